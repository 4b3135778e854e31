use chrono::{Days, NaiveDate};
use meridian_indicator_engine::indicators::{compute_macd, compute_rsi, simulate_mvrv};
use meridian_indicator_engine::{ComputationError, IndicatorParams, Indicators, Report};
use meridian_shared_models::{PricePoint, PriceSeries};

fn sawtooth(len: usize) -> Vec<f64> {
    let pattern = [100.0, 102.0, 101.0, 105.0, 103.0];
    (0..len)
        .map(|i| pattern[i % pattern.len()] + (i / pattern.len()) as f64)
        .collect()
}

fn series(prices: &[f64]) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    PriceSeries::new(
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint::new(start + Days::new(i as u64), price))
            .collect(),
    )
    .unwrap()
}

#[test]
fn indicators_are_reproducible() {
    let prices = sawtooth(45);

    assert_eq!(compute_rsi(&prices, 14).unwrap(), compute_rsi(&prices, 14).unwrap());
    assert_eq!(
        compute_macd(&prices, 12, 26, 9).unwrap(),
        compute_macd(&prices, 12, 26, 9).unwrap()
    );
    assert_eq!(simulate_mvrv(&prices, 30).unwrap(), simulate_mvrv(&prices, 30).unwrap());

    let params = IndicatorParams::default();
    let first = Indicators::new(&series(&prices)).unwrap().calculate(&params).unwrap();
    let second = Indicators::new(&series(&prices)).unwrap().calculate(&params).unwrap();
    assert_eq!(first, second);
}

#[test]
fn report_from_full_window() {
    let prices = sawtooth(180);
    let params = IndicatorParams::default();
    let frame = Indicators::new(&series(&prices)).unwrap().calculate(&params).unwrap();

    let report = Report::from_frame("Ethereum", &frame, &params).unwrap();
    let latest = frame.latest().unwrap();

    assert_eq!(report.price, *prices.last().unwrap());
    assert_eq!(Some(report.rsi), latest.rsi);
    assert_eq!(Some(report.mvrv), latest.mvrv);
    assert!((0.0..=100.0).contains(&report.rsi));
    // Steady uptrend: the latest price sits above its 30-day average.
    assert!(report.mvrv > 1.0);

    let text = report.to_string();
    assert!(text.starts_with("📊 Ethereum Valuation Report (2024-08-27):"));
    assert_eq!(text.lines().count(), 5);
}

#[test]
fn short_series_cannot_be_reported() {
    let params = IndicatorParams::default();
    let frame = Indicators::new(&series(&sawtooth(29)))
        .unwrap()
        .calculate(&params)
        .unwrap();

    // Indicators are still produced, only the report is refused.
    assert_eq!(frame.len(), 29);
    assert!(frame.mvrv.iter().all(Option::is_none));

    let err = Report::from_frame("Gold", &frame, &params).unwrap_err();
    assert!(matches!(
        err,
        ComputationError::InsufficientHistory {
            required: 30,
            available: 29
        }
    ));
}

#[test]
fn minimum_history_is_enough() {
    let params = IndicatorParams::default();
    let frame = Indicators::new(&series(&sawtooth(30)))
        .unwrap()
        .calculate(&params)
        .unwrap();

    assert!(Report::from_frame("Gold", &frame, &params).is_ok());
}
