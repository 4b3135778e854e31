use chrono::NaiveDate;
use meridian_alphavantage::AlphaVantageClient;
use meridian_alphavantage::time_series_daily::{
    TimeSeriesDaily, TimeSeriesDailyParams, TimeSeriesDailyResponse, TimeSeriesError,
};
use std::time::Duration;

const FIXTURE: &str = r#"{
    "Meta Data": {
        "1. Information": "Daily Prices (open, high, low, close) and Volumes",
        "2. Symbol": "XAUUSD",
        "3. Last Refreshed": "2024-07-03",
        "4. Output Size": "Compact",
        "5. Time Zone": "US/Eastern"
    },
    "Time Series (Daily)": {
        "2024-07-03": {"1. open": "2330.1", "2. high": "2364.0", "3. low": "2325.5", "4. close": "2356.10", "5. volume": "0"},
        "2024-07-01": {"1. open": "2326.0", "2. high": "2337.9", "3. low": "2318.6", "4. close": "2332.45", "5. volume": "0"},
        "2024-07-02": {"1. open": "2332.4", "2. high": "2335.2", "3. low": "2318.9", "4. close": "2329.90", "5. volume": "0"}
    }
}"#;

fn parse(json: &str) -> TimeSeriesDailyResponse {
    serde_json::from_str(json).expect("fixture should parse")
}

#[test]
fn converts_daily_closes_in_date_order() {
    let series = parse(FIXTURE).into_price_series(180).unwrap();

    assert_eq!(
        series.dates(),
        vec![
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 7, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 7, 3).unwrap(),
        ]
    );
    assert_eq!(series.prices(), vec![2332.45, 2329.90, 2356.10]);
}

#[test]
fn keeps_only_the_most_recent_days() {
    let series = parse(FIXTURE).into_price_series(1).unwrap();

    assert_eq!(series.prices(), vec![2356.10]);
}

#[test]
fn rate_limit_note_is_reported() {
    let response = parse(
        r#"{"Note": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."}"#,
    );

    assert!(matches!(
        response.into_price_series(180),
        Err(TimeSeriesError::RateLimited(_))
    ));
}

#[test]
fn error_message_is_reported() {
    let response = parse(r#"{"Error Message": "Invalid API call."}"#);

    match response.into_price_series(180) {
        Err(TimeSeriesError::Api(message)) => assert_eq!(message, "Invalid API call."),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn malformed_close_is_reported() {
    let response = parse(
        r#"{"Time Series (Daily)": {"2024-07-01": {"1. open": "1", "2. high": "1", "3. low": "1", "4. close": "n/a"}}}"#,
    );

    assert!(matches!(
        response.into_price_series(180),
        Err(TimeSeriesError::InvalidClose { .. })
    ));
}

#[test]
fn empty_payload_is_reported() {
    assert!(matches!(
        parse("{}").into_price_series(180),
        Err(TimeSeriesError::MissingSeries)
    ));
}

#[tokio::test]
#[ignore = "hits the live Alpha Vantage API"]
pub async fn fetch_time_series_daily() {
    let client = AlphaVantageClient::new(
        std::env::var("ALPHA_VANTAGE_API_KEY")
            .expect("Fill $ALPHA_VANTAGE_API_KEY")
            .as_str(),
        Duration::from_secs(30),
    )
    .expect("Failed to build client");

    let response = client
        .call::<TimeSeriesDaily>(TimeSeriesDailyParams::builder().symbol("XAUUSD").build())
        .await
        .expect("Failed to fetch daily time series");

    println!("{response:?}");
}
