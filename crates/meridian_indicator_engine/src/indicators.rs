use crate::error::ComputationError;
use chrono::NaiveDate;
use itertools::izip;
use meridian_shared_models::PriceSeries;
use polars::prelude::*;
use serde::Serialize;

pub const RSI_WINDOW: usize = 14;
pub const MACD_SHORT_SPAN: usize = 12;
pub const MACD_LONG_SPAN: usize = 26;
pub const MACD_SIGNAL_SPAN: usize = 9;
pub const MVRV_WINDOW: usize = 30;

/// Window and span lengths used by the indicator pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorParams {
    pub rsi_window: usize,
    pub macd_short: usize,
    pub macd_long: usize,
    pub macd_signal: usize,
    pub mvrv_window: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_window: RSI_WINDOW,
            macd_short: MACD_SHORT_SPAN,
            macd_long: MACD_LONG_SPAN,
            macd_signal: MACD_SIGNAL_SPAN,
            mvrv_window: MVRV_WINDOW,
        }
    }
}

impl IndicatorParams {
    /// Shortest series whose latest row has every indicator defined.
    ///
    /// RSI needs `rsi_window` deltas (one more price than the window), MVRV
    /// needs `mvrv_window` prices, MACD is defined from the first price on.
    pub fn min_history(&self) -> usize {
        (self.rsi_window + 1).max(self.mvrv_window).max(1)
    }

    fn validate(&self) -> Result<(), ComputationError> {
        ensure_window("rsi window", self.rsi_window)?;
        ensure_window("macd short span", self.macd_short)?;
        ensure_window("macd long span", self.macd_long)?;
        ensure_window("macd signal span", self.macd_signal)?;
        ensure_window("mvrv window", self.mvrv_window)
    }
}

fn ensure_window(name: &'static str, size: usize) -> Result<(), ComputationError> {
    if size == 0 {
        return Err(ComputationError::InvalidWindow { name });
    }
    Ok(())
}

/// MACD line and its signal line, one entry per input price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

/// Price series augmented with its derived indicators.
///
/// Every column has the same length as `prices` and is aligned by position.
/// `None` marks entries without enough history for the indicator's window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorFrame {
    pub dates: Vec<NaiveDate>,
    pub prices: Vec<f64>,
    pub rsi: Vec<Option<f64>>,
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub mvrv: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub price: f64,
    pub rsi: Option<f64>,
    pub macd: f64,
    pub signal: f64,
    pub mvrv: Option<f64>,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = IndicatorRow> + '_ {
        izip!(
            &self.dates,
            &self.prices,
            &self.rsi,
            &self.macd,
            &self.signal,
            &self.mvrv
        )
        .map(|(&date, &price, &rsi, &macd, &signal, &mvrv)| IndicatorRow {
            date,
            price,
            rsi,
            macd,
            signal,
            mvrv,
        })
    }

    pub fn row(&self, idx: usize) -> Option<IndicatorRow> {
        self.rows().nth(idx)
    }

    pub fn latest(&self) -> Option<IndicatorRow> {
        self.len().checked_sub(1).and_then(|idx| self.row(idx))
    }
}

fn window(size: usize) -> RollingOptionsFixedWindow {
    RollingOptionsFixedWindow {
        window_size: size,
        min_periods: size,
        ..Default::default()
    }
}

pub struct Indicators {
    dates: Vec<NaiveDate>,
    prices: Vec<f64>,
    data: LazyFrame,
}

impl Indicators {
    pub fn new(series: &PriceSeries) -> Result<Self, ComputationError> {
        let prices = series.prices();
        let data = price_frame(&prices)?;

        Ok(Self {
            dates: series.dates(),
            prices,
            data,
        })
    }

    fn calculate_ema(values: Expr, span: usize) -> Expr {
        values.ewm_mean(EWMOptions {
            alpha: 2.0 / (span as f64 + 1.0),
            adjust: false,
            ..Default::default()
        })
    }

    /// Computes the Relative Strength Index over a rolling window of `period` deltas.
    ///
    /// Gains and losses are averaged with a simple moving average, so the
    /// first defined value sits at index `period`. A window without losses
    /// reads 100 when it saw gains and 50 when the price did not move at all.
    fn calculate_rsi(frame: LazyFrame, period: usize) -> LazyFrame {
        let rs = col("avg_gain") / col("avg_loss");

        frame
            .with_column((col("price") - col("price").shift(lit(1))).alias("delta"))
            // max(delta, 0) and max(-delta, 0), keeping the leading null
            .with_columns([
                ((col("delta").abs() + col("delta")) / lit(2.0)).alias("gain"),
                ((col("delta").abs() - col("delta")) / lit(2.0)).alias("loss"),
            ])
            .with_columns([
                col("gain").rolling_mean(window(period)).alias("avg_gain"),
                col("loss").rolling_mean(window(period)).alias("avg_loss"),
            ])
            .with_column(
                when(col("avg_loss").lt_eq(lit(0.0)))
                    .then(
                        when(col("avg_gain").gt(lit(0.0)))
                            .then(lit(100.0))
                            .otherwise(lit(50.0)),
                    )
                    .otherwise(lit(100.0) - (lit(100.0) / (lit(1.0) + rs)))
                    .alias("rsi"),
            )
            // Rolling sums can leave a tiny negative residue once a value leaves the window.
            .with_column(
                when(col("rsi").lt(lit(0.0)))
                    .then(lit(0.0))
                    .when(col("rsi").gt(lit(100.0)))
                    .then(lit(100.0))
                    .otherwise(col("rsi"))
                    .alias("rsi"),
            )
    }

    /// Calculate MACD
    /// - ema_short: `short`-period EMA of the price, seeded with the first price
    /// - ema_long: `long`-period EMA of the price, seeded with the first price
    /// - MACD: ema_short - ema_long
    /// - Signal: `signal`-period EMA of MACD
    fn calculate_macd(frame: LazyFrame, short: usize, long: usize, signal: usize) -> LazyFrame {
        frame
            .with_columns([
                Self::calculate_ema(col("price"), short).alias("ema_short"),
                Self::calculate_ema(col("price"), long).alias("ema_long"),
            ])
            .with_column((col("ema_short") - col("ema_long")).alias("macd"))
            .with_column(Self::calculate_ema(col("macd"), signal).alias("signal"))
    }

    /// Ratio of the price to its trailing `period`-day average (the simulated
    /// realized price). Non-positive realized prices yield NaN, which is read
    /// back as undefined.
    fn calculate_mvrv(frame: LazyFrame, period: usize) -> LazyFrame {
        frame
            .with_column(
                col("price")
                    .rolling_mean(window(period))
                    .alias("realized_price"),
            )
            .with_column(
                when(col("realized_price").gt(lit(0.0)))
                    .then(col("price") / col("realized_price"))
                    .otherwise(lit(f64::NAN))
                    .alias("mvrv"),
            )
    }

    pub fn calculate(self, params: &IndicatorParams) -> Result<IndicatorFrame, ComputationError> {
        params.validate()?;

        let Self {
            dates,
            prices,
            data,
        } = self;

        let data = Self::calculate_rsi(data, params.rsi_window);
        let data = Self::calculate_macd(
            data,
            params.macd_short,
            params.macd_long,
            params.macd_signal,
        );
        let data = Self::calculate_mvrv(data, params.mvrv_window);

        let df = data.collect()?;

        Ok(IndicatorFrame {
            rsi: optional_values(&df, "rsi")?,
            macd: dense_values(&df, "macd")?,
            signal: dense_values(&df, "signal")?,
            mvrv: optional_values(&df, "mvrv")?,
            dates,
            prices,
        })
    }
}

fn price_frame(prices: &[f64]) -> PolarsResult<LazyFrame> {
    let df = DataFrame::new(vec![Column::new("price".into(), prices.to_vec())])?;
    Ok(df.lazy())
}

/// Reads a column where null and non-finite entries mean "undefined".
fn optional_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    Ok(df
        .column(name)?
        .f64()?
        .into_iter()
        .map(|value| value.filter(|v| v.is_finite()))
        .collect())
}

fn dense_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<f64>> {
    Ok(df
        .column(name)?
        .f64()?
        .into_iter()
        .map(|value| value.unwrap_or(f64::NAN))
        .collect())
}

/// RSI of `prices` over `window` deltas; `None` until `window` deltas exist.
pub fn compute_rsi(prices: &[f64], window: usize) -> Result<Vec<Option<f64>>, ComputationError> {
    ensure_window("rsi window", window)?;
    if prices.is_empty() {
        return Ok(Vec::new());
    }

    let df = Indicators::calculate_rsi(price_frame(prices)?, window).collect()?;
    Ok(optional_values(&df, "rsi")?)
}

/// Exponential moving average with α = 2/(span+1), seeded with the first value.
pub fn compute_ema(values: &[f64], span: usize) -> Result<Vec<f64>, ComputationError> {
    ensure_window("ema span", span)?;
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let df = price_frame(values)?
        .with_column(Indicators::calculate_ema(col("price"), span).alias("ema"))
        .collect()?;
    Ok(dense_values(&df, "ema")?)
}

pub fn compute_macd(
    prices: &[f64],
    short: usize,
    long: usize,
    signal: usize,
) -> Result<MacdSeries, ComputationError> {
    ensure_window("macd short span", short)?;
    ensure_window("macd long span", long)?;
    ensure_window("macd signal span", signal)?;
    if prices.is_empty() {
        return Ok(MacdSeries {
            macd: Vec::new(),
            signal: Vec::new(),
        });
    }

    let df = Indicators::calculate_macd(price_frame(prices)?, short, long, signal).collect()?;
    Ok(MacdSeries {
        macd: dense_values(&df, "macd")?,
        signal: dense_values(&df, "signal")?,
    })
}

/// Price over its trailing `window`-price average; `None` until the window is full.
pub fn simulate_mvrv(prices: &[f64], window: usize) -> Result<Vec<Option<f64>>, ComputationError> {
    ensure_window("mvrv window", window)?;
    if prices.is_empty() {
        return Ok(Vec::new());
    }

    let df = Indicators::calculate_mvrv(price_frame(prices)?, window).collect()?;
    Ok(optional_values(&df, "mvrv")?)
}
