pub mod error;
pub mod indicators;
pub mod report;

pub use error::ComputationError;
pub use indicators::{IndicatorFrame, IndicatorParams, IndicatorRow, Indicators, MacdSeries};
pub use report::{MacdTrend, MvrvValuation, Report, RsiZone};
