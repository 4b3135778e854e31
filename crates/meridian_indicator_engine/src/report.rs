use crate::error::ComputationError;
use crate::indicators::{IndicatorFrame, IndicatorParams};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

pub const RSI_OVERSOLD: f64 = 30.0;
pub const MVRV_FAIR_VALUE: f64 = 1.0;

/// RSI reading of the latest row.
///
/// There is intentionally no overbought zone: anything from 30 up reads as
/// neutral or bullish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RsiZone {
    Oversold,
    NeutralBullish,
}

impl RsiZone {
    pub fn classify(rsi: f64) -> Self {
        if rsi < RSI_OVERSOLD {
            RsiZone::Oversold
        } else {
            RsiZone::NeutralBullish
        }
    }
}

impl fmt::Display for RsiZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RsiZone::Oversold => write!(f, "Oversold"),
            RsiZone::NeutralBullish => write!(f, "Neutral/Bullish"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MacdTrend {
    Bullish,
    Bearish,
}

impl MacdTrend {
    /// A MACD sitting exactly on its signal line counts as bearish.
    pub fn classify(macd: f64, signal: f64) -> Self {
        if macd > signal {
            MacdTrend::Bullish
        } else {
            MacdTrend::Bearish
        }
    }
}

impl fmt::Display for MacdTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacdTrend::Bullish => write!(f, "Bullish"),
            MacdTrend::Bearish => write!(f, "Bearish"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MvrvValuation {
    Undervalued,
    FairlyValued,
}

impl MvrvValuation {
    pub fn classify(mvrv: f64) -> Self {
        if mvrv < MVRV_FAIR_VALUE {
            MvrvValuation::Undervalued
        } else {
            MvrvValuation::FairlyValued
        }
    }
}

impl fmt::Display for MvrvValuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MvrvValuation::Undervalued => write!(f, "Undervalued"),
            MvrvValuation::FairlyValued => write!(f, "Fairly Valued"),
        }
    }
}

/// Snapshot of the latest indicator values for one asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub asset: String,
    pub date: NaiveDate,
    pub price: f64,
    pub rsi: f64,
    pub macd: f64,
    pub signal: f64,
    pub mvrv: f64,
}

impl Report {
    /// Builds the report from the last row of `frame`.
    ///
    /// The frame must hold at least `params.min_history()` rows, and every
    /// indicator on its last row must be defined.
    pub fn from_frame(
        asset: impl Into<String>,
        frame: &IndicatorFrame,
        params: &IndicatorParams,
    ) -> Result<Self, ComputationError> {
        let required = params.min_history();
        let latest = match frame.latest() {
            Some(row) if frame.len() >= required => row,
            _ => {
                return Err(ComputationError::InsufficientHistory {
                    required,
                    available: frame.len(),
                })
            }
        };

        let rsi = defined("RSI", latest.rsi)?;
        let macd = defined("MACD", Some(latest.macd))?;
        let signal = defined("Signal", Some(latest.signal))?;
        let mvrv = defined("MVRV", latest.mvrv)?;

        Ok(Self {
            asset: asset.into(),
            date: latest.date,
            price: latest.price,
            rsi,
            macd,
            signal,
            mvrv,
        })
    }

    pub fn rsi_zone(&self) -> RsiZone {
        RsiZone::classify(self.rsi)
    }

    pub fn macd_trend(&self) -> MacdTrend {
        MacdTrend::classify(self.macd, self.signal)
    }

    pub fn mvrv_valuation(&self) -> MvrvValuation {
        MvrvValuation::classify(self.mvrv)
    }

    pub fn subject(&self) -> String {
        format!("{} Daily Valuation", self.asset)
    }
}

fn defined(indicator: &'static str, value: Option<f64>) -> Result<f64, ComputationError> {
    value
        .filter(|v| v.is_finite())
        .ok_or(ComputationError::UndefinedIndicator { indicator })
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "📊 {} Valuation Report ({}):",
            self.asset,
            self.date.format("%Y-%m-%d")
        )?;
        writeln!(f, "Price: ${:.2}", self.price)?;
        writeln!(f, "RSI: {:.2} → {}", self.rsi, self.rsi_zone())?;
        writeln!(
            f,
            "MACD: {:.2}, Signal: {:.2} → {}",
            self.macd,
            self.signal,
            self.macd_trend()
        )?;
        write!(f, "MVRV: {:.2} → {}", self.mvrv, self.mvrv_valuation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn frame(len: usize) -> IndicatorFrame {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        IndicatorFrame {
            dates: (0..len)
                .map(|i| start + chrono::Days::new(i as u64))
                .collect(),
            prices: vec![100.0; len],
            rsi: vec![Some(45.0); len],
            macd: vec![1.5; len],
            signal: vec![1.0; len],
            mvrv: vec![Some(0.95); len],
        }
    }

    fn report(rsi: f64, macd: f64, signal: f64, mvrv: f64) -> Report {
        Report {
            asset: "Bitcoin".to_string(),
            date: date(),
            price: 61234.567,
            rsi,
            macd,
            signal,
            mvrv,
        }
    }

    #[test]
    fn classification_boundaries() {
        assert_eq!(RsiZone::classify(29.999), RsiZone::Oversold);
        assert_eq!(RsiZone::classify(30.0), RsiZone::NeutralBullish);
        assert_eq!(RsiZone::classify(85.0), RsiZone::NeutralBullish);

        assert_eq!(MacdTrend::classify(1.0, 1.0), MacdTrend::Bearish);
        assert_eq!(MacdTrend::classify(1.0001, 1.0), MacdTrend::Bullish);
        assert_eq!(MacdTrend::classify(-2.0, -1.0), MacdTrend::Bearish);

        assert_eq!(MvrvValuation::classify(1.0), MvrvValuation::FairlyValued);
        assert_eq!(MvrvValuation::classify(0.9999), MvrvValuation::Undervalued);
    }

    #[test]
    fn formats_latest_values() {
        let text = report(28.41, -120.5, -100.25, 0.876).to_string();

        assert_eq!(
            text,
            "📊 Bitcoin Valuation Report (2024-06-30):\n\
             Price: $61234.57\n\
             RSI: 28.41 → Oversold\n\
             MACD: -120.50, Signal: -100.25 → Bearish\n\
             MVRV: 0.88 → Undervalued"
        );
    }

    #[test]
    fn formats_boundary_values() {
        let text = report(30.0, 2.0, 2.0, 1.0).to_string();

        assert!(text.contains("RSI: 30.00 → Neutral/Bullish"));
        assert!(text.contains("MACD: 2.00, Signal: 2.00 → Bearish"));
        assert!(text.contains("MVRV: 1.00 → Fairly Valued"));
    }

    #[test]
    fn subject_names_the_asset() {
        assert_eq!(report(50.0, 0.0, 0.0, 1.0).subject(), "Bitcoin Daily Valuation");
    }

    #[test]
    fn from_frame_uses_the_latest_row() {
        let mut frame = frame(30);
        frame.prices[29] = 123.0;
        frame.rsi[29] = Some(71.0);

        let report = Report::from_frame("Gold", &frame, &IndicatorParams::default()).unwrap();
        assert_eq!(report.asset, "Gold");
        assert_eq!(report.date, NaiveDate::from_ymd_opt(2024, 1, 30).unwrap());
        assert_eq!(report.price, 123.0);
        assert_eq!(report.rsi_zone(), RsiZone::NeutralBullish);
        assert_eq!(report.macd_trend(), MacdTrend::Bullish);
        assert_eq!(report.mvrv_valuation(), MvrvValuation::Undervalued);
    }

    #[test]
    fn short_frames_are_rejected() {
        for len in [0, 1, 29] {
            let err = Report::from_frame("Gold", &frame(len), &IndicatorParams::default())
                .unwrap_err();
            assert!(matches!(
                err,
                ComputationError::InsufficientHistory {
                    required: 30,
                    available
                } if available == len
            ));
        }
    }

    #[test]
    fn undefined_latest_value_is_rejected() {
        let mut frame = frame(40);
        frame.mvrv[39] = None;

        let err = Report::from_frame("Gold", &frame, &IndicatorParams::default()).unwrap_err();
        assert!(matches!(
            err,
            ComputationError::UndefinedIndicator { indicator: "MVRV" }
        ));
    }
}
