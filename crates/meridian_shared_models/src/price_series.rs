use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("price series is empty")]
    Empty,
    #[error("dates must be strictly increasing (violated at index {index})")]
    NotAscending { index: usize },
    #[error("price at index {index} must be finite and positive, got {price}")]
    InvalidPrice { index: usize, price: f64 },
}

/// Daily closing price of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Date-ordered closing prices for a single asset.
///
/// A series always holds at least one point, its dates are strictly
/// increasing and every price is finite and greater than zero. It cannot be
/// mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        if points.is_empty() {
            return Err(SeriesError::Empty);
        }

        for (index, point) in points.iter().enumerate() {
            if !point.price.is_finite() || point.price <= 0.0 {
                return Err(SeriesError::InvalidPrice {
                    index,
                    price: point.price,
                });
            }
            if index > 0 && points[index - 1].date >= point.date {
                return Err(SeriesError::NotAscending { index });
            }
        }

        Ok(Self { points })
    }

    /// Builds a series from (date, close) pairs in any order.
    ///
    /// When a date shows up more than once the last close wins, which matches
    /// how providers append an intraday sample after the daily ones.
    pub fn from_daily_closes<I>(closes: I) -> Result<Self, SeriesError>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let by_date: BTreeMap<NaiveDate, f64> = closes.into_iter().collect();

        Self::new(
            by_date
                .into_iter()
                .map(|(date, price)| PricePoint::new(date, price))
                .collect(),
        )
    }

    /// Keeps only the trailing `n` points.
    pub fn most_recent(self, n: usize) -> Result<Self, SeriesError> {
        if n == 0 {
            return Err(SeriesError::Empty);
        }

        let Self { mut points } = self;
        let skip = points.len().saturating_sub(n);
        points.drain(..skip);

        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false, a series holds at least one point.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn latest(&self) -> &PricePoint {
        // Non-empty by construction.
        &self.points[self.points.len() - 1]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PricePoint> {
        self.points.iter()
    }
}

impl<'a> IntoIterator for &'a PriceSeries {
    type Item = &'a PricePoint;
    type IntoIter = std::slice::Iter<'a, PricePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl<'de> Deserialize<'de> for PriceSeries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            points: Vec<PricePoint>,
        }

        let raw = Raw::deserialize(deserializer)?;
        PriceSeries::new(raw.points).map_err(serde::de::Error::custom)
    }
}
