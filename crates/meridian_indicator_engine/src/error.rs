use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComputationError {
    #[error("insufficient history: {required} prices required, {available} available")]
    InsufficientHistory { required: usize, available: usize },
    #[error("{indicator} is undefined on the latest row")]
    UndefinedIndicator { indicator: &'static str },
    #[error("{name} must be at least 1")]
    InvalidWindow { name: &'static str },
    #[error("indicator frame error: {0}")]
    Frame(#[from] PolarsError),
}
