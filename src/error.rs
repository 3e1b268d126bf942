//! Typed errors raised by the aggregation model and config validation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
