use thiserror::Error;

use crate::config::ConfigError;
use crate::db::DbError;

/// Top-level error for callers driving a full round end to end.
///
/// Component-local failures (extraction, threshold parsing, context rules)
/// never surface here — they are absorbed into sentinel values at their own
/// boundary. Only configuration loading and store transactions fail loud.
#[derive(Debug, Error)]
pub enum VigilError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("history store error: {0}")]
    Db(#[from] DbError),
}
