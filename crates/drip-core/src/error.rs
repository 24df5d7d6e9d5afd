use crate::types::{ActivityId, ScheduleId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DripError {
    #[error("not initialized: run 'drip init'")]
    NotInitialized,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("malformed availability rule: {0}")]
    MalformedRule(String),

    #[error("external write failed: {0}")]
    ExternalWrite(String),

    #[error("schedule not found: {0}")]
    ScheduleNotFound(ScheduleId),

    #[error("activity not found: {0}")]
    ActivityNotFound(ActivityId),

    #[error("store error: {0}")]
    Store(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DripError>;
