use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RankwerkError>;

#[derive(Debug, Error)]
pub enum RankwerkError {
    /// A caller-supplied argument is invalid (bad model name, non-finite
    /// reward, payload that is not JSON encodable, length mismatch, ...).
    /// Raised synchronously, before any network or disk activity.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation was called in the wrong order, e.g. tracking a decision
    /// twice or attaching a reward to an untracked decision.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("model load error: {0}")]
    Load(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serde JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Db(String),
}
