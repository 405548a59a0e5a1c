use crate::net::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FipeError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("catalog returned HTTP {0}")]
    Status(u16),
    #[error("catalog JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unparseable price '{0}'")]
    BadPrice(String),
}
