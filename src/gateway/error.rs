use std::io;
use std::time::Duration;

/// Coarse classification used in logs and by callers that branch on failure type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    Timeout,
    InvalidEndpoint,
    MalformedRequest,
}

/// Why a gateway operation produced no reply.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("TCP connection to {endpoint} failed: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    #[error("TCP connection failed: {0}")]
    Io(#[from] io::Error),

    #[error("TCP timeout after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Connect { .. } | GatewayError::Io(_) => ErrorKind::Connection,
            GatewayError::Timeout(_) => ErrorKind::Timeout,
            GatewayError::InvalidEndpoint(_) => ErrorKind::InvalidEndpoint,
            GatewayError::MalformedRequest(_) => ErrorKind::MalformedRequest,
        }
    }
}
