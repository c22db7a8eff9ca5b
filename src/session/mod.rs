pub mod completion;
pub mod exchange;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

use crate::gateway::error::GatewayError;

pub use completion::{Completion, CompletionState, CompletionStrategy, CompletionTracker};
pub use exchange::{exchange, SessionOutput};

/// One command to run against one daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub host: String,
    pub port: u16,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl CommandRequest {
    pub fn new(host: impl Into<String>, port: u16, command: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            command: command.into(),
            payload: None,
        }
    }

    /// Attach a payload line; JSON `null` counts as no payload.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = if payload.is_null() { None } else { Some(payload) };
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.host.trim().is_empty() {
            return Err(GatewayError::InvalidEndpoint("empty host".to_string()));
        }
        if self.port == 0 {
            return Err(GatewayError::InvalidEndpoint(format!("port 0 on {}", self.host)));
        }
        if self.command.trim().is_empty() {
            return Err(GatewayError::MalformedRequest("empty command".to_string()));
        }
        Ok(())
    }
}

/// Open a connection, send the command and collect the reply.
///
/// The connection is dropped when this returns, whatever the outcome.
pub async fn run(
    request: &CommandRequest,
    strategy: CompletionStrategy,
    eol: &str,
) -> Result<SessionOutput, GatewayError> {
    request.validate()?;

    let mut tracker = CompletionTracker::new(strategy, Instant::now());
    let endpoint = request.endpoint();

    let connect = TcpStream::connect((request.host.as_str(), request.port));
    let mut stream = match timeout_at(tracker.overall_deadline(), connect).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(source)) => return Err(GatewayError::Connect { endpoint, source }),
        Err(_) => return Err(GatewayError::Timeout(strategy.overall())),
    };
    debug!(%endpoint, "TCP connected");

    exchange(&mut stream, request, eol, &mut tracker).await
}
