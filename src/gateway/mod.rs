pub mod config;
pub mod error;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::extract;
use crate::session::{self, CommandRequest, Completion, CompletionStrategy, SessionOutput};
use config::Config;
use error::GatewayError;

/// Adjusted value reported when nothing usable came back.
pub const NO_RESPONSE: &str = "no response";

/// The three views of one daemon reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayReply {
    pub original: String,
    pub cleaned: String,
    pub adjusted: String,
    pub completion: Completion,
    pub bytes: usize,
}

impl GatewayReply {
    pub fn from_output(command: &str, output: &SessionOutput) -> Self {
        let original = output.text();
        let (cleaned, adjusted) = extract::derive(command, &original);
        Self {
            original,
            cleaned,
            adjusted,
            completion: output.completion,
            bytes: output.raw.len(),
        }
    }

    /// `adjusted`, or [`NO_RESPONSE`] when it holds nothing but whitespace.
    pub fn adjusted_or_fallback(&self) -> &str {
        if self.adjusted.trim().is_empty() {
            NO_RESPONSE
        } else {
            &self.adjusted
        }
    }
}

/// Runs commands against daemons with fixed timing and line rules
#[derive(Debug, Clone)]
pub struct Gateway {
    strategy: CompletionStrategy,
    eol: String,
}

impl Gateway {
    pub fn new(strategy: CompletionStrategy, eol: impl Into<String>) -> Self {
        Self {
            strategy,
            eol: eol.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.completion_strategy(), config.eol.clone())
    }

    pub fn strategy(&self) -> CompletionStrategy {
        self.strategy
    }

    /// Run one session and derive its reply.
    pub async fn execute(&self, request: &CommandRequest) -> Result<GatewayReply, GatewayError> {
        let span = tracing::info_span!(
            "session",
            id = %Uuid::new_v4(),
            endpoint = %request.endpoint(),
            command = %request.command,
        );
        self.run_session(request).instrument(span).await
    }

    async fn run_session(&self, request: &CommandRequest) -> Result<GatewayReply, GatewayError> {
        let output = session::run(request, self.strategy, &self.eol).await?;
        let reply = GatewayReply::from_output(&request.command, &output);
        debug!(
            completion = ?reply.completion,
            bytes = reply.bytes,
            adjusted = %reply.adjusted,
            "daemon reply adjusted"
        );
        Ok(reply)
    }

    /// Wire projection: always a non-empty string, failures become [`NO_RESPONSE`].
    ///
    /// The distinction between an unreachable daemon and an empty reply only
    /// survives in the logs.
    pub async fn adjusted(&self, request: &CommandRequest) -> String {
        project(&request.command, self.execute(request).await)
    }
}

/// Collapse a gateway outcome into the value handed to the dashboard.
pub fn project(command: &str, outcome: Result<GatewayReply, GatewayError>) -> String {
    match outcome {
        Ok(reply) => {
            if reply.adjusted.trim().is_empty() {
                info!(%command, "daemon reply had no usable content");
            }
            reply.adjusted_or_fallback().to_string()
        }
        Err(e) => {
            warn!(%command, kind = ?e.kind(), error = %e, "daemon command failed");
            NO_RESPONSE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn output(raw: &str, completion: Completion) -> SessionOutput {
        SessionOutput {
            raw: raw.as_bytes().to_vec(),
            completion,
            elapsed: Duration::from_millis(250),
        }
    }

    #[test]
    fn test_reply_views() {
        let out = output("getheight\r\n\0height=482931\r\nok\r\n", Completion::Idle);
        let reply = GatewayReply::from_output("getheight", &out);
        assert_eq!(reply.original, "getheight\r\n\0height=482931\r\nok\r\n");
        assert_eq!(reply.cleaned, "getheight\nheight=482931\nok");
        assert_eq!(reply.adjusted, "height:482931");
        assert_eq!(reply.bytes, out.raw.len());
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let out = SessionOutput {
            raw: vec![b'o', b'k', 0xff, b'\n'],
            completion: Completion::RemoteClosed,
            elapsed: Duration::ZERO,
        };
        let reply = GatewayReply::from_output("ping", &out);
        assert!(reply.original.starts_with("ok"));
        assert!(!reply.adjusted.is_empty());
    }

    #[test]
    fn test_project_fallbacks() {
        let blank = GatewayReply::from_output("status", &output("\r\n", Completion::Idle));
        assert_eq!(project("status", Ok(blank)), NO_RESPONSE);

        let empty = GatewayReply::from_output("getheight", &output("", Completion::RemoteClosed));
        assert_eq!(project("getheight", Ok(empty)), NO_RESPONSE);

        let err = GatewayError::Timeout(Duration::from_millis(5000));
        assert_eq!(project("getheight", Err(err)), NO_RESPONSE);
    }

    #[test]
    fn test_project_keeps_miner_fallback() {
        let reply = GatewayReply::from_output("mineractive", &output("\r\n", Completion::Idle));
        assert_eq!(project("mineractive", Ok(reply)), extract::miner::NO_MINER);
    }
}
