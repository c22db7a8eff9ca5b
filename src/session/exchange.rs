use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{debug, trace};

use super::completion::{Completion, CompletionTracker};
use super::CommandRequest;
use crate::gateway::error::GatewayError;

const READ_CHUNK: usize = 4096;

/// Everything the daemon sent during one session
#[derive(Debug, Clone)]
pub struct SessionOutput {
    pub raw: Vec<u8>,
    pub completion: Completion,
    pub elapsed: Duration,
}

impl SessionOutput {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.raw).into_owned()
    }
}

/// Payload line for the request, if it has one and it serializes.
///
/// Serialization failure drops the payload; the command line is still sent.
fn payload_line(request: &CommandRequest, eol: &str) -> Option<String> {
    let payload = request.payload.as_ref()?;
    match serde_json::to_string(payload) {
        Ok(json) => Some(format!("{json}{eol}")),
        Err(e) => {
            debug!(error = %e, "payload not serializable, sending command only");
            None
        }
    }
}

async fn write_request<S>(stream: &mut S, request: &CommandRequest, eol: &str) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream
        .write_all(format!("{}{eol}", request.command).as_bytes())
        .await?;
    if let Some(line) = payload_line(request, eol) {
        stream.write_all(line.as_bytes()).await?;
    }
    // No shutdown: the daemon answers on this same connection.
    stream.flush().await
}

/// Write the request to an open stream and read until the tracker declares the reply done.
pub async fn exchange<S>(
    stream: &mut S,
    request: &CommandRequest,
    eol: &str,
    tracker: &mut CompletionTracker,
) -> Result<SessionOutput, GatewayError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let ceiling = tracker.strategy().overall();

    match timeout_at(tracker.overall_deadline(), write_request(stream, request, eol)).await {
        Ok(result) => result?,
        Err(_) => return Err(GatewayError::Timeout(ceiling)),
    }

    let mut raw = Vec::new();
    let mut buf = [0u8; READ_CHUNK];

    let completion = loop {
        if let Some(done) = tracker.completion() {
            break done;
        }
        let Some(deadline) = tracker.next_deadline() else {
            continue;
        };

        tokio::select! {
            read = stream.read(&mut buf) => match read? {
                0 => {
                    debug!("TCP socket ended by remote");
                    tracker.on_remote_closed();
                }
                n => {
                    raw.extend_from_slice(&buf[..n]);
                    tracker.on_data(n, Instant::now());
                    trace!(received = raw.len(), "TCP received bytes so far");
                }
            },
            _ = sleep_until(deadline) => {
                tracker.tick(Instant::now());
            }
        }
    };

    if completion == Completion::OverallTimeout {
        return Err(GatewayError::Timeout(ceiling));
    }

    let elapsed = tracker.elapsed(Instant::now());
    debug!(
        bytes = raw.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        ?completion,
        "reply complete"
    );
    Ok(SessionOutput {
        raw,
        completion,
        elapsed,
    })
}
