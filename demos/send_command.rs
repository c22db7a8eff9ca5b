/// Example: one gateway round trip against a local daemon
///
/// Sends `getheight` (or the first argument) to localhost:6969 and prints
/// every view of the reply.
///
/// Run with: cargo run --example send_command -- mineractive
use owonero_proxy::gateway::config::Config;
use owonero_proxy::gateway::Gateway;
use owonero_proxy::session::CommandRequest;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "getheight".to_string());
    let config = Config::default();
    let request = CommandRequest::new(config.default_host.clone(), config.default_port, command);

    let gateway = Gateway::from_config(&config);
    match gateway.execute(&request).await {
        Ok(reply) => {
            tracing::info!("completion: {:?} after {} bytes", reply.completion, reply.bytes);
            tracing::info!("original:\n{}", reply.original);
            tracing::info!("cleaned:\n{}", reply.cleaned);
            tracing::info!("adjusted: {}", reply.adjusted_or_fallback());
        }
        Err(e) => {
            tracing::warn!("gateway failed ({:?}): {}", e.kind(), e);
        }
    }

    Ok(())
}
