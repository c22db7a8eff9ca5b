use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use owonero_proxy::comms::local_api;
use owonero_proxy::gateway::config::Config;
use owonero_proxy::gateway::Gateway;
use owonero_proxy::session::CommandRequest;

#[derive(Parser)]
#[command(name = "owonero-proxy", version, about = "HTTP to TCP gateway for the Owonero dashboard")]
struct AppCli {
    /// Config file path (JSON); built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Debug logging for the proxy (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway (default)
    Serve {
        /// HTTP listen port
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },
    /// Send one command to a daemon and print the adjusted reply
    Send {
        /// Daemon command, e.g. getheight or mineractive
        command: Option<String>,
        /// Daemon host
        #[arg(long)]
        host: Option<String>,
        /// Daemon TCP port
        #[arg(long)]
        daemon_port: Option<u16>,
        /// JSON payload sent as a second line
        #[arg(long)]
        payload: Option<String>,
        /// Print original, cleaned and adjusted views as JSON
        #[arg(long, default_value_t = false)]
        raw: bool,
    },
}

async fn send(
    config: &Config,
    command: Option<String>,
    host: Option<String>,
    daemon_port: Option<u16>,
    payload: Option<String>,
    raw: bool,
) -> Result<()> {
    let mut request = CommandRequest::new(
        host.unwrap_or_else(|| config.default_host.clone()),
        daemon_port.unwrap_or(config.default_port),
        command.unwrap_or_else(|| config.default_command.clone()),
    );
    if let Some(p) = payload {
        let value: serde_json::Value =
            serde_json::from_str(&p).context("parsing --payload as JSON")?;
        request = request.with_payload(value);
    }

    let gateway = Gateway::from_config(config);
    let reply = gateway.execute(&request).await?;
    if raw {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        println!("{}", reply.adjusted_or_fallback());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = AppCli::parse();
    owonero_proxy::utils::logging::init(args.verbose);

    let mut config = Config::load(args.config.as_deref())?;

    match args.command {
        Some(Commands::Send {
            command,
            host,
            daemon_port,
            payload,
            raw,
        }) => {
            send(&config, command, host, daemon_port, payload, raw).await?;
        }
        Some(Commands::Serve { port }) => {
            if let Some(port) = port {
                config.listen_port = port;
            }
            info!(version = owonero_proxy::VERSION, "starting proxy on port {}", config.listen_port);
            local_api::serve(config).await?;
        }
        None => {
            // Bare invocation still honours PORT like the serve subcommand
            if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
                config.listen_port = port;
            }
            info!(version = owonero_proxy::VERSION, "starting proxy on port {}", config.listen_port);
            local_api::serve(config).await?;
        }
    }

    Ok(())
}
