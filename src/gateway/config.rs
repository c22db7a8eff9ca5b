use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::session::CompletionStrategy;

/// Process-wide settings, built once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interface the HTTP gateway binds to
    pub listen_host: String,
    pub listen_port: u16,
    /// Quiet period that ends a daemon reply
    pub idle_timeout_ms: u64,
    /// Hard ceiling for one daemon session
    pub session_timeout_ms: u64,
    /// Line terminator for lines written to the daemon
    pub eol: String,
    pub default_host: String,
    pub default_port: u16,
    pub default_command: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_host: "0.0.0.0".to_string(),
            listen_port: 3001,
            idle_timeout_ms: 250,
            session_timeout_ms: 5000,
            eol: "\r\n".to_string(),
            default_host: "localhost".to_string(),
            default_port: 6969,
            default_command: "getheight".to_string(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path).context("reading config file")?;
        let cfg: Config = serde_json::from_str(&raw).context("parsing JSON")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Explicit path must load; no path means built-in defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p).with_context(|| format!("loading config from {p}")),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.idle_timeout_ms == 0 {
            anyhow::bail!("idle_timeout_ms must be positive");
        }
        if self.session_timeout_ms < self.idle_timeout_ms {
            anyhow::bail!(
                "session_timeout_ms ({}) is shorter than idle_timeout_ms ({})",
                self.session_timeout_ms,
                self.idle_timeout_ms
            );
        }
        if self.eol.is_empty() {
            anyhow::bail!("eol must not be empty");
        }
        if self.default_port == 0 {
            anyhow::bail!("default_port must be in 1-65535");
        }
        self.listen_addr()?;
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .listen_host
            .parse()
            .with_context(|| format!("invalid listen_host {:?}", self.listen_host))?;
        Ok(SocketAddr::new(ip, self.listen_port))
    }

    pub fn completion_strategy(&self) -> CompletionStrategy {
        CompletionStrategy::new(
            Duration::from_millis(self.idle_timeout_ms),
            Duration::from_millis(self.session_timeout_ms),
        )
    }
}
