use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::IntoFuture;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::gateway::config::Config;
use crate::gateway::error::GatewayError;
use crate::gateway::{Gateway, NO_RESPONSE};
use crate::session::CommandRequest;

type SharedState = Arc<AppState>;

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gateway: Gateway,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        let gateway = Gateway::from_config(&config);
        Self { config, gateway }
    }
}

/// Body of `POST /api/tcp`; every field optional, loosely typed like the dashboard sends it.
#[derive(Debug, Default, Deserialize)]
pub struct TcpRequestBody {
    #[serde(default)]
    pub host: Option<Value>,
    #[serde(default)]
    pub port: Option<Value>,
    #[serde(default)]
    pub command: Option<Value>,
    #[serde(default)]
    pub payload: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TcpResponse {
    pub ok: bool,
    pub adjusted: String,
}

// null, false, 0 and "" all mean "use the default"
fn is_falsy(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn present(v: Option<Value>) -> Option<Value> {
    v.filter(|v| !is_falsy(v))
}

fn parse_port(v: &Value) -> Result<u16, GatewayError> {
    let port = match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    port.and_then(|p| u16::try_from(p).ok())
        .filter(|p| *p != 0)
        .ok_or_else(|| GatewayError::InvalidEndpoint(format!("port {v}")))
}

impl TcpRequestBody {
    /// Fill in defaults from config and build the gateway request.
    pub fn into_request(self, config: &Config) -> Result<CommandRequest, GatewayError> {
        let host = match present(self.host) {
            None => config.default_host.clone(),
            Some(Value::String(s)) => s,
            Some(other) => {
                return Err(GatewayError::MalformedRequest(format!("host must be a string, got {other}")))
            }
        };
        let port = match present(self.port) {
            None => config.default_port,
            Some(v) => parse_port(&v)?,
        };
        let command = match present(self.command) {
            None => config.default_command.clone(),
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
        };

        let request = CommandRequest::new(host, port, command);
        Ok(match self.payload {
            Some(payload) => request.with_payload(payload),
            None => request,
        })
    }
}

/// Decode a raw request body. An empty body means all defaults; a JSON
/// value that is not an object carries no fields.
pub fn decode_request(body: &[u8], config: &Config) -> Result<CommandRequest, GatewayError> {
    let parsed: TcpRequestBody = if body.iter().all(u8::is_ascii_whitespace) {
        TcpRequestBody::default()
    } else {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| GatewayError::MalformedRequest(e.to_string()))?;
        if value.is_object() {
            serde_json::from_value(value).map_err(|e| GatewayError::MalformedRequest(e.to_string()))?
        } else {
            TcpRequestBody::default()
        }
    };
    parsed.into_request(config)
}

fn cors_headers() -> [(header::HeaderName, &'static str); 3] {
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (header::ACCESS_CONTROL_ALLOW_METHODS, "GET,POST,OPTIONS"),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
    ]
}

// Health check
async fn health() -> impl IntoResponse {
    (cors_headers(), Json(json!({"ok": true})))
}

// Run one daemon command; always 200, failures surface as "no response"
async fn tcp_command(State(state): State<SharedState>, body: Bytes) -> impl IntoResponse {
    let adjusted = match decode_request(&body, &state.config) {
        Ok(request) => {
            debug!(endpoint = %request.endpoint(), command = %request.command, "proxying command");
            state.gateway.adjusted(&request).await
        }
        Err(e) => {
            warn!(kind = ?e.kind(), error = %e, "rejected /api/tcp body");
            NO_RESPONSE.to_string()
        }
    };

    (
        StatusCode::OK,
        cors_headers(),
        Json(TcpResponse { ok: true, adjusted }),
    )
}

// Preflight for any path, 404 for everything else
async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        (StatusCode::NO_CONTENT, cors_headers()).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({"ok": false, "error": "not found"})),
        )
            .into_response()
    }
}

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/tcp", post(tcp_command).fallback(fallback))
        .route("/api/health", get(health).fallback(fallback))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received, stopping proxy");
}

pub async fn serve(config: Config) -> Result<()> {
    let addr = config.listen_addr()?;
    let cfg = Arc::new(config);
    let state = Arc::new(AppState::new(cfg));

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Proxy server listening on http://{}", addr);
    info!("POST JSON to /api/tcp {{ host, port, command, payload }}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .into_future()
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_uses_defaults() {
        let cfg = Config::default();
        let req = decode_request(b"", &cfg).unwrap();
        assert_eq!(req, CommandRequest::new("localhost", 6969, "getheight"));

        let req = decode_request(b"  \n", &cfg).unwrap();
        assert_eq!(req.command, "getheight");
    }

    #[test]
    fn test_falsy_fields_use_defaults() {
        let cfg = Config::default();
        let body = br#"{"host": "", "port": 0, "command": null, "payload": null}"#;
        let req = decode_request(body, &cfg).unwrap();
        assert_eq!(req, CommandRequest::new("localhost", 6969, "getheight"));
    }

    #[test]
    fn test_explicit_fields() {
        let cfg = Config::default();
        let body = br#"{"host": "10.1.2.3", "port": "7070", "command": "mineractive", "payload": {"a": [1]}}"#;
        let req = decode_request(body, &cfg).unwrap();
        assert_eq!(req.host, "10.1.2.3");
        assert_eq!(req.port, 7070);
        assert_eq!(req.command, "mineractive");
        assert_eq!(req.payload, Some(json!({"a": [1]})));
    }

    #[test]
    fn test_non_string_command_is_stringified() {
        let req = decode_request(br#"{"command": 42}"#, &Config::default()).unwrap();
        assert_eq!(req.command, "42");
    }

    #[test]
    fn test_bad_inputs() {
        let cfg = Config::default();
        let err = decode_request(b"{not json", &cfg).unwrap_err();
        assert_eq!(err.kind(), crate::gateway::error::ErrorKind::MalformedRequest);

        let err = decode_request(br#"{"port": 70000}"#, &cfg).unwrap_err();
        assert_eq!(err.kind(), crate::gateway::error::ErrorKind::InvalidEndpoint);

        let err = decode_request(br#"{"port": "abc"}"#, &cfg).unwrap_err();
        assert_eq!(err.kind(), crate::gateway::error::ErrorKind::InvalidEndpoint);

        let err = decode_request(br#"{"host": 12}"#, &cfg).unwrap_err();
        assert_eq!(err.kind(), crate::gateway::error::ErrorKind::MalformedRequest);
    }

    #[test]
    fn test_non_object_json_carries_no_fields() {
        let req = decode_request(b"[1, 2]", &Config::default()).unwrap();
        assert_eq!(req.command, "getheight");
    }
}
