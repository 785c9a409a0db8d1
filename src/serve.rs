//! Purpose: Demo HTTP server showing the `Qt` extractor end to end.
//! Exports: `ServeConfig`, `ServeError`, `serve`.
//! Role: Axum-based loopback server behind `qtag serve`.
//! Invariants: Loopback-only unless explicitly allowed.
//! Invariants: Decode failures surface as JSON error envelopes with 4xx status.

use std::fmt;
use std::future::IntoFuture;
use std::net::{IpAddr, SocketAddr};

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use qtag::Qt;

use crate::paging::Paging;

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub allow_non_loopback: bool,
}

#[derive(Debug)]
pub struct ServeError {
    usage: bool,
    message: String,
    hint: Option<String>,
    source: Option<std::io::Error>,
}

impl ServeError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            usage: false,
            message: message.into(),
            hint: None,
            source: None,
        }
    }

    fn usage(message: impl Into<String>) -> Self {
        Self {
            usage: true,
            ..Self::new(message)
        }
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    fn with_source(mut self, source: std::io::Error) -> Self {
        self.source = Some(source);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn is_usage(&self) -> bool {
        self.usage
    }
}

impl fmt::Display for ServeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ServeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source as &(dyn std::error::Error + 'static))
    }
}

pub async fn serve(config: ServeConfig) -> Result<(), ServeError> {
    validate_config(&config)?;

    init_tracing();

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|err| ServeError::new("failed to bind server").with_source(err))?;
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "qtag demo server listening");
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, router())
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|err| ServeError::new("server failed").with_source(err))?;
        }
        _ = shutdown_signal() => {
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(Duration::from_secs(10), &mut server).await {
                Ok(result) => {
                    result.map_err(|err| ServeError::new("server failed").with_source(err))?
                }
                Err(_) => return Err(ServeError::new("server shutdown timed out")),
            }
        }
    };
    Ok(())
}

fn router() -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v0/echo", get(echo))
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn echo(Qt(paging): Qt<Paging>) -> Json<Value> {
    Json(json!({ "paging": paging }))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}

fn is_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(addr) => addr.is_loopback(),
        IpAddr::V6(addr) => addr.is_loopback(),
    }
}

fn validate_config(config: &ServeConfig) -> Result<(), ServeError> {
    if !is_loopback(config.bind.ip()) && !config.allow_non_loopback {
        return Err(ServeError::usage("non-loopback bind requires explicit opt-in")
            .with_hint("Re-run with --allow-non-loopback or use a loopback address."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ServeConfig, serve, validate_config};

    #[tokio::test]
    async fn serve_rejects_non_loopback_bind() {
        let config = ServeConfig {
            bind: "0.0.0.0:0".parse().expect("bind"),
            allow_non_loopback: false,
        };
        let err = serve(config).await.expect_err("should reject");
        assert!(err.is_usage());
        assert_eq!(err.message(), "non-loopback bind requires explicit opt-in");
    }

    #[test]
    fn loopback_and_opt_in_are_accepted() {
        let loopback = ServeConfig {
            bind: "127.0.0.1:0".parse().expect("bind"),
            allow_non_loopback: false,
        };
        assert!(validate_config(&loopback).is_ok());

        let v6 = ServeConfig {
            bind: "[::1]:0".parse().expect("bind"),
            allow_non_loopback: false,
        };
        assert!(validate_config(&v6).is_ok());

        let opted_in = ServeConfig {
            bind: "0.0.0.0:0".parse().expect("bind"),
            allow_non_loopback: true,
        };
        assert!(validate_config(&opted_in).is_ok());
    }
}
