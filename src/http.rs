//! Purpose: Shared server plumbing for `serve` and `ui`.
//! Exports: `init_tracing`, `is_loopback`, `run_server`.
//! Role: Bind, serve, and drain an axum router with graceful shutdown.
//! Invariants: Shutdown waits at most `SHUTDOWN_TIMEOUT` for in-flight requests.

use std::future::IntoFuture;
use std::net::{IpAddr, SocketAddr};

use axum::Router;
use tokio::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use userdesk::api::{Error, ErrorKind};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

pub fn is_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(addr) => addr.is_loopback(),
        IpAddr::V6(addr) => addr.is_loopback(),
    }
}

pub async fn run_server(bind: SocketAddr, app: Router, name: &str) -> Result<(), Error> {
    let listener = tokio::net::TcpListener::bind(bind).await.map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message(format!("failed to bind {name} on {bind}"))
            .with_source(err)
    })?;
    info!(%bind, "{name} listening");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("server failed")
                    .with_source(err)
            })?;
        }
        _ = shutdown_signal() => {
            info!("{name} shutting down");
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut server).await {
                Ok(result) => result.map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("server failed")
                        .with_source(err)
                })?,
                Err(_) => {
                    return Err(Error::new(ErrorKind::Io).with_message("server shutdown timed out"));
                }
            }
        }
    };
    Ok(())
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
