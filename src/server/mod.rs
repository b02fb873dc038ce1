//! Static asset server for the built front-end

mod router;
mod status;

pub use router::{build_router, security_headers};
pub use status::{CountedStream, CountingListener, StatusCounters, StatusSnapshot};

use crate::config::ServerSettings;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("server stopped: {0}")]
    Serve(#[from] io::Error),

    #[error("invalid value for {name} header: {value:?}")]
    InvalidHeader { name: String, value: String },
}

/// Bind and serve until ctrl-c
pub async fn run(settings: ServerSettings) -> Result<(), ServerError> {
    if !settings.static_dir.is_dir() {
        warn!(dir = %settings.static_dir.display(), "static directory does not exist");
    }

    let counters = Arc::new(StatusCounters::default());
    let app = build_router(&settings, Arc::clone(&counters))?;
    let listener = TcpListener::bind(settings.listen_address)
        .await
        .map_err(|source| ServerError::Bind {
            addr: settings.listen_address,
            source,
        })?;

    info!(
        addr = %settings.listen_address,
        prefix = %settings.path_prefix,
        "serving {}",
        settings.static_dir.display()
    );
    axum::serve(CountingListener::new(listener, counters), app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
}
