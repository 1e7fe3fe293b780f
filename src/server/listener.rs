use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::info;

use crate::config::Config;
use crate::http::connection::{Connection, ConnectionHandler};

/// Binds `server.listen_addr` and serves until the task is cancelled.
pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.server.listen_addr).await?;
    info!(
        addr = %listener.local_addr()?,
        workers = cfg.server.workers,
        mode = ?cfg.server.mode,
        "Listening"
    );

    serve(listener, cfg).await
}

/// Accept loop over an already bound listener.
///
/// At most `server.workers` connections are in flight. A permit is taken
/// before `accept`, so further clients wait in the listen backlog until a
/// worker frees up. A failed `accept` is logged and skipped.
pub async fn serve(listener: TcpListener, cfg: &Config) -> anyhow::Result<()> {
    let handler = Arc::new(ConnectionHandler::from_config(cfg));
    let workers = Arc::new(Semaphore::new(cfg.server.workers));

    loop {
        let permit = workers.clone().acquire_owned().await?;
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::error!(error = %e, "accept failed");
                continue;
            }
        };
        info!("Accepted connection from {}", peer);

        let handler = handler.clone();
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, handler);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
            drop(permit);
        });
    }
}
