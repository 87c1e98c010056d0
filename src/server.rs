use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::{info, warn};

use crate::config::NodeConfig;
use crate::error::Result;
use crate::service::StorageService;
use crate::store::Store;

/// gRPC storage node
pub struct NodeServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    store: Arc<Store>,
}

impl NodeServer {
    /// Create the entity store and bind the gRPC listener
    pub async fn bind(config: &NodeConfig) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("gRPC server bound to {}", local_addr);

        let store = Arc::new(Store::with_shards(config.shards));
        info!("Entity store ready with {} shards", store.shard_count());

        Ok(Self {
            listener,
            local_addr,
            store,
        })
    }

    /// Get local listening address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle to the store served by this node
    pub fn store(&self) -> Arc<Store> {
        Arc::clone(&self.store)
    }

    /// Serve until `shutdown` resolves. Connections already accepted are
    /// drained before returning.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        info!("Server started, listening on {}", self.local_addr);

        let service = StorageService::new(Arc::clone(&self.store));
        Server::builder()
            .add_service(service.into_server())
            .serve_with_incoming_shutdown(TcpListenerStream::new(self.listener), shutdown)
            .await?;

        info!("Server stopped with {} keys in memory", self.store.len());
        Ok(())
    }
}

/// Resolve on Ctrl-C or, on unix, SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, finishing in-flight requests...");
}
