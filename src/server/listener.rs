//! Hub server listener
//!
//! Handles the TCP accept loop, allocates connection ids, and spawns the
//! broadcast loop plus one session task per accepted socket.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::broadcast::Broadcaster;
use crate::error::Result;
use crate::frame::FrameProducer;
use crate::hub::{ConnectionId, Hub};
use crate::router::{DataHandler, EventRouter, NullDataHandler};
use crate::server::config::ServerConfig;
use crate::server::session;
use crate::stats::BroadcastStats;

/// WebSocket pub/sub hub server
pub struct HubServer {
    config: ServerConfig,
    hub: Arc<Hub>,
    router: Arc<EventRouter>,
    broadcaster: Arc<Broadcaster>,
    next_connection_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl HubServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self::with_data_handler(config, Arc::new(NullDataHandler))
    }

    /// Create a new server with a custom handler for generic data events
    pub fn with_data_handler(config: ServerConfig, data_handler: Arc<dyn DataHandler>) -> Self {
        let hub = Arc::new(Hub::new());
        let producer = Arc::new(FrameProducer::with_dimensions(
            config.frame_width,
            config.frame_height,
        ));
        let router = Arc::new(EventRouter::with_data_handler(
            Arc::clone(&hub),
            Arc::clone(&producer),
            data_handler,
        ));
        let broadcaster = Arc::new(Broadcaster::new(
            Arc::clone(&hub),
            producer,
            config.broadcast_topic.clone(),
            config.tick_interval,
        ));

        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            hub,
            router,
            broadcaster,
            next_connection_id: AtomicU64::new(1),
            connection_semaphore,
        }
    }

    /// Get a reference to the shared hub state
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Snapshot of cumulative broadcast counters
    pub fn broadcast_stats(&self) -> BroadcastStats {
        self.broadcaster.stats()
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            topic = %self.config.broadcast_topic,
            "Hub server listening"
        );

        let broadcast_handle = self.spawn_broadcast_task();
        let result = self.accept_loop(&listener).await;
        broadcast_handle.abort();
        result
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            topic = %self.config.broadcast_topic,
            "Hub server listening"
        );

        let broadcast_handle = self.spawn_broadcast_task();

        let result = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        };

        // Stop the broadcast loop on shutdown
        broadcast_handle.abort();

        result
    }

    fn spawn_broadcast_task(&self) -> tokio::task::JoinHandle<()> {
        let broadcaster = Arc::clone(&self.broadcaster);
        tokio::spawn(async move { broadcaster.run().await })
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        let id = ConnectionId(self.next_connection_id.fetch_add(1, Ordering::Relaxed));

        tracing::debug!(conn = %id, peer = %peer_addr, "New connection");

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::debug!(conn = %id, error = %e, "Failed to set TCP_NODELAY");
            }
        }

        let router = Arc::clone(&self.router);
        let allowed_origins = self.config.allowed_origins.clone();

        tokio::spawn(async move {
            // Hold the limit permit for the whole session
            let _permit = permit;
            session::run(socket, peer_addr, id, router, allowed_origins).await;
        });
    }
}
