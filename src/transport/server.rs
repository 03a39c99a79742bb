//! TCP server that receives framed log messages.
//!
//! Every frame is decoded and handed to the registered handler, then the
//! original frame is echoed back as the acknowledgement. A frame that does not
//! decode is logged and counted but still acknowledged, so a client is never
//! left waiting on a reply.

use bytes::BytesMut;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ServerConfig;
use crate::core::frame::FrameCodec;
use crate::error::Result;
use crate::protocol::message::Message;
use crate::utils::metrics::Metrics;

type HandlerFn = dyn Fn(Message) + Send + Sync + 'static;

/// A bound log server; call [`LogServer::run`] or
/// [`LogServer::run_with_shutdown`] to start accepting.
pub struct LogServer {
    listener: TcpListener,
    config: ServerConfig,
    handler: Arc<HandlerFn>,
    metrics: Arc<Metrics>,
}

impl LogServer {
    /// Bind `config.address` and register the per-message handler.
    #[instrument(skip(config, handler), fields(address = %config.address))]
    pub async fn bind<F>(config: ServerConfig, handler: F) -> Result<Self>
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind(&config.address).await?;
        info!(address = %listener.local_addr()?, "Log server listening");

        Ok(Self {
            listener,
            config,
            handler: Arc::new(handler),
            metrics: Arc::new(Metrics::new()),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    /// Serve until CTRL+C.
    pub async fn run(self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Received CTRL+C signal, shutting down");
                let _ = shutdown_tx.send(()).await;
            }
        });

        self.run_with_shutdown(shutdown_rx).await
    }

    /// Serve until `shutdown_rx` yields or its sender is dropped.
    pub async fn run_with_shutdown(self, mut shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Shutting down log server. Waiting for connections to close...");
                    self.drain().await;
                    self.metrics.log_summary();
                    return Ok(());
                }

                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, peer)) => self.spawn_connection(stream, peer),
                        Err(e) => error!(error = %e, "Error accepting connection"),
                    }
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let active = self.metrics.connections_active.load(Ordering::Relaxed);
        if active >= self.config.max_connections as u64 {
            warn!(peer = %peer, active, "Connection limit reached, refusing connection");
            return;
        }

        self.metrics.connection_established();
        debug!(peer = %peer, "New connection established");

        let handler = self.handler.clone();
        let metrics = self.metrics.clone();
        let codec = FrameCodec::new(self.config.max_frame_size);
        let idle_timeout = self.config.connection_timeout;

        tokio::spawn(async move {
            let framed = Framed::new(stream, codec);
            handle_connection(framed, peer, handler, metrics.clone(), idle_timeout).await;
            metrics.connection_closed();
            debug!(peer = %peer, "Connection closed");
        });
    }

    /// Wait for open connections to finish, up to the shutdown timeout.
    async fn drain(&self) {
        let deadline = tokio::time::sleep(self.config.shutdown_timeout);
        tokio::pin!(deadline);

        loop {
            let connections = self.metrics.connections_active.load(Ordering::Relaxed);
            if connections == 0 {
                info!("All connections closed, shutting down");
                return;
            }

            tokio::select! {
                _ = &mut deadline => {
                    warn!(connections, "Shutdown timeout reached, forcing exit");
                    return;
                }
                _ = tokio::time::sleep(Duration::from_millis(50)) => {
                    debug!(connections, "Waiting for connections to close");
                }
            }
        }
    }
}

async fn handle_connection(
    mut framed: Framed<TcpStream, FrameCodec>,
    peer: SocketAddr,
    handler: Arc<HandlerFn>,
    metrics: Arc<Metrics>,
    idle_timeout: Duration,
) {
    loop {
        let next = match tokio::time::timeout(idle_timeout, framed.next()).await {
            Ok(next) => next,
            Err(_) => {
                debug!(peer = %peer, "Connection idle, closing");
                return;
            }
        };

        let frame: BytesMut = match next {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                metrics.connection_error();
                warn!(peer = %peer, error = %e, "Dropping connection on bad frame");
                return;
            }
            None => return,
        };

        metrics.frame_received(frame.len() as u64);
        match Message::decode(&frame) {
            Ok(message) => {
                metrics.message_decoded();
                handler(message);
            }
            Err(e) => {
                metrics.decode_failure();
                warn!(peer = %peer, error = %e, bytes = frame.len(), "Undecodable log message");
            }
        }

        if let Err(e) = framed.send(frame.freeze()).await {
            metrics.connection_error();
            warn!(peer = %peer, error = %e, "Failed to acknowledge message");
            return;
        }
    }
}
