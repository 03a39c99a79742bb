//! TCP client that ships encoded log messages to a [`LogServer`](super::LogServer).

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::core::frame::FrameCodec;
use crate::error::{constants, Result, XclogError};
use crate::protocol::message::Message;

/// One connection to a log server.
pub struct LogClient {
    framed: Framed<TcpStream, FrameCodec>,
    response_timeout: Duration,
}

impl LogClient {
    #[instrument(skip(config), fields(address = %config.address))]
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let stream = timeout(config.connection_timeout, TcpStream::connect(&config.address))
            .await
            .map_err(|_| XclogError::Timeout)??;
        stream.set_nodelay(true)?;
        debug!("Connected to log server");

        Ok(Self {
            framed: Framed::new(stream, FrameCodec::new(config.max_frame_size)),
            response_timeout: config.response_timeout,
        })
    }

    /// Encode and send `msg`, then wait for the server's acknowledgement.
    pub async fn send(&mut self, msg: &Message) -> Result<()> {
        self.send_encoded(Bytes::from(msg.encode())).await
    }

    /// Send already-encoded bytes and wait for the server to echo them.
    pub async fn send_encoded(&mut self, encoded: Bytes) -> Result<()> {
        self.framed.send(encoded.clone()).await?;

        let ack = timeout(self.response_timeout, self.framed.next())
            .await
            .map_err(|_| XclogError::Timeout)?
            .ok_or(XclogError::ConnectionClosed)??;

        if ack[..] != encoded[..] {
            return Err(XclogError::TransportError(
                constants::ERR_ECHO_MISMATCH.to_string(),
            ));
        }
        Ok(())
    }
}
