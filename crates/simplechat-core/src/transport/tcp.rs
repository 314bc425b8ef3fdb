//! TCP transport for chat sessions.

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::{TcpListener, TcpStream};
use tracing::debug;

use crate::config::DEFAULT_MAX_FRAME_LEN;
use crate::errors::{ChatError, ChatResult};
use crate::transport::{Connector, FramedConnection, Listener};

fn wrap_stream(
    stream: TcpStream,
    peer: Option<SocketAddr>,
    max_frame_len: usize,
) -> FramedConnection<TcpStream> {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Failed to set TCP_NODELAY: {}", e);
    }
    let peer_label = peer
        .or_else(|| stream.peer_addr().ok())
        .map(|a| a.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    FramedConnection::new(stream, peer_label).with_max_frame_len(max_frame_len)
}

/// Opens TCP connections to an accepting peer
#[derive(Debug, Clone)]
pub struct TcpConnector {
    max_frame_len: usize,
}

impl TcpConnector {
    pub fn new(max_frame_len: usize) -> Self {
        Self { max_frame_len }
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LEN)
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Stream = FramedConnection<TcpStream>;

    async fn connect(&self, address: &str) -> ChatResult<Self::Stream> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(|e| ChatError::Connection {
                address: address.to_string(),
                reason: e.to_string(),
            })?;
        Ok(wrap_stream(stream, None, self.max_frame_len))
    }
}

/// TCP listener handing out framed connections
pub struct TcpChatListener {
    listener: TcpListener,
    max_frame_len: usize,
}

impl TcpChatListener {
    /// Bind to an address and start listening.
    pub async fn bind(address: &str, max_frame_len: usize) -> ChatResult<Self> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|e| ChatError::Connection {
                address: address.to_string(),
                reason: format!("Failed to bind: {}", e),
            })?;
        Ok(Self {
            listener,
            max_frame_len,
        })
    }

    pub fn local_addr(&self) -> ChatResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

#[async_trait]
impl Listener for TcpChatListener {
    type Stream = FramedConnection<TcpStream>;

    async fn accept(&self) -> ChatResult<Self::Stream> {
        let (stream, peer) = self.listener.accept().await?;
        Ok(wrap_stream(stream, Some(peer), self.max_frame_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::transport::{DuplexStream, FrameReader, FrameWriter};

    #[tokio::test]
    async fn test_tcp_round_trip() {
        let listener = TcpChatListener::bind("127.0.0.1:0", DEFAULT_MAX_FRAME_LEN)
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();

        let client_task = tokio::spawn(async move {
            let conn = TcpConnector::default()
                .connect(&addr.to_string())
                .await
                .unwrap();
            let (mut reader, mut writer) = conn.into_split();
            writer.send(&Message::new("Tom", "hello")).await.unwrap();
            let reply = reader.recv().await.unwrap().unwrap();
            assert_eq!(reply, Message::new("Matt", "hi Tom"));
            writer.close().await.unwrap();
        });

        let conn = listener.accept().await.unwrap();
        assert!(conn.peer_label().starts_with("127.0.0.1:"));
        let (mut reader, mut writer) = conn.into_split();

        assert_eq!(
            reader.recv().await.unwrap(),
            Some(Message::new("Tom", "hello"))
        );
        writer.send(&Message::new("Matt", "hi Tom")).await.unwrap();
        assert_eq!(reader.recv().await.unwrap(), None);

        client_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_failure_names_address() {
        // Bind then drop to obtain a port nobody listens on
        let addr = {
            let listener = TcpChatListener::bind("127.0.0.1:0", DEFAULT_MAX_FRAME_LEN)
                .await
                .unwrap();
            listener.local_addr().unwrap()
        };

        let result = TcpConnector::default().connect(&addr.to_string()).await;
        match result {
            Err(ChatError::Connection { address, .. }) => assert_eq!(address, addr.to_string()),
            Err(other) => panic!("Unexpected error: {}", other),
            Ok(_) => panic!("Connection should have been refused"),
        }
    }
}
