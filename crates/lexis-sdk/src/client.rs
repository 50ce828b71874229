use std::fmt::Display;
use std::net::SocketAddr;

use lexis_protocol::{read_message, write_message, Message, Request};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::debug;

use crate::error::{SdkError, SdkResult};

/// A connection to a dictionary server.
///
/// Requests are answered strictly in order, so each call writes one line and
/// waits for exactly one line back.
pub struct DictionaryClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    peer: SocketAddr,
}

impl DictionaryClient {
    pub async fn connect<A>(addr: A) -> SdkResult<Self>
    where
        A: ToSocketAddrs + Display,
    {
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|source| SdkError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        let peer = stream.peer_addr().map_err(|source| SdkError::Connect {
            addr: addr.to_string(),
            source,
        })?;
        let (reader, writer) = stream.into_split();
        debug!(%peer, "connected to dictionary server");
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
            peer,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Send a raw envelope and wait for the response.
    pub async fn send(&mut self, msg: &Message) -> SdkResult<Message> {
        write_message(&mut self.writer, msg).await?;
        read_message(&mut self.reader)
            .await?
            .ok_or(SdkError::ConnectionClosed)
    }

    /// Send a typed request and wait for the response.
    pub async fn request(&mut self, request: Request) -> SdkResult<Message> {
        self.send(&request.into_message()).await
    }

    /// Close the write side and drop the connection.
    pub async fn close(mut self) -> SdkResult<()> {
        self.writer
            .shutdown()
            .await
            .map_err(lexis_protocol::ProtocolError::from)?;
        Ok(())
    }
}
