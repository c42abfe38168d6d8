use std::future::Future;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::UdpSocket;

use crate::config::BroadcastConfig;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("peer disconnected")]
    Disconnected,
    #[error("write failed: {0}")]
    Io(io::Error),
}

impl From<io::Error> for SinkError {
    fn from(err: io::Error) -> Self {
        if is_disconnect(&err) {
            SinkError::Disconnected
        } else {
            SinkError::Io(err)
        }
    }
}

/// Errors that mean the other end of a stream has gone away.
pub fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::WriteZero
    )
}

/// Destination for replayed lines.
pub trait Sink {
    /// Writes one already-terminated line.
    fn send(&mut self, bytes: &[u8]) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// Sink over a connected byte stream, normally a `TcpStream`.
#[derive(Debug)]
pub struct StreamSink<W> {
    inner: W,
}

impl<W> StreamSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W> Sink for StreamSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        self.inner.write_all(bytes).await?;
        self.inner.flush().await?;
        Ok(())
    }
}

/// Sends every line as one datagram from each source socket.
///
/// Delivery is never confirmed; send failures are logged and dropped.
#[derive(Debug)]
pub struct BroadcastSink {
    sockets: Vec<UdpSocket>,
    destination: SocketAddr,
    datagrams_sent: u64,
    datagrams_failed: u64,
}

impl BroadcastSink {
    pub async fn bind(config: &BroadcastConfig) -> io::Result<Self> {
        let sources = if config.sources.is_empty() {
            vec![Ipv4Addr::UNSPECIFIED]
        } else {
            config.sources.clone()
        };

        let mut sockets = Vec::with_capacity(sources.len());
        for source in sources {
            let socket = UdpSocket::bind(SocketAddr::new(IpAddr::V4(source), 0)).await?;
            socket.set_broadcast(true)?;
            log::debug!("Broadcast source bound to {}", socket.local_addr()?);
            sockets.push(socket);
        }

        Ok(Self {
            sockets,
            destination: config.destination_addr(),
            datagrams_sent: 0,
            datagrams_failed: 0,
        })
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    pub fn source_addrs(&self) -> Vec<SocketAddr> {
        self.sockets
            .iter()
            .filter_map(|socket| socket.local_addr().ok())
            .collect()
    }

    pub fn datagrams_sent(&self) -> u64 {
        self.datagrams_sent
    }

    pub fn datagrams_failed(&self) -> u64 {
        self.datagrams_failed
    }
}

impl Sink for BroadcastSink {
    async fn send(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        for socket in &self.sockets {
            match socket.send_to(bytes, self.destination).await {
                Ok(_) => self.datagrams_sent += 1,
                Err(e) => {
                    self.datagrams_failed += 1;
                    log::debug!("Datagram to {} dropped: {}", self.destination, e);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnect_kinds_map_to_disconnected() {
        for kind in [
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::ConnectionAborted,
        ] {
            let err = SinkError::from(io::Error::from(kind));
            assert!(matches!(err, SinkError::Disconnected), "{kind:?}");
        }

        let err = SinkError::from(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, SinkError::Io(_)));
    }

    #[tokio::test]
    async fn stream_sink_writes_bytes_unchanged() {
        let mut sink = StreamSink::new(Vec::new());
        sink.send(b"00:00:00.000000 $IIHDG,1*00\r\n").await.unwrap();
        sink.send(b"00:00:00.100000 $IIHDG,2*00\r\n").await.unwrap();

        assert_eq!(
            sink.into_inner(),
            b"00:00:00.000000 $IIHDG,1*00\r\n00:00:00.100000 $IIHDG,2*00\r\n".to_vec()
        );
    }

    #[tokio::test]
    async fn broadcast_sink_sends_one_datagram_per_source() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = receiver.local_addr().unwrap().port();

        let config = BroadcastConfig {
            port,
            destination: Ipv4Addr::LOCALHOST,
            sources: vec![Ipv4Addr::LOCALHOST, Ipv4Addr::LOCALHOST],
        };
        let mut sink = BroadcastSink::bind(&config).await.unwrap();
        sink.send(b"12:00:00.000000 A\r\n").await.unwrap();

        let mut buf = [0u8; 64];
        for _ in 0..2 {
            let (n, _) = receiver.recv_from(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"12:00:00.000000 A\r\n");
        }
        assert_eq!(sink.datagrams_sent(), 2);
        assert_eq!(sink.source_addrs().len(), 2);
    }
}
