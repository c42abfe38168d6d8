use std::io;
use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};

use super::sink::StreamSink;

/// Listener that hands out exactly one connection per replay session.
#[derive(Debug)]
pub struct ReplayListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl ReplayListener {
    pub async fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn accept(&self) -> io::Result<(StreamSink<TcpStream>, SocketAddr)> {
        let (stream, peer) = self.listener.accept().await?;
        stream.set_nodelay(true)?;
        Ok((StreamSink::new(stream), peer))
    }
}

/// Opens the single outbound connection a transmitter writes to.
pub async fn connect<A: ToSocketAddrs>(addr: A) -> io::Result<StreamSink<TcpStream>> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    Ok(StreamSink::new(stream))
}
