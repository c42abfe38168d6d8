use std::io::{self, Write};
use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs, UdpSocket};

use crate::config::{MAX_DATAGRAM_SIZE, STREAM_READ_SIZE};

/// Receive-only listener that prints every datagram it gets.
pub struct UdpMonitor {
    socket: UdpSocket,
    local_addr: SocketAddr,
    recv_buffer: [u8; MAX_DATAGRAM_SIZE],
}

impl UdpMonitor {
    pub async fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        socket.set_broadcast(true)?;
        let local_addr = socket.local_addr()?;

        Ok(Self {
            socket,
            local_addr,
            recv_buffer: [0u8; MAX_DATAGRAM_SIZE],
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Next datagram decoded as UTF-8 with surrounding whitespace removed.
    pub async fn recv_text(&mut self) -> io::Result<(String, SocketAddr)> {
        let (size, addr) = self.socket.recv_from(&mut self.recv_buffer).await?;
        let text = String::from_utf8_lossy(&self.recv_buffer[..size])
            .trim()
            .to_owned();
        Ok((text, addr))
    }

    /// Prints datagrams to `out` until an I/O error occurs.
    pub async fn run<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        loop {
            let (text, addr) = self.recv_text().await?;
            log::trace!("{} bytes from {}", text.len(), addr);
            writeln!(out, "{}", text)?;
            out.flush()?;
        }
    }
}

/// Accepts one stream connection and echoes what it receives.
pub struct TcpMonitor {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpMonitor {
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

    pub async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        self.listener.accept().await
    }
}

/// Copies decoded text from `stream` to `out` until the peer closes.
///
/// A character split across reads is held back until its remaining bytes
/// arrive. Invalid bytes print as U+FFFD. Returns the number of bytes received.
pub async fn forward<R, W>(stream: &mut R, out: &mut W) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    let mut buffer = [0u8; STREAM_READ_SIZE];
    let mut pending = Vec::with_capacity(STREAM_READ_SIZE);
    let mut total = 0u64;

    loop {
        let size = stream.read(&mut buffer).await?;
        if size == 0 {
            if !pending.is_empty() {
                out.write_all(String::from_utf8_lossy(&pending).as_bytes())?;
                out.flush()?;
            }
            return Ok(total);
        }
        total += size as u64;
        pending.extend_from_slice(&buffer[..size]);

        let consumed = write_decoded(&pending, out)?;
        pending.drain(..consumed);
        out.flush()?;
    }
}

/// Writes the decodable prefix of `bytes` and returns how many bytes it used.
/// An incomplete character at the end is left for the next read.
fn write_decoded<W: Write>(bytes: &[u8], out: &mut W) -> io::Result<usize> {
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(text) => {
                out.write_all(text.as_bytes())?;
                return Ok(bytes.len());
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                out.write_all(valid)?;
                match e.error_len() {
                    Some(invalid) => {
                        out.write_all("\u{fffd}".as_bytes())?;
                        rest = &after[invalid..];
                    }
                    None => return Ok(bytes.len() - after.len()),
                }
            }
        }
    }
}
