//! TCP connect probing

use super::ProbeResult;
use async_trait::async_trait;
use log::trace;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::{Duration, Instant};
use tokio::net::TcpSocket;

/// Single host:port probe.
///
/// Implementations never fail: every socket-level error is reported as a
/// closed port.
#[async_trait]
pub trait PortProber: Send + Sync {
    async fn probe(&self, ip: Ipv4Addr, port: u16) -> ProbeResult;

    /// Upper bound of a single probe
    fn timeout(&self) -> Duration;
}

/// Full-handshake TCP connect prober
#[derive(Debug, Clone)]
pub struct TcpConnectProber {
    timeout: Duration,
}

impl TcpConnectProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Non-blocking IPv4 stream socket with SO_REUSEADDR set
    fn new_socket() -> io::Result<TcpSocket> {
        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;
        Ok(TcpSocket::from_std_stream(socket.into()))
    }
}

#[async_trait]
impl PortProber for TcpConnectProber {
    async fn probe(&self, ip: Ipv4Addr, port: u16) -> ProbeResult {
        let addr = SocketAddr::V4(SocketAddrV4::new(ip, port));

        let socket = match Self::new_socket() {
            Ok(socket) => socket,
            Err(e) => {
                trace!("socket setup for {} failed: {}", addr, e);
                return ProbeResult::closed(port);
            }
        };

        let start = Instant::now();
        match tokio::time::timeout(self.timeout, socket.connect(addr)).await {
            Ok(Ok(stream)) => {
                let elapsed = start.elapsed();
                drop(stream);
                ProbeResult::open(port, elapsed)
            }
            Ok(Err(e)) => {
                trace!("{} closed: {}", addr, e);
                ProbeResult::closed(port)
            }
            Err(_) => ProbeResult::closed(port),
        }
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// One-shot probe with an explicit timeout
pub async fn probe(ip: Ipv4Addr, port: u16, timeout: Duration) -> ProbeResult {
    TcpConnectProber::new(timeout).probe(ip, port).await
}
