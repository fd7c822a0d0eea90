//! UDP radio and clock inside a turmoil simulation.
//!
//! Turmoil virtualizes both the network and tokio's clock, so the real
//! [`liftcall_app::Runtime`] can run against a panel host over a lossy,
//! delayed link and still finish deterministically.

use std::{
    io,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use liftcall_app::RadioLink;
use liftcall_core::Environment;
use turmoil::net::UdpSocket;

use crate::PanelSim;

/// Largest datagram read from the socket.
const MAX_DATAGRAM: usize = 64;

/// Environment on turmoil's simulated tokio clock.
#[derive(Debug, Clone, Copy)]
pub struct TurmoilEnv {
    boot: tokio::time::Instant,
}

impl TurmoilEnv {
    /// Start the uptime counter at the current simulated instant.
    ///
    /// Must be called from inside a turmoil host or client.
    pub fn new() -> Self {
        Self { boot: tokio::time::Instant::now() }
    }
}

impl Default for TurmoilEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for TurmoilEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn uptime(&self) -> Duration {
        tokio::time::Instant::now() - self.boot
    }
}

/// Radio backed by a turmoil UDP socket.
pub struct TurmoilRadio {
    socket: UdpSocket,
    panel: SocketAddr,
    transmissions: usize,
}

impl TurmoilRadio {
    /// Bind `port` on this host and address the panel at `panel_host:panel_port`.
    pub async fn bind(port: u16, panel_host: &str, panel_port: u16) -> io::Result<Self> {
        let socket = UdpSocket::bind((IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)).await?;
        let panel = SocketAddr::new(turmoil::lookup(panel_host), panel_port);
        Ok(Self { socket, panel, transmissions: 0 })
    }

    /// Number of datagrams sent.
    pub fn transmissions(&self) -> usize {
        self.transmissions
    }
}

impl RadioLink for TurmoilRadio {
    type Error = io::Error;

    async fn transmit(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.socket.send_to(bytes, self.panel).await?;
        self.transmissions += 1;
        Ok(())
    }

    async fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut buf = [0u8; MAX_DATAGRAM];
        match tokio::time::timeout(timeout, self.socket.recv_from(&mut buf)).await {
            Ok(Ok((len, _))) => Ok(Some(buf[..len].to_vec())),
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(None),
        }
    }
}

/// Serve `panel` on `port` of the current turmoil host until the simulation
/// ends.
pub async fn serve_panel(port: u16, mut panel: PanelSim) -> io::Result<()> {
    let socket = UdpSocket::bind((IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)).await?;
    let mut buf = [0u8; MAX_DATAGRAM];

    loop {
        let (len, peer) = socket.recv_from(&mut buf).await?;
        for reply in panel.handle_datagram(&buf[..len]) {
            socket.send_to(&reply, peer).await?;
        }
    }
}
