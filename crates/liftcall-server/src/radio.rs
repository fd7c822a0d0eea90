//! UDP radio link to the elevator-call panel.
//!
//! One datagram carries one frame, mirroring the point-to-point radio packet.

use std::{io, net::SocketAddr, time::Duration};

use liftcall_app::RadioLink;
use tokio::net::UdpSocket;

use crate::StationError;

/// Largest datagram read. Anything longer than a frame is malformed anyway.
const MAX_DATAGRAM: usize = 64;

/// Datagram radio bound to a local port, transmitting to the panel.
pub struct UdpRadio {
    socket: UdpSocket,
    panel: SocketAddr,
}

impl UdpRadio {
    /// Bind the local radio port and resolve the panel address.
    pub async fn bind(local: &str, panel: &str) -> Result<Self, StationError> {
        let panel = tokio::net::lookup_host(panel)
            .await?
            .next()
            .ok_or_else(|| StationError::Config(format!("panel address {panel} did not resolve")))?;
        let socket = UdpSocket::bind(local).await?;

        Ok(Self { socket, panel })
    }

    /// Local address the radio is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, StationError> {
        Ok(self.socket.local_addr()?)
    }
}

impl RadioLink for UdpRadio {
    type Error = io::Error;

    async fn transmit(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        let sent = self.socket.send_to(bytes, self.panel).await?;
        if sent != bytes.len() {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "datagram truncated"));
        }
        Ok(())
    }

    async fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut buf = [0u8; MAX_DATAGRAM];
        match tokio::time::timeout(timeout, self.socket.recv_from(&mut buf)).await {
            Ok(Ok((len, from))) => {
                tracing::trace!(%from, len, "Radio datagram");
                Ok(Some(buf[..len].to_vec()))
            },
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use liftcall_proto::{Frame, SequenceNumber};

    use super::*;

    #[tokio::test]
    async fn exchanges_frames_with_panel() {
        let panel = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let panel_addr = panel.local_addr().unwrap().to_string();
        let mut radio = UdpRadio::bind("127.0.0.1:0", &panel_addr).await.unwrap();
        let radio_addr = radio.local_addr().unwrap();

        let request = Frame::request(SequenceNumber::new(1), 3, 7, 0);
        radio.transmit(&request.to_bytes()).await.unwrap();

        let mut buf = [0u8; 16];
        let (len, _) = panel.recv_from(&mut buf).await.unwrap();
        assert_eq!(Frame::decode(&buf[..len]).unwrap(), request);

        panel.send_to(&request.to_ack(1).to_bytes(), radio_addr).await.unwrap();
        let received = radio.receive(Duration::from_secs(1)).await.unwrap();
        assert_eq!(received, Some(request.to_ack(1).to_bytes().to_vec()));
    }

    #[tokio::test]
    async fn silence_times_out() {
        let mut radio = UdpRadio::bind("127.0.0.1:0", "127.0.0.1:9").await.unwrap();
        let received = radio.receive(Duration::from_millis(20)).await.unwrap();
        assert_eq!(received, None);
    }
}
