//! HTTP operator console transport.
//!
//! Accepts at most one connection per call and reads only the request head.
//! Bodies are never read: every console request is a bodiless `GET`.

use std::{net::SocketAddr, time::Duration};

use liftcall_core::GatewayReply;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

use crate::StationError;

/// Deadline for a client to finish sending its request head.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(3000);

/// Largest request head accepted.
const MAX_HEAD_LEN: usize = 8 * 1024;

/// Console listener holding at most one open connection.
pub struct HttpConsole {
    listener: TcpListener,
    pending: Option<TcpStream>,
    request_timeout: Duration,
}

impl HttpConsole {
    /// Bind the console listener.
    pub async fn bind(addr: &str, request_timeout: Duration) -> Result<Self, StationError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, pending: None, request_timeout })
    }

    /// Local address the console is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, StationError> {
        Ok(self.listener.local_addr()?)
    }

    /// Take one waiting connection, if any, and read its request head.
    ///
    /// Returns `None` when nobody is waiting. A client that does not finish
    /// its head within the deadline is dropped.
    pub async fn accept_request(&mut self) -> Result<Option<String>, StationError> {
        // Poll accept exactly once so an idle console never delays the tick
        let Ok(accepted) = tokio::time::timeout(Duration::ZERO, self.listener.accept()).await
        else {
            return Ok(None);
        };
        let (mut stream, peer) = accepted?;
        tracing::debug!(%peer, "Console client connected");

        match tokio::time::timeout(self.request_timeout, read_head(&mut stream)).await {
            Ok(Ok(head)) => {
                self.pending = Some(stream);
                Ok(Some(head))
            },
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                tracing::warn!(%peer, "Console request timed out");
                Ok(None)
            },
        }
    }

    /// Write the reply to the pending connection and close it.
    pub async fn respond(&mut self, reply: &GatewayReply) -> Result<(), StationError> {
        let Some(mut stream) = self.pending.take() else {
            return Err(StationError::Transport("no pending console connection".to_string()));
        };

        stream.write_all(reply.render().as_bytes()).await?;
        stream.shutdown().await?;
        Ok(())
    }
}

/// Read until the blank line ending the head, EOF, or the size limit.
async fn read_head<S>(stream: &mut S) -> std::io::Result<String>
where
    S: AsyncRead + Unpin,
{
    let mut head = Vec::with_capacity(512);
    let mut buf = [0u8; 512];

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        head.extend_from_slice(&buf[..n]);
        if head.windows(4).any(|w| w == b"\r\n\r\n") || head.len() >= MAX_HEAD_LEN {
            break;
        }
    }

    Ok(String::from_utf8_lossy(&head).into_owned())
}
