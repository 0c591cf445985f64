//! Connection server.
//!
//! Accepts connections in a loop and spawns one task per connection. Each
//! task reads a line, hands it to the [`CommandHandler`] and writes the reply
//! line back, until the peer sends `EXIT`, closes, or the socket fails.
//! Bad requests only produce error replies; they never end the connection.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tracing::Instrument;

use greenhub_app::dispatcher::CommandHandler;

use crate::config::TcpConfig;
use crate::error::TcpError;
use crate::protocol::Protocol;
use crate::{EXIT_COMMAND, GOODBYE};

/// A bound listener ready to serve.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    handler: Arc<CommandHandler>,
    idle_timeout: Option<Duration>,
}

impl Server {
    /// Bind the listener described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TcpError::Io`] if the address cannot be bound.
    pub async fn bind(config: &TcpConfig, handler: Arc<CommandHandler>) -> Result<Self, TcpError> {
        let listener = TcpListener::bind(config.bind_addr()).await?;
        tracing::info!(address = %listener.local_addr()?, "listening");
        Ok(Self {
            listener,
            handler,
            idle_timeout: config.idle_timeout(),
        })
    }

    /// Address actually bound, useful when the configured port was `0`.
    ///
    /// # Errors
    ///
    /// Returns [`TcpError::Io`] if the socket cannot report its address.
    pub fn local_addr(&self) -> Result<SocketAddr, TcpError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the process exits.
    ///
    /// # Errors
    ///
    /// Never returns an error today; the signature leaves room for fatal
    /// listener failures.
    pub async fn run(self) -> Result<(), TcpError> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` completes. Connections already accepted keep
    /// running on their own tasks.
    ///
    /// # Errors
    ///
    /// See [`Server::run`].
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<(), TcpError> {
        let mut shutdown = std::pin::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("no longer accepting connections");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => self.spawn_connection(stream, peer),
                    Err(err) => tracing::error!(error = %err, "failed to accept connection"),
                },
            }
        }
    }

    fn spawn_connection(&self, stream: tokio::net::TcpStream, peer: SocketAddr) {
        let handler = Arc::clone(&self.handler);
        let idle_timeout = self.idle_timeout;
        tokio::spawn(
            async move {
                tracing::info!("connection accepted");
                let mut protocol = Protocol::new(stream);
                match serve_connection(&mut protocol, &handler, idle_timeout).await {
                    Ok(()) => tracing::info!("connection closed"),
                    Err(TcpError::IdleTimeout) => tracing::info!("idle connection dropped"),
                    Err(TcpError::ConnectionClosed) => {
                        tracing::info!("peer closed in the middle of a line");
                    }
                    Err(err) => tracing::error!(error = %err, "connection failed"),
                }
            }
            .instrument(tracing::info_span!("connection", %peer)),
        );
    }
}

/// Run the request/reply loop on one connection.
///
/// Returns `Ok(())` when the peer sends `EXIT` or closes between lines.
/// Blank lines are skipped without a reply.
///
/// # Errors
///
/// Returns transport failures, and [`TcpError::IdleTimeout`] when
/// `idle_timeout` elapses while waiting for a line.
pub async fn serve_connection<S>(
    protocol: &mut Protocol<S>,
    handler: &CommandHandler,
    idle_timeout: Option<Duration>,
) -> Result<(), TcpError>
where
    S: AsyncRead + AsyncWrite,
{
    loop {
        let line = match idle_timeout {
            Some(limit) => tokio::time::timeout(limit, protocol.read_message())
                .await
                .map_err(|_| TcpError::IdleTimeout)??,
            None => protocol.read_message().await?,
        };
        let Some(line) = line else {
            return Ok(());
        };

        let line = line.trim();
        if line.eq_ignore_ascii_case(EXIT_COMMAND) {
            protocol.send_message(GOODBYE).await?;
            return Ok(());
        }
        if line.is_empty() {
            continue;
        }

        let reply = handler.handle_line(line);
        protocol.send_message(&reply).await?;
    }
}
