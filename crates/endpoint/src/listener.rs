//! Accept loop.
//!
//! Accepts producer connections and spawns one decoding task per
//! connection. Transient accept failures are retried after a fixed pause;
//! anything else ends the loop for good.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncRead;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::DropGuard;
use tracing::{error, info, warn};

use crate::connection;
use crate::decode::Decode;
use crate::dispatch::Dispatcher;
use crate::shutdown::Shutdown;

/// A source of inbound connections.
///
/// Implemented for [`TcpListener`]; anything else that yields byte streams
/// can be served through [`Endpoint::serve`](crate::Endpoint::serve).
pub trait Accept: Send + 'static {
    type Stream: AsyncRead + Unpin + Send + 'static;

    fn accept(&mut self) -> impl Future<Output = io::Result<(Self::Stream, SocketAddr)>> + Send;
}

impl Accept for TcpListener {
    type Stream = TcpStream;

    fn accept(&mut self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send {
        TcpListener::accept(self)
    }
}

/// Returns `true` for accept errors that are expected to clear up on their
/// own: a peer aborting during the handshake, interrupts, timeouts, memory
/// pressure and file descriptor exhaustion.
pub fn is_transient(err: &io::Error) -> bool {
    use io::ErrorKind::*;

    matches!(
        err.kind(),
        ConnectionAborted | ConnectionReset | Interrupted | WouldBlock | TimedOut | OutOfMemory
    ) || is_fd_exhaustion(err)
}

#[cfg(unix)]
fn is_fd_exhaustion(err: &io::Error) -> bool {
    matches!(err.raw_os_error(), Some(libc::ENFILE | libc::EMFILE))
}

#[cfg(not(unix))]
fn is_fd_exhaustion(_err: &io::Error) -> bool {
    false
}

/// Runs until shutdown or a fatal accept error. The acceptor (and with it
/// the listening socket) is dropped when this returns, and only then is
/// `listener_closed` fired, also on panic or if the task never ran.
pub(crate) async fn accept_loop<A, D>(
    acceptor: A,
    decoder: Arc<D>,
    dispatch: Dispatcher<D::Event>,
    shutdown: Shutdown,
    retry_delay: Duration,
    listener_closed: DropGuard,
) where
    A: Accept,
    D: Decode,
{
    // Declared before the acceptor so it drops after it.
    let _listener_closed = listener_closed;
    let mut acceptor = acceptor;
    let signal = shutdown.signal();
    let mut next_conn_id: u64 = 0;

    loop {
        let accepted = tokio::select! {
            biased;
            _ = signal.cancelled() => {
                info!("listener closing");
                break;
            }
            result = acceptor.accept() => result,
        };

        match accepted {
            Ok((stream, peer_addr)) => {
                next_conn_id += 1;
                let conn_id = next_conn_id;
                info!(conn_id, %peer_addr, "producer connected");

                tokio::spawn(connection::consume(
                    stream,
                    conn_id,
                    peer_addr,
                    Arc::clone(&decoder),
                    dispatch.clone(),
                    signal.clone(),
                ));
            }
            Err(e) if is_transient(&e) => {
                warn!(
                    retry_in_ms = retry_delay.as_millis() as u64,
                    "transient accept error: {e}"
                );
                tokio::select! {
                    biased;
                    _ = signal.cancelled() => break,
                    _ = tokio::time::sleep(retry_delay) => {}
                }
            }
            Err(e) => {
                error!("accept failed, no longer accepting connections: {e}");
                break;
            }
        }
    }
}
