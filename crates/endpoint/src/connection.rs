//! Per-connection decode loop.
//!
//! Reads frames off one producer stream, decodes each payload and hands the
//! event to the dispatch queue. Any framing or I/O failure ends the
//! connection; a payload that fails to decode only costs that one frame.

use std::net::SocketAddr;
use std::sync::Arc;

use eater_wire::{WireError, read_frame};
use tokio::io::{AsyncRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::CONNECTION_BUFFER_SIZE;
use crate::decode::Decode;
use crate::dispatch::Dispatcher;

/// Why a connection's loop ended.
#[derive(Debug)]
enum Exit {
    /// Producer closed the stream between frames.
    Closed,
    Shutdown,
    Wire(WireError),
}

/// Consumes the stream until it ends, fails or shutdown is signalled. The
/// stream is dropped (closing the connection) on return.
pub(crate) async fn consume<S, D>(
    stream: S,
    conn_id: u64,
    peer_addr: SocketAddr,
    decoder: Arc<D>,
    dispatch: Dispatcher<D::Event>,
    signal: CancellationToken,
) where
    S: AsyncRead + Unpin,
    D: Decode,
{
    let mut reader = BufReader::with_capacity(CONNECTION_BUFFER_SIZE, stream);
    let mut delivered: u64 = 0;
    let mut dropped: u64 = 0;

    let exit = loop {
        if signal.is_cancelled() {
            break Exit::Shutdown;
        }

        let frame = tokio::select! {
            biased;
            _ = signal.cancelled() => break Exit::Shutdown,
            result = read_frame(&mut reader) => result,
        };

        let frame = match frame {
            Ok(Some(frame)) => frame,
            Ok(None) => break Exit::Closed,
            Err(e) => break Exit::Wire(e),
        };

        let event = match decoder.decode(&frame.payload) {
            Ok(event) => event,
            Err(e) => {
                dropped += 1;
                debug!(conn_id, len = frame.len(), "dropping undecodable frame: {e}");
                continue;
            }
        };

        if !dispatch.send(event).await {
            break Exit::Shutdown;
        }
        delivered += 1;
    };

    match exit {
        Exit::Closed => {
            debug!(conn_id, %peer_addr, delivered, dropped, "producer disconnected");
        }
        Exit::Shutdown => {
            debug!(conn_id, %peer_addr, delivered, dropped, "connection closed by shutdown");
        }
        Exit::Wire(e @ WireError::UnsupportedVersion { .. }) => {
            warn!(conn_id, %peer_addr, delivered, dropped, "closing connection: {e}");
        }
        Exit::Wire(e) if e.is_truncated() => {
            debug!(conn_id, %peer_addr, delivered, dropped, "producer disconnected mid-frame");
        }
        Exit::Wire(e) => {
            debug!(conn_id, %peer_addr, delivered, dropped, "connection error: {e}");
        }
    }
}
