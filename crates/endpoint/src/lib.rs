//! TCP endpoint for the live event feed.
//!
//! Binds a listening socket, accepts producer connections, decodes the
//! framed payloads on each connection and fans every decoded event into a
//! single queue. Consumers only ever see the queue:
//!
//! ```text
//! producer ──TCP──► accept loop ──spawn──► connection task ──decode──┐
//! producer ──TCP──►      │         ──spawn──► connection task ──decode──┤
//!                        ▼                                             ▼
//!                   Endpoint::stop()  ───── closes ─────►  Reader (queue)
//! ```
//!
//! # Wire format
//!
//! See [`eater_wire::frame`] for the binary protocol specification.

pub mod config;
mod connection;
pub mod decode;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod listener;
pub mod shutdown;

pub use config::EndpointConfig;
pub use decode::{Decode, Json, Raw};
pub use dispatch::Reader;
pub use endpoint::Endpoint;
pub use error::EndpointError;
pub use listener::{Accept, is_transient};
pub use shutdown::Shutdown;

pub use eater_wire::PROTOCOL_VERSION;

use std::time::Duration;

/// Delay before retrying after a transient accept error.
pub const DEFAULT_ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Default queue capacity. One slot is the closest a tokio channel gets to
/// an unbuffered handoff.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1;

/// Read buffer size for each connection (64 KB).
pub const CONNECTION_BUFFER_SIZE: usize = 64 * 1024;
