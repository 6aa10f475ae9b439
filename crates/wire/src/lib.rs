//! Frame codec for the live event feed.
//!
//! A producer streams events over TCP as a sequence of frames, each one a
//! version byte, a little-endian payload length and the opaque payload.
//! This crate only knows about framing; what the payload means is up to the
//! consumer.
//!
//! # Wire format
//!
//! See [`frame`] module for the binary protocol specification.

pub mod error;
pub mod frame;

pub use error::WireError;
pub use frame::{Frame, read_frame, write_frame};

/// The highest (and only) protocol version understood by this codec.
pub const PROTOCOL_VERSION: u8 = 1;

/// Size of the fixed frame header: 1 byte version + 4 byte length.
pub const HEADER_LEN: usize = 5;
