//! Error types for the frame codec.

/// Errors produced while reading or writing frames.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported protocol version {found} (expected {expected})")]
    UnsupportedVersion { found: u8, expected: u8 },

    #[error("payload too large: {0} bytes (max 4294967295)")]
    PayloadTooLarge(usize),
}

impl WireError {
    /// Returns `true` if the peer closed the stream in the middle of a frame.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}
