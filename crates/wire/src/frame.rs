//! Frame reading and writing.
//!
//! # Wire format
//!
//! ```text
//! PER FRAME (Producer -> Endpoint):
//!   [1 byte: protocol version, must be 0x01]
//!   [4 bytes LE: payload_len]
//!   [payload_len bytes: opaque payload]
//! ```
//!
//! Frames are concatenated with no delimiter. A stream carries zero or more
//! frames until the producer closes it.
//!
//! The declared length is trusted: a buffer of exactly `payload_len` bytes
//! is allocated before the payload is read, with no upper bound applied
//! here.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::PROTOCOL_VERSION;
use crate::error::WireError;

/// A single decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw payload bytes; empty for a zero-length frame.
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Encodes the frame (header + payload) into a new buffer.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let len = payload_len(&self.payload)?;
        let mut buf = Vec::with_capacity(crate::HEADER_LEN + self.payload.len());
        buf.push(PROTOCOL_VERSION);
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(&self.payload);
        Ok(buf)
    }
}

fn payload_len(payload: &[u8]) -> Result<u32, WireError> {
    u32::try_from(payload.len()).map_err(|_| WireError::PayloadTooLarge(payload.len()))
}

/// Writes one frame carrying `payload` to the stream.
///
/// Does not flush; wrap buffered writers accordingly.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), WireError> {
    let len = payload_len(payload)?;

    writer.write_u8(PROTOCOL_VERSION).await?;
    writer.write_u32_le(len).await?;
    writer.write_all(payload).await?;
    Ok(())
}

/// Reads one frame from the stream.
///
/// Returns `None` if the stream ended cleanly on a frame boundary. A stream
/// that ends anywhere inside a frame yields an I/O error
/// (see [`WireError::is_truncated`]). A header with the wrong version is
/// rejected before any payload is read.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Frame>, WireError> {
    let version = match reader.read_u8().await {
        Ok(v) => v,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let len = reader.read_u32_le().await?;

    if version != PROTOCOL_VERSION {
        return Err(WireError::UnsupportedVersion {
            found: version,
            expected: PROTOCOL_VERSION,
        });
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;

    Ok(Some(Frame { payload }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn header_layout_is_little_endian() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &[0xAA; 258]).await.unwrap();

        assert_eq!(&buf[..5], &[0x01, 0x02, 0x01, 0x00, 0x00]);
        assert_eq!(buf.len(), 5 + 258);
    }

    #[tokio::test]
    async fn encode_matches_write_frame() {
        let frame = Frame::new(b"hello".to_vec());

        let mut written = Vec::new();
        write_frame(&mut written, &frame.payload).await.unwrap();

        assert_eq!(frame.encode().unwrap(), written);
    }

    #[tokio::test]
    async fn zero_length_payload() {
        let bytes = [0x01, 0x00, 0x00, 0x00, 0x00];

        let mut cursor = &bytes[..];
        let frame = read_frame(&mut cursor).await.unwrap().unwrap();
        assert!(frame.is_empty());

        assert!(read_frame(&mut cursor).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn frames_read_in_order() {
        let mut buf = Vec::new();
        for payload in [&b"first"[..], b"", b"third"] {
            write_frame(&mut buf, payload).await.unwrap();
        }

        let mut cursor = &buf[..];
        let a = read_frame(&mut cursor).await.unwrap().unwrap();
        let b = read_frame(&mut cursor).await.unwrap().unwrap();
        let c = read_frame(&mut cursor).await.unwrap().unwrap();
        assert_eq!(a.payload, b"first");
        assert!(b.is_empty());
        assert_eq!(c.payload, b"third");
        assert!(read_frame(&mut cursor).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unsupported_version_rejected() {
        let bytes = [0x02, 0x03, 0x00, 0x00, 0x00, b'a', b'b', b'c'];

        let mut cursor = &bytes[..];
        let err = read_frame(&mut cursor).await.unwrap_err();
        assert!(matches!(
            err,
            WireError::UnsupportedVersion {
                found: 2,
                expected: 1
            }
        ));
        // Payload is left unread.
        assert_eq!(cursor.len(), 3);
    }

    #[tokio::test]
    async fn truncated_header() {
        let bytes = [0x01, 0x04, 0x00];

        let mut cursor = &bytes[..];
        let err = read_frame(&mut cursor).await.unwrap_err();
        assert!(err.is_truncated());
    }

    #[tokio::test]
    async fn truncated_payload() {
        let bytes = [0x01, 0x04, 0x00, 0x00, 0x00, b'a', b'b'];

        let mut cursor = &bytes[..];
        let err = read_frame(&mut cursor).await.unwrap_err();
        assert!(err.is_truncated());
    }

    #[tokio::test]
    async fn empty_stream_is_clean_eof() {
        let mut cursor: &[u8] = &[];
        assert!(read_frame(&mut cursor).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn frames_over_duplex_stream() {
        let (mut client, mut server) = tokio::io::duplex(64);

        let writer = tokio::spawn(async move {
            for i in 0u8..10 {
                write_frame(&mut client, &[i; 16]).await.unwrap();
            }
        });

        for i in 0u8..10 {
            let frame = read_frame(&mut server).await.unwrap().unwrap();
            assert_eq!(frame.payload, vec![i; 16]);
        }
        writer.await.unwrap();
        assert!(read_frame(&mut server).await.unwrap().is_none());
    }
}
