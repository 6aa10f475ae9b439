//! Payload decoding.
//!
//! The endpoint never interprets payload bytes itself. Whoever owns the
//! event schema supplies a [`Decode`] implementation; a plain closure works
//! too.

use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;

/// Turns one frame payload into an event.
///
/// Called once per frame, on the connection's task. A returned error drops
/// that frame only; the connection keeps going.
pub trait Decode: Send + Sync + 'static {
    type Event: Send + 'static;
    type Error: fmt::Display + Send;

    fn decode(&self, payload: &[u8]) -> Result<Self::Event, Self::Error>;
}

impl<F, E, Er> Decode for F
where
    F: Fn(&[u8]) -> Result<E, Er> + Send + Sync + 'static,
    E: Send + 'static,
    Er: fmt::Display + Send,
{
    type Event = E;
    type Error = Er;

    fn decode(&self, payload: &[u8]) -> Result<E, Er> {
        self(payload)
    }
}

/// Passes payload bytes through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Raw;

impl Decode for Raw {
    type Event = Vec<u8>;
    type Error = Infallible;

    fn decode(&self, payload: &[u8]) -> Result<Vec<u8>, Infallible> {
        Ok(payload.to_vec())
    }
}

/// Decodes each payload as a JSON document of type `T`.
pub struct Json<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Json<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Json<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Json<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Json<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Json")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Decode for Json<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Event = T;
    type Error = serde_json::Error;

    fn decode(&self, payload: &[u8]) -> Result<T, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn decode_with<D: Decode>(decoder: &D, payload: &[u8]) -> Result<D::Event, String> {
        decoder.decode(payload).map_err(|e| e.to_string())
    }

    #[test]
    fn raw_passes_bytes_through() {
        assert_eq!(decode_with(&Raw, b"\x00\x01").unwrap(), vec![0, 1]);
        assert!(decode_with(&Raw, b"").unwrap().is_empty());
    }

    #[test]
    fn closure_decoder() {
        let utf8 = |p: &[u8]| std::str::from_utf8(p).map(str::to_owned);
        assert_eq!(decode_with(&utf8, b"ok").unwrap(), "ok");
        assert!(decode_with(&utf8, &[0xff, 0xfe]).is_err());
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Block {
        height: u32,
    }

    #[test]
    fn json_decoder() {
        let json = Json::<Block>::new();
        assert_eq!(
            decode_with(&json, br#"{"height": 42}"#).unwrap(),
            Block { height: 42 }
        );
        assert!(decode_with(&json, b"{").is_err());
        assert!(decode_with(&json, b"").is_err());
    }
}
