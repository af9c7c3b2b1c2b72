//! JSON convenience helpers and value-to-reader conversion.

use std::io::Cursor;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Errors from JSON conversion.
#[derive(Debug, Error)]
pub enum JsonError {
    /// The value could not be serialized.
    #[error("failed to marshal to JSON: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
}

/// Serializes `value` as pretty JSON with a two-space indent.
///
/// Serialization failures are logged at `warn` and yield `None`.
pub fn to_json_bytes<T: Serialize + ?Sized>(value: &T) -> Option<Vec<u8>> {
    match serde_json::to_vec_pretty(value) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(error = %e, "Failed to marshal to JSON");
            None
        }
    }
}

/// Like [`to_json_bytes`], returning an empty string on failure.
#[must_use]
pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> String {
    to_json_bytes(value)
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default()
}

/// Marks a value to be serialized as compact JSON by [`to_reader`].
#[derive(Debug, Clone, Copy)]
pub struct Json<T>(pub T);

/// A value that can be turned into a byte stream by [`to_reader`].
///
/// Text and byte buffers pass through unchanged, numbers and booleans use
/// their display form, [`Json`] wraps anything serializable and `None`
/// produces an empty stream.
pub trait ReaderSource {
    /// Produces the bytes the reader will yield.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError`] if the value needs serializing and that fails.
    fn reader_bytes(&self) -> Result<Vec<u8>, JsonError>;
}

impl ReaderSource for str {
    fn reader_bytes(&self) -> Result<Vec<u8>, JsonError> {
        Ok(self.as_bytes().to_vec())
    }
}

impl ReaderSource for String {
    fn reader_bytes(&self) -> Result<Vec<u8>, JsonError> {
        self.as_str().reader_bytes()
    }
}

impl ReaderSource for [u8] {
    fn reader_bytes(&self) -> Result<Vec<u8>, JsonError> {
        Ok(self.to_vec())
    }
}

impl ReaderSource for Vec<u8> {
    fn reader_bytes(&self) -> Result<Vec<u8>, JsonError> {
        Ok(self.clone())
    }
}

macro_rules! display_reader_source {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ReaderSource for $ty {
                fn reader_bytes(&self) -> Result<Vec<u8>, JsonError> {
                    Ok(self.to_string().into_bytes())
                }
            }
        )*
    };
}

display_reader_source!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool,
);

impl<T: ReaderSource> ReaderSource for Option<T> {
    fn reader_bytes(&self) -> Result<Vec<u8>, JsonError> {
        match self {
            Some(inner) => inner.reader_bytes(),
            None => Ok(Vec::new()),
        }
    }
}

impl<T: ReaderSource + ?Sized> ReaderSource for &T {
    fn reader_bytes(&self) -> Result<Vec<u8>, JsonError> {
        (**self).reader_bytes()
    }
}

impl<T: Serialize> ReaderSource for Json<T> {
    fn reader_bytes(&self) -> Result<Vec<u8>, JsonError> {
        serde_json::to_vec(&self.0).map_err(|source| JsonError::Serialize { source })
    }
}

/// Returns an in-memory reader over the byte form of `value`.
///
/// ```
/// use std::io::Read;
/// use utilkit::json::{to_reader, Json};
///
/// let mut out = String::new();
/// to_reader(&Json(serde_json::json!({"a": 1})))?.read_to_string(&mut out)?;
/// assert_eq!(out, r#"{"a":1}"#);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// # Errors
///
/// Returns [`JsonError`] if a [`Json`] value fails to serialize.
pub fn to_reader<T: ReaderSource + ?Sized>(value: &T) -> Result<Cursor<Vec<u8>>, JsonError> {
    value.reader_bytes().map(Cursor::new)
}
