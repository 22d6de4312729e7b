//! Incremental decoding of JSON value streams.
//!
//! A JSON stream body is a sequence of JSON values separated by optional
//! whitespace (usually one per line). Chunk boundaries fall anywhere, so a
//! value may arrive split across several chunks.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

/// Buffers body chunks and yields every complete value they contain.
#[derive(Debug)]
pub struct JsonStreamDecoder<T> {
    buffer: Vec<u8>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> JsonStreamDecoder<T> {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Appends `chunk` and returns the values completed by it.
    ///
    /// A trailing partial value stays buffered for the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<T>, serde_json::Error> {
        self.buffer.extend_from_slice(chunk);

        let mut values = Vec::new();
        let mut consumed = 0;
        let mut iter = serde_json::Deserializer::from_slice(&self.buffer).into_iter::<T>();
        loop {
            match iter.next() {
                Some(Ok(value)) => {
                    values.push(value);
                    consumed = iter.byte_offset();
                }
                Some(Err(e)) if e.is_eof() => break,
                Some(Err(e)) => return Err(e),
                None => {
                    consumed = iter.byte_offset();
                    break;
                }
            }
        }

        self.buffer.drain(..consumed);
        Ok(values)
    }

    /// Checks that nothing but whitespace is left once the body has ended.
    pub fn finish(self) -> Result<(), serde_json::Error> {
        if self.buffer.iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }
        // Reparse the leftover to surface serde_json's own EOF error.
        serde_json::from_slice::<T>(&self.buffer).map(|_| ())
    }

    /// Number of buffered bytes not yet decoded.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

impl<T: DeserializeOwned> Default for JsonStreamDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}
