//! UTF-8 safe streaming decoder for token-by-token output.
//!
//! A token's bytes may end in the middle of a multi-byte character. The
//! decoder holds such a trailing partial sequence back until the next token
//! completes it, and only ever hands out whole characters.

use std::sync::Arc;

use super::decode::DecodeError;
use super::vocab::{Rank, Vocabulary};

/// Incremental decoder that buffers incomplete UTF-8 sequences.
///
/// # Example
///
/// ```ignore
/// let mut decoder = StreamingDecoder::new(Arc::new(vocab));
/// for token in token_stream {
///     if let Some(text) = decoder.add_token(token)? {
///         print!("{}", text);
///     }
/// }
/// print!("{}", decoder.flush());
/// ```
#[derive(Debug)]
pub struct StreamingDecoder {
    vocab: Arc<Vocabulary>,
    buffer: Vec<u8>,
}

impl StreamingDecoder {
    pub fn new(vocab: Arc<Vocabulary>) -> Self {
        Self {
            vocab,
            buffer: Vec::with_capacity(16),
        }
    }

    /// Add a token and return any text it completes.
    ///
    /// An unknown token fails without touching the buffered bytes.
    pub fn add_token(&mut self, token: Rank) -> Result<Option<String>, DecodeError> {
        let bytes = self
            .vocab
            .bytes_of(token)
            .ok_or(DecodeError::UnknownToken(token))?;
        self.buffer.extend_from_slice(bytes);
        Ok(self.take_complete())
    }

    /// Add several tokens at once. Nothing is buffered if any token is unknown.
    pub fn add_tokens(&mut self, tokens: &[Rank]) -> Result<Option<String>, DecodeError> {
        if let Some(&unknown) = tokens.iter().find(|&&t| self.vocab.bytes_of(t).is_none()) {
            return Err(DecodeError::UnknownToken(unknown));
        }
        for bytes in tokens.iter().filter_map(|&t| self.vocab.bytes_of(t)) {
            self.buffer.extend_from_slice(bytes);
        }
        Ok(self.take_complete())
    }

    /// Return whatever is buffered, replacing a partial sequence with U+FFFD.
    pub fn flush(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();
        text
    }

    /// Discard any buffered bytes.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Drain everything except a trailing incomplete sequence.
    ///
    /// Invalid bytes (as opposed to a truncated tail) are emitted as U+FFFD so
    /// the buffer cannot grow without bound.
    fn take_complete(&mut self) -> Option<String> {
        let ready = self.buffer.len() - incomplete_tail_len(&self.buffer);
        if ready == 0 {
            return None;
        }

        let bytes: Vec<u8> = self.buffer.drain(..ready).collect();
        Some(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }
}

/// Length of a truncated UTF-8 sequence at the end of `bytes`, if any.
fn incomplete_tail_len(bytes: &[u8]) -> usize {
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(_) => return 0,
            Err(e) => match e.error_len() {
                None => return rest.len() - e.valid_up_to(),
                Some(invalid) => rest = &rest[e.valid_up_to() + invalid..],
            },
        }
    }
}
