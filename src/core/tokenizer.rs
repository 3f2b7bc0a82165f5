use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use super::bpe::{encode_atom, EncodeError};
use super::decode::{decode_into, decode_to_vec, DecodeError};
use super::splitter::{encode_splitting, MatchError, RegexMatcher, CL100K_BASE_PATTERN};
use super::streaming::StreamingDecoder;
use super::vocab::{Rank, VocabError, Vocabulary};

#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("Regex compilation error: {0}")]
    RegexError(#[from] MatchError),
    #[error("Vocabulary error: {0}")]
    VocabError(#[from] VocabError),
    #[error("Encoding error: {0}")]
    EncodeError(#[from] EncodeError),
    #[error("Decoding error: {0}")]
    DecodeError(#[from] DecodeError),
    #[error("Decoding error: invalid UTF-8")]
    Utf8Error,
}

/// BPE tokenizer: a shared vocabulary plus a regex atom matcher.
///
/// The vocabulary sits behind an `Arc`, so clones are cheap and every clone
/// reads the same table. All operations take `&self`; a tokenizer can be used
/// from many threads at once.
///
/// The buffer-based methods ([`encode`](Self::encode),
/// [`decode`](Self::decode)) never allocate output and report capacity errors
/// instead. The `_to_vec` variants size the output themselves.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    vocab: Arc<Vocabulary>,
    matcher: RegexMatcher,
}

impl Tokenizer {
    /// Create a tokenizer that splits with [`CL100K_BASE_PATTERN`].
    pub fn new(vocab: impl Into<Arc<Vocabulary>>) -> Result<Self, TokenizerError> {
        Self::with_pattern(vocab, CL100K_BASE_PATTERN)
    }

    /// Create a tokenizer with a custom pre-splitting pattern.
    pub fn with_pattern(
        vocab: impl Into<Arc<Vocabulary>>,
        pattern: &str,
    ) -> Result<Self, TokenizerError> {
        Ok(Self {
            vocab: vocab.into(),
            matcher: RegexMatcher::new(pattern)?,
        })
    }

    /// Create a tokenizer from a tiktoken vocabulary file.
    pub fn from_file<P: AsRef<Path>>(vocab_path: P, pattern: &str) -> Result<Self, TokenizerError> {
        let vocab = Vocabulary::from_tiktoken_file(vocab_path)?;
        Self::with_pattern(vocab, pattern)
    }

    /// Create a tokenizer from raw tiktoken vocabulary bytes.
    pub fn from_bytes(vocab_data: &[u8], pattern: &str) -> Result<Self, TokenizerError> {
        let vocab = Vocabulary::from_tiktoken(vocab_data)?;
        Self::with_pattern(vocab, pattern)
    }

    /// Recompile the matcher so a single match fails after `limit` backtracking steps.
    ///
    /// # Example
    /// ```ignore
    /// let tokenizer = Tokenizer::from_file("cl100k_base.tiktoken", CL100K_BASE_PATTERN)?
    ///     .backtrack_limit(100_000)?;
    /// ```
    pub fn backtrack_limit(mut self, limit: usize) -> Result<Self, TokenizerError> {
        self.matcher = RegexMatcher::with_backtrack_limit(self.matcher.pattern(), limit)?;
        Ok(self)
    }

    /// Encode a single atom without pre-splitting.
    pub fn encode_atom(&self, atom: &[u8], out: &mut [Rank]) -> Result<usize, TokenizerError> {
        Ok(encode_atom(&self.vocab, atom, out)?)
    }

    /// Split `input` into atoms and encode them into `out`.
    ///
    /// `input` need not be UTF-8. `out.len() >= input.len()` is always
    /// sufficient.
    pub fn encode(&self, input: &[u8], out: &mut [Rank]) -> Result<usize, TokenizerError> {
        Ok(encode_splitting(&self.vocab, out, input, &self.matcher)?)
    }

    /// Split and encode `input`, returning the tokens.
    pub fn encode_to_vec(&self, input: &[u8]) -> Result<Vec<Rank>, TokenizerError> {
        let mut out = vec![0; input.len()];
        let n = self.encode(input, &mut out)?;
        out.truncate(n);
        Ok(out)
    }

    /// Decode `tokens` into `out`, returning the number of bytes written.
    pub fn decode(&self, tokens: &[Rank], out: &mut [u8]) -> Result<usize, TokenizerError> {
        Ok(decode_into(&self.vocab, out, tokens)?)
    }

    /// Decode token IDs back to bytes.
    pub fn decode_to_vec(&self, tokens: &[Rank]) -> Result<Vec<u8>, TokenizerError> {
        Ok(decode_to_vec(&self.vocab, tokens)?)
    }

    /// Decode token IDs to a string.
    pub fn decode_str(&self, tokens: &[Rank]) -> Result<String, TokenizerError> {
        let bytes = self.decode_to_vec(tokens)?;
        String::from_utf8(bytes).map_err(|_| TokenizerError::Utf8Error)
    }

    /// Decode token IDs to a string, replacing invalid UTF-8 with U+FFFD.
    pub fn decode_lossy(&self, tokens: &[Rank]) -> Result<String, TokenizerError> {
        let bytes = self.decode_to_vec(tokens)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Start a UTF-8 safe streaming decode over this tokenizer's vocabulary.
    pub fn streaming_decoder(&self) -> StreamingDecoder {
        StreamingDecoder::new(Arc::clone(&self.vocab))
    }

    /// Number of tokens in the vocabulary. Valid token IDs are `0..vocab_size()`.
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    pub fn vocab(&self) -> &Arc<Vocabulary> {
        &self.vocab
    }

    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }
}
