//! Python bindings for the splitbpe tokenizer.
//!
//! Thin PyO3 wrappers around [`Tokenizer`] and [`StreamingDecoder`]. Rust
//! errors surface as `ValueError`, or `IOError` when a vocabulary file cannot
//! be read.
//!
//! # Example
//!
//! ```python
//! from splitbpe._core import Tokenizer
//!
//! tokenizer = Tokenizer("cl100k_base.tiktoken")
//! tokens = tokenizer.encode("Hello, world!")
//! text = tokenizer.decode(tokens)
//!
//! decoder = tokenizer.streaming_decoder()
//! for token_id in token_stream:
//!     if text := decoder.add_token(token_id):
//!         print(text, end="", flush=True)
//! ```

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use crate::core::{StreamingDecoder, Tokenizer, TokenizerError, VocabError, CL100K_BASE_PATTERN};

fn to_py_err(e: TokenizerError) -> PyErr {
    match e {
        TokenizerError::VocabError(VocabError::IoError(io)) => PyIOError::new_err(io.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

/// Python wrapper for the Rust Tokenizer.
#[pyclass(name = "Tokenizer")]
pub struct PyTokenizer {
    inner: Tokenizer,
}

#[pymethods]
impl PyTokenizer {
    /// Create a tokenizer from a tiktoken vocabulary file.
    ///
    /// Args:
    ///     vocab_path: Path to a file of base64 tokens, one per line, in rank order
    ///     pattern: Pre-splitting regex (default: the cl100k_base pattern)
    #[new]
    #[pyo3(signature = (vocab_path, pattern=None))]
    fn new(vocab_path: &str, pattern: Option<&str>) -> PyResult<Self> {
        let inner = Tokenizer::from_file(vocab_path, pattern.unwrap_or(CL100K_BASE_PATTERN))
            .map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Same as the constructor; reads a tiktoken vocabulary file.
    #[staticmethod]
    #[pyo3(signature = (vocab_path, pattern=None))]
    fn from_file(vocab_path: &str, pattern: Option<&str>) -> PyResult<Self> {
        Self::new(vocab_path, pattern)
    }

    /// Create a tokenizer from raw tiktoken vocabulary bytes.
    #[staticmethod]
    #[pyo3(signature = (vocab_data, pattern=None))]
    fn from_bytes(vocab_data: &[u8], pattern: Option<&str>) -> PyResult<Self> {
        let inner = Tokenizer::from_bytes(vocab_data, pattern.unwrap_or(CL100K_BASE_PATTERN))
            .map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Return a copy whose regex gives up after `limit` backtracking steps.
    fn backtrack_limit(&self, limit: usize) -> PyResult<Self> {
        let inner = self.inner.clone().backtrack_limit(limit).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Encode text to token IDs.
    fn encode(&self, text: &str) -> PyResult<Vec<u32>> {
        self.inner.encode_to_vec(text.as_bytes()).map_err(to_py_err)
    }

    /// Encode raw bytes to token IDs.
    ///
    /// Invalid UTF-8 sequences are encoded as atoms of their own.
    fn encode_bytes(&self, data: &[u8]) -> PyResult<Vec<u32>> {
        self.inner.encode_to_vec(data).map_err(to_py_err)
    }

    /// Encode a single atom with BPE only, skipping the regex split.
    ///
    /// Any bytes are accepted.
    fn encode_atom(&self, atom: &[u8]) -> PyResult<Vec<u32>> {
        let mut out = vec![0; atom.len()];
        let n = self.inner.encode_atom(atom, &mut out).map_err(to_py_err)?;
        out.truncate(n);
        Ok(out)
    }

    /// Decode token IDs to a string.
    ///
    /// Raises:
    ///     ValueError: On an unknown token ID or if the bytes are not valid UTF-8
    fn decode(&self, tokens: Vec<u32>) -> PyResult<String> {
        self.inner.decode_str(&tokens).map_err(to_py_err)
    }

    /// Decode token IDs to bytes.
    fn decode_bytes(&self, tokens: Vec<u32>) -> PyResult<Vec<u8>> {
        self.inner.decode_to_vec(&tokens).map_err(to_py_err)
    }

    /// Decode token IDs to a string, replacing invalid UTF-8 with U+FFFD.
    fn decode_lossy(&self, tokens: Vec<u32>) -> PyResult<String> {
        self.inner.decode_lossy(&tokens).map_err(to_py_err)
    }

    #[getter]
    fn vocab_size(&self) -> usize {
        self.inner.vocab_size()
    }

    #[getter]
    fn pattern(&self) -> &str {
        self.inner.pattern()
    }

    /// Create a streaming decoder for token-by-token output.
    fn streaming_decoder(&self) -> PyStreamingDecoder {
        PyStreamingDecoder {
            inner: self.inner.streaming_decoder(),
        }
    }

    fn __repr__(&self) -> String {
        format!("Tokenizer(vocab_size={})", self.inner.vocab_size())
    }
}

/// Python wrapper for the streaming decoder.
///
/// Buffers incomplete UTF-8 sequences and only emits complete characters.
#[pyclass(name = "StreamingDecoder")]
pub struct PyStreamingDecoder {
    inner: StreamingDecoder,
}

#[pymethods]
impl PyStreamingDecoder {
    /// Add a token and return any complete characters, or None while buffering.
    fn add_token(&mut self, token_id: u32) -> PyResult<Option<String>> {
        self.inner
            .add_token(token_id)
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    fn add_tokens(&mut self, token_ids: Vec<u32>) -> PyResult<Option<String>> {
        self.inner
            .add_tokens(&token_ids)
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    /// Flush buffered bytes, replacing an incomplete tail with U+FFFD.
    fn flush(&mut self) -> String {
        self.inner.flush()
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    #[getter]
    fn has_pending(&self) -> bool {
        self.inner.has_pending()
    }

    #[getter]
    fn pending_bytes(&self) -> usize {
        self.inner.pending_bytes()
    }

    fn __repr__(&self) -> String {
        format!(
            "StreamingDecoder(pending_bytes={})",
            self.inner.pending_bytes()
        )
    }
}
