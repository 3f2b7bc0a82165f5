//! Core tokenization engine for splitbpe.
//!
//! # Architecture
//!
//! - [`Vocabulary`]: rank-ordered token table with an exact inverse map, plus
//!   the tiktoken-format loader
//! - [`bpe`]: the merge engine; encodes one atom into a caller-owned buffer
//! - [`splitter`]: atom matchers and [`encode_splitting`], which drives a
//!   matcher and the merge engine over a whole input
//! - [`decode`]: token IDs back to bytes, all-or-nothing per token
//! - [`StreamingDecoder`]: UTF-8 safe incremental decoding
//! - [`Tokenizer`]: shared vocabulary plus a regex matcher behind one API
//!
//! Data flows raw bytes → atoms → token IDs. Decoding only reverses the last
//! step.
//!
//! # Performance Notes
//!
//! - Merge state is an index-linked arena, so each merge is an O(1) splice and
//!   refreshes exactly two cached pair ranks
//! - FxHashMap for byte-string lookups
//! - No output allocation on the buffer-based paths

pub mod bpe;
pub mod decode;
pub mod splitter;
mod streaming;
mod tokenizer;
mod vocab;

pub use bpe::{byte_pair_encode, encode_atom, EncodeError, InvariantViolation};
pub use decode::{decode_into, decode_to_vec, decoded_len, DecodeError};
pub use splitter::{
    encode_splitting, AtomMatcher, MatchError, RegexMatcher, CL100K_BASE_PATTERN,
};
pub use streaming::StreamingDecoder;
pub use tokenizer::{Tokenizer, TokenizerError};
pub use vocab::{
    load_tiktoken_bpe, load_tiktoken_bpe_file, load_tiktoken_bpe_reader, Rank, VocabError,
    Vocabulary,
};
