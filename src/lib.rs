pub mod core;
#[cfg(feature = "python")]
mod python;

pub use crate::core::{
    decode_into, encode_atom, encode_splitting, AtomMatcher, DecodeError, EncodeError, MatchError,
    Rank, RegexMatcher, StreamingDecoder, Tokenizer, TokenizerError, VocabError, Vocabulary,
    CL100K_BASE_PATTERN,
};
