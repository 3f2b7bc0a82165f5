//! Token IDs back to bytes.

use thiserror::Error;

use super::vocab::{Rank, Vocabulary};

/// Errors that can occur during decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unknown token id: {0}")]
    UnknownToken(Rank),
    #[error("Output buffer too small: need {needed} bytes, have {available}")]
    Capacity { needed: usize, available: usize },
}

#[inline]
fn token_bytes(vocab: &Vocabulary, token: Rank) -> Result<&[u8], DecodeError> {
    vocab.bytes_of(token).ok_or(DecodeError::UnknownToken(token))
}

/// Decode `tokens` into `out`, returning the number of bytes written.
///
/// Each token is written whole or not at all: an unknown token or a token
/// that does not fit fails before any of its bytes are copied.
pub fn decode_into(
    vocab: &Vocabulary,
    out: &mut [u8],
    tokens: &[Rank],
) -> Result<usize, DecodeError> {
    let mut cursor = 0;
    for &token in tokens {
        let bytes = token_bytes(vocab, token)?;
        let end = cursor + bytes.len();
        let Some(dst) = out.get_mut(cursor..end) else {
            return Err(DecodeError::Capacity {
                needed: end,
                available: out.len(),
            });
        };
        dst.copy_from_slice(bytes);
        cursor = end;
    }
    Ok(cursor)
}

/// Number of bytes `tokens` decode to.
pub fn decoded_len(vocab: &Vocabulary, tokens: &[Rank]) -> Result<usize, DecodeError> {
    tokens.iter().try_fold(0usize, |len, &token| {
        token_bytes(vocab, token).map(|bytes| len + bytes.len())
    })
}

/// Decode `tokens` into a vector of exactly the decoded length.
pub fn decode_to_vec(vocab: &Vocabulary, tokens: &[Rank]) -> Result<Vec<u8>, DecodeError> {
    let mut out = vec![0; decoded_len(vocab, tokens)?];
    let n = decode_into(vocab, &mut out, tokens)?;
    debug_assert_eq!(n, out.len());
    Ok(out)
}
