//! Ranked vocabulary table and the tiktoken text loader.
//!
//! A [`Vocabulary`] is an ordered list of byte strings. A token's position in
//! that list is its rank, and the rank doubles as the token ID: lower ranks
//! were learned earlier and merge first.
//!
//! # Tiktoken Format
//!
//! Vocabulary files store one token per line, base64-encoded, in ascending
//! rank order. Anything after the first whitespace-delimited field (usually the
//! rank itself) is ignored, since the line position already defines the rank.
//!
//! ```text
//! IQ== 0
//! Ig== 1
//! Iw== 2
//! ```
//!
//! Here `IQ==` decodes to `!` (rank 0), `Ig==` to `"` (rank 1) and so on.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use log::{debug, warn};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Token identifier. Equal to the token's position in the vocabulary.
pub type Rank = u32;

/// Errors that can occur when building or loading a vocabulary.
#[derive(Error, Debug)]
pub enum VocabError {
    #[error("Invalid base64 encoding on line {line}: {source}")]
    Base64Error {
        line: usize,
        #[source]
        source: base64::DecodeError,
    },
    #[error("Duplicate token at rank {rank} (first seen at rank {first_rank})")]
    DuplicateToken { rank: Rank, first_rank: Rank },
    #[error("Empty token at rank {0}")]
    EmptyToken(Rank),
    #[error("Vocabulary has {0} entries, more than a rank can address")]
    TooLarge(usize),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Immutable rank-ordered vocabulary.
///
/// `token_for_rank` and `rank_for_token` are built together and are exact
/// inverses of each other. Nothing mutates either map after construction, so
/// one table can be shared across threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    token_for_rank: Vec<Vec<u8>>,
    rank_for_token: FxHashMap<Vec<u8>, Rank>,
    byte_aligned: bool,
}

impl Vocabulary {
    /// Build a table where each token's rank is its position in `tokens`.
    pub fn new(tokens: Vec<Vec<u8>>) -> Result<Self, VocabError> {
        if Rank::try_from(tokens.len()).is_err() {
            return Err(VocabError::TooLarge(tokens.len()));
        }

        let mut rank_for_token =
            FxHashMap::with_capacity_and_hasher(tokens.len(), Default::default());
        for (rank, token) in tokens.iter().enumerate() {
            let rank = rank as Rank;
            if token.is_empty() {
                return Err(VocabError::EmptyToken(rank));
            }
            if let Some(&first_rank) = rank_for_token.get(token.as_slice()) {
                return Err(VocabError::DuplicateToken { rank, first_rank });
            }
            rank_for_token.insert(token.clone(), rank);
        }

        let byte_aligned = tokens.len() >= 256
            && tokens[..256]
                .iter()
                .enumerate()
                .all(|(b, token)| *token == [b as u8]);

        debug!(
            "vocabulary built: {} tokens, byte aligned: {}",
            tokens.len(),
            byte_aligned
        );
        if !byte_aligned {
            warn!("ranks 0..=255 are not the raw bytes in order; single-byte atoms will encode to their byte value regardless");
        }

        Ok(Self {
            token_for_rank: tokens,
            rank_for_token,
            byte_aligned,
        })
    }

    /// Load a table from tiktoken-format bytes.
    pub fn from_tiktoken(data: &[u8]) -> Result<Self, VocabError> {
        Self::new(load_tiktoken_bpe(data)?)
    }

    /// Load a table from a tiktoken-format stream.
    pub fn from_tiktoken_reader<R: BufRead>(reader: R) -> Result<Self, VocabError> {
        Self::new(load_tiktoken_bpe_reader(reader)?)
    }

    /// Load a table from a tiktoken-format file.
    pub fn from_tiktoken_file<P: AsRef<Path>>(path: P) -> Result<Self, VocabError> {
        Self::new(load_tiktoken_bpe_file(path)?)
    }

    /// Exact-match lookup of a byte string's rank.
    #[inline]
    pub fn rank_of(&self, bytes: &[u8]) -> Option<Rank> {
        self.rank_for_token.get(bytes).copied()
    }

    /// Byte string for a rank, or `None` when the rank is out of range.
    #[inline]
    pub fn bytes_of(&self, rank: Rank) -> Option<&[u8]> {
        self.token_for_rank.get(rank as usize).map(Vec::as_slice)
    }

    /// Number of tokens in the table.
    pub fn len(&self) -> usize {
        self.token_for_rank.len()
    }

    pub fn is_empty(&self) -> bool {
        self.token_for_rank.is_empty()
    }

    /// Whether ranks 0..=255 are exactly the single bytes 0..=255.
    pub fn is_byte_aligned(&self) -> bool {
        self.byte_aligned
    }

    /// Iterate over `(rank, bytes)` in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (Rank, &[u8])> + '_ {
        self.token_for_rank
            .iter()
            .enumerate()
            .map(|(rank, token)| (rank as Rank, token.as_slice()))
    }
}

/// Decode one tiktoken record. Returns `None` for blank lines.
///
/// `line_no` is 1-based and only used for error reporting.
fn parse_line(line: &[u8], line_no: usize) -> Result<Option<Vec<u8>>, VocabError> {
    let token_b64 = line
        .split(|b| b.is_ascii_whitespace())
        .find(|field| !field.is_empty());

    match token_b64 {
        None => Ok(None),
        Some(field) => STANDARD
            .decode(field)
            .map(Some)
            .map_err(|source| VocabError::Base64Error {
                line: line_no,
                source,
            }),
    }
}

/// Load tiktoken-format vocabulary bytes into rank-ordered tokens.
pub fn load_tiktoken_bpe(data: &[u8]) -> Result<Vec<Vec<u8>>, VocabError> {
    let mut tokens = Vec::new();
    for (line_no, line) in data.split(|&b| b == b'\n').enumerate() {
        if let Some(token) = parse_line(line, line_no + 1)? {
            tokens.push(token);
        }
    }
    Ok(tokens)
}

/// Load rank-ordered tokens from a tiktoken-format stream.
pub fn load_tiktoken_bpe_reader<R: BufRead>(mut reader: R) -> Result<Vec<Vec<u8>>, VocabError> {
    let mut tokens = Vec::new();
    let mut line = Vec::new();
    let mut line_no = 0;
    while reader.read_until(b'\n', &mut line)? > 0 {
        line_no += 1;
        if let Some(token) = parse_line(&line, line_no)? {
            tokens.push(token);
        }
        line.clear();
    }
    Ok(tokens)
}

/// Load rank-ordered tokens from a tiktoken-format file.
pub fn load_tiktoken_bpe_file<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<u8>>, VocabError> {
    let file = File::open(path)?;
    load_tiktoken_bpe_reader(BufReader::new(file))
}
