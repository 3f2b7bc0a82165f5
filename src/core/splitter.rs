//! Atom boundary matching and the splitting encoder.
//!
//! An [`AtomMatcher`] partitions input into atoms: ordered, non-overlapping
//! byte spans that are merged independently. [`encode_splitting`] runs the
//! matcher once and feeds each atom to the merge engine, packing the results
//! into one caller-owned token buffer.

use std::ops::Range;

use fancy_regex::{Regex, RegexBuilder};
use log::trace;
use thiserror::Error;

use super::bpe::{encode_atom, EncodeError};
use super::vocab::{Rank, Vocabulary};

/// Pre-splitting pattern compatible with cl100k_base (GPT-4, GPT-3.5-turbo).
///
/// Contractions, letter runs with an optional leading symbol, 1-3 digit runs,
/// punctuation runs with an optional leading space and trailing newlines,
/// newline-terminated whitespace, whitespace not followed by text, and any
/// remaining whitespace.
pub const CL100K_BASE_PATTERN: &str = r"(?i:'s|'t|'re|'ve|'m|'ll|'d)|[^\r\n\p{L}\p{N}]?\p{L}+|\p{N}{1,3}| ?[^\s\p{L}\p{N}]+[\r\n]*|\s*[\r\n]+|\s+(?!\S)|\s+";

/// Errors produced while finding atom boundaries.
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Regex error: {0}")]
    Regex(#[source] Box<fancy_regex::Error>),
    #[error("Atom {start}..{end} overlaps the previous atom or leaves the input (previous end {prev_end}, input length {input_len})")]
    InvalidSpan {
        start: usize,
        end: usize,
        prev_end: usize,
        input_len: usize,
    },
}

impl From<fancy_regex::Error> for MatchError {
    fn from(e: fancy_regex::Error) -> Self {
        Self::Regex(Box::new(e))
    }
}

/// Finds the atoms of an input buffer.
///
/// Implementations must return spans in left-to-right order without
/// overlaps. Gaps are allowed; bytes outside every span are not encoded.
pub trait AtomMatcher {
    fn find_atoms(&self, input: &[u8]) -> Result<Vec<Range<usize>>, MatchError>;
}

impl<F> AtomMatcher for F
where
    F: Fn(&[u8]) -> Vec<Range<usize>>,
{
    fn find_atoms(&self, input: &[u8]) -> Result<Vec<Range<usize>>, MatchError> {
        Ok(self(input))
    }
}

/// Regex-driven atom matcher.
///
/// The regex runs over each valid UTF-8 run of the input. Every invalid
/// sequence between runs becomes an atom of its own, so arbitrary bytes are
/// accepted and still round-trip.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
    pattern: String,
    backtrack_limit: Option<usize>,
}

impl RegexMatcher {
    /// Compile `pattern` with the default backtrack limit.
    pub fn new(pattern: &str) -> Result<Self, MatchError> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            pattern: pattern.to_string(),
            backtrack_limit: None,
        })
    }

    /// Compile `pattern`, failing matches that backtrack more than `limit` times.
    pub fn with_backtrack_limit(pattern: &str, limit: usize) -> Result<Self, MatchError> {
        let regex = RegexBuilder::new(pattern).backtrack_limit(limit).build()?;
        Ok(Self {
            regex,
            pattern: pattern.to_string(),
            backtrack_limit: Some(limit),
        })
    }

    /// Matcher for [`CL100K_BASE_PATTERN`].
    pub fn cl100k_base() -> Result<Self, MatchError> {
        Self::new(CL100K_BASE_PATTERN)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn backtrack_limit(&self) -> Option<usize> {
        self.backtrack_limit
    }
}

impl AtomMatcher for RegexMatcher {
    fn find_atoms(&self, input: &[u8]) -> Result<Vec<Range<usize>>, MatchError> {
        let mut atoms = Vec::new();
        let mut offset = 0;
        for chunk in input.utf8_chunks() {
            let text = chunk.valid();
            for m in self.regex.find_iter(text) {
                let m = m?;
                atoms.push(offset + m.start()..offset + m.end());
            }
            offset += text.len();

            let invalid = chunk.invalid();
            if !invalid.is_empty() {
                atoms.push(offset..offset + invalid.len());
                offset += invalid.len();
            }
        }
        Ok(atoms)
    }
}

/// Encode `input` atom by atom into `out`, returning the total token count.
///
/// Stops at the first failing atom. Tokens of earlier atoms stay in `out`, but
/// on error the caller should not rely on anything in the buffer.
pub fn encode_splitting<M>(
    vocab: &Vocabulary,
    out: &mut [Rank],
    input: &[u8],
    matcher: &M,
) -> Result<usize, EncodeError>
where
    M: AtomMatcher + ?Sized,
{
    let atoms = matcher.find_atoms(input)?;
    trace!("encoding {} bytes as {} atoms", input.len(), atoms.len());

    let available = out.len();
    let mut cursor = 0;
    let mut prev_end = 0;
    for span in atoms {
        if span.start < prev_end || span.start > span.end || span.end > input.len() {
            return Err(MatchError::InvalidSpan {
                start: span.start,
                end: span.end,
                prev_end,
                input_len: input.len(),
            }
            .into());
        }
        prev_end = span.end;

        let written = encode_atom(vocab, &input[span], &mut out[cursor..]).map_err(|e| match e {
            EncodeError::Capacity { needed, .. } => EncodeError::Capacity {
                needed: cursor + needed,
                available,
            },
            other => other,
        })?;
        cursor += written;
    }

    Ok(cursor)
}
