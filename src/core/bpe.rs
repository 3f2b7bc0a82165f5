//! Byte-pair merge engine for a single atom.
//!
//! The atom starts as one segment per byte. Segments live in an arena indexed
//! by the byte offset where they start; `prev`/`next` are arena indices, so a
//! merge is an O(1) splice. Each segment caches the rank its pair with the
//! successor would produce. A merge can only change two of those cached
//! ranks: the merged segment's own and its predecessor's.

use thiserror::Error;

use super::vocab::{Rank, Vocabulary};

/// A merged segment whose bytes are not in the vocabulary.
///
/// This is a defect signal, not an input error: the merge loop only merges
/// into vocabulary entries, so it can only surface when the table is missing
/// single-byte tokens or the loop itself is wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Byte offset of the segment within the atom.
    pub offset: usize,
    /// Length of the segment in bytes.
    pub len: usize,
}

/// Errors that can occur while encoding.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Output buffer too small: need {needed} tokens, have {available}")]
    Capacity { needed: usize, available: usize },
    #[error("Atom matcher failed: {0}")]
    Match(#[from] super::splitter::MatchError),
    #[error("Internal invariant violated: segment at offset {} ({} bytes) has no rank", .0.offset, .0.len)]
    Invariant(InvariantViolation),
}

/// Rank a pair of adjacent segments would merge into.
///
/// Variant order matters: every `Mergeable` rank compares below `Blocked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PairRank {
    Mergeable(Rank),
    Blocked,
}

impl PairRank {
    #[inline]
    fn lookup(vocab: &Vocabulary, bytes: &[u8]) -> Self {
        vocab.rank_of(bytes).map_or(Self::Blocked, Self::Mergeable)
    }
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    prev: Option<usize>,
    /// Start of the successor, or the atom length for the last segment.
    next: usize,
    pair: PairRank,
}

/// Leftmost live segment holding the lowest pair rank.
fn min_segment(segments: &[Segment]) -> usize {
    let mut min = 0;
    let mut i = segments[0].next;
    while i < segments.len() {
        if segments[i].pair < segments[min].pair {
            min = i;
        }
        i = segments[i].next;
    }
    min
}

/// Encode one atom into `out`, returning the number of tokens written.
///
/// Nothing is written unless the whole atom succeeds: both
/// [`EncodeError::Capacity`] (merged token count exceeds `out.len()`) and
/// [`EncodeError::Invariant`] leave `out` untouched. A buffer of `atom.len()`
/// slots is always enough.
pub fn encode_atom(
    vocab: &Vocabulary,
    atom: &[u8],
    out: &mut [Rank],
) -> Result<usize, EncodeError> {
    match atom {
        [] => return Ok(0),
        [byte] => {
            let slot = out.first_mut().ok_or(EncodeError::Capacity {
                needed: 1,
                available: 0,
            })?;
            *slot = Rank::from(*byte);
            return Ok(1);
        }
        _ => {}
    }

    let len = atom.len();
    let mut segments: Vec<Segment> = (0..len)
        .map(|i| Segment {
            prev: i.checked_sub(1),
            next: i + 1,
            pair: if i + 1 < len {
                PairRank::lookup(vocab, &atom[i..i + 2])
            } else {
                PairRank::Blocked
            },
        })
        .collect();

    let mut min = min_segment(&segments);
    while segments[min].pair != PairRank::Blocked {
        // Splice out the successor.
        let absorbed = segments[min].next;
        let after = segments[absorbed].next;
        segments[min].next = after;
        if after < len {
            segments[after].prev = Some(min);
        }

        segments[min].pair = if after < len {
            PairRank::lookup(vocab, &atom[min..segments[after].next])
        } else {
            PairRank::Blocked
        };
        if let Some(prev) = segments[min].prev {
            segments[prev].pair = PairRank::lookup(vocab, &atom[prev..after]);
        }

        min = min_segment(&segments);
    }

    let mut ranks = Vec::with_capacity(len);
    let mut i = 0;
    while i < len {
        let end = segments[i].next;
        match vocab.rank_of(&atom[i..end]) {
            Some(rank) => ranks.push(rank),
            None => {
                debug_assert!(
                    end - i == 1,
                    "merged segment {:?} missing from vocabulary",
                    &atom[i..end]
                );
                return Err(EncodeError::Invariant(InvariantViolation {
                    offset: i,
                    len: end - i,
                }));
            }
        }
        i = end;
    }

    let available = out.len();
    let dst = out.get_mut(..ranks.len()).ok_or(EncodeError::Capacity {
        needed: ranks.len(),
        available,
    })?;
    dst.copy_from_slice(&ranks);
    Ok(ranks.len())
}

/// Encode one atom into a freshly allocated vector.
pub fn byte_pair_encode(vocab: &Vocabulary, atom: &[u8]) -> Result<Vec<Rank>, EncodeError> {
    let mut out = vec![0; atom.len()];
    let n = encode_atom(vocab, atom, &mut out)?;
    out.truncate(n);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn the_vocab() -> Vocabulary {
        let mut tokens: Vec<Vec<u8>> = (0u8..=255).map(|b| vec![b]).collect();
        tokens.push(b"th".to_vec());
        tokens.push(b"the".to_vec());
        Vocabulary::new(tokens).unwrap()
    }

    fn vocab_with(extra: &[&[u8]]) -> Vocabulary {
        let mut tokens: Vec<Vec<u8>> = (0u8..=255).map(|b| vec![b]).collect();
        tokens.extend(extra.iter().map(|t| t.to_vec()));
        Vocabulary::new(tokens).unwrap()
    }

    #[test]
    fn test_merges_to_single_token() {
        let vocab = the_vocab();
        assert_eq!(byte_pair_encode(&vocab, b"the").unwrap(), vec![257]);
    }

    #[test]
    fn test_partial_merge() {
        let vocab = the_vocab();
        assert_eq!(
            byte_pair_encode(&vocab, b"that").unwrap(),
            vec![256, b'a' as Rank, b't' as Rank]
        );
    }

    #[test]
    fn test_empty_atom() {
        let vocab = the_vocab();
        let mut out: [Rank; 0] = [];
        assert_eq!(encode_atom(&vocab, b"", &mut out).unwrap(), 0);
    }

    #[test]
    fn test_single_byte_ignores_vocab() {
        let vocab = Vocabulary::new(vec![b"zz".to_vec()]).unwrap();
        let mut out = [0; 1];
        assert_eq!(encode_atom(&vocab, b"x", &mut out).unwrap(), 1);
        assert_eq!(out, [b'x' as Rank]);
    }

    #[test]
    fn test_single_byte_needs_one_slot() {
        let vocab = the_vocab();
        let mut out: [Rank; 0] = [];
        assert!(matches!(
            encode_atom(&vocab, b"x", &mut out),
            Err(EncodeError::Capacity {
                needed: 1,
                available: 0
            })
        ));
    }

    #[test]
    fn test_lowest_rank_merges_first() {
        // "bc" outranks "ab", so "abc" must become [a, bc] rather than [ab, c].
        let vocab = vocab_with(&[b"bc", b"ab"]);
        assert_eq!(
            byte_pair_encode(&vocab, b"abc").unwrap(),
            vec![b'a' as Rank, 256]
        );
    }

    #[test]
    fn test_leftmost_wins_ties() {
        // Every "aa" pair has the same rank, so the leftmost one merges first.
        let vocab = vocab_with(&[b"aa"]);
        assert_eq!(byte_pair_encode(&vocab, b"aaa").unwrap(), vec![256, b'a' as Rank]);

        let vocab = vocab_with(&[b"aa", b"aaaa"]);
        assert_eq!(byte_pair_encode(&vocab, b"aaaa").unwrap(), vec![257]);
    }

    #[test]
    fn test_predecessor_rank_refreshed() {
        // After "bc" merges, the predecessor pair becomes "a"+"bc".
        let vocab = vocab_with(&[b"bc", b"abc"]);
        assert_eq!(byte_pair_encode(&vocab, b"abc").unwrap(), vec![257]);
    }

    #[test]
    fn test_successor_rank_uses_full_span() {
        // "ab" then "cd" merge; only the 4-byte "abcd" joins them.
        let vocab = vocab_with(&[b"ab", b"cd", b"abc", b"abcd"]);
        assert_eq!(byte_pair_encode(&vocab, b"abcd").unwrap(), vec![259]);
    }

    #[test]
    fn test_no_merges() {
        let vocab = the_vocab();
        assert_eq!(
            byte_pair_encode(&vocab, b"xyz").unwrap(),
            vec![b'x' as Rank, b'y' as Rank, b'z' as Rank]
        );
    }

    #[test]
    fn test_capacity_counts_merged_tokens() {
        let vocab = the_vocab();

        let mut exact = [0; 4];
        assert_eq!(encode_atom(&vocab, b"that", &mut exact).unwrap(), 3);

        let mut short = [0; 3];
        assert_eq!(encode_atom(&vocab, b"that", &mut short).unwrap(), 3);

        let mut too_short = [7; 2];
        assert!(matches!(
            encode_atom(&vocab, b"that", &mut too_short),
            Err(EncodeError::Capacity {
                needed: 3,
                available: 2
            })
        ));
        assert_eq!(too_short, [7, 7]);
    }

    #[test]
    fn test_output_bounded_by_input() {
        let vocab = vocab_with(&[b"ab", b"ba", b"aba", b"bab", b"abab"]);
        let atoms: [&[u8]; 4] = [b"ababababa", b"aabbaabb", b"bbbbbbb", b"ab"];
        for atom in atoms {
            let tokens = byte_pair_encode(&vocab, atom).unwrap();
            assert!(!tokens.is_empty());
            assert!(tokens.len() <= atom.len());
        }
    }

    #[test]
    fn test_missing_byte_token_is_invariant_violation() {
        let vocab = Vocabulary::new(vec![b"a".to_vec(), b"b".to_vec()]).unwrap();
        let mut out = [0; 2];
        assert!(matches!(
            encode_atom(&vocab, b"ax", &mut out),
            Err(EncodeError::Invariant(InvariantViolation { offset: 1, len: 1 }))
        ));
    }

    #[test]
    fn test_invariant_violation_writes_nothing() {
        // "a" resolves before "x" fails; its rank must not reach the buffer.
        let vocab = Vocabulary::new(vec![b"a".to_vec(), b"b".to_vec()]).unwrap();
        let mut out = [9; 3];
        assert!(encode_atom(&vocab, b"aax", &mut out).is_err());
        assert_eq!(out, [9, 9, 9]);
    }
}
