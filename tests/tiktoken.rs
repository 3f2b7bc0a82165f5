//! Integration tests for loading tiktoken-format vocabularies from disk.

use std::fs;
use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use splitbpe::{Tokenizer, TokenizerError, VocabError, Vocabulary, CL100K_BASE_PATTERN};
use tempfile::TempDir;

/// A tiktoken file: bytes in order, then a few merged tokens.
fn tiktoken_data(extra: &[&str]) -> String {
    let tokens = (0u8..=255)
        .map(|b| vec![b])
        .chain(extra.iter().map(|t| t.as_bytes().to_vec()));
    tokens
        .enumerate()
        .map(|(rank, token)| format!("{} {}\n", STANDARD.encode(token), rank))
        .collect()
}

/// Write `data` into a fresh temp dir. The dir is removed when dropped.
fn write_temp(name: &str, data: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(name);
    fs::write(&path, data).unwrap();
    (temp_dir, path)
}

#[test]
fn test_tokenizer_from_file() {
    let data = tiktoken_data(&["He", "ll", "Hell", "Hello"]);
    let (_dir, path) = write_temp("hello.tiktoken", &data);
    let tokenizer = Tokenizer::from_file(&path, CL100K_BASE_PATTERN).unwrap();

    assert_eq!(tokenizer.vocab_size(), 260);
    assert!(tokenizer.vocab().is_byte_aligned());

    let tokens = tokenizer.encode_to_vec(b"Hello, Hello").unwrap();
    // "Hello" merges fully; ", " and " Hello" have no merged tokens for the space.
    assert_eq!(tokens[0], 259);
    assert_eq!(tokenizer.decode_str(&tokens).unwrap(), "Hello, Hello");
}

#[test]
fn test_file_and_bytes_agree() {
    let data = tiktoken_data(&["ab", "abc"]);
    let (_dir, path) = write_temp("agree.tiktoken", &data);
    let from_file = Vocabulary::from_tiktoken_file(&path).unwrap();
    let from_bytes = Vocabulary::from_tiktoken(data.as_bytes()).unwrap();

    assert_eq!(from_file.len(), from_bytes.len());
    for (rank, bytes) in from_bytes.iter() {
        assert_eq!(from_file.bytes_of(rank), Some(bytes));
    }
}

#[test]
fn test_crlf_and_blank_lines() {
    let data = tiktoken_data(&["ab"]).replace('\n', "\r\n") + "\r\n\r\n";
    let vocab = Vocabulary::from_tiktoken(data.as_bytes()).unwrap();
    assert_eq!(vocab.len(), 257);
    assert_eq!(vocab.rank_of(b"ab"), Some(256));
}

#[test]
fn test_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing.tiktoken");
    assert!(matches!(
        Tokenizer::from_file(&path, CL100K_BASE_PATTERN),
        Err(TokenizerError::VocabError(VocabError::IoError(_)))
    ));
}

#[test]
fn test_duplicate_token_in_file() {
    let data = tiktoken_data(&["ab", "ab"]);
    assert!(matches!(
        Vocabulary::from_tiktoken(data.as_bytes()),
        Err(VocabError::DuplicateToken {
            rank: 257,
            first_rank: 256
        })
    ));
}

#[test]
fn test_bad_pattern() {
    let data = tiktoken_data(&[]);
    assert!(matches!(
        Tokenizer::from_bytes(data.as_bytes(), "(unclosed"),
        Err(TokenizerError::RegexError(_))
    ));
}
