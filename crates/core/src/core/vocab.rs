//! Vocabulary storage and lookup.
//!
//! The vocabulary maps token ids to raw byte tokens and keeps the reverse
//! mapping (bytes -> id) used during encoding. Ids `0..256` are the single
//! bytes, followed by the special tokens in the order they were supplied, then
//! one id per learned merge.

use crate::error::{Result, TokenizerError};
use ahash::AHashMap;
use compact_str::CompactString;

/// An immutable sequence of raw bytes; the unit stored in the vocabulary.
pub type ByteToken = Vec<u8>;

/// Forward mapping: ID -> byte token
pub type Vocab = AHashMap<u32, ByteToken>;

/// Reverse mapping: byte token -> ID
pub type VocabR = AHashMap<ByteToken, u32>;

/// Number of single-byte base tokens.
pub const BYTE_VOCAB_SIZE: usize = 256;

/// Vocabulary with forward and reverse mappings.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    /// Forward mapping: ID -> byte token
    vocab: Vocab,
    /// Reverse mapping: byte token -> ID
    vocab_r: VocabR,
    /// Special tokens in the order their ids were assigned
    special: Vec<CompactString>,
    /// Next ID handed out by `push_token`
    next_id: u32,
}

impl Vocabulary {
    /// Create a new empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new vocabulary with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vocab: Vocab::with_capacity(capacity),
            vocab_r: VocabR::with_capacity(capacity),
            special: Vec::new(),
            next_id: 0,
        }
    }

    /// Build the base vocabulary: the 256 single bytes in numeric order
    /// followed by one entry per special token, in the order given.
    pub fn initialize<S: AsRef<str>>(special_tokens: &[S]) -> Result<Self> {
        let mut vocab = Self::with_capacity(BYTE_VOCAB_SIZE + special_tokens.len());

        for byte in 0..=u8::MAX {
            vocab.push_token(vec![byte]);
        }

        for token in special_tokens {
            vocab.add_special_token(token.as_ref())?;
        }

        Ok(vocab)
    }

    /// Smallest target size a trainer may ask for with `num_special` special tokens.
    #[inline]
    pub fn minimum_size(num_special: usize) -> usize {
        BYTE_VOCAB_SIZE + num_special
    }

    /// Append a token under the next sequential ID.
    ///
    /// Always assigns a fresh ID, even when the bytes are already present:
    /// two merge paths can build the same string. The reverse mapping keeps
    /// the first ID it saw for those bytes.
    pub fn push_token(&mut self, token: ByteToken) -> u32 {
        let id = self.next_id;
        self.vocab_r.entry(token.clone()).or_insert(id);
        self.vocab.insert(id, token);
        self.next_id += 1;
        id
    }

    /// Add a token with a specific ID.
    ///
    /// Returns an error if the ID is already taken.
    pub fn add_token_with_id(&mut self, token: ByteToken, id: u32) -> Result<()> {
        if self.vocab.contains_key(&id) {
            return Err(TokenizerError::InvalidConfig(format!(
                "Token ID {} already exists",
                id
            )));
        }

        self.vocab_r.entry(token.clone()).or_insert(id);
        self.vocab.insert(id, token);
        self.next_id = self.next_id.max(id + 1);

        Ok(())
    }

    /// Register a special token under the next sequential ID.
    pub fn add_special_token(&mut self, token: &str) -> Result<u32> {
        if self.special.iter().any(|s| s.as_str() == token) {
            return Err(TokenizerError::InvalidConfig(format!(
                "duplicate special token {:?}",
                token
            )));
        }
        if token.is_empty() {
            return Err(TokenizerError::InvalidConfig(
                "special tokens must not be empty".to_string(),
            ));
        }

        self.special.push(CompactString::new(token));
        Ok(self.push_token(token.as_bytes().to_vec()))
    }

    /// Mark a token that already has an ID as special, without reassigning it.
    pub fn mark_special(&mut self, token: &str) -> Result<u32> {
        let id = self.token_id(token.as_bytes())?;
        if !self.special.iter().any(|s| s.as_str() == token) {
            self.special.push(CompactString::new(token));
        }
        Ok(id)
    }

    /// Get the ID for a byte token.
    #[inline]
    pub fn get_id(&self, token: &[u8]) -> Option<u32> {
        self.vocab_r.get(token).copied()
    }

    /// Get the ID for a byte token, failing loudly when it is absent.
    #[inline]
    pub fn token_id(&self, token: &[u8]) -> Result<u32> {
        self.get_id(token)
            .ok_or_else(|| TokenizerError::unknown_bytes(token))
    }

    /// Get the byte token for an ID.
    #[inline]
    pub fn get_token(&self, id: u32) -> Option<&[u8]> {
        self.vocab.get(&id).map(|t| t.as_slice())
    }

    /// Special tokens in the order their IDs were assigned.
    pub fn special_tokens(&self) -> &[CompactString] {
        &self.special
    }

    /// Get the size of the vocabulary.
    #[inline]
    pub fn len(&self) -> usize {
        self.vocab.len()
    }

    /// Check if the vocabulary is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vocab.is_empty()
    }

    /// The ID the next pushed token will receive.
    #[inline]
    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    /// All `(id, token)` entries sorted by ID.
    pub fn entries(&self) -> Vec<(u32, &[u8])> {
        let mut entries: Vec<(u32, &[u8])> = self
            .vocab
            .iter()
            .map(|(&id, token)| (id, token.as_slice()))
            .collect();
        entries.sort_unstable_by_key(|&(id, _)| id);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_bytes() {
        let vocab = Vocabulary::initialize::<&str>(&[]).unwrap();

        assert_eq!(vocab.len(), 256);
        assert_eq!(vocab.get_token(0), Some(&[0u8][..]));
        assert_eq!(vocab.get_token(97), Some(&b"a"[..]));
        assert_eq!(vocab.get_token(255), Some(&[255u8][..]));
        assert_eq!(vocab.get_id(b"a"), Some(97));
        assert_eq!(vocab.next_id(), 256);
    }

    #[test]
    fn test_initialize_special_tokens() {
        let vocab = Vocabulary::initialize(&["<|endoftext|>", "<pad>"]).unwrap();

        assert_eq!(vocab.len(), 258);
        assert_eq!(vocab.get_id(b"<|endoftext|>"), Some(256));
        assert_eq!(vocab.get_id(b"<pad>"), Some(257));
        let specials: Vec<&str> = vocab.special_tokens().iter().map(|s| s.as_str()).collect();
        assert_eq!(specials, vec!["<|endoftext|>", "<pad>"]);
    }

    #[test]
    fn test_duplicate_special_token() {
        let result = Vocabulary::initialize(&["<eos>", "<eos>"]);
        assert!(matches!(result, Err(TokenizerError::InvalidConfig(_))));
    }

    #[test]
    fn test_push_duplicate_bytes_keeps_first_reverse_id() {
        let mut vocab = Vocabulary::initialize::<&str>(&[]).unwrap();
        let first = vocab.push_token(b"abc".to_vec());
        let second = vocab.push_token(b"abc".to_vec());

        assert_eq!(first, 256);
        assert_eq!(second, 257);
        assert_eq!(vocab.len(), 258);
        assert_eq!(vocab.get_id(b"abc"), Some(256));
        assert_eq!(vocab.get_token(257), Some(&b"abc"[..]));
    }

    #[test]
    fn test_token_id_fails_loudly() {
        let vocab = Vocabulary::initialize::<&str>(&[]).unwrap();
        let err = vocab.token_id(b"zz").unwrap_err();
        assert!(matches!(err, TokenizerError::UnknownToken(ref s) if s == "b\"zz\""));
    }

    #[test]
    fn test_add_token_with_id() {
        let mut vocab = Vocabulary::new();
        vocab.add_token_with_id(b"hello".to_vec(), 5).unwrap();
        vocab.add_token_with_id(b"world".to_vec(), 10).unwrap();

        assert_eq!(vocab.get_id(b"hello"), Some(5));
        assert_eq!(vocab.get_token(10), Some(&b"world"[..]));
        assert_eq!(vocab.next_id(), 11);
        assert!(vocab.add_token_with_id(b"again".to_vec(), 5).is_err());
    }
}
