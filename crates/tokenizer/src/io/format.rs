//! Format definitions for tokenizer serialization.
//!
//! Byte tokens are not valid UTF-8 in general, so every format writes them
//! through the GPT-2 byte <-> unicode table: each byte maps to one printable
//! character, and a token is the string of its bytes' characters.

use ahash::AHashMap;
use bytepair_core::{ByteToken, Result, SplitPattern, TokenizerError};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Version written to `tokenizer.json`.
pub const FORMAT_VERSION: &str = "1.0";

/// File names used on disk.
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const VOCAB_FILE: &str = "vocab.json";
pub const MERGES_FILE: &str = "merges.txt";

/// First line of a HuggingFace `merges.txt`.
pub const MERGES_HEADER: &str = "#version: 0.2";

/// Model format types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelFormat {
    /// Single `tokenizer.json` with vocabulary, merges and special tokens
    #[default]
    Json,
    /// HuggingFace tokenizer format (vocab.json + merges.txt)
    HuggingFace,
}

impl FromStr for ModelFormat {
    type Err = TokenizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ModelFormat::Json),
            "huggingface" | "hf" => Ok(ModelFormat::HuggingFace),
            other => Err(TokenizerError::InvalidConfig(format!(
                "unknown model format {:?} (expected json or huggingface)",
                other
            ))),
        }
    }
}

/// GPT-2 reversible mapping between bytes and printable characters.
///
/// Printable Latin-1 bytes map to themselves; every other byte is shifted to
/// a code point from 256 upwards, in byte order.
#[derive(Debug, Clone)]
pub struct ByteMapper {
    to_char: [char; 256],
    to_byte: AHashMap<char, u8>,
}

impl ByteMapper {
    pub fn new() -> Self {
        let printable = |b: u8| matches!(b, b'!'..=b'~' | 0xA1..=0xAC | 0xAE..=0xFF);

        let mut to_char = ['\0'; 256];
        let mut shifted = 0u32;
        for b in 0..=u8::MAX {
            to_char[b as usize] = if printable(b) {
                char::from(b)
            } else {
                shifted += 1;
                // 256..=323 are all valid scalar values
                char::from_u32(255 + shifted).unwrap_or(char::REPLACEMENT_CHARACTER)
            };
        }

        let to_byte = to_char
            .iter()
            .enumerate()
            .map(|(b, &c)| (c, b as u8))
            .collect();

        Self { to_char, to_byte }
    }

    /// Map raw token bytes to their printable form.
    pub fn encode(&self, token: &[u8]) -> String {
        token.iter().map(|&b| self.to_char[b as usize]).collect()
    }

    /// Map a printable token back to its bytes.
    pub fn decode(&self, token: &str) -> Result<ByteToken> {
        token
            .chars()
            .map(|c| {
                self.to_byte.get(&c).copied().ok_or_else(|| {
                    TokenizerError::Load(format!(
                        "character {:?} in token {:?} is not byte-mapped",
                        c, token
                    ))
                })
            })
            .collect()
    }
}

impl Default for ByteMapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete tokenizer serialization format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedTokenizer {
    /// Format version
    pub version: String,
    /// ID -> byte-mapped token
    pub vocab: BTreeMap<u32, String>,
    /// Merge list in rank order, byte-mapped
    pub merges: Vec<(String, String)>,
    /// Special tokens, verbatim
    pub special_tokens: Vec<String>,
    /// Configuration
    pub config: SerializedConfig,
}

/// Tokenizer configuration in serialized format.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SerializedConfig {
    #[serde(default)]
    pub split_pattern: SplitPattern,
}

/// HuggingFace `vocab.json`: token -> ID, written in ID order.
#[derive(Debug, Clone, Default)]
pub struct HuggingFaceVocab(pub Vec<(String, u32)>);

impl Serialize for HuggingFaceVocab {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(token, id)| (token, id)))
    }
}
