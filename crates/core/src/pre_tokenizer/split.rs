//! Text splitting for pre-tokenization.
//!
//! Training cuts special tokens out of the corpus whole, then splits the text
//! between them into words with the GPT-2 pattern. At encode time
//! the same pattern can optionally be used to split ordinary text before
//! merges are applied.

use super::special::{Segment, SpecialTokenMatcher};
use crate::core::ByteToken;
use crate::error::{Result, TokenizerError};
use fancy_regex::Regex;
use serde::{Deserialize, Serialize};

/// GPT-2 pre-tokenization pattern.
///
/// Contractions, letter runs, digit runs and other non-space runs (each
/// optionally preceded by one space), whitespace not followed by a
/// non-space, then any remaining whitespace.
pub const GPT2_SPLIT_PATTERN: &str =
    r"'s|'t|'re|'ve|'m|'ll|'d| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";

/// Order special tokens longest first so that no token is shadowed by one of
/// its own prefixes. Ties keep the caller's order.
pub fn longest_first<S: AsRef<str>>(special_tokens: &[S]) -> Vec<&str> {
    let mut sorted: Vec<&str> = special_tokens.iter().map(|s| s.as_ref()).collect();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()));
    sorted
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| TokenizerError::Pattern(e.to_string()))
}

/// Splits a training corpus into words.
///
/// Special tokens are cut out first with the same leftmost-longest matcher
/// the encoder uses. Only the text between them goes through the GPT-2
/// pattern, so punctuation next to a special token can never absorb part of it.
#[derive(Debug, Clone)]
pub struct PreTokenizer {
    /// Matches special tokens; each match resolves to an index into `specials`
    special: Option<SpecialTokenMatcher>,
    specials: Vec<String>,
    pattern: Regex,
}

impl PreTokenizer {
    pub fn new<S: AsRef<str>>(special_tokens: &[S]) -> Result<Self> {
        let specials: Vec<String> = special_tokens
            .iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        let indexed: Vec<(&str, u32)> = specials
            .iter()
            .enumerate()
            .map(|(index, token)| (token.as_str(), index as u32))
            .collect();
        let special = SpecialTokenMatcher::new(&indexed)?;

        Ok(Self {
            special,
            specials,
            pattern: compile(GPT2_SPLIT_PATTERN)?,
        })
    }

    /// Split `text` into words, each returned as its UTF-8 bytes in source order.
    pub fn pretokenize(&self, text: &str) -> Result<Vec<ByteToken>> {
        let segments = match &self.special {
            Some(matcher) => matcher.split(text),
            None => vec![Segment::Text(text)],
        };

        let mut words = Vec::new();
        for segment in segments {
            match segment {
                Segment::Special(index) => {
                    if let Some(token) = self.specials.get(index as usize) {
                        words.push(token.as_bytes().to_vec());
                    }
                }
                Segment::Text(chunk) => {
                    for m in self.pattern.find_iter(chunk) {
                        let m = m.map_err(|e| TokenizerError::Pattern(e.to_string()))?;
                        words.push(m.as_str().as_bytes().to_vec());
                    }
                }
            }
        }
        Ok(words)
    }
}

/// Splitting patterns applied to ordinary text at encode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplitPattern {
    /// No splitting: the whole span goes through the merges at once
    #[default]
    NoSplit,
    /// Split with the GPT-2 pattern first, like training does
    Gpt2,
}

/// Text splitter for encode-time pre-tokenization.
#[derive(Debug, Clone)]
pub struct Splitter {
    /// Pattern to split on
    pattern: SplitPattern,
    /// Compiled GPT-2 pattern, when needed
    regex: Option<Regex>,
}

impl Splitter {
    /// Create a new splitter.
    pub fn new(pattern: SplitPattern) -> Result<Self> {
        let regex = match pattern {
            SplitPattern::NoSplit => None,
            SplitPattern::Gpt2 => Some(compile(GPT2_SPLIT_PATTERN)?),
        };
        Ok(Self { pattern, regex })
    }

    /// The configured pattern.
    pub fn pattern(&self) -> SplitPattern {
        self.pattern
    }

    /// Split text into chunks.
    pub fn split<'a>(&self, text: &'a str) -> Result<Vec<&'a str>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        match &self.regex {
            None => Ok(vec![text]),
            Some(regex) => regex
                .find_iter(text)
                .map(|m| {
                    m.map(|m| m.as_str())
                        .map_err(|e| TokenizerError::Pattern(e.to_string()))
                })
                .collect(),
        }
    }
}

impl Default for Splitter {
    fn default() -> Self {
        Self {
            pattern: SplitPattern::NoSplit,
            regex: None,
        }
    }
}
