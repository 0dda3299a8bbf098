//! Special-token matching, shared by training and encoding.

use super::split::longest_first;
use crate::error::{Result, TokenizerError};
use ahash::AHashMap;
use regex::Regex;

/// A span of input text as seen by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// A whole special token, already resolved to its id
    Special(u32),
    /// Ordinary text between special tokens
    Text(&'a str),
}

/// Finds special tokens in text.
///
/// All tokens are compiled into one alternation, longest first, so the
/// leftmost match is always the longest token starting there.
#[derive(Debug, Clone)]
pub struct SpecialTokenMatcher {
    pattern: Regex,
    ids: AHashMap<String, u32>,
}

impl SpecialTokenMatcher {
    /// Build a matcher from `(token, id)` pairs.
    ///
    /// Returns `None` when there are no tokens to match.
    pub fn new(tokens: &[(&str, u32)]) -> Result<Option<Self>> {
        if tokens.is_empty() {
            return Ok(None);
        }

        let strings: Vec<&str> = tokens.iter().map(|&(token, _)| token).collect();
        let alternation = longest_first(&strings)
            .into_iter()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("|");

        let pattern =
            Regex::new(&alternation).map_err(|e| TokenizerError::Pattern(e.to_string()))?;
        let ids = tokens
            .iter()
            .map(|&(token, id)| (token.to_string(), id))
            .collect();

        Ok(Some(Self { pattern, ids }))
    }

    /// Split `text` into special tokens and the text between them.
    ///
    /// Empty text segments are not emitted.
    pub fn split<'a>(&self, text: &'a str) -> Vec<Segment<'a>> {
        let mut segments = Vec::new();
        let mut last = 0;

        for m in self.pattern.find_iter(text) {
            if m.start() > last {
                segments.push(Segment::Text(&text[last..m.start()]));
            }
            if let Some(&id) = self.ids.get(m.as_str()) {
                segments.push(Segment::Special(id));
            }
            last = m.end();
        }

        if last < text.len() {
            segments.push(Segment::Text(&text[last..]));
        }

        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_tokens() {
        assert!(SpecialTokenMatcher::new(&[]).unwrap().is_none());
    }

    #[test]
    fn test_split_segments() {
        let matcher = SpecialTokenMatcher::new(&[("<eos>", 256)]).unwrap().unwrap();

        assert_eq!(
            matcher.split("the<eos>cat"),
            vec![Segment::Text("the"), Segment::Special(256), Segment::Text("cat")]
        );
        assert_eq!(
            matcher.split("<eos><eos>"),
            vec![Segment::Special(256), Segment::Special(256)]
        );
        assert!(matcher.split("").is_empty());
    }

    #[test]
    fn test_longest_token_first() {
        let matcher = SpecialTokenMatcher::new(&[("<|a|>", 256), ("<|a|><|a|>", 257)])
            .unwrap()
            .unwrap();

        assert_eq!(
            matcher.split("<|a|><|a|><|a|>"),
            vec![Segment::Special(257), Segment::Special(256)]
        );
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let matcher = SpecialTokenMatcher::new(&[("[.*]", 300)]).unwrap().unwrap();
        assert_eq!(
            matcher.split("a[.*]b[x]"),
            vec![Segment::Text("a"), Segment::Special(300), Segment::Text("b[x]")]
        );
    }
}
