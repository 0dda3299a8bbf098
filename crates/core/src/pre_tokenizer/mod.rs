//! Pre-tokenization: splitting raw text before any merges are applied.

pub mod special;
pub mod split;

pub use special::{Segment, SpecialTokenMatcher};
pub use split::{PreTokenizer, SplitPattern, Splitter, GPT2_SPLIT_PATTERN};

use crate::core::ByteToken;
use crate::error::Result;

/// Split a corpus into words with the GPT-2 pattern, keeping every special
/// token as one word.
pub fn pretokenize<S: AsRef<str>>(text: &str, special_tokens: &[S]) -> Result<Vec<ByteToken>> {
    PreTokenizer::new(special_tokens)?.pretokenize(text)
}
