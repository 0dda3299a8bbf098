//! CLI commands for the bytepair tokenizer.

pub mod benchmark;
pub mod decode;
pub mod encode;
pub mod train;

pub use benchmark::BenchmarkCommand;
pub use decode::DecodeCommand;
pub use encode::EncodeCommand;
pub use train::TrainCommand;

use anyhow::{Context, Result};
use bytepair_tokenizer::{ModelFormat, SplitPattern, Tokenizer};
use std::path::Path;

/// Load a saved tokenizer in either on-disk format.
///
/// `special_tokens` only matters for the HuggingFace layout, which does not
/// record them.
pub fn load_tokenizer(
    dir: &Path,
    format: ModelFormat,
    special_tokens: &[String],
    pretokenize: bool,
) -> Result<Tokenizer> {
    let tokenizer = match format {
        ModelFormat::Json => Tokenizer::load(dir),
        ModelFormat::HuggingFace => Tokenizer::load_huggingface(dir, special_tokens),
    }
    .with_context(|| format!("failed to load tokenizer from {}", dir.display()))?;

    if !pretokenize || tokenizer.split_pattern() == SplitPattern::Gpt2 {
        return Ok(tokenizer);
    }

    Ok(Tokenizer::with_split_pattern(
        tokenizer.vocab().clone(),
        tokenizer.merges().to_vec(),
        tokenizer.special_tokens(),
        SplitPattern::Gpt2,
    )?)
}
