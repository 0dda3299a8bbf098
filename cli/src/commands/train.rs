//! Train command implementation.

use clap::Parser;

/// Train command arguments.
#[derive(Parser)]
pub struct TrainCommand {
    /// Path to the training data file
    #[arg(short, long)]
    pub input: String,

    /// Output directory for the trained model
    #[arg(short, long)]
    pub output: String,

    /// Target vocabulary size (bytes + special tokens + merges)
    #[arg(long, default_value_t = 30_000)]
    pub vocab_size: usize,

    /// Minimum frequency for merges
    #[arg(short, long, default_value_t = 1)]
    pub min_frequency: u64,

    /// Special token; repeat for several, IDs follow the given order
    #[arg(short = 's', long = "special-token")]
    pub special_tokens: Vec<String>,

    /// Output format: json or huggingface
    #[arg(short, long, default_value = "json")]
    pub format: ModelFormat,

    /// Split text with the GPT-2 pattern before encoding
    #[arg(long, default_value_t = false)]
    pub pretokenize: bool,
}

use anyhow::{Context, Result as AnyhowResult};
use bytepair_tokenizer::{ModelFormat, SplitPattern, Tokenizer};
use std::path::Path;
use std::time::Instant;

pub fn run(cmd: TrainCommand) -> AnyhowResult<()> {
    log::info!(
        "Training tokenizer on {} (vocab size {}, min frequency {}, {} special tokens)",
        cmd.input,
        cmd.vocab_size,
        cmd.min_frequency,
        cmd.special_tokens.len()
    );

    let split_pattern = if cmd.pretokenize {
        SplitPattern::Gpt2
    } else {
        SplitPattern::NoSplit
    };

    let start = Instant::now();
    let tokenizer = Tokenizer::builder()
        .vocab_size(cmd.vocab_size)
        .min_frequency(cmd.min_frequency)
        .special_tokens(&cmd.special_tokens)
        .split_pattern(split_pattern)
        .train_file(&cmd.input)
        .with_context(|| format!("training on {} failed", cmd.input))?;

    println!("Training completed in {:.2}s", start.elapsed().as_secs_f64());
    println!("Final vocab size: {}", tokenizer.vocab_size());
    println!("Merges learned: {}", tokenizer.merges().len());

    let output_path = Path::new(&cmd.output);
    match cmd.format {
        ModelFormat::Json => tokenizer.save(output_path)?,
        ModelFormat::HuggingFace => tokenizer.save_huggingface(output_path)?,
    }
    println!("Model saved to {}", cmd.output);

    Ok(())
}
