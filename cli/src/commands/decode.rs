//! Decode command implementation.

use clap::Parser;

/// Decode command arguments.
#[derive(Parser)]
pub struct DecodeCommand {
    /// Directory of the trained tokenizer model
    #[arg(short, long)]
    pub tokenizer: String,

    /// Token IDs to decode, separated by commas or spaces
    #[arg(long)]
    pub tokens: String,

    /// Model format: json or huggingface
    #[arg(short, long, default_value = "json")]
    pub format: ModelFormat,

    /// Special tokens, needed when loading the huggingface format
    #[arg(short = 's', long = "special-token")]
    pub special_tokens: Vec<String>,
}

use super::load_tokenizer;
use anyhow::{Context, Result as AnyhowResult};
use bytepair_tokenizer::ModelFormat;
use std::path::Path;

pub fn run(cmd: DecodeCommand) -> AnyhowResult<()> {
    let tokenizer = load_tokenizer(
        Path::new(&cmd.tokenizer),
        cmd.format,
        &cmd.special_tokens,
        false,
    )?;

    let ids: Vec<u32> = cmd
        .tokens
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .with_context(|| format!("invalid token id {:?}", s))
        })
        .collect::<AnyhowResult<_>>()?;

    println!("{}", tokenizer.decode(&ids));

    Ok(())
}
