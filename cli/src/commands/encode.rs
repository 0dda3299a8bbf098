//! Encode command implementation.

use clap::Parser;

/// Encode command arguments.
#[derive(Parser)]
pub struct EncodeCommand {
    /// Directory of the trained tokenizer model
    #[arg(short, long)]
    pub tokenizer: String,

    /// Text to encode, or "-" to read stdin
    #[arg(short, long)]
    pub input: String,

    /// Model format: json or huggingface
    #[arg(short, long, default_value = "json")]
    pub format: ModelFormat,

    /// Special tokens, needed when loading the huggingface format
    #[arg(short = 's', long = "special-token")]
    pub special_tokens: Vec<String>,

    /// Split text with the GPT-2 pattern before applying merges
    #[arg(long, default_value_t = false)]
    pub pretokenize: bool,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<String>,
}

use super::load_tokenizer;
use anyhow::Result as AnyhowResult;
use bytepair_tokenizer::ModelFormat;
use std::io::Read;
use std::path::Path;

pub fn run(cmd: EncodeCommand) -> AnyhowResult<()> {
    let tokenizer = load_tokenizer(
        Path::new(&cmd.tokenizer),
        cmd.format,
        &cmd.special_tokens,
        cmd.pretokenize,
    )?;

    // Read input text (from stdin if "-")
    let input_text = if cmd.input == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        cmd.input
    };

    let ids = tokenizer.encode(&input_text)?;
    let output = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" ");

    match &cmd.output {
        Some(path) => {
            std::fs::write(path, &output)?;
            println!("Encoded {} tokens to {}", ids.len(), path);
        }
        None => {
            println!("{}", output);
        }
    }

    Ok(())
}
