//! Benchmark command implementation.

use clap::Parser;

/// Benchmark command arguments.
#[derive(Parser)]
pub struct BenchmarkCommand {
    /// Directory of the trained tokenizer model
    #[arg(short, long)]
    pub tokenizer: String,

    /// Path to input text file for benchmarking
    #[arg(short, long)]
    pub input: String,

    /// Number of iterations to run
    #[arg(short = 'n', long, default_value_t = 100)]
    pub iterations: usize,

    /// Encode the file's lines in parallel instead of the whole text at once
    #[arg(long, default_value_t = false)]
    pub batch: bool,
}

use anyhow::{ensure, Result as AnyhowResult};
use bytepair_tokenizer::Tokenizer;
use std::fs;
use std::time::Instant;

pub fn run(cmd: BenchmarkCommand) -> AnyhowResult<()> {
    ensure!(cmd.iterations > 0, "--iterations must be at least 1");

    let tokenizer = Tokenizer::load(&cmd.tokenizer)?;
    let text = fs::read_to_string(&cmd.input)?;
    let lines: Vec<&str> = text.lines().collect();

    let encode = || -> AnyhowResult<usize> {
        if cmd.batch {
            Ok(tokenizer.encode_batch(&lines)?.iter().map(Vec::len).sum())
        } else {
            Ok(tokenizer.encode(&text)?.len())
        }
    };

    println!("Benchmarking encoding...");
    println!("  Text length: {} bytes", text.len());
    println!("  Iterations: {}", cmd.iterations);
    println!("  Mode: {}", if cmd.batch { "batch" } else { "single" });
    println!();

    // Warmup
    let tokens = encode()?;

    let start = Instant::now();
    for _ in 0..cmd.iterations {
        encode()?;
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed.as_secs_f64() / cmd.iterations as f64;

    println!("Results:");
    println!("  Tokens per pass: {}", tokens);
    println!("  Total time: {:.2}s", elapsed.as_secs_f64());
    println!("  Average time: {:.3}ms", per_iter * 1_000.0);
    println!("  Throughput: {:.0} tokens/s", tokens as f64 / per_iter);
    println!(
        "  Throughput: {:.2} MB/s",
        text.len() as f64 / per_iter / 1_000_000.0
    );

    Ok(())
}
