//! bytepair-tokenizer - High-level tokenizer API
//!
//! This crate provides a user-friendly interface for byte-level BPE,
//! integrating the vocabulary, merge rules and encoder into a single API.
//!
//! # Features
//!
//! - Builder for training or assembling a tokenizer
//! - Atomic special tokens, matched longest first
//! - Lazy encoding of chunked input and parallel batch encoding
//! - Loading and saving as `tokenizer.json` or HuggingFace vocab/merges
//!
//! # Example
//!
//! ```rust
//! use bytepair_tokenizer::Tokenizer;
//!
//! let tokenizer = Tokenizer::builder()
//!     .vocab_size(300)
//!     .special_tokens(["<|endoftext|>"])
//!     .train("low lower lowest<|endoftext|>newer newest")?;
//!
//! let ids = tokenizer.encode("lowest<|endoftext|>")?;
//! assert_eq!(tokenizer.decode(&ids), "lowest<|endoftext|>");
//! # Ok::<(), bytepair_tokenizer::TokenizerError>(())
//! ```

// Re-export core types
pub use bytepair_core::{MergeList, Result, SplitPattern, TokenizerError, Vocabulary};
pub use bytepair_training::{train_bpe, BpeTrainer, TrainingConfig};

// Tokenizer API
pub mod tokenizer;
pub use tokenizer::{EncodeIter, Tokenizer, TokenizerBuilder, TokenizerConfig};

// IO/Serialization
pub mod io;
pub use io::{ModelFormat, TokenizerLoader, TokenizerSaver};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
