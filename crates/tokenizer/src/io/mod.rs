//! Serialization and deserialization for BPE models.
//!
//! Two on-disk layouts are supported: a single `tokenizer.json` that keeps
//! the exact ID map, merge order and special tokens, and the HuggingFace
//! `vocab.json` + `merges.txt` pair.

pub mod format;
pub mod load;
pub mod save;

pub use format::{ByteMapper, ModelFormat, SerializedTokenizer};
pub use load::{TokenizerLoader, TokenizerParts};
pub use save::TokenizerSaver;
