//! bytepair-core - Core byte-pair encoding data structures
//!
//! This crate provides the building blocks shared by the trainer and the
//! tokenizer:
//!
//! - [`Vocabulary`]: id <-> byte token mappings, seeded with the 256 single
//!   bytes and the special tokens
//! - [`MergeRules`]: ranked merge list and the greedy lowest-rank applier
//! - [`PairPriorityQueue`]: the training merge queue
//! - [`pre_tokenizer`]: GPT-2 word splitting and special-token matching
//! - [`ByteLevelEncoder`]: bytes to ids and back
//!
//! # Example
//!
//! ```rust
//! use bytepair_core::{ByteLevelEncoder, MergeRules, Vocabulary};
//!
//! let mut vocab = Vocabulary::initialize::<&str>(&[]).unwrap();
//! vocab.push_token(b"th".to_vec());
//! let merges = MergeRules::from_merges(vec![(b"t".to_vec(), b"h".to_vec())]);
//!
//! let encoder = ByteLevelEncoder::new(vocab, merges);
//! assert_eq!(encoder.encode_bytes(b"the").unwrap(), vec![256, 101]);
//! ```

pub mod error;
pub use error::{Result, TokenizerError};

pub mod core;
pub use core::{
    ByteToken, FirstSeen, MergeCandidate, MergeList, MergeMap, MergeRules, Pair,
    PairPriorityQueue, Vocab, VocabR, Vocabulary, BYTE_VOCAB_SIZE,
};

pub mod pre_tokenizer;
pub use pre_tokenizer::{
    pretokenize, PreTokenizer, Segment, SpecialTokenMatcher, SplitPattern, Splitter,
    GPT2_SPLIT_PATTERN,
};

pub mod encoding;
pub use encoding::ByteLevelEncoder;
