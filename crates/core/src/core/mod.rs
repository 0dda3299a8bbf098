//! Core BPE algorithm implementation.
//!
//! This module contains the fundamental data structures and algorithms
//! for byte-pair encoding: the vocabulary, merge rules and the merge queue
//! used during training.

pub mod merges;
pub mod priority;
pub mod vocab;

pub use merges::{MergeList, MergeMap, MergeRules, Pair};
pub use priority::{FirstSeen, MergeCandidate, PairPriorityQueue};
pub use vocab::{ByteToken, Vocab, VocabR, Vocabulary, BYTE_VOCAB_SIZE};
