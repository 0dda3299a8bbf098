//! bytepair-training - BPE training
//!
//! This crate learns a byte-level vocabulary and an ordered merge list from
//! a text corpus.
//!
//! # Features
//!
//! - GPT-2 style pre-tokenization with atomic special tokens
//! - Frequency-driven merging with a deterministic tie-break: among equally
//!   frequent pairs the one occurring first in the corpus wins
//! - Incremental pair counting, with a full-rescan mode for cross-checking
//!
//! # Example
//!
//! ```rust,ignore
//! use bytepair_training::{BpeTrainer, TrainingConfig};
//!
//! let config = TrainingConfig {
//!     vocab_size: 1_000,
//!     special_tokens: vec!["<|endoftext|>".to_string()],
//!     ..Default::default()
//! };
//!
//! let trainer = BpeTrainer::new(config);
//! let (vocab, merges) = trainer.train_text("low lower lowest")?;
//! ```

use std::path::Path;

pub use bytepair_core::{MergeList, Result, TokenizerError, Vocabulary};

// Training infrastructure
pub mod training;
pub use training::{BpeTrainer, PairCounter, PairIndex, TrainingConfig};

/// Train a vocabulary and merge list from a UTF-8 text file.
///
/// The vocabulary starts with the 256 single bytes followed by
/// `special_tokens` in order; merges are added until it holds `vocab_size`
/// entries or no pair is left to merge.
pub fn train_bpe<P, S>(
    input_path: P,
    vocab_size: usize,
    special_tokens: &[S],
) -> Result<(Vocabulary, MergeList)>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let config = TrainingConfig {
        vocab_size,
        special_tokens: special_tokens
            .iter()
            .map(|s| s.as_ref().to_string())
            .collect(),
        ..Default::default()
    };
    config.validate()?;

    let path = input_path.as_ref();
    log::info!("Reading training corpus from {}", path.display());
    let text = std::fs::read_to_string(path).map_err(|err| TokenizerError::Io {
        path: path.to_path_buf(),
        err,
    })?;

    BpeTrainer::new(config).train_text(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_train_bpe_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "aaabdaaabac").unwrap();

        let (vocab, merges) = train_bpe(file.path(), 259, &["<|endoftext|>"]).unwrap();

        assert_eq!(vocab.get_id(b"<|endoftext|>"), Some(256));
        assert_eq!(merges.len(), 2);
        assert_eq!(merges[0], (b"a".to_vec(), b"a".to_vec()));
        assert_eq!(merges[1], (b"aa".to_vec(), b"a".to_vec()));
        assert_eq!(vocab.len(), 259);
    }

    #[test]
    fn test_train_bpe_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");

        let err = train_bpe::<_, &str>(&path, 300, &[]).unwrap_err();
        assert!(matches!(err, TokenizerError::Io { path: ref p, .. } if p == &path));
    }

    #[test]
    fn test_train_bpe_rejects_small_vocab_before_reading() {
        let err = train_bpe("does-not-exist.txt", 100, &["<eos>"]).unwrap_err();
        assert!(matches!(err, TokenizerError::VocabSizeTooSmall { minimum: 257, .. }));
    }
}
