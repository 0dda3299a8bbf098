//! BPE trainer implementation.
//!
//! Training repeatedly merges the most frequent adjacent pair until the
//! vocabulary reaches its target size. Among equally frequent pairs the one
//! that occurs first in corpus scan order is merged, which makes the output
//! fully deterministic.

use super::counter::{PairCounter, PairIndex, PairStats};
use ahash::AHashMap;
use bytepair_core::{
    pretokenize, ByteToken, MergeCandidate, MergeList, Pair, PairPriorityQueue, Result,
    TokenizerError, Vocabulary,
};

/// Merges between two debug progress lines.
const LOG_EVERY: usize = 50;

/// Configuration for BPE training.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Target vocabulary size, including the 256 bytes and special tokens
    pub vocab_size: usize,
    /// Minimum frequency for a pair to be merged
    pub min_frequency: u64,
    /// Special tokens, assigned IDs right after the bytes
    pub special_tokens: Vec<String>,
    /// Maintain pair counts incrementally instead of rescanning every word
    pub incremental: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            vocab_size: 30_000,
            min_frequency: 1,
            special_tokens: Vec::new(),
            incremental: true,
        }
    }
}

impl TrainingConfig {
    /// Default configuration with the given target size.
    pub fn with_vocab_size(vocab_size: usize) -> Self {
        Self {
            vocab_size,
            ..Default::default()
        }
    }

    /// Check the configuration before any work is done.
    pub fn validate(&self) -> Result<()> {
        self.check(Vocabulary::minimum_size(self.special_tokens.len()))
    }

    /// Check against a vocabulary that already holds `base_size` tokens.
    fn check(&self, base_size: usize) -> Result<()> {
        if self.vocab_size < base_size {
            return Err(TokenizerError::VocabSizeTooSmall {
                requested: self.vocab_size,
                minimum: base_size,
            });
        }
        if self.min_frequency == 0 {
            return Err(TokenizerError::InvalidConfig(
                "min_frequency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// BPE trainer.
///
/// Trains a BPE vocabulary from pre-tokenized words by iteratively merging
/// the most frequent byte pairs.
#[derive(Debug, Clone, Default)]
pub struct BpeTrainer {
    config: TrainingConfig,
}

impl BpeTrainer {
    /// Create a new BPE trainer with the given configuration.
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Create a new BPE trainer with default configuration.
    pub fn with_vocab_size(vocab_size: usize) -> Self {
        Self::new(TrainingConfig::with_vocab_size(vocab_size))
    }

    /// The trainer's configuration.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Pre-tokenize `text` and train on it from a fresh base vocabulary.
    pub fn train_text(&self, text: &str) -> Result<(Vocabulary, MergeList)> {
        self.config.validate()?;

        let vocab = Vocabulary::initialize(&self.config.special_tokens)?;
        let words = pretokenize(text, &self.config.special_tokens)?;
        log::info!(
            "Pre-tokenized {} bytes into {} words",
            text.len(),
            words.len()
        );

        self.run(&words, vocab)
    }

    /// Train on pre-tokenized words, extending `vocab`.
    ///
    /// # Returns
    /// The grown vocabulary and the merge list in the order merges were made
    pub fn train(
        &self,
        words: &[ByteToken],
        vocab: Vocabulary,
    ) -> Result<(Vocabulary, MergeList)> {
        self.config.check(vocab.len())?;
        self.run(words, vocab)
    }

    fn run(&self, words: &[ByteToken], vocab: Vocabulary) -> Result<(Vocabulary, MergeList)> {
        let mut counter = PairCounter::new();
        counter.add_words(words, &vocab)?;
        log::info!(
            "Training on {} unique words ({} total), vocab {} -> {}",
            counter.word_count(),
            counter.total_word_occurrences(),
            vocab.len(),
            self.config.vocab_size
        );

        let (vocab, merges) = if self.config.incremental {
            self.train_incremental(counter, vocab)?
        } else {
            self.train_rescan(counter, vocab)?
        };

        log::info!(
            "Training finished: {} merges, vocabulary size {}",
            merges.len(),
            vocab.len()
        );
        Ok((vocab, merges))
    }

    /// Maintain counts with a [`PairIndex`] and a lazily invalidated heap.
    fn train_incremental(
        &self,
        mut counter: PairCounter,
        mut vocab: Vocabulary,
    ) -> Result<(Vocabulary, MergeList)> {
        let mut index = PairIndex::build(&counter);
        let mut queue = self.build_queue(&index, &counter);
        let mut merges = MergeList::new();

        while vocab.len() < self.config.vocab_size {
            let Some(candidate) = queue.pop() else {
                break;
            };
            if candidate.count < self.config.min_frequency {
                break;
            }

            let new_id = self.add_merge(&mut vocab, &mut merges, &candidate)?;
            let touched = index.merge(&mut counter, candidate.pair, new_id);

            for pair in touched {
                match index.stats(&counter, pair) {
                    Some(stats) => queue.push(candidate_from(pair, stats)),
                    None => queue.remove(pair),
                }
            }
        }

        Ok((vocab, merges))
    }

    /// Recount every pair from scratch on each iteration.
    fn train_rescan(
        &self,
        mut counter: PairCounter,
        mut vocab: Vocabulary,
    ) -> Result<(Vocabulary, MergeList)> {
        let mut merges = MergeList::new();

        while vocab.len() < self.config.vocab_size {
            let Some(candidate) = best_candidate(&counter.count_pairs()) else {
                break;
            };
            if candidate.count < self.config.min_frequency {
                break;
            }

            let new_id = self.add_merge(&mut vocab, &mut merges, &candidate)?;
            counter.merge_pair_in_words(candidate.pair, new_id);
        }

        Ok((vocab, merges))
    }

    /// Build priority queue from the initial pair counts.
    fn build_queue(&self, index: &PairIndex, counter: &PairCounter) -> PairPriorityQueue {
        let mut queue = PairPriorityQueue::new();
        for pair in index.pairs() {
            if let Some(stats) = index.stats(counter, pair) {
                queue.push(candidate_from(pair, stats));
            }
        }
        queue
    }

    /// Record the winning pair: new vocabulary entry plus merge list entry.
    fn add_merge(
        &self,
        vocab: &mut Vocabulary,
        merges: &mut MergeList,
        candidate: &MergeCandidate,
    ) -> Result<u32> {
        let (left, right) = candidate.pair;
        let left = vocab.get_token(left).map(<[u8]>::to_vec).ok_or_else(|| {
            TokenizerError::InvalidConfig(format!("pair refers to unknown id {}", left))
        })?;
        let right = vocab.get_token(right).map(<[u8]>::to_vec).ok_or_else(|| {
            TokenizerError::InvalidConfig(format!("pair refers to unknown id {}", right))
        })?;

        let new_id = vocab.push_token([left.as_slice(), right.as_slice()].concat());

        let rank = merges.len() + 1;
        if rank == 1 || rank % LOG_EVERY == 0 {
            log::debug!(
                "merge {}/{}: {:?} + {:?} (count {})",
                rank,
                self.config.vocab_size.saturating_sub(vocab.len() - rank),
                String::from_utf8_lossy(&left),
                String::from_utf8_lossy(&right),
                candidate.count
            );
        }

        merges.push((left, right));
        Ok(new_id)
    }
}

fn candidate_from(pair: Pair, stats: PairStats) -> MergeCandidate {
    MergeCandidate::new(pair, stats.count, stats.first_seen)
}

/// Highest count, earliest first occurrence.
fn best_candidate(stats: &AHashMap<Pair, PairStats>) -> Option<MergeCandidate> {
    stats
        .iter()
        .map(|(&pair, &s)| candidate_from(pair, s))
        .fold(None, |best: Option<MergeCandidate>, c| match best {
            Some(b) if !c.beats(&b) => Some(b),
            _ => Some(c),
        })
}
