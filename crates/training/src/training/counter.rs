//! Pair counting for BPE training.
//!
//! Words are stored once per distinct byte string, in order of first
//! appearance, with a weight equal to their number of occurrences. Each token
//! of a word remembers the byte offset where it starts in the original word,
//! so `(word index, offset)` reproduces the corpus scan order used to break
//! ties between equally frequent pairs.

use ahash::AHashMap;
use bytepair_core::{ByteToken, FirstSeen, Pair, Result, Vocabulary};
use std::collections::BTreeSet;

/// A pre-tokenized word as a sequence of token IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Current token IDs
    ids: Vec<u32>,
    /// Byte offset where each token starts in the original word
    starts: Vec<u32>,
}

impl Word {
    /// Create a word from token IDs and their start offsets.
    pub fn new(ids: Vec<u32>, starts: Vec<u32>) -> Self {
        debug_assert_eq!(ids.len(), starts.len());
        Self { ids, starts }
    }

    /// Current token IDs.
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Adjacent pairs with the start offset of their left token.
    pub fn pairs(&self) -> impl Iterator<Item = (Pair, u32)> + '_ {
        self.ids
            .windows(2)
            .zip(self.starts.iter())
            .map(|(w, &start)| ((w[0], w[1]), start))
    }

    /// Offset of the first occurrence of `pair`, if any.
    pub fn first_offset(&self, pair: Pair) -> Option<u32> {
        self.pairs()
            .find(|&(p, _)| p == pair)
            .map(|(_, start)| start)
    }

    /// Replace every non-overlapping occurrence of `pair`, scanning left to
    /// right, with `new_id`. Returns whether anything changed.
    pub fn merge(&mut self, pair: Pair, new_id: u32) -> bool {
        let len = self.ids.len();
        if len < 2 {
            return false;
        }

        let mut ids = Vec::with_capacity(len);
        let mut starts = Vec::with_capacity(len);
        let mut changed = false;
        let mut i = 0;

        while i < len {
            if i + 1 < len && self.ids[i] == pair.0 && self.ids[i + 1] == pair.1 {
                ids.push(new_id);
                starts.push(self.starts[i]);
                changed = true;
                i += 2;
            } else {
                ids.push(self.ids[i]);
                starts.push(self.starts[i]);
                i += 1;
            }
        }

        if changed {
            self.ids = ids;
            self.starts = starts;
        }
        changed
    }

    /// Count each adjacent pair once per occurrence.
    fn pair_counts(&self) -> AHashMap<Pair, u64> {
        let mut counts = AHashMap::new();
        for (pair, _) in self.pairs() {
            *counts.entry(pair).or_insert(0) += 1;
        }
        counts
    }
}

/// Count and first occurrence of one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairStats {
    pub count: u64,
    pub first_seen: FirstSeen,
}

/// Counter for BPE pair frequencies.
#[derive(Debug, Default)]
pub struct PairCounter {
    /// Distinct words, ordered by first appearance
    words: Vec<Word>,
    /// Word -> frequency count
    word_counts: Vec<u64>,
    /// Word bytes -> index into `words`
    index: AHashMap<ByteToken, usize>,
}

impl PairCounter {
    /// Create a new pair counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every word of a pre-tokenized corpus.
    pub fn add_words(&mut self, words: &[ByteToken], vocab: &Vocabulary) -> Result<()> {
        for word in words {
            self.add_word(word, vocab)?;
        }
        Ok(())
    }

    /// Add a single word to the counter.
    ///
    /// A word whose full bytes are already a vocabulary entry (a special
    /// token, for instance) becomes that single ID; anything else starts as
    /// one ID per byte.
    pub fn add_word(&mut self, word: &[u8], vocab: &Vocabulary) -> Result<()> {
        if word.is_empty() {
            return Ok(());
        }

        if let Some(&pos) = self.index.get(word) {
            self.word_counts[pos] += 1;
            return Ok(());
        }

        let seeded = match vocab.get_id(word) {
            Some(id) => Word::new(vec![id], vec![0]),
            None => {
                let ids = word
                    .iter()
                    .map(|b| vocab.token_id(std::slice::from_ref(b)))
                    .collect::<Result<Vec<u32>>>()?;
                let starts = (0..word.len() as u32).collect();
                Word::new(ids, starts)
            }
        };

        self.index.insert(word.to_vec(), self.words.len());
        self.words.push(seeded);
        self.word_counts.push(1);
        Ok(())
    }

    /// Count all pairs with a full scan over every word.
    pub fn count_pairs(&self) -> AHashMap<Pair, PairStats> {
        let mut stats: AHashMap<Pair, PairStats> = AHashMap::new();

        for (w, (word, &count)) in self.words.iter().zip(self.word_counts.iter()).enumerate() {
            for (pair, start) in word.pairs() {
                stats
                    .entry(pair)
                    .and_modify(|s| s.count += count)
                    .or_insert(PairStats {
                        count,
                        first_seen: FirstSeen::new(w as u32, start),
                    });
            }
        }

        stats
    }

    /// Get the number of unique words.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Get the total count of all word occurrences.
    pub fn total_word_occurrences(&self) -> u64 {
        self.word_counts.iter().sum()
    }

    /// Get a reference to the words.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Get a reference to the word counts.
    pub fn word_counts(&self) -> &[u64] {
        &self.word_counts
    }

    /// Merge a pair in all words.
    ///
    /// Returns the number of words that changed.
    pub fn merge_pair_in_words(&mut self, pair: Pair, new_token_id: u32) -> usize {
        self.words
            .iter_mut()
            .map(|word| word.merge(pair, new_token_id))
            .filter(|&changed| changed)
            .count()
    }
}

/// Incrementally maintained pair counts.
///
/// Alongside each pair's total count it keeps the set of words containing
/// the pair, so a merge only revisits the words it can affect.
#[derive(Debug, Default)]
pub struct PairIndex {
    pair_counts: AHashMap<Pair, u64>,
    pair_words: AHashMap<Pair, BTreeSet<u32>>,
}

impl PairIndex {
    /// Build the index with one full scan.
    pub fn build(counter: &PairCounter) -> Self {
        let mut index = Self::default();

        for (w, (word, &count)) in counter.words.iter().zip(counter.word_counts.iter()).enumerate()
        {
            for (pair, _) in word.pairs() {
                *index.pair_counts.entry(pair).or_insert(0) += count;
                index.pair_words.entry(pair).or_default().insert(w as u32);
            }
        }

        index
    }

    /// All pairs currently present.
    pub fn pairs(&self) -> impl Iterator<Item = Pair> + '_ {
        self.pair_counts.keys().copied()
    }

    /// Current total count of `pair` (0 if absent).
    pub fn count(&self, pair: Pair) -> u64 {
        self.pair_counts.get(&pair).copied().unwrap_or(0)
    }

    /// Count and first occurrence of `pair`, if it occurs at all.
    pub fn stats(&self, counter: &PairCounter, pair: Pair) -> Option<PairStats> {
        let count = self.count(pair);
        if count == 0 {
            return None;
        }

        let &word = self.pair_words.get(&pair)?.iter().next()?;
        let offset = counter.words[word as usize].first_offset(pair)?;
        Some(PairStats {
            count,
            first_seen: FirstSeen::new(word, offset),
        })
    }

    /// Apply a merge to the words containing `pair` and update the counts.
    ///
    /// Returns every pair whose count changed in at least one word; those
    /// are the only pairs whose count or first occurrence can have moved.
    pub fn merge(&mut self, counter: &mut PairCounter, pair: Pair, new_id: u32) -> Vec<Pair> {
        let Some(affected) = self.pair_words.get(&pair).cloned() else {
            return Vec::new();
        };

        let mut touched: BTreeSet<Pair> = BTreeSet::new();

        for w in affected {
            let word = &mut counter.words[w as usize];
            let weight = counter.word_counts[w as usize];

            let before = word.pair_counts();
            if !word.merge(pair, new_id) {
                continue;
            }
            let after = word.pair_counts();

            for (&p, &old) in &before {
                let new = after.get(&p).copied().unwrap_or(0);
                if new != old {
                    self.adjust(p, old, new, weight);
                    if new == 0 {
                        self.remove_word(p, w);
                    }
                    touched.insert(p);
                }
            }
            for (&p, &new) in &after {
                if !before.contains_key(&p) {
                    self.adjust(p, 0, new, weight);
                    self.pair_words.entry(p).or_default().insert(w);
                    touched.insert(p);
                }
            }
        }

        touched.into_iter().collect()
    }

    fn adjust(&mut self, pair: Pair, old: u64, new: u64, weight: u64) {
        let total = self.pair_counts.entry(pair).or_insert(0);
        *total = *total + new * weight - old * weight;
        if *total == 0 {
            self.pair_counts.remove(&pair);
        }
    }

    fn remove_word(&mut self, pair: Pair, word: u32) {
        if let Some(words) = self.pair_words.get_mut(&pair) {
            words.remove(&word);
            if words.is_empty() {
                self.pair_words.remove(&pair);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vocabulary {
        Vocabulary::initialize(&["<eos>"]).unwrap()
    }

    fn counter(words: &[&str]) -> PairCounter {
        let vocab = vocab();
        let mut counter = PairCounter::new();
        for word in words {
            counter.add_word(word.as_bytes(), &vocab).unwrap();
        }
        counter
    }

    #[test]
    fn test_add_word() {
        let counter = counter(&["abc"]);

        assert_eq!(counter.word_count(), 1);
        assert_eq!(counter.words()[0].ids(), &[97, 98, 99]);
    }

    #[test]
    fn test_duplicate_words_are_weighted() {
        let counter = counter(&["ab", "cd", "ab", "ab"]);

        assert_eq!(counter.word_count(), 2);
        assert_eq!(counter.word_counts(), &[3, 1]);
        assert_eq!(counter.total_word_occurrences(), 4);
    }

    #[test]
    fn test_special_word_is_one_id() {
        let counter = counter(&["<eos>", "a"]);

        assert_eq!(counter.words()[0].ids(), &[256]);
        assert_eq!(counter.words()[1].ids(), &[97]);
        assert!(counter.count_pairs().is_empty());
    }

    #[test]
    fn test_count_pairs_with_first_seen() {
        let counter = counter(&["abc", "bcd", "bcd"]);
        let pairs = counter.count_pairs();

        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[&(97, 98)].count, 1);
        assert_eq!(pairs[&(98, 99)].count, 3);
        assert_eq!(pairs[&(98, 99)].first_seen, FirstSeen::new(0, 1));
        assert_eq!(pairs[&(99, 100)].first_seen, FirstSeen::new(1, 1));
    }

    #[test]
    fn test_word_merge_keeps_left_offsets() {
        let mut word = Word::new(vec![97, 97, 97, 98], vec![0, 1, 2, 3]);

        assert!(word.merge((97, 97), 256));
        assert_eq!(word.ids(), &[256, 97, 98]);
        assert_eq!(word.first_offset((97, 98)), Some(2));
        assert!(!word.merge((99, 99), 257));
    }

    #[test]
    fn test_merge_pair_in_words() {
        let mut counter = counter(&["aab", "ba", "aa"]);
        let changed = counter.merge_pair_in_words((97, 97), 257);

        assert_eq!(changed, 2);
        assert_eq!(counter.words()[0].ids(), &[257, 98]);
        assert_eq!(counter.words()[1].ids(), &[98, 97]);
        assert_eq!(counter.words()[2].ids(), &[257]);
    }

    #[test]
    fn test_pair_index_tracks_full_rescan() {
        let mut incremental = counter(&["aaab", "daaab", "ac", "aaab"]);
        let mut rescan = counter(&["aaab", "daaab", "ac", "aaab"]);
        let mut index = PairIndex::build(&incremental);

        let touched = index.merge(&mut incremental, (97, 97), 257);
        rescan.merge_pair_in_words((97, 97), 257);

        assert!(touched.contains(&(97, 97)));
        assert!(touched.contains(&(257, 97)));
        assert!(!touched.contains(&(97, 99)));

        let expected = rescan.count_pairs();
        for (&pair, stats) in &expected {
            assert_eq!(index.stats(&incremental, pair), Some(*stats));
        }
        assert_eq!(index.pairs().count(), expected.len());
        assert_eq!(index.count((97, 97)), 0);
    }
}
