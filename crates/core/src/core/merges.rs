//! Merge rule management and application for BPE.
//!
//! A merge list is the ordered output of training; a merge's index is its
//! rank and lower ranks always win. [`MergeRules`] precomputes the rank map
//! once and applies it to byte sequences.
//!
//! Byte tokens are interned to small integer symbols so pairs can be looked
//! up without allocating. During application the working sequence is a list
//! of spans over the input buffer: every token produced by merging adjacent
//! tokens is itself a contiguous span.

use crate::core::vocab::ByteToken;
use ahash::AHashMap;
use std::ops::Range;

/// A pair of token IDs (or interned symbols) that can be merged.
pub type Pair = (u32, u32);

/// Ordered merge history: `(left, right)` byte tokens, earliest-trained first.
pub type MergeList = Vec<(ByteToken, ByteToken)>;

/// Merge rule mapping: symbol pair -> (rank, merged symbol).
pub type MergeMap = AHashMap<Pair, (u32, u32)>;

/// One token of the working sequence: a span of the input and its symbol,
/// if the bytes appear anywhere in the merge list.
#[derive(Debug, Clone, Copy)]
struct Part {
    start: usize,
    end: usize,
    symbol: Option<u32>,
}

/// Collection of BPE merge rules with efficient lookup.
#[derive(Debug, Clone, Default)]
pub struct MergeRules {
    /// The merge list exactly as supplied
    list: MergeList,
    /// Merge rules: symbol pair -> (rank, merged symbol)
    merges: MergeMap,
    /// Interned byte tokens appearing in the merge list
    symbols: AHashMap<ByteToken, u32>,
}

impl MergeRules {
    /// Create a new empty collection of merge rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the rank map from an ordered merge list.
    ///
    /// A pair listed more than once keeps its first (lowest) rank.
    pub fn from_merges(list: MergeList) -> Self {
        let mut rules = Self {
            merges: MergeMap::with_capacity(list.len()),
            symbols: AHashMap::with_capacity(list.len() * 2),
            list: Vec::new(),
        };

        for (rank, (left, right)) in list.iter().enumerate() {
            let l = rules.intern(left);
            let r = rules.intern(right);
            let merged = rules.intern(&[left.as_slice(), right.as_slice()].concat());
            if rules.merges.contains_key(&(l, r)) {
                log::warn!(
                    "merge {} repeats an earlier pair and is ignored: {:?} + {:?}",
                    rank,
                    String::from_utf8_lossy(left),
                    String::from_utf8_lossy(right)
                );
                continue;
            }
            rules.merges.insert((l, r), (rank as u32, merged));
        }

        rules.list = list;
        rules
    }

    fn intern(&mut self, token: &[u8]) -> u32 {
        if let Some(&symbol) = self.symbols.get(token) {
            return symbol;
        }
        let symbol = self.symbols.len() as u32;
        self.symbols.insert(token.to_vec(), symbol);
        symbol
    }

    /// The merge list in rank order.
    pub fn list(&self) -> &[(ByteToken, ByteToken)] {
        &self.list
    }

    /// Rank of the merge `(left, right)`, if present.
    pub fn rank(&self, left: &[u8], right: &[u8]) -> Option<u32> {
        let l = *self.symbols.get(left)?;
        let r = *self.symbols.get(right)?;
        self.merges.get(&(l, r)).map(|&(rank, _)| rank)
    }

    /// Get the number of merge rules.
    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Check if there are no merge rules.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Apply the merges to a sequence of byte tokens.
    ///
    /// Repeatedly merges every non-overlapping occurrence (left to right) of
    /// the lowest-ranked adjacent pair until no adjacent pair has a rank.
    pub fn apply(&self, tokens: &[ByteToken]) -> Vec<ByteToken> {
        let buffer: Vec<u8> = tokens.concat();
        let mut parts = Vec::with_capacity(tokens.len());
        let mut start = 0;
        for token in tokens {
            let end = start + token.len();
            parts.push(self.part(&buffer, start, end));
            start = end;
        }

        self.merge_parts(parts)
            .into_iter()
            .map(|span| buffer[span].to_vec())
            .collect()
    }

    /// Apply the merges to raw bytes, starting from one token per byte.
    ///
    /// Returns the spans of `bytes` covered by each resulting token.
    pub fn apply_bytes(&self, bytes: &[u8]) -> Vec<Range<usize>> {
        let parts = (0..bytes.len())
            .map(|i| self.part(bytes, i, i + 1))
            .collect();
        self.merge_parts(parts)
    }

    fn part(&self, buffer: &[u8], start: usize, end: usize) -> Part {
        Part {
            start,
            end,
            symbol: self.symbols.get(&buffer[start..end]).copied(),
        }
    }

    fn merge_parts(&self, mut parts: Vec<Part>) -> Vec<Range<usize>> {
        while parts.len() > 1 {
            let Some((pair, merged)) = self.best_pair(&parts) else {
                break;
            };

            let mut out = Vec::with_capacity(parts.len());
            let mut i = 0;
            while i < parts.len() {
                if i + 1 < parts.len()
                    && parts[i].symbol == Some(pair.0)
                    && parts[i + 1].symbol == Some(pair.1)
                {
                    out.push(Part {
                        start: parts[i].start,
                        end: parts[i + 1].end,
                        symbol: Some(merged),
                    });
                    i += 2;
                } else {
                    out.push(parts[i]);
                    i += 1;
                }
            }
            parts = out;
        }

        parts.into_iter().map(|p| p.start..p.end).collect()
    }

    /// Lowest-ranked adjacent pair present in `parts`, with its merged symbol.
    fn best_pair(&self, parts: &[Part]) -> Option<(Pair, u32)> {
        let mut best: Option<(u32, Pair, u32)> = None;

        for window in parts.windows(2) {
            let (Some(l), Some(r)) = (window[0].symbol, window[1].symbol) else {
                continue;
            };
            if let Some(&(rank, merged)) = self.merges.get(&(l, r)) {
                if best.map_or(true, |(best_rank, _, _)| rank < best_rank) {
                    best = Some((rank, (l, r), merged));
                }
            }
        }

        best.map(|(_, pair, merged)| (pair, merged))
    }
}
