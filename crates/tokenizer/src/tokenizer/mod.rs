//! Main tokenizer implementation.
//!
//! This module provides the high-level `Tokenizer` struct that ties the
//! vocabulary, merge rules, special-token matching and byte-level encoder
//! together.

use crate::io::{TokenizerLoader, TokenizerParts, TokenizerSaver};
use bytepair_core::{
    ByteLevelEncoder, ByteToken, MergeList, MergeRules, Result, Segment, SpecialTokenMatcher,
    SplitPattern, Splitter, TokenizerError, Vocabulary,
};
use bytepair_training::{BpeTrainer, TrainingConfig};
use compact_str::CompactString;
use std::iter::FusedIterator;
use std::path::Path;
use std::sync::Arc;

/// Configuration for building a tokenizer.
#[derive(Debug, Clone)]
pub struct TokenizerConfig {
    /// Target vocabulary size
    pub vocab_size: usize,
    /// Minimum frequency for merges during training
    pub min_frequency: u64,
    /// Special tokens, in ID order
    pub special_tokens: Vec<CompactString>,
    /// Encode-time pre-tokenization
    pub split_pattern: SplitPattern,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            vocab_size: 30_000,
            min_frequency: 1,
            special_tokens: Vec::new(),
            split_pattern: SplitPattern::NoSplit,
        }
    }
}

/// Builder for creating a tokenizer.
#[derive(Debug, Clone, Default)]
pub struct TokenizerBuilder {
    config: TokenizerConfig,
}

impl TokenizerBuilder {
    /// Create a new tokenizer builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target vocabulary size.
    pub fn vocab_size(mut self, size: usize) -> Self {
        self.config.vocab_size = size;
        self
    }

    /// Set the minimum frequency for merges.
    pub fn min_frequency(mut self, freq: u64) -> Self {
        self.config.min_frequency = freq;
        self
    }

    /// Set special tokens.
    pub fn special_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.special_tokens = tokens
            .into_iter()
            .map(|s| CompactString::new(s.as_ref()))
            .collect();
        self
    }

    /// Set the encode-time split pattern.
    pub fn split_pattern(mut self, pattern: SplitPattern) -> Self {
        self.config.split_pattern = pattern;
        self
    }

    /// The configuration built so far.
    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Build a tokenizer from an existing vocabulary and merge list.
    pub fn build_from(self, vocab: Vocabulary, merges: MergeList) -> Result<Tokenizer> {
        Tokenizer::with_split_pattern(
            vocab,
            merges,
            &self.config.special_tokens,
            self.config.split_pattern,
        )
    }

    /// Train on `text` and build a tokenizer from the result.
    pub fn train(self, text: &str) -> Result<Tokenizer> {
        let trainer = BpeTrainer::new(TrainingConfig {
            vocab_size: self.config.vocab_size,
            min_frequency: self.config.min_frequency,
            special_tokens: self
                .config
                .special_tokens
                .iter()
                .map(|s| s.to_string())
                .collect(),
            incremental: true,
        });
        let (vocab, merges) = trainer.train_text(text)?;
        self.build_from(vocab, merges)
    }

    /// Train on the contents of a UTF-8 text file.
    pub fn train_file<P: AsRef<Path>>(self, path: P) -> Result<Tokenizer> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| TokenizerError::Io {
            path: path.to_path_buf(),
            err,
        })?;
        self.train(&text)
    }
}

/// Main tokenizer struct.
///
/// Cloning is cheap: the vocabulary, merge rules and compiled patterns are
/// shared behind `Arc` and never change after construction, so a tokenizer
/// can encode from many threads at once.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    /// Byte-level encoder over the shared vocabulary and merges
    encoder: ByteLevelEncoder,
    /// Special-token matcher, absent when there are no special tokens
    special: Option<Arc<SpecialTokenMatcher>>,
    /// Encode-time text splitter
    splitter: Arc<Splitter>,
}

impl Tokenizer {
    /// Create a tokenizer from a vocabulary, a merge list and special tokens.
    ///
    /// Special tokens missing from the vocabulary are appended under the next
    /// free IDs.
    pub fn new<S: AsRef<str>>(
        vocab: Vocabulary,
        merges: MergeList,
        special_tokens: &[S],
    ) -> Result<Self> {
        Self::with_split_pattern(vocab, merges, special_tokens, SplitPattern::NoSplit)
    }

    /// Like [`Tokenizer::new`], with an explicit encode-time split pattern.
    pub fn with_split_pattern<S: AsRef<str>>(
        mut vocab: Vocabulary,
        merges: MergeList,
        special_tokens: &[S],
        split_pattern: SplitPattern,
    ) -> Result<Self> {
        let mut specials: Vec<(&str, u32)> = Vec::with_capacity(special_tokens.len());
        for token in special_tokens {
            let token = token.as_ref();
            if specials.iter().any(|&(s, _)| s == token) {
                return Err(TokenizerError::InvalidConfig(format!(
                    "duplicate special token {:?}",
                    token
                )));
            }

            let id = match vocab.get_id(token.as_bytes()) {
                Some(_) => vocab.mark_special(token)?,
                None => {
                    let id = vocab.add_special_token(token)?;
                    log::warn!(
                        "Special token {:?} missing from vocabulary, added as {}",
                        token,
                        id
                    );
                    id
                }
            };
            specials.push((token, id));
        }

        let special = SpecialTokenMatcher::new(&specials)?.map(Arc::new);
        let splitter = Arc::new(Splitter::new(split_pattern)?);
        let encoder = ByteLevelEncoder::new(vocab, MergeRules::from_merges(merges));

        log::debug!(
            "Tokenizer ready: {} tokens, {} merges, {} special tokens",
            encoder.vocab().len(),
            encoder.merges().len(),
            specials.len()
        );

        Ok(Self {
            encoder,
            special,
            splitter,
        })
    }

    /// Create a tokenizer builder.
    pub fn builder() -> TokenizerBuilder {
        TokenizerBuilder::new()
    }

    /// Encode text to token IDs.
    ///
    /// Special tokens map to their reserved IDs; every other span is split
    /// into bytes, merged by rank and looked up in the vocabulary.
    pub fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let mut ids = Vec::with_capacity(text.len() / 2);

        match &self.special {
            Some(matcher) => {
                for segment in matcher.split(text) {
                    match segment {
                        Segment::Special(id) => ids.push(id),
                        Segment::Text(span) => self.encode_span(span, &mut ids)?,
                    }
                }
            }
            None => self.encode_span(text, &mut ids)?,
        }

        Ok(ids)
    }

    fn encode_span(&self, span: &str, ids: &mut Vec<u32>) -> Result<()> {
        for piece in self.splitter.split(span)? {
            self.encoder.encode_bytes_into(piece.as_bytes(), ids)?;
        }
        Ok(())
    }

    /// Lazily encode a sequence of text chunks.
    ///
    /// Each chunk is encoded only when the iterator needs its IDs, so memory
    /// stays bounded by the largest chunk. Chunks are encoded independently.
    pub fn encode_iterable<I>(&self, chunks: I) -> EncodeIter<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        EncodeIter {
            tokenizer: self,
            chunks: chunks.into_iter(),
            pending: Vec::new().into_iter(),
            done: false,
        }
    }

    /// Encode a batch of texts (parallelized).
    pub fn encode_batch<S>(&self, texts: &[S]) -> Result<Vec<Vec<u32>>>
    where
        S: AsRef<str> + Sync,
    {
        use rayon::prelude::*;

        texts
            .par_iter()
            .map(|text| self.encode(text.as_ref()))
            .collect()
    }

    /// Decode token IDs back to text.
    ///
    /// Unknown IDs are skipped and invalid UTF-8 becomes U+FFFD.
    pub fn decode(&self, ids: &[u32]) -> String {
        self.encoder.decode(ids)
    }

    /// Concatenated raw bytes of the known IDs.
    pub fn decode_bytes(&self, ids: &[u32]) -> Vec<u8> {
        self.encoder.decode_bytes(ids)
    }

    /// Get the vocabulary size.
    pub fn vocab_size(&self) -> usize {
        self.encoder.vocab().len()
    }

    /// Get a reference to the vocabulary.
    pub fn vocab(&self) -> &Vocabulary {
        self.encoder.vocab()
    }

    /// The merge list in rank order.
    pub fn merges(&self) -> &[(ByteToken, ByteToken)] {
        self.encoder.merges().list()
    }

    /// Special tokens in ID order.
    pub fn special_tokens(&self) -> &[CompactString] {
        self.encoder.vocab().special_tokens()
    }

    /// The encode-time split pattern.
    pub fn split_pattern(&self) -> SplitPattern {
        self.splitter.pattern()
    }

    /// Save the tokenizer to `path/tokenizer.json`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        TokenizerSaver::new(self.vocab(), self.merges(), self.split_pattern()).save(path.as_ref())
    }

    /// Save `vocab.json` and `merges.txt` under `path`.
    pub fn save_huggingface<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        TokenizerSaver::new(self.vocab(), self.merges(), self.split_pattern())
            .save_huggingface(path.as_ref())
    }

    /// Load a tokenizer saved with [`Tokenizer::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let TokenizerParts {
            vocab,
            merges,
            special_tokens,
            split_pattern,
        } = TokenizerLoader::load(path.as_ref())?;
        Self::with_split_pattern(vocab, merges, &special_tokens, split_pattern)
    }

    /// Load a tokenizer from HuggingFace `vocab.json` + `merges.txt`.
    pub fn load_huggingface<P, S>(path: P, special_tokens: &[S]) -> Result<Self>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let (vocab, merges) = TokenizerLoader::load_huggingface(path.as_ref())?;
        Self::new(vocab, merges, special_tokens)
    }
}

/// Iterator returned by [`Tokenizer::encode_iterable`].
///
/// Yields one ID at a time. After an error it yields nothing more.
pub struct EncodeIter<'a, I> {
    tokenizer: &'a Tokenizer,
    chunks: I,
    pending: std::vec::IntoIter<u32>,
    done: bool,
}

impl<'a, I> Iterator for EncodeIter<'a, I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = Result<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(id) = self.pending.next() {
                return Some(Ok(id));
            }
            if self.done {
                return None;
            }

            match self.chunks.next() {
                Some(chunk) => match self.tokenizer.encode(chunk.as_ref()) {
                    Ok(ids) => self.pending = ids.into_iter(),
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                },
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}

impl<'a, I> FusedIterator for EncodeIter<'a, I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn merge(l: &str, r: &str) -> (ByteToken, ByteToken) {
        (l.as_bytes().to_vec(), r.as_bytes().to_vec())
    }

    /// Bytes, `<eos>` (256), "th" (257), "the" (258).
    fn the_tokenizer(with_the: bool) -> Tokenizer {
        let mut vocab = Vocabulary::initialize(&["<eos>"]).unwrap();
        vocab.push_token(b"th".to_vec());
        if with_the {
            vocab.push_token(b"the".to_vec());
        }
        Tokenizer::new(vocab, vec![merge("t", "h"), merge("th", "e")], &["<eos>"]).unwrap()
    }

    const CORPUS: &str = "the quick brown fox jumps over the lazy dog.<|endoftext|>\
        The dog sleeps; the fox doesn't. Über naïve café · 東京 12345!<|endoftext|>\
        low lower lowest newer newest wider widest";

    fn trained() -> Tokenizer {
        Tokenizer::builder()
            .vocab_size(400)
            .special_tokens(["<|endoftext|>"])
            .train(CORPUS)
            .unwrap()
    }

    #[test]
    fn test_encode_special_and_merges() {
        let tokenizer = the_tokenizer(true);
        assert_eq!(tokenizer.encode("the<eos>").unwrap(), vec![258, 256]);
        assert_eq!(tokenizer.decode(&[258, 256]), "the<eos>");
    }

    #[test]
    fn test_encode_unknown_token() {
        let tokenizer = the_tokenizer(false);
        let err = tokenizer.encode("the").unwrap_err();
        assert!(matches!(err, TokenizerError::UnknownToken(_)));
    }

    #[test]
    fn test_encode_empty() {
        let tokenizer = the_tokenizer(true);
        assert!(tokenizer.encode("").unwrap().is_empty());
        assert_eq!(tokenizer.decode(&[]), "");
    }

    #[test]
    fn test_roundtrip_trained() {
        let tokenizer = trained();

        for text in [
            "the lazy fox",
            "Über 東京<|endoftext|>naïve",
            "<|endoftext|><|endoftext|>",
            "  leading and trailing  \n",
            "unseen: ✓ 🦀 \u{0}",
        ] {
            let ids = tokenizer.encode(text).unwrap();
            assert_eq!(tokenizer.decode(&ids), text);
        }
    }

    #[test]
    fn test_special_tokens_are_atomic() {
        let tokenizer = trained();
        let eot = tokenizer.vocab().get_id(b"<|endoftext|>").unwrap();
        assert_eq!(eot, 256);

        let ids = tokenizer.encode("a<|endoftext|>b<|endoftext|>").unwrap();
        assert_eq!(ids.iter().filter(|&&id| id == eot).count(), 2);
        assert_eq!(*ids.last().unwrap(), eot);

        // Broken-up special tokens are ordinary text
        let ids = tokenizer.encode("<|endoftext|").unwrap();
        assert!(!ids.contains(&eot));
    }

    #[test]
    fn test_overlapping_special_tokens_prefer_longest() {
        let vocab = Vocabulary::initialize::<&str>(&[]).unwrap();
        let tokenizer = Tokenizer::new(vocab, Vec::new(), &["<s>", "<s><s>"]).unwrap();

        assert_eq!(tokenizer.encode("<s><s><s>").unwrap(), vec![257, 256]);
    }

    #[test]
    fn test_missing_special_token_is_added() {
        let vocab = Vocabulary::initialize::<&str>(&[]).unwrap();
        let tokenizer = Tokenizer::new(vocab, Vec::new(), &["<pad>"]).unwrap();

        assert_eq!(tokenizer.vocab_size(), 257);
        assert_eq!(tokenizer.encode("<pad>").unwrap(), vec![256]);
        assert_eq!(tokenizer.special_tokens().len(), 1);
    }

    #[test]
    fn test_duplicate_special_tokens_rejected() {
        let vocab = Vocabulary::initialize::<&str>(&[]).unwrap();
        let result = Tokenizer::new(vocab, Vec::new(), &["<pad>", "<pad>"]);
        assert!(matches!(result, Err(TokenizerError::InvalidConfig(_))));
    }

    #[test]
    fn test_decode_is_lenient() {
        let tokenizer = the_tokenizer(true);
        assert_eq!(tokenizer.decode(&[104, 9999, 105]), "hi");
        // A truncated three-byte sequence becomes a single replacement character
        assert_eq!(tokenizer.decode(&[0xE2, 0x82]), "\u{FFFD}");
        assert_eq!(tokenizer.decode_bytes(&[0xE2, 9999]), vec![0xE2]);
    }

    #[test]
    fn test_split_pattern_limits_merges() {
        let mut vocab = Vocabulary::initialize::<&str>(&[]).unwrap();
        vocab.push_token(b"a ".to_vec());
        let merges = vec![merge("a", " ")];

        let whole = Tokenizer::new(vocab.clone(), merges.clone(), &[] as &[&str]).unwrap();
        assert_eq!(whole.encode("a b").unwrap(), vec![256, 98]);

        let split =
            Tokenizer::with_split_pattern(vocab, merges, &[] as &[&str], SplitPattern::Gpt2)
                .unwrap();
        assert_eq!(split.encode("a b").unwrap(), vec![97, 32, 98]);
    }

    #[test]
    fn test_encode_iterable_matches_encode() {
        let tokenizer = trained();
        let chunks = vec!["the lazy ", "dog<|endoftext|>", "", "naïve café\n"];

        let lazy: Vec<u32> = tokenizer
            .encode_iterable(chunks.iter())
            .collect::<Result<_>>()
            .unwrap();
        let eager: Vec<u32> = chunks
            .iter()
            .flat_map(|c| tokenizer.encode(c).unwrap())
            .collect();
        assert_eq!(lazy, eager);
    }

    #[test]
    fn test_encode_iterable_stops_after_error() {
        let tokenizer = the_tokenizer(false);
        let mut iter = tokenizer.encode_iterable(["ab", "the", "cd"]);

        assert_eq!(iter.next().unwrap().unwrap(), 97);
        assert_eq!(iter.next().unwrap().unwrap(), 98);
        assert!(iter.next().unwrap().is_err());
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_encode_batch() {
        let tokenizer = trained();
        let texts = vec!["the dog".to_string(), "newest fox".to_string(), String::new()];

        let batch = tokenizer.encode_batch(&texts).unwrap();
        for (text, ids) in texts.iter().zip(&batch) {
            assert_eq!(&tokenizer.encode(text).unwrap(), ids);
        }
    }

    #[test]
    fn test_tokenizer_is_shareable() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<Tokenizer>();
    }

    #[test]
    fn test_save_load_roundtrip() {
        let tokenizer = trained();
        let dir = tempfile::tempdir().unwrap();

        tokenizer.save(dir.path()).unwrap();
        let loaded = Tokenizer::load(dir.path()).unwrap();

        assert_eq!(loaded.vocab().entries(), tokenizer.vocab().entries());
        assert_eq!(loaded.merges(), tokenizer.merges());
        assert_eq!(loaded.special_tokens(), tokenizer.special_tokens());

        let text = "the lazy dog<|endoftext|>Über";
        assert_eq!(loaded.encode(text).unwrap(), tokenizer.encode(text).unwrap());
    }

    #[test]
    fn test_huggingface_roundtrip() {
        let tokenizer = trained();
        let dir = tempfile::tempdir().unwrap();

        tokenizer.save_huggingface(dir.path()).unwrap();
        let loaded = Tokenizer::load_huggingface(dir.path(), &["<|endoftext|>"]).unwrap();

        let text = "newest wider<|endoftext|>fox";
        assert_eq!(loaded.encode(text).unwrap(), tokenizer.encode(text).unwrap());
    }

    #[test]
    fn test_train_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.txt");
        std::fs::write(&path, CORPUS).unwrap();

        let from_file = Tokenizer::builder()
            .vocab_size(400)
            .special_tokens(["<|endoftext|>"])
            .train_file(&path)
            .unwrap();
        assert_eq!(from_file.merges(), trained().merges());

        let missing = Tokenizer::builder().train_file(dir.path().join("nope.txt"));
        assert!(matches!(missing, Err(TokenizerError::Io { .. })));
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(text in "\\PC*") {
            let tokenizer = trained();
            let ids = tokenizer.encode(&text).unwrap();
            prop_assert_eq!(tokenizer.decode(&ids), text);
        }

        #[test]
        fn prop_encode_is_deterministic(text in "[a-z <|endoftx>]{0,40}") {
            let tokenizer = trained();
            prop_assert_eq!(tokenizer.encode(&text).unwrap(), tokenizer.encode(&text).unwrap());
        }
    }
}
