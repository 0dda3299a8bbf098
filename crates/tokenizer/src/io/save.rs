//! Save functionality for trained tokenizers.

use super::format::{
    ByteMapper, HuggingFaceVocab, SerializedConfig, SerializedTokenizer, FORMAT_VERSION,
    MERGES_FILE, MERGES_HEADER, TOKENIZER_FILE, VOCAB_FILE,
};
use bytepair_core::{ByteToken, Result, SplitPattern, TokenizerError, Vocabulary};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Tokenizer saver - handles saving trained models.
pub struct TokenizerSaver<'a> {
    /// Vocabulary reference
    vocab: &'a Vocabulary,
    /// Merge list in rank order
    merges: &'a [(ByteToken, ByteToken)],
    /// Encode-time split pattern
    split_pattern: SplitPattern,
    mapper: ByteMapper,
}

impl<'a> TokenizerSaver<'a> {
    /// Create a new tokenizer saver.
    pub fn new(
        vocab: &'a Vocabulary,
        merges: &'a [(ByteToken, ByteToken)],
        split_pattern: SplitPattern,
    ) -> Self {
        Self {
            vocab,
            merges,
            split_pattern,
            mapper: ByteMapper::new(),
        }
    }

    /// Save the tokenizer to a directory in custom JSON format.
    ///
    /// This saves a single `tokenizer.json` file containing all model data.
    ///
    /// # Arguments
    /// * `path` - Directory path to save to
    pub fn save(&self, path: &Path) -> Result<()> {
        create_dir(path)?;

        let mut writer = create_file(&path.join(TOKENIZER_FILE))?;
        serde_json::to_writer_pretty(&mut writer, &self.serialize())
            .map_err(|e| TokenizerError::Save(format!("Failed to serialize tokenizer: {}", e)))?;
        flush(&mut writer, TOKENIZER_FILE)?;

        log::info!(
            "Saved tokenizer ({} tokens, {} merges) to {}",
            self.vocab.len(),
            self.merges.len(),
            path.display()
        );
        Ok(())
    }

    /// Save in HuggingFace format (vocab.json + merges.txt).
    ///
    /// Special tokens are not recorded separately; they appear in
    /// `vocab.json` like any other token. When two IDs share the same bytes
    /// only the lower ID can be written.
    pub fn save_huggingface(&self, path: &Path) -> Result<()> {
        create_dir(path)?;

        let mut writer = create_file(&path.join(VOCAB_FILE))?;
        serde_json::to_writer_pretty(&mut writer, &self.huggingface_vocab())
            .map_err(|e| TokenizerError::Save(format!("Failed to serialize vocab: {}", e)))?;
        flush(&mut writer, VOCAB_FILE)?;

        let mut writer = create_file(&path.join(MERGES_FILE))?;
        let write_err = |e: std::io::Error| {
            TokenizerError::Save(format!("Failed to write {}: {}", MERGES_FILE, e))
        };
        writeln!(writer, "{}", MERGES_HEADER).map_err(write_err)?;
        for (left, right) in self.merges {
            writeln!(
                writer,
                "{} {}",
                self.mapper.encode(left),
                self.mapper.encode(right)
            )
            .map_err(write_err)?;
        }
        flush(&mut writer, MERGES_FILE)?;

        log::info!("Saved HuggingFace vocab and merges to {}", path.display());
        Ok(())
    }

    /// Serialize the tokenizer to a structure.
    pub(crate) fn serialize(&self) -> SerializedTokenizer {
        let vocab = self
            .vocab
            .entries()
            .into_iter()
            .map(|(id, token)| (id, self.mapper.encode(token)))
            .collect();

        let merges = self
            .merges
            .iter()
            .map(|(left, right)| (self.mapper.encode(left), self.mapper.encode(right)))
            .collect();

        SerializedTokenizer {
            version: FORMAT_VERSION.to_string(),
            vocab,
            merges,
            special_tokens: self
                .vocab
                .special_tokens()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            config: SerializedConfig {
                split_pattern: self.split_pattern,
            },
        }
    }

    fn huggingface_vocab(&self) -> HuggingFaceVocab {
        let mut entries = Vec::with_capacity(self.vocab.len());
        for (id, token) in self.vocab.entries() {
            // Duplicates lose to the reverse map's (lowest) ID
            if self.vocab.get_id(token) == Some(id) {
                entries.push((self.mapper.encode(token), id));
            } else {
                log::warn!(
                    "Token {} duplicates the bytes of another token; omitted from {}",
                    id,
                    VOCAB_FILE
                );
            }
        }
        HuggingFaceVocab(entries)
    }
}

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| {
        TokenizerError::Save(format!(
            "Failed to create directory {}: {}",
            path.display(),
            e
        ))
    })
}

fn create_file(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| {
        TokenizerError::Save(format!("Failed to create file {}: {}", path.display(), e))
    })?;
    Ok(BufWriter::new(file))
}

/// Flush explicitly so write errors are not lost when the writer drops.
fn flush<W: Write>(writer: &mut W, name: &str) -> Result<()> {
    writer
        .flush()
        .map_err(|e| TokenizerError::Save(format!("Failed to write {}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Vocabulary, Vec<(ByteToken, ByteToken)>) {
        let mut vocab = Vocabulary::initialize(&["<eos>"]).unwrap();
        vocab.push_token(b" t".to_vec());
        vocab.push_token(b" t".to_vec());
        (vocab, vec![(b" ".to_vec(), b"t".to_vec())])
    }

    #[test]
    fn test_serialize() {
        let (vocab, merges) = sample();
        let saver = TokenizerSaver::new(&vocab, &merges, SplitPattern::NoSplit);
        let serialized = saver.serialize();

        assert_eq!(serialized.vocab.len(), 259);
        assert_eq!(serialized.vocab[&32], "\u{120}");
        assert_eq!(serialized.vocab[&256], "<eos>");
        assert_eq!(serialized.vocab[&258], "\u{120}t");
        assert_eq!(serialized.merges, vec![("\u{120}".to_string(), "t".to_string())]);
        assert_eq!(serialized.special_tokens, vec!["<eos>".to_string()]);
        assert_eq!(serialized.version, FORMAT_VERSION);
    }

    struct FailingFlush;

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("disk full"))
        }
    }

    #[test]
    fn test_flush_error_is_reported() {
        let mut writer = BufWriter::new(FailingFlush);
        writer.write_all(b"{}").unwrap();

        let err = flush(&mut writer, TOKENIZER_FILE).unwrap_err();
        assert!(matches!(err, TokenizerError::Save(ref msg) if msg.contains("disk full")));
    }

    #[test]
    fn test_save_writes_complete_json() {
        let (vocab, merges) = sample();
        let dir = tempfile::tempdir().unwrap();

        TokenizerSaver::new(&vocab, &merges, SplitPattern::Gpt2)
            .save(dir.path())
            .unwrap();

        let json = std::fs::read_to_string(dir.path().join(TOKENIZER_FILE)).unwrap();
        let parsed: SerializedTokenizer = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.vocab.len(), 259);
        assert_eq!(parsed.config.split_pattern, SplitPattern::Gpt2);
    }

    #[test]
    fn test_save_huggingface_files() {
        let (vocab, merges) = sample();
        let dir = tempfile::tempdir().unwrap();

        TokenizerSaver::new(&vocab, &merges, SplitPattern::NoSplit)
            .save_huggingface(dir.path())
            .unwrap();

        let merges_txt = std::fs::read_to_string(dir.path().join(MERGES_FILE)).unwrap();
        assert_eq!(merges_txt, "#version: 0.2\n\u{120} t\n");

        let vocab_json: std::collections::HashMap<String, u32> =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(VOCAB_FILE)).unwrap())
                .unwrap();
        // The duplicate " t" under 258 cannot be represented
        assert_eq!(vocab_json.len(), 258);
        assert_eq!(vocab_json["\u{120}t"], 257);
    }
}
