//! Load functionality for pre-trained tokenizers.

use super::format::{
    ByteMapper, SerializedTokenizer, FORMAT_VERSION, MERGES_FILE, MERGES_HEADER, TOKENIZER_FILE,
    VOCAB_FILE,
};
use bytepair_core::{MergeList, Result, SplitPattern, TokenizerError, Vocabulary};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Everything needed to rebuild a tokenizer.
#[derive(Debug, Clone)]
pub struct TokenizerParts {
    pub vocab: Vocabulary,
    pub merges: MergeList,
    pub special_tokens: Vec<String>,
    pub split_pattern: SplitPattern,
}

/// Tokenizer loader - handles loading trained models.
pub struct TokenizerLoader;

impl TokenizerLoader {
    /// Load a tokenizer from a directory in custom JSON format.
    ///
    /// Expects a `tokenizer.json` file in the given directory.
    pub fn load(path: &Path) -> Result<TokenizerParts> {
        let file_path = path.join(TOKENIZER_FILE);
        let serialized: SerializedTokenizer = serde_json::from_reader(open(&file_path)?)
            .map_err(|e| TokenizerError::Load(format!("Failed to deserialize tokenizer: {}", e)))?;

        if serialized.version != FORMAT_VERSION {
            log::warn!(
                "{} has format version {}, expected {}",
                file_path.display(),
                serialized.version,
                FORMAT_VERSION
            );
        }

        Self::deserialize(serialized)
    }

    /// Load from HuggingFace format (vocab.json + merges.txt).
    ///
    /// The files carry no special-token list; callers pass it to
    /// [`crate::Tokenizer::new`] themselves.
    pub fn load_huggingface(path: &Path) -> Result<(Vocabulary, MergeList)> {
        let mapper = ByteMapper::new();

        let vocab_path = path.join(VOCAB_FILE);
        let vocab_map: HashMap<String, u32> = serde_json::from_reader(open(&vocab_path)?)
            .map_err(|e| TokenizerError::Load(format!("Failed to deserialize vocab: {}", e)))?;

        let mut entries = Vec::with_capacity(vocab_map.len());
        for (token, id) in vocab_map {
            entries.push((id, mapper.decode(&token)?));
        }
        let vocab = build_vocab(entries)?;

        let merges_path = path.join(MERGES_FILE);
        let merges_content = std::fs::read_to_string(&merges_path).map_err(|e| {
            TokenizerError::Load(format!("Failed to read {}: {}", merges_path.display(), e))
        })?;

        let mut merges = MergeList::new();
        for (line_num, line) in merges_content.lines().enumerate() {
            if (line_num == 0 && line.starts_with(MERGES_HEADER)) || line.is_empty() {
                continue;
            }

            let (left, right) = line
                .split_once(' ')
                .filter(|(l, r)| !l.is_empty() && !r.is_empty() && !r.contains(' '))
                .ok_or_else(|| {
                    TokenizerError::Load(format!(
                        "Invalid merge format at line {}: '{}'",
                        line_num + 1,
                        line
                    ))
                })?;
            merges.push((mapper.decode(left)?, mapper.decode(right)?));
        }

        log::info!(
            "Loaded HuggingFace tokenizer: {} tokens, {} merges",
            vocab.len(),
            merges.len()
        );
        Ok((vocab, merges))
    }

    /// Deserialize from a serialized structure.
    pub(crate) fn deserialize(data: SerializedTokenizer) -> Result<TokenizerParts> {
        let mapper = ByteMapper::new();

        let mut entries = Vec::with_capacity(data.vocab.len());
        for (id, token) in data.vocab {
            entries.push((id, mapper.decode(&token)?));
        }
        let vocab = build_vocab(entries)?;

        let mut merges = MergeList::with_capacity(data.merges.len());
        for (left, right) in &data.merges {
            merges.push((mapper.decode(left)?, mapper.decode(right)?));
        }

        Ok(TokenizerParts {
            vocab,
            merges,
            special_tokens: data.special_tokens,
            split_pattern: data.config.split_pattern,
        })
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| {
        TokenizerError::Load(format!("Failed to open file {}: {}", path.display(), e))
    })?;
    Ok(BufReader::new(file))
}

/// Insert entries in ID order so duplicate bytes resolve to the lowest ID.
fn build_vocab(mut entries: Vec<(u32, Vec<u8>)>) -> Result<Vocabulary> {
    entries.sort_by_key(|&(id, _)| id);

    let mut vocab = Vocabulary::with_capacity(entries.len());
    for (id, token) in entries {
        vocab.add_token_with_id(token, id)?;
    }
    Ok(vocab)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::save::TokenizerSaver;

    fn sample() -> (Vocabulary, MergeList) {
        let mut vocab = Vocabulary::initialize(&["<|endoftext|>"]).unwrap();
        vocab.push_token(b"\xe4\xb8".to_vec());
        vocab.push_token(b"\xe4\xb8\x80".to_vec());
        vocab.push_token(b" a".to_vec());
        let merges = vec![
            (b"\xe4".to_vec(), b"\xb8".to_vec()),
            (b"\xe4\xb8".to_vec(), b"\x80".to_vec()),
            (b" ".to_vec(), b"a".to_vec()),
        ];
        (vocab, merges)
    }

    #[test]
    fn test_load_roundtrip() {
        let (vocab, merges) = sample();
        let dir = tempfile::tempdir().unwrap();

        TokenizerSaver::new(&vocab, &merges, SplitPattern::Gpt2)
            .save(dir.path())
            .unwrap();
        let parts = TokenizerLoader::load(dir.path()).unwrap();

        assert_eq!(parts.vocab.entries(), vocab.entries());
        assert_eq!(parts.merges, merges);
        assert_eq!(parts.special_tokens, vec!["<|endoftext|>".to_string()]);
        assert_eq!(parts.split_pattern, SplitPattern::Gpt2);
    }

    #[test]
    fn test_load_huggingface_roundtrip() {
        let (vocab, merges) = sample();
        let dir = tempfile::tempdir().unwrap();

        TokenizerSaver::new(&vocab, &merges, SplitPattern::NoSplit)
            .save_huggingface(dir.path())
            .unwrap();
        let (loaded_vocab, loaded_merges) = TokenizerLoader::load_huggingface(dir.path()).unwrap();

        assert_eq!(loaded_vocab.entries(), vocab.entries());
        assert_eq!(loaded_merges, merges);
    }

    #[test]
    fn test_load_huggingface_rejects_bad_merge_line() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(VOCAB_FILE), r#"{"a": 0, "b": 1}"#).unwrap();
        std::fs::write(dir.path().join(MERGES_FILE), "#version: 0.2\na b\nab\n").unwrap();

        let err = TokenizerLoader::load_huggingface(dir.path()).unwrap_err();
        assert!(matches!(err, TokenizerError::Load(ref msg) if msg.contains("line 3")));
    }

    #[test]
    fn test_load_huggingface_rejects_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(VOCAB_FILE), r#"{"a": 0, "b": 0}"#).unwrap();
        std::fs::write(dir.path().join(MERGES_FILE), "#version: 0.2\n").unwrap();

        let err = TokenizerLoader::load_huggingface(dir.path()).unwrap_err();
        assert!(matches!(err, TokenizerError::InvalidConfig(ref msg) if msg.contains("0")));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TokenizerLoader::load(dir.path()).unwrap_err();
        assert!(matches!(err, TokenizerError::Load(_)));
    }
}
