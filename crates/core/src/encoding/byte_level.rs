//! Byte-level BPE encoding.
//!
//! Text is converted to UTF-8 bytes, each byte starts as its own token, the
//! merge rules are applied, and every resulting byte token is mapped to its
//! id through the reverse vocabulary. Decoding concatenates the raw bytes of
//! each id and decodes them as UTF-8 with replacement.

use crate::core::{MergeRules, Vocabulary};
use crate::Result;
use std::sync::Arc;

/// Byte-level BPE encoder.
///
/// The vocabulary and merge rules are shared read-only through `Arc`, so an
/// encoder can be cloned cheaply and used from several threads at once.
#[derive(Debug, Clone)]
pub struct ByteLevelEncoder {
    /// Vocabulary for id lookups in both directions
    vocab: Arc<Vocabulary>,
    /// Ranked merge rules
    merges: Arc<MergeRules>,
}

impl ByteLevelEncoder {
    /// Create a new byte-level encoder.
    pub fn new(vocab: Vocabulary, merges: MergeRules) -> Self {
        Self::with_arcs(Arc::new(vocab), Arc::new(merges))
    }

    /// Create an encoder over already shared vocabulary and merges.
    pub fn with_arcs(vocab: Arc<Vocabulary>, merges: Arc<MergeRules>) -> Self {
        Self { vocab, merges }
    }

    /// The vocabulary used for lookups.
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// The ranked merge rules.
    pub fn merges(&self) -> &MergeRules {
        &self.merges
    }

    /// Encode raw bytes to token IDs.
    ///
    /// Fails with `UnknownToken` if a merged token has no vocabulary entry,
    /// which means the vocabulary and merge list do not belong together.
    pub fn encode_bytes(&self, bytes: &[u8]) -> Result<Vec<u32>> {
        let mut ids = Vec::with_capacity(bytes.len());
        self.encode_bytes_into(bytes, &mut ids)?;
        Ok(ids)
    }

    /// Encode raw bytes, appending the IDs to `ids`.
    pub fn encode_bytes_into(&self, bytes: &[u8], ids: &mut Vec<u32>) -> Result<()> {
        for span in self.merges.apply_bytes(bytes) {
            ids.push(self.vocab.token_id(&bytes[span])?);
        }
        Ok(())
    }

    /// Concatenate the raw bytes of each ID.
    ///
    /// IDs missing from the vocabulary are skipped.
    pub fn decode_bytes(&self, ids: &[u32]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ids.len() * 4);
        for &id in ids {
            if let Some(token) = self.vocab.get_token(id) {
                bytes.extend_from_slice(token);
            }
        }
        bytes
    }

    /// Decode token IDs back to text.
    ///
    /// Unknown IDs are skipped and malformed UTF-8 becomes U+FFFD; decoding
    /// never fails.
    pub fn decode(&self, ids: &[u32]) -> String {
        String::from_utf8_lossy(&self.decode_bytes(ids)).into_owned()
    }
}
