//! services/api/src/adapters/tokenizer.rs
//!
//! Token estimation with the cl100k_base BPE vocabulary. Counts feed the
//! session usage dashboard only; nothing is truncated or billed from them.

use study_notes_core::ports::{PortError, PortResult, TokenCounter};
use tiktoken_rs::CoreBPE;

pub struct TiktokenCounter {
    bpe: CoreBPE,
}

impl TiktokenCounter {
    /// Loads the cl100k_base encoding. The vocabulary ships with the crate, so
    /// this does not touch the network.
    pub fn cl100k() -> PortResult<Self> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for TiktokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}
