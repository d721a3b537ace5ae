//! In-process proposal store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ProposalStore, decode_record, encode_record};
use crate::errors::Result;
use crate::proposal::Proposal;

/// Map-backed store holding the same JSON bytes a remote store would.
/// Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Stored keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.records.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Raw bytes stored under `key`.
    pub async fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.records.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl ProposalStore for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.records.lock().await.contains_key(key))
    }

    async fn get(&self, key: &str) -> Result<Option<Proposal>> {
        let records = self.records.lock().await;
        records
            .get(key)
            .map(|bytes| decode_record(key, bytes))
            .transpose()
    }

    async fn put(&self, key: &str, proposal: &Proposal) -> Result<()> {
        let bytes = encode_record(proposal)?;
        self.records.lock().await.insert(key.to_string(), bytes);
        Ok(())
    }
}
