//! Persistence for seen proposals.
//!
//! ## Key Layout
//!
//! ```text
//! proposal:{proposal_id}   JSON-encoded Proposal, no expiry
//! ```
//!
//! The store is the only record of which proposals have been observed.
//! Records are created on first sight, overwritten on every later sight, and
//! never deleted.

mod memory;
mod redis_store;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

use async_trait::async_trait;

use crate::errors::{Result, WatchError};
use crate::proposal::Proposal;

/// Namespace prefix for proposal records.
pub const KEY_PREFIX: &str = "proposal:";

/// Store key for a proposal id.
pub fn proposal_key(proposal_id: &str) -> String {
    format!("{KEY_PREFIX}{proposal_id}")
}

/// Key-value store of seen proposals.
///
/// `exists` followed by `put` is not atomic. Callers get correct new/seen
/// decisions only while a single worker reconciles at a time; parallel
/// reconciliation needs per-key mutual exclusion around the pair.
#[async_trait]
pub trait ProposalStore: Send + Sync {
    /// Whether a record exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Read back the record under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Proposal>>;

    /// Upsert `proposal` under `key` with no expiry.
    async fn put(&self, key: &str, proposal: &Proposal) -> Result<()>;
}

pub(crate) fn encode_record(proposal: &Proposal) -> Result<Vec<u8>> {
    serde_json::to_vec(proposal).map_err(|e| {
        WatchError::encode_with_source(
            format!("serializing proposal {} failed", proposal.proposal_id),
            e,
        )
    })
}

pub(crate) fn decode_record(key: &str, bytes: &[u8]) -> Result<Proposal> {
    serde_json::from_slice(bytes)
        .map_err(|e| WatchError::encode_with_source(format!("record at {key} does not decode"), e))
}
