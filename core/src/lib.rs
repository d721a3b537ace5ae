//! `govwatch-core` — governance proposal watcher.
//!
//! Polls a proposal feed, records every proposal it sees in a key-value
//! store, and pushes a notification the first time a proposal id shows up.
//!
//! ## Layout
//! - [`source`]: fetches the current proposal set from the feed.
//! - [`store`]: key-value persistence keyed by `proposal:<id>`.
//! - [`notifier`]: formats and delivers the "new proposal" message.
//! - [`engine`]: one reconciliation cycle over source + store + notifier.
//! - [`scheduler`]: runs the engine on a fixed interval until cancelled.

pub mod config;
pub mod engine;
pub mod errors;
pub mod notifier;
pub mod proposal;
pub mod scheduler;
pub mod source;
pub mod store;

pub use config::WatchConfig;
pub use engine::{CycleOutcome, CycleReport, ProposalOutcome, ReconcileEngine};
pub use errors::{ErrorCategory, ErrorPolicy, Result, WatchError};
pub use notifier::{
    Notifier, TelegramNotifier, format_bounded_notification, format_notification,
};
pub use proposal::{Proposal, ProposalContent, ProposalFeed};
pub use scheduler::Scheduler;
pub use source::{HttpProposalSource, ProposalSource};
pub use store::{MemoryStore, ProposalStore, RedisStore, proposal_key};
