//! ReconcileEngine — one fetch → dedup → notify pass.
//!
//! The engine owns no state of its own. Whether a proposal is new is decided
//! entirely by the store: a proposal is new when its key is absent right
//! before this cycle writes it.
//!
//! ## Per-proposal sequence
//!
//! ```text
//! key  = proposal:<id>
//! seen = store.exists(key)     Store error  -> skip proposal
//! store.put(key, proposal)     Store/Encode -> skip proposal, no notification
//! if !seen: notifier.notify()  Notify error -> logged only
//! ```
//!
//! The write happens for seen proposals too, so edits to title or description
//! are picked up, but only the first sighting of an id ever notifies.

use std::sync::Arc;

use crate::errors::{ErrorPolicy, Result, WatchError};
use crate::notifier::Notifier;
use crate::proposal::Proposal;
use crate::source::ProposalSource;
use crate::store::{ProposalStore, proposal_key};

/// What happened to one fetched proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalOutcome {
    /// First sighting: stored, notification attempted.
    New { delivered: bool },
    /// Already known: record overwritten, no notification.
    Refreshed,
}

/// Counts for a completed cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub new: usize,
    pub refreshed: usize,
    /// Proposals dropped for this cycle because of a store or encode error.
    pub skipped: usize,
    /// New proposals whose notification could not be delivered.
    pub notify_failed: usize,
}

#[derive(Debug)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// The feed could not be fetched or decoded; nothing was processed.
    Aborted(WatchError),
}

impl CycleOutcome {
    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Aborted(_) => None,
        }
    }
}

/// Reconciles the feed against the store and notifies on new proposals.
///
/// Collaborators are constructed once at startup and shared for the life of
/// the process.
pub struct ReconcileEngine {
    source: Arc<dyn ProposalSource>,
    store: Arc<dyn ProposalStore>,
    notifier: Arc<dyn Notifier>,
    explorer_base_url: String,
}

impl ReconcileEngine {
    pub fn new(
        source: Arc<dyn ProposalSource>,
        store: Arc<dyn ProposalStore>,
        notifier: Arc<dyn Notifier>,
        explorer_base_url: impl Into<String>,
    ) -> Self {
        Self {
            source,
            store,
            notifier,
            explorer_base_url: explorer_base_url.into(),
        }
    }

    /// Run one cycle. Per-proposal failures never abort the cycle; only a
    /// failed fetch does.
    pub async fn run_cycle(&self) -> CycleOutcome {
        tracing::info!("Fetching proposals");
        let proposals = match self.source.fetch().await {
            Ok(proposals) => proposals,
            Err(e) => {
                tracing::error!(
                    error_category = e.category().as_str(),
                    "Cycle aborted: {e}"
                );
                return CycleOutcome::Aborted(e);
            }
        };

        let mut report = CycleReport {
            fetched: proposals.len(),
            ..CycleReport::default()
        };

        for proposal in &proposals {
            match self.process(proposal).await {
                Ok(ProposalOutcome::New { delivered }) => {
                    report.new += 1;
                    if !delivered {
                        report.notify_failed += 1;
                    }
                }
                Ok(ProposalOutcome::Refreshed) => report.refreshed += 1,
                Err(e) => self.handle_item_error(proposal, &e, &mut report),
            }
        }

        tracing::info!(
            fetched = report.fetched,
            new = report.new,
            refreshed = report.refreshed,
            skipped = report.skipped,
            notify_failed = report.notify_failed,
            "Cycle complete"
        );
        CycleOutcome::Completed(report)
    }

    async fn process(&self, proposal: &Proposal) -> Result<ProposalOutcome> {
        let key = proposal_key(&proposal.proposal_id);
        let seen = self.store.exists(&key).await?;
        self.store.put(&key, proposal).await?;

        if seen {
            tracing::debug!(proposal_id = %proposal.proposal_id, "Refreshed known proposal");
            return Ok(ProposalOutcome::Refreshed);
        }

        tracing::info!(
            proposal_id = %proposal.proposal_id,
            title = %proposal.title(),
            "New proposal"
        );
        let delivered = match self.notifier.notify(proposal, &self.explorer_base_url).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    proposal_id = %proposal.proposal_id,
                    error_category = e.category().as_str(),
                    "Notification failed: {e}"
                );
                false
            }
        };
        Ok(ProposalOutcome::New { delivered })
    }

    fn handle_item_error(&self, proposal: &Proposal, err: &WatchError, report: &mut CycleReport) {
        let category = err.category();
        // `process` only surfaces store and encode errors.
        debug_assert_eq!(
            category.policy(),
            ErrorPolicy::SkipProposal,
            "unexpected {} while processing a proposal",
            category.as_str()
        );
        report.skipped += 1;
        tracing::warn!(
            proposal_id = %proposal.proposal_id,
            error_category = category.as_str(),
            "Skipping proposal: {err}"
        );
    }
}
