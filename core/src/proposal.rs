//! Proposal records as reported by the feed.
//!
//! The stored form of a proposal is the same JSON object the feed returns for
//! it (minus unknown fields), so a record read back from the store decodes
//! with the same type.

use serde::{Deserialize, Serialize};

/// Feed envelope: `{ "proposals": [ ... ] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalFeed {
    #[serde(default)]
    pub proposals: Vec<Proposal>,
}

/// One governance proposal. Two proposals with the same `proposal_id` are the
/// same logical proposal regardless of their content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub proposal_id: String,
    #[serde(default)]
    pub content: ProposalContent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl Proposal {
    pub fn new(
        proposal_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            proposal_id: proposal_id.into(),
            content: ProposalContent {
                title: title.into(),
                description: description.into(),
            },
        }
    }

    pub fn title(&self) -> &str {
        &self.content.title
    }

    pub fn description(&self) -> &str {
        &self.content.description
    }
}
