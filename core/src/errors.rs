//! Error taxonomy for the watcher.
//!
//! Every error carries a category, and every category maps to exactly one
//! handling policy. The engine consults [`ErrorCategory::policy`] instead of
//! deciding per call site whether a failure is fatal.

use thiserror::Error;

/// Error category for structured logging and behavior mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Config file missing, unreadable, or invalid
    Config,
    /// Feed request failed at the transport or HTTP status level
    Fetch,
    /// Feed body did not decode into the expected envelope
    Parse,
    /// Store unreachable or a command failed
    Store,
    /// Proposal could not be serialized to (or read back from) its stored form
    Encode,
    /// Notification delivery failed
    Notify,
}

/// What the caller does when an error of a given category surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Terminate the process (startup only).
    Fatal,
    /// Stop the current cycle; the next scheduled cycle starts from scratch.
    AbortCycle,
    /// Skip the current proposal and keep going with the rest of the batch.
    SkipProposal,
    /// Log and carry on; nothing else is affected.
    LogOnly,
}

impl ErrorCategory {
    /// Machine-readable code for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "CONFIG_ERROR",
            Self::Fetch => "FETCH_ERROR",
            Self::Parse => "PARSE_ERROR",
            Self::Store => "STORE_ERROR",
            Self::Encode => "ENCODE_ERROR",
            Self::Notify => "NOTIFY_ERROR",
        }
    }

    pub fn policy(&self) -> ErrorPolicy {
        match self {
            Self::Config => ErrorPolicy::Fatal,
            Self::Fetch | Self::Parse => ErrorPolicy::AbortCycle,
            Self::Store | Self::Encode => ErrorPolicy::SkipProposal,
            Self::Notify => ErrorPolicy::LogOnly,
        }
    }
}

pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("fetch error: {message}")]
    Fetch {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("store error: {message}")]
    Store {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("encode error: {message}")]
    Encode {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("notify error: {message}")]
    Notify {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl WatchError {
    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config { .. } => ErrorCategory::Config,
            Self::Fetch { .. } => ErrorCategory::Fetch,
            Self::Parse { .. } => ErrorCategory::Parse,
            Self::Store { .. } => ErrorCategory::Store,
            Self::Encode { .. } => ErrorCategory::Encode,
            Self::Notify { .. } => ErrorCategory::Notify,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
            source: None,
        }
    }

    pub fn fetch_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Fetch {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn parse_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Parse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            source: None,
        }
    }

    pub fn store_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Store {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn encode_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Encode {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn notify(message: impl Into<String>) -> Self {
        Self::Notify {
            message: message.into(),
            source: None,
        }
    }

    pub fn notify_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Notify {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type for watcher operations
pub type Result<T> = std::result::Result<T, WatchError>;
