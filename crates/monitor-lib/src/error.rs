//! Error taxonomy for the monitor
//!
//! Three failure classes with distinct handling policies:
//! - `Fetch`: a control-plane query failed; the tick is skipped or
//!   degraded, the run continues (the next tick is the retry).
//! - `Parse`: a malformed quantity string; only the offending pod is
//!   dropped from the snapshot.
//! - `Sink`: the event log cannot be written or flushed; fatal for
//!   the run.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by snapshot collection and event persistence
#[derive(Debug, Error)]
pub enum MonitorError {
    /// A control-plane sub-fetch failed (pod list, metrics, deployment status)
    #[error("fetch failed for {resource}: {reason}")]
    Fetch {
        /// Which sub-fetch failed, e.g. "pod list" or "pod metrics"
        resource: &'static str,
        reason: anyhow::Error,
    },

    /// A resource quantity string could not be parsed
    #[error("cannot parse {what} quantity {raw:?}")]
    Parse { what: &'static str, raw: String },

    /// The event log could not be written or flushed
    #[error("event sink failure on {}: {source}", .path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MonitorError {
    /// Wrap an arbitrary error as a transient fetch failure
    pub fn fetch(resource: &'static str, reason: impl Into<anyhow::Error>) -> Self {
        Self::Fetch {
            resource,
            reason: reason.into(),
        }
    }

    /// True for errors that skip the current tick rather than the run
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Parse { .. })
    }
}
