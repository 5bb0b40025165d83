//! Run state and per-item outcomes.
//!
//! A Run is one pass over a manifest: folders are provisioned first, then
//! every requested variant is attempted.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::download::Variant;

/// State of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Not started
    Pending,

    /// Ensuring target folders exist
    Provisioning,

    /// All folders exist, no transfer started yet
    Provisioned,

    /// Transfers in progress
    Downloading,

    /// Every item was attempted
    Completed,

    /// Stopped by a fatal condition
    Aborted,
}

impl Default for RunState {
    fn default() -> Self {
        Self::Pending
    }
}

impl RunState {
    /// Whether moving to `next` is a legal transition
    pub fn can_transition_to(self, next: RunState) -> bool {
        matches!(
            (self, next),
            (RunState::Pending, RunState::Provisioning)
                | (RunState::Provisioning, RunState::Provisioned)
                | (RunState::Provisioning, RunState::Aborted)
                | (RunState::Provisioned, RunState::Downloading)
                | (RunState::Downloading, RunState::Completed)
                | (RunState::Downloading, RunState::Aborted)
        )
    }
}

/// What happened to one requested variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ItemStatus {
    /// Written to disk
    Downloaded { destination: PathBuf, bytes: u64 },

    /// Not attempted (unknown library, missing variant, duplicate destination)
    Skipped { reason: String },

    /// Transfer attempted and failed
    Failed { error: String },
}

/// Outcome of a single library variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub section: String,
    pub library: String,

    /// Requested variant (absent when the library itself was skipped)
    pub variant: Option<Variant>,

    pub status: ItemStatus,
}

impl ItemOutcome {
    pub fn is_downloaded(&self) -> bool {
        matches!(self.status, ItemStatus::Downloaded { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, ItemStatus::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, ItemStatus::Failed { .. })
    }
}

/// Completion signal for a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub run_id: Uuid,
    pub state: RunState,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,

    /// Outcomes in plan order
    pub outcomes: Vec<ItemOutcome>,
}

impl Completion {
    pub fn downloaded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_downloaded()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    /// True when nothing failed or was skipped
    pub fn is_clean(&self) -> bool {
        self.failed() == 0 && self.skipped() == 0
    }

    /// Outcomes for one library, in order
    pub fn outcomes_for<'a>(&'a self, library: &'a str) -> impl Iterator<Item = &'a ItemOutcome> {
        self.outcomes.iter().filter(move |o| o.library == library)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        assert!(RunState::Pending.can_transition_to(RunState::Provisioning));
        assert!(RunState::Provisioning.can_transition_to(RunState::Aborted));
        assert!(RunState::Downloading.can_transition_to(RunState::Completed));

        assert!(!RunState::Pending.can_transition_to(RunState::Downloading));
        assert!(!RunState::Completed.can_transition_to(RunState::Downloading));
        assert!(!RunState::Provisioned.can_transition_to(RunState::Completed));
    }

    #[test]
    fn test_completion_counters() {
        let outcome = |library: &str, status: ItemStatus| ItemOutcome {
            section: "./js/".to_string(),
            library: library.to_string(),
            variant: Some(Variant::Original),
            status,
        };

        let completion = Completion {
            run_id: Uuid::new_v4(),
            state: RunState::Completed,
            started_at: Utc::now(),
            completed_at: Utc::now(),
            outcomes: vec![
                outcome(
                    "jquery",
                    ItemStatus::Downloaded {
                        destination: PathBuf::from("/p/js/jquery.js"),
                        bytes: 10,
                    },
                ),
                outcome(
                    "nope",
                    ItemStatus::Skipped {
                        reason: "not in catalog".to_string(),
                    },
                ),
                outcome(
                    "angular",
                    ItemStatus::Failed {
                        error: "HTTP 404".to_string(),
                    },
                ),
            ],
        };

        assert_eq!(completion.downloaded(), 1);
        assert_eq!(completion.skipped(), 1);
        assert_eq!(completion.failed(), 1);
        assert!(!completion.is_clean());
        assert_eq!(completion.outcomes_for("jquery").count(), 1);
    }

    #[test]
    fn test_item_status_serialization() {
        let status = ItemStatus::Skipped {
            reason: "duplicate".to_string(),
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"status\":\"skipped\""));
    }
}
