//! Transfer limits for download runs.
//!
//! Bounds network work through:
//! - A per-transfer timeout
//! - A timeout for the whole download phase
//! - The number of transfers in flight

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Limits applied to every run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLimits {
    /// Per-transfer timeout in seconds (default: 120)
    #[serde(default = "default_transfer_timeout")]
    pub transfer_timeout_seconds: u64,

    /// Download phase timeout in seconds (default: 3600 = 1 hour)
    #[serde(default = "default_run_timeout")]
    pub run_timeout_seconds: u64,

    /// Transfers in flight at once (default: 1, strictly sequential)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_transfer_timeout() -> u64 {
    120
}
fn default_run_timeout() -> u64 {
    3600
} // 1 hour
fn default_concurrency() -> usize {
    1
}

impl Default for TransferLimits {
    fn default() -> Self {
        Self {
            transfer_timeout_seconds: default_transfer_timeout(),
            run_timeout_seconds: default_run_timeout(),
            concurrency: default_concurrency(),
        }
    }
}

impl TransferLimits {
    /// Upper bound on parallel transfers
    pub const MAX_CONCURRENCY: usize = 4;

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_seconds)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_seconds)
    }

    /// Clamp values into their supported ranges
    pub fn normalized(self) -> Self {
        let concurrency = self.concurrency.clamp(1, Self::MAX_CONCURRENCY);
        if concurrency != self.concurrency {
            warn!(
                requested = self.concurrency,
                used = concurrency,
                "Concurrency out of range, clamping"
            );
        }

        Self {
            transfer_timeout_seconds: self.transfer_timeout_seconds.max(1),
            run_timeout_seconds: self.run_timeout_seconds.max(1),
            concurrency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = TransferLimits::default();
        assert_eq!(limits.transfer_timeout(), Duration::from_secs(120));
        assert_eq!(limits.run_timeout(), Duration::from_secs(3600));
        assert_eq!(limits.concurrency, 1);
    }

    #[test]
    fn test_normalized_clamps() {
        let limits = TransferLimits {
            transfer_timeout_seconds: 0,
            run_timeout_seconds: 10,
            concurrency: 0,
        }
        .normalized();

        assert_eq!(limits.transfer_timeout_seconds, 1);
        assert_eq!(limits.concurrency, 1);

        let limits = TransferLimits {
            concurrency: 16,
            ..Default::default()
        }
        .normalized();
        assert_eq!(limits.concurrency, TransferLimits::MAX_CONCURRENCY);
    }

    #[test]
    fn test_serde_defaults() {
        let limits: TransferLimits = serde_json::from_str(r#"{ "concurrency": 2 }"#).unwrap();
        assert_eq!(limits.concurrency, 2);
        assert_eq!(limits.transfer_timeout_seconds, 120);
    }
}
