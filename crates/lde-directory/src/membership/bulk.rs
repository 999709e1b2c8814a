//! Bulk Operation Coordinator
//!
//! Runs a single-target membership operation once per target, in order, and
//! reports partial failure instead of aborting. Nothing is rolled back: the
//! targets that succeeded stay applied.

use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::warn;
use utoipa::ToSchema;

use crate::shared::error::{DirectoryError, Result};

/// One target that failed inside a bulk call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BulkItemFailure {
    pub target_id: String,
    pub error: String,
}

/// Result of a bulk call that succeeded for at least one target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BulkOutcome {
    pub success_count: usize,
    /// Targets that failed; empty on full success
    pub failures: Vec<BulkItemFailure>,
}

impl BulkOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Apply `op` to every target sequentially.
///
/// Fails with [`DirectoryError::BulkFailure`] when no target succeeded,
/// which includes an empty target list.
pub async fn bulk_apply<F, Fut>(targets: &[String], failure_message: &str, mut op: F) -> Result<BulkOutcome>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut outcome = BulkOutcome::default();

    for target in targets {
        match op(target.clone()).await {
            Ok(()) => outcome.success_count += 1,
            Err(err) => outcome.failures.push(BulkItemFailure {
                target_id: target.clone(),
                error: err.to_string(),
            }),
        }
    }

    if outcome.success_count == 0 {
        return Err(DirectoryError::BulkFailure {
            message: failure_message.to_string(),
            failures: outcome.failures,
        });
    }

    if !outcome.is_complete() {
        warn!(
            succeeded = outcome.success_count,
            failed = outcome.failures.len(),
            "Bulk operation completed with failures"
        );
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EntityKind;

    fn targets(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    async fn fail_on(missing: &'static [&'static str], target: String) -> Result<()> {
        if missing.contains(&target.as_str()) {
            Err(DirectoryError::not_found(EntityKind::User, target))
        } else {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_all_succeed() {
        let outcome = bulk_apply(&targets(&["u1", "u2"]), "failed", |t| fail_on(&[], t))
            .await
            .unwrap();
        assert_eq!(outcome.success_count, 2);
        assert!(outcome.is_complete());
    }

    #[tokio::test]
    async fn test_partial_failure_is_success() {
        let outcome = bulk_apply(&targets(&["u1", "u2", "u3"]), "failed", |t| fail_on(&["u2"], t))
            .await
            .unwrap();
        assert_eq!(outcome.success_count, 2);
        assert_eq!(
            outcome.failures,
            vec![BulkItemFailure {
                target_id: "u2".to_string(),
                error: "user not found: u2".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_zero_successes_fail() {
        let err = bulk_apply(&targets(&["u1", "u2"]), "nothing applied", |t| fail_on(&["u1", "u2"], t))
            .await
            .unwrap_err();
        match err {
            DirectoryError::BulkFailure { message, failures } => {
                assert_eq!(message, "nothing applied");
                assert_eq!(failures.len(), 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_targets_fail() {
        let err = bulk_apply(&[], "nothing applied", |t| fail_on(&[], t)).await.unwrap_err();
        assert_eq!(err.code(), "BULK_FAILURE");
    }

    #[tokio::test]
    async fn test_targets_run_in_order() {
        let mut seen = Vec::new();
        bulk_apply(&targets(&["c", "a", "b"]), "failed", |t| {
            seen.push(t);
            async { Ok(()) }
        })
        .await
        .unwrap();
        assert_eq!(seen, targets(&["c", "a", "b"]));
    }
}
