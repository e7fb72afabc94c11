//! Targeting port and in-memory implementation.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::RuleId;
use domain::ErrorKind;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum TargetingError {
    /// The targeting system does not know or accept these rules.
    #[error("Invalid targeting rules: {}", format_rules(.0))]
    InvalidRules(Vec<RuleId>),

    #[error("Targeting service unavailable: {0}")]
    Unavailable(String),
}

impl TargetingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TargetingError::InvalidRules(_) => ErrorKind::Validation,
            TargetingError::Unavailable(_) => ErrorKind::Infrastructure,
        }
    }
}

fn format_rules(rules: &[RuleId]) -> String {
    rules
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Checks targeting rule references against the targeting system.
#[async_trait]
pub trait TargetingService: Send + Sync {
    /// Succeeds if every rule is known and usable.
    async fn validate_targeting_rules(&self, rules: &[RuleId]) -> Result<(), TargetingError>;
}

/// In-memory targeting service for testing.
///
/// Accepts every rule unless it was marked unknown.
#[derive(Clone, Default)]
pub struct InMemoryTargetingService {
    unknown: Arc<RwLock<HashSet<RuleId>>>,
    fail: Arc<AtomicBool>,
}

impl InMemoryTargetingService {
    /// Creates a new targeting service that accepts every rule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the service reject the rule.
    pub async fn mark_unknown(&self, rule: RuleId) {
        self.unknown.write().await.insert(rule);
    }

    /// Makes every subsequent call fail with `Unavailable` until reset.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TargetingService for InMemoryTargetingService {
    async fn validate_targeting_rules(&self, rules: &[RuleId]) -> Result<(), TargetingError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TargetingError::Unavailable(
                "targeting rejected by test toggle".to_string(),
            ));
        }

        let unknown = self.unknown.read().await;
        let rejected: Vec<RuleId> = rules
            .iter()
            .filter(|r| unknown.contains(*r))
            .copied()
            .collect();
        if rejected.is_empty() {
            Ok(())
        } else {
            Err(TargetingError::InvalidRules(rejected))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accepts_unmarked_rules() {
        let service = InMemoryTargetingService::new();
        let rules = vec![RuleId::new(), RuleId::new()];
        assert!(service.validate_targeting_rules(&rules).await.is_ok());
    }

    #[tokio::test]
    async fn test_rejects_unknown_rules() {
        let service = InMemoryTargetingService::new();
        let known = RuleId::new();
        let unknown = RuleId::new();
        service.mark_unknown(unknown).await;

        let err = service
            .validate_targeting_rules(&[known, unknown])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        match err {
            TargetingError::InvalidRules(rules) => assert_eq!(rules, vec![unknown]),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fail_toggle() {
        let service = InMemoryTargetingService::new();
        service.set_fail(true);

        let err = service
            .validate_targeting_rules(&[RuleId::new()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
    }
}
