//! Log of tracked customer interactions and its in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::CampaignId;
use domain::{ErrorKind, TrackedEvent, TrackedEventKind};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::period::TimePeriod;

/// Errors raised by a tracked event log.
#[derive(Debug, Error)]
pub enum TrackedEventError {
    #[error("Tracked event log unavailable: {0}")]
    Unavailable(String),
}

impl TrackedEventError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrackedEventError::Unavailable(_) => ErrorKind::Infrastructure,
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackedEventError>;

/// Append-only storage of the interactions folded into campaign metrics.
///
/// The campaign aggregate keeps running totals; the log keeps the individual
/// events so totals can be rebuilt for any time window.
#[async_trait]
pub trait TrackedEventRepository: Send + Sync {
    async fn append(&self, campaign_id: CampaignId, event: &TrackedEvent) -> Result<()>;

    /// Most recent events first, at most `limit`.
    async fn find_by_campaign(
        &self,
        campaign_id: CampaignId,
        limit: usize,
    ) -> Result<Vec<TrackedEvent>>;

    /// Most recent events of one kind first, at most `limit`.
    async fn find_by_campaign_and_kind(
        &self,
        campaign_id: CampaignId,
        kind: TrackedEventKind,
        limit: usize,
    ) -> Result<Vec<TrackedEvent>>;

    async fn count_by_campaign(&self, campaign_id: CampaignId) -> Result<u64>;

    /// Events that occurred within the period, oldest first.
    async fn find_in_period(
        &self,
        campaign_id: CampaignId,
        period: &TimePeriod,
    ) -> Result<Vec<TrackedEvent>>;
}

/// In-memory tracked event log for testing and embedding.
///
/// Cloning shares the underlying storage.
#[derive(Clone, Default)]
pub struct InMemoryTrackedEventRepository {
    events: Arc<RwLock<HashMap<CampaignId, Vec<TrackedEvent>>>>,
    fail_on_append: Arc<AtomicBool>,
}

impl InMemoryTrackedEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent append fail with `Unavailable` until reset.
    pub fn set_fail_on_append(&self, fail: bool) {
        self.fail_on_append.store(fail, Ordering::SeqCst);
    }

    /// Total number of events across all campaigns.
    pub async fn len(&self) -> usize {
        self.events.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn newest_first(
        &self,
        campaign_id: CampaignId,
        limit: usize,
        keep: impl Fn(&TrackedEvent) -> bool + Send,
    ) -> Vec<TrackedEvent> {
        let store = self.events.read().await;
        let Some(events) = store.get(&campaign_id) else {
            return Vec::new();
        };
        let mut found: Vec<_> = events.iter().filter(|&e| keep(e)).cloned().collect();
        found.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        found.truncate(limit);
        found
    }
}

#[async_trait]
impl TrackedEventRepository for InMemoryTrackedEventRepository {
    async fn append(&self, campaign_id: CampaignId, event: &TrackedEvent) -> Result<()> {
        if self.fail_on_append.load(Ordering::SeqCst) {
            return Err(TrackedEventError::Unavailable(
                "append rejected by test toggle".to_string(),
            ));
        }
        self.events
            .write()
            .await
            .entry(campaign_id)
            .or_default()
            .push(event.clone());
        Ok(())
    }

    async fn find_by_campaign(
        &self,
        campaign_id: CampaignId,
        limit: usize,
    ) -> Result<Vec<TrackedEvent>> {
        Ok(self.newest_first(campaign_id, limit, |_| true).await)
    }

    async fn find_by_campaign_and_kind(
        &self,
        campaign_id: CampaignId,
        kind: TrackedEventKind,
        limit: usize,
    ) -> Result<Vec<TrackedEvent>> {
        Ok(self
            .newest_first(campaign_id, limit, |e| e.kind == kind)
            .await)
    }

    async fn count_by_campaign(&self, campaign_id: CampaignId) -> Result<u64> {
        Ok(self
            .events
            .read()
            .await
            .get(&campaign_id)
            .map_or(0, |events| events.len() as u64))
    }

    async fn find_in_period(
        &self,
        campaign_id: CampaignId,
        period: &TimePeriod,
    ) -> Result<Vec<TrackedEvent>> {
        let store = self.events.read().await;
        let mut found: Vec<_> = store
            .get(&campaign_id)
            .into_iter()
            .flatten()
            .filter(|e| period.contains(e.occurred_at))
            .cloned()
            .collect();
        found.sort_by_key(|e| e.occurred_at);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn click_at(minutes_ago: i64) -> TrackedEvent {
        let mut event = TrackedEvent::click();
        event.occurred_at = Utc::now() - Duration::minutes(minutes_ago);
        event
    }

    #[tokio::test]
    async fn test_append_and_find_newest_first() {
        let log = InMemoryTrackedEventRepository::new();
        let id = CampaignId::new();
        let older = click_at(30);
        let newer = click_at(5);

        log.append(id, &older).await.unwrap();
        log.append(id, &newer).await.unwrap();
        log.append(CampaignId::new(), &click_at(1)).await.unwrap();

        let found = log.find_by_campaign(id, 10).await.unwrap();
        assert_eq!(found, vec![newer.clone(), older]);
        assert_eq!(log.find_by_campaign(id, 1).await.unwrap(), vec![newer]);
        assert_eq!(log.count_by_campaign(id).await.unwrap(), 2);
        assert_eq!(log.len().await, 3);
    }

    #[tokio::test]
    async fn test_find_by_kind() {
        let log = InMemoryTrackedEventRepository::new();
        let id = CampaignId::new();
        log.append(id, &TrackedEvent::impression()).await.unwrap();
        log.append(id, &TrackedEvent::click()).await.unwrap();
        log.append(id, &TrackedEvent::impression()).await.unwrap();

        let impressions = log
            .find_by_campaign_and_kind(id, TrackedEventKind::Impression, 10)
            .await
            .unwrap();
        assert_eq!(impressions.len(), 2);
        assert!(
            impressions
                .iter()
                .all(|e| e.kind == TrackedEventKind::Impression)
        );
    }

    #[tokio::test]
    async fn test_find_in_period_is_oldest_first() {
        let log = InMemoryTrackedEventRepository::new();
        let id = CampaignId::new();
        for minutes_ago in [5, 90, 30, 200] {
            log.append(id, &click_at(minutes_ago)).await.unwrap();
        }

        let now = Utc::now();
        let period = TimePeriod::new(now - Duration::minutes(120), now);
        let found = log.find_in_period(id, &period).await.unwrap();

        assert_eq!(found.len(), 3);
        assert!(found.windows(2).all(|w| w[0].occurred_at <= w[1].occurred_at));
        assert!(
            log.find_in_period(CampaignId::new(), &period)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_fail_on_append() {
        let log = InMemoryTrackedEventRepository::new();
        log.set_fail_on_append(true);

        let err = log
            .append(CampaignId::new(), &TrackedEvent::click())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert!(log.is_empty().await);
    }
}
