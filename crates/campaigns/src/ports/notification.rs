//! Notification port and in-memory implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::CampaignId;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::alerts::{BudgetAlert, PerformanceAlert};

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Delivers campaign notifications to people.
///
/// Every call is best-effort from the service's point of view: a failure is
/// logged and never undoes the operation that triggered it.
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send_performance_alert(
        &self,
        campaign_id: CampaignId,
        alert: &PerformanceAlert,
    ) -> Result<(), NotificationError>;

    async fn send_budget_alert(
        &self,
        campaign_id: CampaignId,
        alert: &BudgetAlert,
    ) -> Result<(), NotificationError>;

    async fn send_campaign_started(&self, campaign_id: CampaignId)
    -> Result<(), NotificationError>;

    async fn send_campaign_ended(&self, campaign_id: CampaignId) -> Result<(), NotificationError>;
}

/// A notification recorded by [`InMemoryNotificationService`].
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    PerformanceAlert(CampaignId, PerformanceAlert),
    BudgetAlert(CampaignId, BudgetAlert),
    CampaignStarted(CampaignId),
    CampaignEnded(CampaignId),
}

impl Notification {
    pub fn campaign_id(&self) -> CampaignId {
        match self {
            Notification::PerformanceAlert(id, _)
            | Notification::BudgetAlert(id, _)
            | Notification::CampaignStarted(id)
            | Notification::CampaignEnded(id) => *id,
        }
    }
}

/// In-memory notification service for testing.
///
/// Records every notification it accepts, in send order.
#[derive(Clone, Default)]
pub struct InMemoryNotificationService {
    sent: Arc<RwLock<Vec<Notification>>>,
    fail_on_send: Arc<AtomicBool>,
}

impl InMemoryNotificationService {
    /// Creates a new notification service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent send fail until reset.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.fail_on_send.store(fail, Ordering::SeqCst);
    }

    /// Returns every recorded notification in send order.
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.read().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.read().await.len()
    }

    /// Returns the recorded notifications for one campaign.
    pub async fn sent_for(&self, campaign_id: CampaignId) -> Vec<Notification> {
        self.sent
            .read()
            .await
            .iter()
            .filter(|n| n.campaign_id() == campaign_id)
            .cloned()
            .collect()
    }

    pub async fn clear(&self) {
        self.sent.write().await.clear();
    }

    async fn record(&self, notification: Notification) -> Result<(), NotificationError> {
        if self.fail_on_send.load(Ordering::SeqCst) {
            return Err(NotificationError::Delivery(
                "send rejected by test toggle".to_string(),
            ));
        }
        self.sent.write().await.push(notification);
        Ok(())
    }
}

#[async_trait]
impl NotificationService for InMemoryNotificationService {
    async fn send_performance_alert(
        &self,
        campaign_id: CampaignId,
        alert: &PerformanceAlert,
    ) -> Result<(), NotificationError> {
        self.record(Notification::PerformanceAlert(campaign_id, alert.clone()))
            .await
    }

    async fn send_budget_alert(
        &self,
        campaign_id: CampaignId,
        alert: &BudgetAlert,
    ) -> Result<(), NotificationError> {
        self.record(Notification::BudgetAlert(campaign_id, alert.clone()))
            .await
    }

    async fn send_campaign_started(
        &self,
        campaign_id: CampaignId,
    ) -> Result<(), NotificationError> {
        self.record(Notification::CampaignStarted(campaign_id)).await
    }

    async fn send_campaign_ended(&self, campaign_id: CampaignId) -> Result<(), NotificationError> {
        self.record(Notification::CampaignEnded(campaign_id)).await
    }
}
