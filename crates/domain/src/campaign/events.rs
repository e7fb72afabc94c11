//! Campaign domain events.

use chrono::{DateTime, Utc};
use common::{CampaignId, CustomerId, RuleId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::aggregate::DomainEvent;
use crate::money::Money;

use super::{CampaignSettings, CampaignStatus, CampaignType, TrackedEventKind};

/// Events that can occur on a campaign aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CampaignEvent {
    /// Campaign was created in draft.
    CampaignCreated(CampaignCreatedData),

    /// Draft campaign went live.
    CampaignActivated(CampaignActivatedData),

    /// Active campaign was paused.
    CampaignPaused(CampaignTransitionData),

    /// Paused campaign went live again.
    CampaignResumed(CampaignTransitionData),

    /// Campaign finished.
    CampaignCompleted(CampaignTransitionData),

    /// Campaign was cancelled.
    CampaignCancelled(CampaignCancelledData),

    /// Targeting rules were replaced.
    CampaignTargetingRulesUpdated(TargetingRulesUpdatedData),

    /// Budget was set, changed or cleared.
    CampaignBudgetUpdated(BudgetUpdatedData),

    /// Delivery settings were replaced.
    CampaignSettingsUpdated(SettingsUpdatedData),

    /// Start and end dates were moved.
    CampaignRescheduled(CampaignRescheduledData),

    /// Name or description changed.
    CampaignDetailsUpdated(DetailsUpdatedData),

    /// A customer interaction was folded into the metrics.
    CampaignEventTracked(EventTrackedData),
}

impl CampaignEvent {
    /// Creates a CampaignCreated event.
    pub fn created(
        campaign_id: CampaignId,
        name: impl Into<String>,
        campaign_type: CampaignType,
        created_by: UserId,
    ) -> Self {
        CampaignEvent::CampaignCreated(CampaignCreatedData {
            campaign_id,
            name: name.into(),
            campaign_type,
            created_by,
            occurred_at: Utc::now(),
        })
    }

    /// Creates a CampaignActivated event.
    pub fn activated(
        campaign_id: CampaignId,
        name: impl Into<String>,
        start_date: DateTime<Utc>,
    ) -> Self {
        CampaignEvent::CampaignActivated(CampaignActivatedData {
            campaign_id,
            name: name.into(),
            start_date,
            occurred_at: Utc::now(),
        })
    }

    /// Creates a CampaignPaused event.
    pub fn paused(campaign_id: CampaignId, name: impl Into<String>) -> Self {
        CampaignEvent::CampaignPaused(CampaignTransitionData::now(campaign_id, name))
    }

    /// Creates a CampaignResumed event.
    pub fn resumed(campaign_id: CampaignId, name: impl Into<String>) -> Self {
        CampaignEvent::CampaignResumed(CampaignTransitionData::now(campaign_id, name))
    }

    /// Creates a CampaignCompleted event.
    pub fn completed(campaign_id: CampaignId, name: impl Into<String>) -> Self {
        CampaignEvent::CampaignCompleted(CampaignTransitionData::now(campaign_id, name))
    }

    /// Creates a CampaignCancelled event.
    pub fn cancelled(
        campaign_id: CampaignId,
        name: impl Into<String>,
        reason: impl Into<String>,
        previous_status: CampaignStatus,
    ) -> Self {
        CampaignEvent::CampaignCancelled(CampaignCancelledData {
            campaign_id,
            name: name.into(),
            reason: reason.into(),
            previous_status,
            occurred_at: Utc::now(),
        })
    }

    /// Returns the campaign this event belongs to.
    pub fn campaign_id(&self) -> CampaignId {
        match self {
            CampaignEvent::CampaignCreated(d) => d.campaign_id,
            CampaignEvent::CampaignActivated(d) => d.campaign_id,
            CampaignEvent::CampaignPaused(d)
            | CampaignEvent::CampaignResumed(d)
            | CampaignEvent::CampaignCompleted(d) => d.campaign_id,
            CampaignEvent::CampaignCancelled(d) => d.campaign_id,
            CampaignEvent::CampaignTargetingRulesUpdated(d) => d.campaign_id,
            CampaignEvent::CampaignBudgetUpdated(d) => d.campaign_id,
            CampaignEvent::CampaignSettingsUpdated(d) => d.campaign_id,
            CampaignEvent::CampaignRescheduled(d) => d.campaign_id,
            CampaignEvent::CampaignDetailsUpdated(d) => d.campaign_id,
            CampaignEvent::CampaignEventTracked(d) => d.campaign_id,
        }
    }
}

impl DomainEvent for CampaignEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CampaignEvent::CampaignCreated(_) => "CampaignCreated",
            CampaignEvent::CampaignActivated(_) => "CampaignActivated",
            CampaignEvent::CampaignPaused(_) => "CampaignPaused",
            CampaignEvent::CampaignResumed(_) => "CampaignResumed",
            CampaignEvent::CampaignCompleted(_) => "CampaignCompleted",
            CampaignEvent::CampaignCancelled(_) => "CampaignCancelled",
            CampaignEvent::CampaignTargetingRulesUpdated(_) => "CampaignTargetingRulesUpdated",
            CampaignEvent::CampaignBudgetUpdated(_) => "CampaignBudgetUpdated",
            CampaignEvent::CampaignSettingsUpdated(_) => "CampaignSettingsUpdated",
            CampaignEvent::CampaignRescheduled(_) => "CampaignRescheduled",
            CampaignEvent::CampaignDetailsUpdated(_) => "CampaignDetailsUpdated",
            CampaignEvent::CampaignEventTracked(_) => "CampaignEventTracked",
        }
    }

    fn aggregate_id(&self) -> String {
        self.campaign_id().to_string()
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CampaignEvent::CampaignCreated(d) => d.occurred_at,
            CampaignEvent::CampaignActivated(d) => d.occurred_at,
            CampaignEvent::CampaignPaused(d)
            | CampaignEvent::CampaignResumed(d)
            | CampaignEvent::CampaignCompleted(d) => d.occurred_at,
            CampaignEvent::CampaignCancelled(d) => d.occurred_at,
            CampaignEvent::CampaignTargetingRulesUpdated(d) => d.occurred_at,
            CampaignEvent::CampaignBudgetUpdated(d) => d.occurred_at,
            CampaignEvent::CampaignSettingsUpdated(d) => d.occurred_at,
            CampaignEvent::CampaignRescheduled(d) => d.occurred_at,
            CampaignEvent::CampaignDetailsUpdated(d) => d.occurred_at,
            CampaignEvent::CampaignEventTracked(d) => d.occurred_at,
        }
    }

    fn payload(&self) -> Result<Map<String, Value>, serde_json::Error> {
        let value = match self {
            CampaignEvent::CampaignCreated(d) => serde_json::to_value(d)?,
            CampaignEvent::CampaignActivated(d) => serde_json::to_value(d)?,
            CampaignEvent::CampaignPaused(d)
            | CampaignEvent::CampaignResumed(d)
            | CampaignEvent::CampaignCompleted(d) => serde_json::to_value(d)?,
            CampaignEvent::CampaignCancelled(d) => serde_json::to_value(d)?,
            CampaignEvent::CampaignTargetingRulesUpdated(d) => serde_json::to_value(d)?,
            CampaignEvent::CampaignBudgetUpdated(d) => serde_json::to_value(d)?,
            CampaignEvent::CampaignSettingsUpdated(d) => serde_json::to_value(d)?,
            CampaignEvent::CampaignRescheduled(d) => serde_json::to_value(d)?,
            CampaignEvent::CampaignDetailsUpdated(d) => serde_json::to_value(d)?,
            CampaignEvent::CampaignEventTracked(d) => serde_json::to_value(d)?,
        };
        match value {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

/// Data for CampaignCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignCreatedData {
    pub campaign_id: CampaignId,
    pub name: String,
    pub campaign_type: CampaignType,
    pub created_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Data for CampaignActivated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignActivatedData {
    pub campaign_id: CampaignId,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub occurred_at: DateTime<Utc>,
}

/// Data shared by pause, resume and complete transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignTransitionData {
    pub campaign_id: CampaignId,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
}

impl CampaignTransitionData {
    fn now(campaign_id: CampaignId, name: impl Into<String>) -> Self {
        Self {
            campaign_id,
            name: name.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// Data for CampaignCancelled event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignCancelledData {
    pub campaign_id: CampaignId,
    pub name: String,
    pub reason: String,
    /// Status the campaign was in when it was cancelled.
    pub previous_status: CampaignStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Data for CampaignTargetingRulesUpdated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetingRulesUpdatedData {
    pub campaign_id: CampaignId,
    pub name: String,
    pub rules: Vec<RuleId>,
    pub occurred_at: DateTime<Utc>,
}

/// Data for CampaignBudgetUpdated event. A `None` budget means it was cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetUpdatedData {
    pub campaign_id: CampaignId,
    pub name: String,
    pub budget: Option<Money>,
    pub occurred_at: DateTime<Utc>,
}

/// Data for CampaignSettingsUpdated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdatedData {
    pub campaign_id: CampaignId,
    pub name: String,
    pub settings: CampaignSettings,
    pub occurred_at: DateTime<Utc>,
}

/// Data for CampaignRescheduled event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRescheduledData {
    pub campaign_id: CampaignId,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub occurred_at: DateTime<Utc>,
}

/// Data for CampaignDetailsUpdated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsUpdatedData {
    pub campaign_id: CampaignId,
    /// The name after the update.
    pub name: String,
    pub previous_name: String,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

/// Data for CampaignEventTracked event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTrackedData {
    pub campaign_id: CampaignId,
    pub name: String,
    pub event_kind: TrackedEventKind,
    pub customer_id: Option<CustomerId>,
    pub occurred_at: DateTime<Utc>,
}
