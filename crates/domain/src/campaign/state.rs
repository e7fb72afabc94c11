//! Campaign lifecycle state machine and classification.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ParseVariantError;

/// The status of a campaign in its lifecycle.
///
/// State transitions:
/// ```text
///            ┌──────── pause ───────┐
///            ▼                      │
/// Draft ──► Active ◄── resume ── Paused
///   │         │                     │
///   ├─────────┴──── complete ───────┴──► Completed
///   └─────────┴──── cancel ─────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    /// Campaign is being prepared and has never run.
    #[default]
    Draft,

    /// Campaign is running.
    Active,

    /// Campaign was running and is temporarily stopped.
    Paused,

    /// Campaign finished (terminal state).
    Completed,

    /// Campaign was cancelled (terminal state).
    Cancelled,
}

impl CampaignStatus {
    /// Returns true if the campaign can be activated in this status.
    pub fn can_activate(&self) -> bool {
        matches!(self, CampaignStatus::Draft | CampaignStatus::Paused)
    }

    /// Returns true if the campaign can be paused in this status.
    pub fn can_pause(&self) -> bool {
        matches!(self, CampaignStatus::Active)
    }

    /// Returns true if the campaign can be resumed in this status.
    pub fn can_resume(&self) -> bool {
        matches!(self, CampaignStatus::Paused)
    }

    /// Returns true if the campaign can be completed in this status.
    pub fn can_complete(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if the campaign can be cancelled in this status.
    pub fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if targeting rules may be replaced in this status.
    pub fn can_change_targeting(&self) -> bool {
        !matches!(self, CampaignStatus::Active) && !self.is_terminal()
    }

    /// Returns true if the campaign may be deleted in this status.
    pub fn can_delete(&self) -> bool {
        !matches!(self, CampaignStatus::Active)
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, CampaignStatus::Completed | CampaignStatus::Cancelled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "DRAFT",
            CampaignStatus::Active => "ACTIVE",
            CampaignStatus::Paused => "PAUSED",
            CampaignStatus::Completed => "COMPLETED",
            CampaignStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(CampaignStatus::Draft),
            "ACTIVE" => Ok(CampaignStatus::Active),
            "PAUSED" => Ok(CampaignStatus::Paused),
            "COMPLETED" => Ok(CampaignStatus::Completed),
            "CANCELLED" => Ok(CampaignStatus::Cancelled),
            other => Err(ParseVariantError::new("campaign status", other)),
        }
    }
}

/// What a campaign is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignType {
    Promotion,
    Loyalty,
    Coupon,
    Segmentation,
    Retargeting,
}

impl CampaignType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignType::Promotion => "PROMOTION",
            CampaignType::Loyalty => "LOYALTY",
            CampaignType::Coupon => "COUPON",
            CampaignType::Segmentation => "SEGMENTATION",
            CampaignType::Retargeting => "RETARGETING",
        }
    }
}

impl std::fmt::Display for CampaignType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CampaignType {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROMOTION" => Ok(CampaignType::Promotion),
            "LOYALTY" => Ok(CampaignType::Loyalty),
            "COUPON" => Ok(CampaignType::Coupon),
            "SEGMENTATION" => Ok(CampaignType::Segmentation),
            "RETARGETING" => Ok(CampaignType::Retargeting),
            other => Err(ParseVariantError::new("campaign type", other)),
        }
    }
}
