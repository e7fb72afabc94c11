//! Campaign aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod metrics;
mod performance;
mod settings;
mod state;

pub use aggregate::{BUDGET_WARNING_RATIO, Campaign, CampaignState};
pub use commands::*;
pub use events::{
    BudgetUpdatedData, CampaignActivatedData, CampaignCancelledData, CampaignCreatedData,
    CampaignEvent, CampaignRescheduledData, CampaignTransitionData, DetailsUpdatedData,
    EventTrackedData, SettingsUpdatedData, TargetingRulesUpdatedData,
};
pub use metrics::{CampaignMetrics, TrackedEvent, TrackedEventKind};
pub use performance::{
    DerivedMetrics, NEEDS_ATTENTION_SCORE, PERFORMING_WELL_SCORE, PerformanceGrade,
    Recommendation, performance_score, recommendations,
};
pub use settings::{
    AbTestConfig, ActionType, CampaignSettings, Channel, ConditionOperator, ConditionType,
    Frequency, PersonalizationConfig, SchedulingAction, SchedulingCondition, SchedulingRule,
    Variant,
};
pub use state::{CampaignStatus, CampaignType};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::error::ErrorKind;
use crate::money::MoneyError;
use crate::validation::ValidationErrors;

/// Errors that can occur during campaign operations.
#[derive(Debug, Error)]
pub enum CampaignError {
    /// Input failed validation; nothing was changed.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// A monetary value could not be combined with the campaign's amounts.
    #[error("Invalid amount: {0}")]
    Money(#[from] MoneyError),

    /// Campaign is not in a status that allows the action.
    #[error("Invalid state transition: cannot {action} from {current} status")]
    InvalidTransition {
        current: CampaignStatus,
        action: &'static str,
    },

    /// Activation requested before the campaign's start date.
    #[error("Cannot activate before the start date {start_date}")]
    StartDateInFuture { start_date: DateTime<Utc> },

    /// Resume requested after the campaign's end date.
    #[error("Cannot resume: campaign ended at {end_date}")]
    CampaignEnded { end_date: DateTime<Utc> },

    /// Targeting rules are frozen while the campaign runs.
    #[error("Targeting rules cannot be changed while the campaign is {current}")]
    TargetingLocked { current: CampaignStatus },

    /// Dates are frozen while the campaign runs.
    #[error("Schedule cannot be changed while the campaign is {current}")]
    ScheduleLocked { current: CampaignStatus },

    /// Field updates are rejected once the campaign has finished.
    #[error("Cannot {action}: campaign is {current}")]
    Terminal {
        current: CampaignStatus,
        action: &'static str,
    },
}

impl CampaignError {
    /// Returns whether the error is an input problem or a rule violation.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CampaignError::Validation(_) | CampaignError::Money(_) => ErrorKind::Validation,
            _ => ErrorKind::BusinessRule,
        }
    }
}

/// Error returned when a string does not name a member of a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseVariantError {
    /// Which vocabulary was being parsed.
    pub kind: &'static str,

    /// The rejected input.
    pub value: String,
}

impl ParseVariantError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
