//! Campaign commands.

use chrono::{DateTime, Utc};
use common::{CampaignId, RuleId, UserId};

use crate::command::Command;
use crate::money::Money;
use crate::validation::{ValidationErrors, check_max_chars, check_required_text};

use super::{CampaignSettings, CampaignType, Channel, TrackedEvent};

pub const MAX_NAME_CHARS: usize = 255;
pub const MAX_DESCRIPTION_CHARS: usize = 1000;
pub const MAX_DELETE_REASON_CHARS: usize = 200;

pub(crate) fn check_details(errors: &mut ValidationErrors, name: &str, description: &str) {
    check_required_text(errors, "name", name, MAX_NAME_CHARS);
    check_max_chars(errors, "description", description, MAX_DESCRIPTION_CHARS);
}

pub(crate) fn check_schedule(
    errors: &mut ValidationErrors,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
) {
    if let Some(end_date) = end_date
        && end_date <= start_date
    {
        errors.add("endDate", "must be after the start date");
    }
}

pub(crate) fn check_targeting_rules(errors: &mut ValidationErrors, rules: &[RuleId]) {
    if rules.is_empty() {
        errors.add("targetingRules", "at least one targeting rule is required");
    }
}

pub(crate) fn check_budget(errors: &mut ValidationErrors, budget: Option<&Money>) {
    if let Some(budget) = budget
        && !budget.is_positive()
    {
        errors.add("budget", "must be positive");
    }
}

pub(crate) fn check_settings(errors: &mut ValidationErrors, settings: &CampaignSettings) {
    if let Err(nested) = settings.validate() {
        errors.merge_nested("settings", nested);
    }
}

/// Command to create a new campaign in draft.
#[derive(Debug, Clone)]
pub struct CreateCampaign {
    /// The campaign ID to create.
    pub campaign_id: CampaignId,
    pub name: String,
    pub description: String,
    pub campaign_type: CampaignType,
    pub targeting_rules: Vec<RuleId>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Option<Money>,
    pub created_by: UserId,
    pub settings: CampaignSettings,
}

impl CreateCampaign {
    /// Creates a command with a generated campaign ID, no description, no end
    /// date, no budget and email-only delivery.
    pub fn new(
        name: impl Into<String>,
        campaign_type: CampaignType,
        targeting_rules: Vec<RuleId>,
        start_date: DateTime<Utc>,
        created_by: UserId,
    ) -> Self {
        Self {
            campaign_id: CampaignId::new(),
            name: name.into(),
            description: String::new(),
            campaign_type,
            targeting_rules,
            start_date,
            end_date: None,
            budget: None,
            created_by,
            settings: CampaignSettings::for_channels([Channel::Email]),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_budget(mut self, budget: Money) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_settings(mut self, settings: CampaignSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl Command for CreateCampaign {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_details(&mut errors, &self.name, &self.description);
        check_targeting_rules(&mut errors, &self.targeting_rules);
        check_schedule(&mut errors, self.start_date, self.end_date);
        check_budget(&mut errors, self.budget.as_ref());
        check_settings(&mut errors, &self.settings);
        errors.into_result()
    }
}

/// Command to put a draft or paused campaign live.
#[derive(Debug, Clone)]
pub struct ActivateCampaign {
    pub campaign_id: CampaignId,
}

impl ActivateCampaign {
    pub fn new(campaign_id: CampaignId) -> Self {
        Self { campaign_id }
    }
}

impl Command for ActivateCampaign {}

/// Command to pause an active campaign.
#[derive(Debug, Clone)]
pub struct PauseCampaign {
    pub campaign_id: CampaignId,
}

impl PauseCampaign {
    pub fn new(campaign_id: CampaignId) -> Self {
        Self { campaign_id }
    }
}

impl Command for PauseCampaign {}

/// Command to resume a paused campaign.
#[derive(Debug, Clone)]
pub struct ResumeCampaign {
    pub campaign_id: CampaignId,
}

impl ResumeCampaign {
    pub fn new(campaign_id: CampaignId) -> Self {
        Self { campaign_id }
    }
}

impl Command for ResumeCampaign {}

/// Command to complete a campaign.
#[derive(Debug, Clone)]
pub struct CompleteCampaign {
    pub campaign_id: CampaignId,
}

impl CompleteCampaign {
    pub fn new(campaign_id: CampaignId) -> Self {
        Self { campaign_id }
    }
}

impl Command for CompleteCampaign {}

/// Command to cancel a campaign.
#[derive(Debug, Clone)]
pub struct CancelCampaign {
    pub campaign_id: CampaignId,

    /// Why the campaign is being cancelled. Required.
    pub reason: String,
}

impl CancelCampaign {
    pub fn new(campaign_id: CampaignId, reason: impl Into<String>) -> Self {
        Self {
            campaign_id,
            reason: reason.into(),
        }
    }
}

impl Command for CancelCampaign {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.reason.trim().is_empty() {
            errors.add("reason", "is required");
        }
        errors.into_result()
    }
}

/// Command to replace a campaign's targeting rules.
#[derive(Debug, Clone)]
pub struct UpdateTargetingRules {
    pub campaign_id: CampaignId,
    pub rules: Vec<RuleId>,
}

impl UpdateTargetingRules {
    pub fn new(campaign_id: CampaignId, rules: Vec<RuleId>) -> Self {
        Self { campaign_id, rules }
    }
}

impl Command for UpdateTargetingRules {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_targeting_rules(&mut errors, &self.rules);
        errors.into_result()
    }
}

/// Command to set or clear a campaign's budget.
#[derive(Debug, Clone)]
pub struct UpdateBudget {
    pub campaign_id: CampaignId,
    pub budget: Option<Money>,
}

impl UpdateBudget {
    pub fn new(campaign_id: CampaignId, budget: Option<Money>) -> Self {
        Self {
            campaign_id,
            budget,
        }
    }
}

impl Command for UpdateBudget {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_budget(&mut errors, self.budget.as_ref());
        errors.into_result()
    }
}

/// Command to replace a campaign's delivery settings.
#[derive(Debug, Clone)]
pub struct UpdateSettings {
    pub campaign_id: CampaignId,
    pub settings: CampaignSettings,
}

impl UpdateSettings {
    pub fn new(campaign_id: CampaignId, settings: CampaignSettings) -> Self {
        Self {
            campaign_id,
            settings,
        }
    }
}

impl Command for UpdateSettings {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_settings(&mut errors, &self.settings);
        errors.into_result()
    }
}

/// Command to move a campaign's start and end dates.
#[derive(Debug, Clone)]
pub struct RescheduleCampaign {
    pub campaign_id: CampaignId,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl RescheduleCampaign {
    pub fn new(
        campaign_id: CampaignId,
        start_date: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            campaign_id,
            start_date,
            end_date,
        }
    }
}

impl Command for RescheduleCampaign {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_schedule(&mut errors, self.start_date, self.end_date);
        errors.into_result()
    }
}

/// Command to rename a campaign or change its description.
#[derive(Debug, Clone)]
pub struct UpdateCampaignDetails {
    pub campaign_id: CampaignId,
    pub name: String,
    pub description: String,
}

impl UpdateCampaignDetails {
    pub fn new(
        campaign_id: CampaignId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            campaign_id,
            name: name.into(),
            description: description.into(),
        }
    }
}

impl Command for UpdateCampaignDetails {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_details(&mut errors, &self.name, &self.description);
        errors.into_result()
    }
}

/// Command to fold a customer interaction into a campaign's metrics.
#[derive(Debug, Clone)]
pub struct TrackCampaignEvent {
    pub campaign_id: CampaignId,
    pub event: TrackedEvent,
}

impl TrackCampaignEvent {
    pub fn new(campaign_id: CampaignId, event: TrackedEvent) -> Self {
        Self { campaign_id, event }
    }
}

impl Command for TrackCampaignEvent {}

/// Command to soft-delete a campaign.
#[derive(Debug, Clone)]
pub struct DeleteCampaign {
    pub campaign_id: CampaignId,
    pub reason: Option<String>,
}

impl DeleteCampaign {
    pub fn new(campaign_id: CampaignId) -> Self {
        Self {
            campaign_id,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl Command for DeleteCampaign {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(reason) = &self.reason {
            check_max_chars(&mut errors, "reason", reason, MAX_DELETE_REASON_CHARS);
        }
        errors.into_result()
    }
}
