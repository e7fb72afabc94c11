//! Campaign aggregate implementation.

use chrono::{DateTime, Utc};
use common::{CampaignId, RuleId, UserId, Version};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::command::Command;
use crate::money::{Currency, Money};
use crate::validation::ValidationErrors;

use super::commands::{
    check_budget, check_details, check_schedule, check_settings, check_targeting_rules,
};
use super::events::{
    BudgetUpdatedData, CampaignRescheduledData, DetailsUpdatedData, EventTrackedData,
    SettingsUpdatedData, TargetingRulesUpdatedData,
};
use super::{
    CampaignError, CampaignEvent, CampaignMetrics, CampaignSettings, CampaignStatus, CampaignType,
    CreateCampaign, PerformanceGrade, Recommendation, TrackedEvent,
};

/// Share of the budget at which spend counts as approaching the limit.
pub const BUDGET_WARNING_RATIO: Decimal = Decimal::from_parts(9, 0, 0, false, 1);

/// Business state of a campaign, free of identity and versioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignState {
    name: String,
    description: String,
    status: CampaignStatus,
    campaign_type: CampaignType,
    targeting_rules: Vec<RuleId>,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    budget: Option<Money>,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    settings: CampaignSettings,
    metrics: CampaignMetrics,
}

/// Campaign aggregate root.
///
/// Identity and version form the persistence envelope around the business
/// [`CampaignState`]. Every successful operation changes the state, moves the
/// version forward by one, refreshes `updated_at` and queues exactly one
/// [`CampaignEvent`]. A failed operation changes nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    id: CampaignId,
    version: Version,
    state: CampaignState,
    #[serde(skip)]
    pending_events: Vec<CampaignEvent>,
}

impl Campaign {
    /// Creates a draft campaign from a validated command.
    ///
    /// Metrics are kept in the budget's currency, or in `fallback_currency`
    /// when no budget is given.
    pub fn create(cmd: CreateCampaign, fallback_currency: Currency) -> Result<Self, CampaignError> {
        cmd.validate()?;

        let currency = cmd
            .budget
            .as_ref()
            .map(|b| b.currency().clone())
            .unwrap_or(fallback_currency);
        let now = Utc::now();
        let event = CampaignEvent::created(
            cmd.campaign_id,
            cmd.name.clone(),
            cmd.campaign_type,
            cmd.created_by,
        );

        Ok(Self {
            id: cmd.campaign_id,
            version: Version::first(),
            state: CampaignState {
                name: cmd.name,
                description: cmd.description,
                status: CampaignStatus::Draft,
                campaign_type: cmd.campaign_type,
                targeting_rules: cmd.targeting_rules,
                start_date: cmd.start_date,
                end_date: cmd.end_date,
                budget: cmd.budget,
                created_by: cmd.created_by,
                created_at: now,
                updated_at: now,
                settings: cmd.settings,
                metrics: CampaignMetrics::new(currency),
            },
            pending_events: vec![event],
        })
    }

    // Accessors

    pub fn state(&self) -> &CampaignState {
        &self.state
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn description(&self) -> &str {
        &self.state.description
    }

    pub fn status(&self) -> CampaignStatus {
        self.state.status
    }

    pub fn campaign_type(&self) -> CampaignType {
        self.state.campaign_type
    }

    pub fn targeting_rules(&self) -> &[RuleId] {
        &self.state.targeting_rules
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        self.state.start_date
    }

    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        self.state.end_date
    }

    pub fn budget(&self) -> Option<&Money> {
        self.state.budget.as_ref()
    }

    pub fn created_by(&self) -> UserId {
        self.state.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.state.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.state.updated_at
    }

    pub fn settings(&self) -> &CampaignSettings {
        &self.state.settings
    }

    pub fn metrics(&self) -> &CampaignMetrics {
        &self.state.metrics
    }

    // Lifecycle transitions

    /// Puts a draft or paused campaign live.
    ///
    /// The start date must have been reached. Resuming from paused also
    /// requires that the end date, if any, has not passed.
    pub fn activate(&mut self) -> Result<(), CampaignError> {
        let now = Utc::now();
        let current = self.state.status;

        if !current.can_activate() {
            return Err(CampaignError::InvalidTransition {
                current,
                action: "activate",
            });
        }
        if self.state.start_date > now {
            return Err(CampaignError::StartDateInFuture {
                start_date: self.state.start_date,
            });
        }
        if current == CampaignStatus::Paused {
            if let Some(end_date) = self.state.end_date.filter(|end| *end < now) {
                return Err(CampaignError::CampaignEnded { end_date });
            }
        }

        self.state.status = CampaignStatus::Active;
        let event = if current == CampaignStatus::Paused {
            CampaignEvent::resumed(self.id, self.state.name.clone())
        } else {
            CampaignEvent::activated(self.id, self.state.name.clone(), self.state.start_date)
        };
        self.record(event, now);
        Ok(())
    }

    /// Resumes a paused campaign.
    pub fn resume(&mut self) -> Result<(), CampaignError> {
        let current = self.state.status;
        if !current.can_resume() {
            return Err(CampaignError::InvalidTransition {
                current,
                action: "resume",
            });
        }
        self.activate()
    }

    pub fn pause(&mut self) -> Result<(), CampaignError> {
        let current = self.state.status;
        if !current.can_pause() {
            return Err(CampaignError::InvalidTransition {
                current,
                action: "pause",
            });
        }

        self.state.status = CampaignStatus::Paused;
        self.record(
            CampaignEvent::paused(self.id, self.state.name.clone()),
            Utc::now(),
        );
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), CampaignError> {
        let current = self.state.status;
        if !current.can_complete() {
            return Err(CampaignError::InvalidTransition {
                current,
                action: "complete",
            });
        }

        self.state.status = CampaignStatus::Completed;
        self.record(
            CampaignEvent::completed(self.id, self.state.name.clone()),
            Utc::now(),
        );
        Ok(())
    }

    /// Cancels a campaign that has not finished yet. A reason is required.
    pub fn cancel(&mut self, reason: &str) -> Result<(), CampaignError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationErrors::single("reason", "is required").into());
        }
        let current = self.state.status;
        if !current.can_cancel() {
            return Err(CampaignError::InvalidTransition {
                current,
                action: "cancel",
            });
        }

        self.state.status = CampaignStatus::Cancelled;
        self.record(
            CampaignEvent::cancelled(self.id, self.state.name.clone(), reason, current),
            Utc::now(),
        );
        Ok(())
    }

    // Field updates

    /// Replaces the targeting rules. Not allowed while the campaign runs.
    pub fn update_targeting_rules(&mut self, rules: Vec<RuleId>) -> Result<(), CampaignError> {
        let mut errors = ValidationErrors::new();
        check_targeting_rules(&mut errors, &rules);
        errors.into_result()?;
        self.ensure_targeting_editable()?;

        let now = Utc::now();
        self.state.targeting_rules = rules.clone();
        self.record(
            CampaignEvent::CampaignTargetingRulesUpdated(TargetingRulesUpdatedData {
                campaign_id: self.id,
                name: self.state.name.clone(),
                rules,
                occurred_at: now,
            }),
            now,
        );
        Ok(())
    }

    /// Sets or clears the budget.
    ///
    /// A budget must be positive and in the currency the metrics are kept in,
    /// otherwise spend could not be compared against it.
    pub fn update_budget(&mut self, budget: Option<Money>) -> Result<(), CampaignError> {
        let mut errors = ValidationErrors::new();
        check_budget(&mut errors, budget.as_ref());
        if let Some(budget) = &budget {
            if budget.currency() != self.state.metrics.currency() {
                errors.add(
                    "budget.currency",
                    format!("must be {}", self.state.metrics.currency()),
                );
            }
        }
        errors.into_result()?;

        self.ensure_not_terminal("update budget")?;

        let now = Utc::now();
        self.state.budget = budget.clone();
        self.record(
            CampaignEvent::CampaignBudgetUpdated(BudgetUpdatedData {
                campaign_id: self.id,
                name: self.state.name.clone(),
                budget,
                occurred_at: now,
            }),
            now,
        );
        Ok(())
    }

    pub fn update_settings(&mut self, settings: CampaignSettings) -> Result<(), CampaignError> {
        let mut errors = ValidationErrors::new();
        check_settings(&mut errors, &settings);
        errors.into_result()?;

        self.ensure_not_terminal("update settings")?;

        let now = Utc::now();
        self.state.settings = settings.clone();
        self.record(
            CampaignEvent::CampaignSettingsUpdated(SettingsUpdatedData {
                campaign_id: self.id,
                name: self.state.name.clone(),
                settings,
                occurred_at: now,
            }),
            now,
        );
        Ok(())
    }

    /// Moves the start and end dates. Not allowed while the campaign runs.
    pub fn reschedule(
        &mut self,
        start_date: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<(), CampaignError> {
        let mut errors = ValidationErrors::new();
        check_schedule(&mut errors, start_date, end_date);
        errors.into_result()?;

        self.ensure_not_terminal("reschedule")?;
        let current = self.state.status;
        if current == CampaignStatus::Active {
            return Err(CampaignError::ScheduleLocked { current });
        }

        let now = Utc::now();
        self.state.start_date = start_date;
        self.state.end_date = end_date;
        self.record(
            CampaignEvent::CampaignRescheduled(CampaignRescheduledData {
                campaign_id: self.id,
                name: self.state.name.clone(),
                start_date,
                end_date,
                occurred_at: now,
            }),
            now,
        );
        Ok(())
    }

    pub fn update_details(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<(), CampaignError> {
        let name = name.into();
        let description = description.into();
        let mut errors = ValidationErrors::new();
        check_details(&mut errors, &name, &description);
        errors.into_result()?;

        self.ensure_not_terminal("update details")?;

        let now = Utc::now();
        let previous_name = std::mem::replace(&mut self.state.name, name.clone());
        self.state.description = description.clone();
        self.record(
            CampaignEvent::CampaignDetailsUpdated(DetailsUpdatedData {
                campaign_id: self.id,
                name,
                previous_name,
                description,
                occurred_at: now,
            }),
            now,
        );
        Ok(())
    }

    /// Folds a customer interaction into the metrics. Allowed in every status.
    pub fn track_event(&mut self, event: TrackedEvent) -> Result<(), CampaignError> {
        self.state.metrics.record(&event)?;

        let now = Utc::now();
        self.record(
            CampaignEvent::CampaignEventTracked(EventTrackedData {
                campaign_id: self.id,
                name: self.state.name.clone(),
                event_kind: event.kind,
                customer_id: event.customer_id,
                occurred_at: event.occurred_at,
            }),
            now,
        );
        Ok(())
    }

    // Queries

    /// Returns true if the campaign is active and `now` lies within its dates.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.state.status == CampaignStatus::Active
            && self.state.start_date <= now
            && self.state.end_date.is_none_or(|end| now <= end)
    }

    /// Returns true once spend has reached the budget. False without a budget.
    pub fn has_exceeded_budget(&self) -> bool {
        self.budget_share(Decimal::ONE)
            .is_some_and(|limit| self.state.metrics.cost().amount() >= limit)
    }

    /// Returns true once spend has reached 90% of the budget. False without a budget.
    pub fn is_approaching_budget_limit(&self) -> bool {
        self.budget_warning_threshold()
            .is_some_and(|threshold| self.state.metrics.cost().amount() >= threshold)
    }

    /// Spend at which the campaign counts as approaching its budget limit.
    ///
    /// None without a comparable budget.
    pub fn budget_warning_threshold(&self) -> Option<Decimal> {
        self.budget_share(BUDGET_WARNING_RATIO)
    }

    pub fn performance_score(&self) -> f64 {
        self.state.metrics.performance_score()
    }

    pub fn performance_grade(&self) -> PerformanceGrade {
        self.state.metrics.performance_grade()
    }

    pub fn is_performing_well(&self) -> bool {
        self.state.metrics.is_performing_well()
    }

    pub fn needs_attention(&self) -> bool {
        self.state.metrics.needs_attention()
    }

    pub fn recommendations(&self) -> Vec<Recommendation> {
        self.state.metrics.recommendations()
    }

    fn budget_share(&self, ratio: Decimal) -> Option<Decimal> {
        self.state
            .budget
            .as_ref()
            .filter(|budget| budget.same_currency(self.state.metrics.cost()))
            .and_then(|budget| budget.amount().checked_mul(ratio))
    }

    /// Fails unless the current status still allows targeting changes.
    pub fn ensure_targeting_editable(&self) -> Result<(), CampaignError> {
        self.ensure_not_terminal("update targeting rules")?;
        let current = self.state.status;
        if !current.can_change_targeting() {
            return Err(CampaignError::TargetingLocked { current });
        }
        Ok(())
    }

    fn ensure_not_terminal(&self, action: &'static str) -> Result<(), CampaignError> {
        let current = self.state.status;
        if current.is_terminal() {
            return Err(CampaignError::Terminal { current, action });
        }
        Ok(())
    }

    fn record(&mut self, event: CampaignEvent, now: DateTime<Utc>) {
        self.version = self.version.next();
        self.state.updated_at = self.state.updated_at.max(now);
        self.pending_events.push(event);
    }
}

impl Aggregate for Campaign {
    type Id = CampaignId;
    type Event = CampaignEvent;

    fn aggregate_type() -> &'static str {
        "Campaign"
    }

    fn id(&self) -> CampaignId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn pending_events(&self) -> &[CampaignEvent] {
        &self.pending_events
    }

    fn take_events(&mut self) -> Vec<CampaignEvent> {
        std::mem::take(&mut self.pending_events)
    }
}
