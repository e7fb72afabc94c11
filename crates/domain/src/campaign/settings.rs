//! Campaign delivery settings and their validation.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::money::Money;
use crate::validation::ValidationErrors;

use super::ParseVariantError;

/// Delivery channel for campaign messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    Email,
    Sms,
    Push,
    Web,
    Social,
    Display,
}

impl FromStr for Channel {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EMAIL" => Ok(Channel::Email),
            "SMS" => Ok(Channel::Sms),
            "PUSH" => Ok(Channel::Push),
            "WEB" => Ok(Channel::Web),
            "SOCIAL" => Ok(Channel::Social),
            "DISPLAY" => Ok(Channel::Display),
            other => Err(ParseVariantError::new("channel", other)),
        }
    }
}

/// How often a customer may be contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    #[default]
    Once,
    Daily,
    Weekly,
    Monthly,
}

impl FromStr for Frequency {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONCE" => Ok(Frequency::Once),
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            other => Err(ParseVariantError::new("frequency", other)),
        }
    }
}

/// A/B test configuration. Only validated when enabled.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbTestConfig {
    pub enabled: bool,
    pub variants: Vec<Variant>,
    /// Share of traffic routed into the experiment, in [0, 1].
    pub traffic_split: f64,
    pub success_metric: String,
    pub duration_days: u32,
}

impl AbTestConfig {
    pub const MIN_VARIANTS: usize = 2;
    pub const MAX_VARIANTS: usize = 10;
    const WEIGHT_TOLERANCE: f64 = 0.01;

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !self.enabled {
            return Ok(());
        }

        let count = self.variants.len();
        if !(Self::MIN_VARIANTS..=Self::MAX_VARIANTS).contains(&count) {
            errors.add(
                "variants",
                format!(
                    "must contain between {} and {} variants",
                    Self::MIN_VARIANTS,
                    Self::MAX_VARIANTS
                ),
            );
        }
        if !(0.0..=1.0).contains(&self.traffic_split) {
            errors.add("trafficSplit", "must be between 0 and 1");
        }
        if self.success_metric.trim().is_empty() {
            errors.add("successMetric", "is required");
        }
        if self.duration_days == 0 {
            errors.add("durationDays", "must be greater than 0");
        }

        for (i, variant) in self.variants.iter().enumerate() {
            if let Err(nested) = variant.validate() {
                errors.merge_nested(&format!("variants[{i}]"), nested);
            }
        }

        let total: f64 = self.variants.iter().map(|v| v.weight).sum();
        if count > 0 && (total - 1.0).abs() > Self::WEIGHT_TOLERANCE {
            errors.add("variants", format!("weights must sum to 1.0, got {total:.3}"));
        }

        errors.into_result()
    }
}

/// One arm of an A/B test.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Free-form overrides applied when this variant is served.
    pub settings: Map<String, Value>,
    pub weight: f64,
}

impl Variant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            weight,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.id.trim().is_empty() {
            errors.add("id", "is required");
        }
        if self.name.trim().is_empty() {
            errors.add("name", "is required");
        }
        if !(0.0..=1.0).contains(&self.weight) {
            errors.add("weight", "must be between 0 and 1");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    Time,
    Date,
    Event,
    Metric,
}

impl FromStr for ConditionType {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(ConditionType::Time),
            "date" => Ok(ConditionType::Date),
            "event" => Ok(ConditionType::Event),
            "metric" => Ok(ConditionType::Metric),
            other => Err(ParseVariantError::new("condition type", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    GreaterThan,
    LessThan,
    Contains,
    NotEquals,
}

impl FromStr for ConditionOperator {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equals" => Ok(ConditionOperator::Equals),
            "greater_than" => Ok(ConditionOperator::GreaterThan),
            "less_than" => Ok(ConditionOperator::LessThan),
            "contains" => Ok(ConditionOperator::Contains),
            "not_equals" => Ok(ConditionOperator::NotEquals),
            other => Err(ParseVariantError::new("condition operator", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Activate,
    Pause,
    Stop,
    UpdateSettings,
    SendNotification,
}

impl FromStr for ActionType {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "activate" => Ok(ActionType::Activate),
            "pause" => Ok(ActionType::Pause),
            "stop" => Ok(ActionType::Stop),
            "update_settings" => Ok(ActionType::UpdateSettings),
            "send_notification" => Ok(ActionType::SendNotification),
            other => Err(ParseVariantError::new("action type", other)),
        }
    }
}

/// Predicate that decides when a scheduling rule fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingCondition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub operator: ConditionOperator,
    pub value: Value,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SchedulingCondition {
    pub fn new(condition_type: ConditionType, operator: ConditionOperator, value: Value) -> Self {
        Self {
            condition_type,
            operator,
            value,
            metadata: Map::new(),
        }
    }
}

/// What a scheduling rule does when it fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl SchedulingAction {
    pub fn new(action_type: ActionType) -> Self {
        Self {
            action_type,
            parameters: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub conditions: Vec<SchedulingCondition>,
    pub actions: Vec<SchedulingAction>,
    pub is_active: bool,
}

impl SchedulingRule {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.id.trim().is_empty() {
            errors.add("id", "is required");
        }
        if self.name.trim().is_empty() {
            errors.add("name", "is required");
        }
        if self.conditions.is_empty() {
            errors.add("conditions", "at least one condition is required");
        }
        if self.actions.is_empty() {
            errors.add("actions", "at least one action is required");
        }
        for (i, condition) in self.conditions.iter().enumerate() {
            if condition.value.is_null() {
                errors.add(format!("conditions[{i}].value"), "is required");
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizationConfig {
    pub enabled: bool,
    pub rules: Vec<String>,
    pub fallback: String,
    pub max_variants: u32,
}

impl PersonalizationConfig {
    pub const MAX_VARIANTS_LIMIT: u32 = 100;

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.enabled && !(1..=Self::MAX_VARIANTS_LIMIT).contains(&self.max_variants) {
            errors.add(
                "maxVariants",
                format!("must be between 1 and {}", Self::MAX_VARIANTS_LIMIT),
            );
        }
        errors.into_result()
    }
}

/// Delivery configuration attached to a campaign.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSettings {
    pub target_audience: BTreeSet<String>,
    pub channels: BTreeSet<Channel>,
    pub frequency: Frequency,
    pub max_impressions: Option<u64>,
    pub budget_limit: Option<Money>,
    pub ab_test: Option<AbTestConfig>,
    pub scheduling_rules: Vec<SchedulingRule>,
    pub personalization: PersonalizationConfig,
}

impl CampaignSettings {
    /// Settings delivering once over the given channels, everything else unset.
    pub fn for_channels(channels: impl IntoIterator<Item = Channel>) -> Self {
        Self {
            channels: channels.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Validates every component and reports all violations with their paths.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.channels.is_empty() {
            errors.add("channels", "at least one channel is required");
        }
        if self.max_impressions == Some(0) {
            errors.add("maxImpressions", "must be greater than 0");
        }
        if let Some(limit) = &self.budget_limit
            && !limit.is_positive()
        {
            errors.add("budgetLimit", "must be positive");
        }
        if let Some(ab_test) = &self.ab_test
            && let Err(nested) = ab_test.validate()
        {
            errors.merge_nested("abTest", nested);
        }
        for (i, rule) in self.scheduling_rules.iter().enumerate() {
            if let Err(nested) = rule.validate() {
                errors.merge_nested(&format!("schedulingRules[{i}]"), nested);
            }
        }
        if let Err(nested) = self.personalization.validate() {
            errors.merge_nested("personalization", nested);
        }

        errors.into_result()
    }
}
