//! Advisory alerts derived from a campaign's metrics and budget.
//!
//! Evaluation is pure: the same campaign always yields the same alerts.
//! Delivery is the service's concern.

use domain::Campaign;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const LOW_CTR_THRESHOLD: f64 = 1.0;
const LOW_CTR_MIN_IMPRESSIONS: u64 = 1000;
const LOW_CONVERSION_THRESHOLD: f64 = 2.0;
const LOW_CONVERSION_MIN_CLICKS: u64 = 100;
const NEGATIVE_ROI_THRESHOLD: f64 = 0.0;

/// How urgently an alert should be looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceAlertType {
    LowCtr,
    LowConversion,
    NegativeRoi,
}

impl PerformanceAlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceAlertType::LowCtr => "low_ctr",
            PerformanceAlertType::LowConversion => "low_conversion",
            PerformanceAlertType::NegativeRoi => "negative_roi",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetAlertType {
    ApproachingLimit,
    Exceeded,
}

impl BudgetAlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetAlertType::ApproachingLimit => "approaching_limit",
            BudgetAlertType::Exceeded => "exceeded",
        }
    }
}

/// A KPI crossed its alert threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAlert {
    #[serde(rename = "type")]
    pub alert_type: PerformanceAlertType,
    pub threshold: f64,
    pub current_value: f64,
    pub message: String,
    pub severity: AlertSeverity,
}

/// Spend crossed a share of the budget.
///
/// Threshold and current value are amounts in the budget currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAlert {
    #[serde(rename = "type")]
    pub alert_type: BudgetAlertType,
    pub threshold: Decimal,
    pub current_value: Decimal,
    pub message: String,
    pub severity: AlertSeverity,
}

/// Returns the performance alerts the campaign currently triggers, in fixed order.
pub fn performance_alerts(campaign: &Campaign) -> Vec<PerformanceAlert> {
    let metrics = campaign.metrics();
    let name = campaign.name();
    let mut alerts = Vec::new();

    if metrics.ctr() < LOW_CTR_THRESHOLD && metrics.impressions() > LOW_CTR_MIN_IMPRESSIONS {
        alerts.push(PerformanceAlert {
            alert_type: PerformanceAlertType::LowCtr,
            threshold: LOW_CTR_THRESHOLD,
            current_value: metrics.ctr(),
            message: format!("Campaign {name} has low CTR: {:.2}%", metrics.ctr()),
            severity: AlertSeverity::Medium,
        });
    }

    if metrics.conversion_rate() < LOW_CONVERSION_THRESHOLD
        && metrics.clicks() > LOW_CONVERSION_MIN_CLICKS
    {
        alerts.push(PerformanceAlert {
            alert_type: PerformanceAlertType::LowConversion,
            threshold: LOW_CONVERSION_THRESHOLD,
            current_value: metrics.conversion_rate(),
            message: format!(
                "Campaign {name} has low conversion rate: {:.2}%",
                metrics.conversion_rate()
            ),
            severity: AlertSeverity::High,
        });
    }

    if metrics.roi() < NEGATIVE_ROI_THRESHOLD {
        alerts.push(PerformanceAlert {
            alert_type: PerformanceAlertType::NegativeRoi,
            threshold: NEGATIVE_ROI_THRESHOLD,
            current_value: metrics.roi(),
            message: format!("Campaign {name} has negative ROI: {:.2}%", metrics.roi()),
            severity: AlertSeverity::Critical,
        });
    }

    alerts
}

/// Returns the budget alerts the campaign currently triggers.
///
/// Empty without a budget. Once spend reaches the budget both the
/// approaching and the exceeded alert are returned.
pub fn budget_alerts(campaign: &Campaign) -> Vec<BudgetAlert> {
    let Some(budget) = campaign.budget() else {
        return Vec::new();
    };
    let spent = campaign.metrics().cost().amount();
    let limit = budget.amount();
    let name = campaign.name();
    let mut alerts = Vec::new();

    if campaign.is_approaching_budget_limit()
        && let Some(threshold) = campaign.budget_warning_threshold()
    {
        alerts.push(BudgetAlert {
            alert_type: BudgetAlertType::ApproachingLimit,
            threshold,
            current_value: spent,
            message: format!(
                "Campaign {name} is approaching budget limit: {spent:.2} of {limit:.2}"
            ),
            severity: AlertSeverity::Medium,
        });
    }

    if campaign.has_exceeded_budget() {
        alerts.push(BudgetAlert {
            alert_type: BudgetAlertType::Exceeded,
            threshold: limit,
            current_value: spent,
            message: format!("Campaign {name} has exceeded budget: {spent:.2} of {limit:.2}"),
            severity: AlertSeverity::Critical,
        });
    }

    alerts
}
