//! Campaign metrics: raw counters, monetary totals and the event fold.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::CustomerId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::money::{Currency, Money, MoneyError};

use super::ParseVariantError;
use super::performance::{
    self, DerivedMetrics, NEEDS_ATTENTION_SCORE, PERFORMING_WELL_SCORE, PerformanceGrade,
    Recommendation,
};

/// Kind of customer interaction reported for a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackedEventKind {
    Impression,
    Click,
    Conversion,
    Bounce,
    Unsubscribe,
}

impl TrackedEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackedEventKind::Impression => "IMPRESSION",
            TrackedEventKind::Click => "CLICK",
            TrackedEventKind::Conversion => "CONVERSION",
            TrackedEventKind::Bounce => "BOUNCE",
            TrackedEventKind::Unsubscribe => "UNSUBSCRIBE",
        }
    }
}

impl std::fmt::Display for TrackedEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackedEventKind {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IMPRESSION" => Ok(TrackedEventKind::Impression),
            "CLICK" => Ok(TrackedEventKind::Click),
            "CONVERSION" => Ok(TrackedEventKind::Conversion),
            "BOUNCE" => Ok(TrackedEventKind::Bounce),
            "UNSUBSCRIBE" => Ok(TrackedEventKind::Unsubscribe),
            other => Err(ParseVariantError::new("tracked event kind", other)),
        }
    }
}

/// A single customer interaction to fold into campaign metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEvent {
    pub kind: TrackedEventKind,
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub data: Map<String, Value>,
    pub revenue: Option<Money>,
    pub cost: Option<Money>,
    pub occurred_at: DateTime<Utc>,
}

impl TrackedEvent {
    pub fn new(kind: TrackedEventKind) -> Self {
        Self {
            kind,
            customer_id: None,
            data: Map::new(),
            revenue: None,
            cost: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn impression() -> Self {
        Self::new(TrackedEventKind::Impression)
    }

    pub fn click() -> Self {
        Self::new(TrackedEventKind::Click)
    }

    pub fn conversion() -> Self {
        Self::new(TrackedEventKind::Conversion)
    }

    pub fn with_customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_revenue(mut self, revenue: Money) -> Self {
        self.revenue = Some(revenue);
        self
    }

    pub fn with_cost(mut self, cost: Money) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

/// Performance metrics of a campaign.
///
/// Counters and monetary totals are the source of truth; the derived KPIs are
/// recomputed from them after every change and cannot be set directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignMetrics {
    impressions: u64,
    clicks: u64,
    conversions: u64,
    bounces: u64,
    unsubscribes: u64,
    revenue: Money,
    cost: Money,
    derived: DerivedMetrics,
    last_updated: DateTime<Utc>,
}

impl CampaignMetrics {
    /// Zeroed metrics with revenue and cost in `currency`.
    pub fn new(currency: Currency) -> Self {
        Self {
            impressions: 0,
            clicks: 0,
            conversions: 0,
            bounces: 0,
            unsubscribes: 0,
            revenue: Money::zero(currency.clone()),
            cost: Money::zero(currency),
            derived: DerivedMetrics::default(),
            last_updated: Utc::now(),
        }
    }

    /// Metrics rebuilt from stored totals, e.g. when importing from a
    /// reporting system.
    pub fn from_totals(
        impressions: u64,
        clicks: u64,
        conversions: u64,
        revenue: Money,
        cost: Money,
    ) -> Result<Self, MoneyError> {
        if !revenue.same_currency(&cost) {
            return Err(MoneyError::CurrencyMismatch {
                left: revenue.currency().clone(),
                right: cost.currency().clone(),
            });
        }
        let mut metrics = Self {
            impressions,
            clicks,
            conversions,
            bounces: 0,
            unsubscribes: 0,
            revenue,
            cost,
            derived: DerivedMetrics::default(),
            last_updated: Utc::now(),
        };
        metrics.recompute();
        Ok(metrics)
    }

    /// Folds one tracked event into the metrics.
    ///
    /// Monetary deltas are checked before anything is changed, so a currency
    /// mismatch leaves the metrics untouched.
    pub fn record(&mut self, event: &TrackedEvent) -> Result<(), MoneyError> {
        let revenue = add_delta(&self.revenue, event.revenue.as_ref())?;
        let cost = add_delta(&self.cost, event.cost.as_ref())?;

        let counter = match event.kind {
            TrackedEventKind::Impression => &mut self.impressions,
            TrackedEventKind::Click => &mut self.clicks,
            TrackedEventKind::Conversion => &mut self.conversions,
            TrackedEventKind::Bounce => &mut self.bounces,
            TrackedEventKind::Unsubscribe => &mut self.unsubscribes,
        };
        *counter = counter.saturating_add(1);
        self.revenue = revenue;
        self.cost = cost;

        self.recompute();
        Ok(())
    }

    /// Adds another metrics set to this one.
    ///
    /// Both revenue and cost currencies must match. Derived KPIs are
    /// recomputed from the summed totals.
    pub fn merge(&mut self, other: &CampaignMetrics) -> Result<(), MoneyError> {
        let revenue = self.revenue.add(&other.revenue)?;
        let cost = self.cost.add(&other.cost)?;

        self.impressions = self.impressions.saturating_add(other.impressions);
        self.clicks = self.clicks.saturating_add(other.clicks);
        self.conversions = self.conversions.saturating_add(other.conversions);
        self.bounces = self.bounces.saturating_add(other.bounces);
        self.unsubscribes = self.unsubscribes.saturating_add(other.unsubscribes);
        self.revenue = revenue;
        self.cost = cost;

        self.recompute();
        Ok(())
    }

    /// Zeroes every counter and total, keeping the currency.
    pub fn reset(&mut self) {
        *self = Self::new(self.currency().clone());
    }

    fn recompute(&mut self) {
        self.derived = DerivedMetrics::compute(
            self.impressions,
            self.clicks,
            self.conversions,
            self.revenue.amount(),
            self.cost.amount(),
        );
        self.last_updated = Utc::now();
    }

    pub fn impressions(&self) -> u64 {
        self.impressions
    }

    pub fn clicks(&self) -> u64 {
        self.clicks
    }

    pub fn conversions(&self) -> u64 {
        self.conversions
    }

    pub fn bounces(&self) -> u64 {
        self.bounces
    }

    pub fn unsubscribes(&self) -> u64 {
        self.unsubscribes
    }

    pub fn revenue(&self) -> &Money {
        &self.revenue
    }

    pub fn cost(&self) -> &Money {
        &self.cost
    }

    /// The currency revenue and cost are kept in.
    pub fn currency(&self) -> &Currency {
        self.cost.currency()
    }

    pub fn derived(&self) -> &DerivedMetrics {
        &self.derived
    }

    pub fn ctr(&self) -> f64 {
        self.derived.ctr
    }

    pub fn conversion_rate(&self) -> f64 {
        self.derived.conversion_rate
    }

    pub fn cost_per_click(&self) -> Money {
        self.money_in_currency(self.derived.cost_per_click)
    }

    pub fn cost_per_acquisition(&self) -> Money {
        self.money_in_currency(self.derived.cost_per_acquisition)
    }

    pub fn roas(&self) -> f64 {
        self.derived.roas
    }

    pub fn roi(&self) -> f64 {
        self.derived.roi
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// 0–100 score built from CTR, conversion rate and ROI.
    pub fn performance_score(&self) -> f64 {
        performance::performance_score(&self.derived)
    }

    pub fn performance_grade(&self) -> PerformanceGrade {
        PerformanceGrade::from_score(self.performance_score())
    }

    pub fn is_performing_well(&self) -> bool {
        self.performance_score() >= PERFORMING_WELL_SCORE
    }

    pub fn needs_attention(&self) -> bool {
        self.performance_score() < NEEDS_ATTENTION_SCORE
    }

    pub fn recommendations(&self) -> Vec<Recommendation> {
        performance::recommendations(self.impressions, &self.derived)
    }

    fn money_in_currency(&self, amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, self.currency().clone())
            .unwrap_or_else(|_| Money::zero(self.currency().clone()))
    }
}

impl Default for CampaignMetrics {
    fn default() -> Self {
        Self::new(Currency::default())
    }
}

/// Adds a monetary delta to a running total. Deltas only ever grow a total.
fn add_delta(total: &Money, delta: Option<&Money>) -> Result<Money, MoneyError> {
    match delta {
        Some(delta) if delta.amount().is_sign_negative() && !delta.is_zero() => {
            Err(MoneyError::NegativeAmount(delta.amount()))
        }
        Some(delta) => total.add(delta),
        None => Ok(total.clone()),
    }
}
