//! Derived KPIs, performance scoring and recommendations.
//!
//! Everything here is a pure function of raw counters and monetary totals, so
//! the same inputs always produce the same report.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Derived key performance indicators.
///
/// Every field is zero whenever its denominator is zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    /// Click-through rate in percent.
    pub ctr: f64,
    /// Conversions per click in percent.
    pub conversion_rate: f64,
    /// Cost per click, in the cost currency.
    pub cost_per_click: Decimal,
    /// Cost per conversion, in the cost currency.
    pub cost_per_acquisition: Decimal,
    /// Return on ad spend (revenue / cost).
    pub roas: f64,
    /// Return on investment in percent.
    pub roi: f64,
}

impl DerivedMetrics {
    /// Computes the KPIs from raw totals.
    pub fn compute(
        impressions: u64,
        clicks: u64,
        conversions: u64,
        revenue: Decimal,
        cost: Decimal,
    ) -> Self {
        let hundred = Decimal::ONE_HUNDRED;

        let roi = if cost.is_zero() {
            Decimal::ZERO
        } else {
            (revenue - cost)
                .checked_div(cost)
                .and_then(|ratio| ratio.checked_mul(hundred))
                .unwrap_or(Decimal::ZERO)
        };

        Self {
            ctr: percentage(clicks, impressions),
            conversion_rate: percentage(conversions, clicks),
            cost_per_click: per_unit(cost, clicks),
            cost_per_acquisition: per_unit(cost, conversions),
            roas: to_f64(revenue.checked_div(cost).unwrap_or(Decimal::ZERO)),
            roi: to_f64(roi),
        }
    }
}

fn percentage(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 * 100.0 / denominator as f64
}

fn per_unit(cost: Decimal, units: u64) -> Decimal {
    if units == 0 || cost.is_zero() {
        return Decimal::ZERO;
    }
    cost.checked_div(Decimal::from(units))
        .unwrap_or(Decimal::ZERO)
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Letter grade derived from a performance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerformanceGrade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "C+")]
    CPlus,
    C,
    D,
    F,
}

impl PerformanceGrade {
    /// Maps a 0–100 score onto its grade.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => PerformanceGrade::APlus,
            s if s >= 80.0 => PerformanceGrade::A,
            s if s >= 70.0 => PerformanceGrade::BPlus,
            s if s >= 60.0 => PerformanceGrade::B,
            s if s >= 50.0 => PerformanceGrade::CPlus,
            s if s >= 40.0 => PerformanceGrade::C,
            s if s >= 30.0 => PerformanceGrade::D,
            _ => PerformanceGrade::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceGrade::APlus => "A+",
            PerformanceGrade::A => "A",
            PerformanceGrade::BPlus => "B+",
            PerformanceGrade::B => "B",
            PerformanceGrade::CPlus => "C+",
            PerformanceGrade::C => "C",
            PerformanceGrade::D => "D",
            PerformanceGrade::F => "F",
        }
    }
}

impl std::fmt::Display for PerformanceGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Improvement advice, listed in evaluation order.
///
/// Serialized as the human readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum Recommendation {
    ImproveClickThrough,
    ImproveConversion,
    ReviewCosts,
    IncreaseReach,
    ReduceCostPerClick,
}

impl Recommendation {
    pub const ALL: [Recommendation; 5] = [
        Recommendation::ImproveClickThrough,
        Recommendation::ImproveConversion,
        Recommendation::ReviewCosts,
        Recommendation::IncreaseReach,
        Recommendation::ReduceCostPerClick,
    ];

    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::ImproveClickThrough => {
                "Improve ad creative and targeting to increase click-through rate"
            }
            Recommendation::ImproveConversion => {
                "Optimize landing page and user experience to improve conversion rate"
            }
            Recommendation::ReviewCosts => "Review campaign costs and optimize bidding strategy",
            Recommendation::IncreaseReach => {
                "Increase campaign reach and budget to generate more impressions"
            }
            Recommendation::ReduceCostPerClick => {
                "Optimize targeting and ad quality to reduce cost per click"
            }
        }
    }
}

impl From<Recommendation> for &'static str {
    fn from(recommendation: Recommendation) -> Self {
        recommendation.message()
    }
}

impl TryFrom<String> for Recommendation {
    type Error = String;

    fn try_from(message: String) -> Result<Self, Self::Error> {
        Recommendation::ALL
            .into_iter()
            .find(|r| r.message() == message)
            .ok_or_else(|| format!("unknown recommendation: {message}"))
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

pub const PERFORMING_WELL_SCORE: f64 = 60.0;
pub const NEEDS_ATTENTION_SCORE: f64 = 40.0;

const LOW_CTR: f64 = 1.0;
const LOW_CONVERSION_RATE: f64 = 2.0;
const LOW_ROI: f64 = 50.0;
const LOW_IMPRESSIONS: u64 = 1000;
const HIGH_COST_PER_CLICK: Decimal = Decimal::TWO;

/// Scores the KPIs on a 0–100 scale.
///
/// CTR contributes up to 30 points, conversion rate up to 30 and ROI up to 40.
pub fn performance_score(metrics: &DerivedMetrics) -> f64 {
    let ctr = match metrics.ctr {
        v if v >= 5.0 => 30.0,
        v if v >= 2.0 => 20.0,
        v if v >= 1.0 => 10.0,
        _ => 0.0,
    };
    let conversion = match metrics.conversion_rate {
        v if v >= 10.0 => 30.0,
        v if v >= 5.0 => 20.0,
        v if v >= 2.0 => 10.0,
        _ => 0.0,
    };
    let roi = match metrics.roi {
        v if v >= 200.0 => 40.0,
        v if v >= 100.0 => 30.0,
        v if v >= 50.0 => 20.0,
        v if v >= 0.0 => 10.0,
        _ => 0.0,
    };
    ctr + conversion + roi
}

/// Returns every matching recommendation in fixed order.
pub fn recommendations(impressions: u64, metrics: &DerivedMetrics) -> Vec<Recommendation> {
    let mut out = Vec::new();
    if metrics.ctr < LOW_CTR {
        out.push(Recommendation::ImproveClickThrough);
    }
    if metrics.conversion_rate < LOW_CONVERSION_RATE {
        out.push(Recommendation::ImproveConversion);
    }
    if metrics.roi < LOW_ROI {
        out.push(Recommendation::ReviewCosts);
    }
    if impressions < LOW_IMPRESSIONS {
        out.push(Recommendation::IncreaseReach);
    }
    if !metrics.cost_per_click.is_zero() && metrics.cost_per_click > HIGH_COST_PER_CLICK {
        out.push(Recommendation::ReduceCostPerClick);
    }
    out
}
