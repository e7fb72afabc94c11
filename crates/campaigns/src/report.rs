//! Performance summaries of campaigns, as a snapshot or over a period.

use chrono::{DateTime, Utc};
use common::CampaignId;
use domain::{
    Aggregate, Campaign, CampaignMetrics, CampaignStatus, Currency, MoneyError,
    PerformanceGrade, Recommendation, TrackedEvent,
};
use serde::Serialize;

use crate::period::TimePeriod;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub campaign_id: CampaignId,
    pub name: String,
    pub status: CampaignStatus,
    pub metrics: CampaignMetrics,
    pub score: f64,
    pub grade: PerformanceGrade,
    pub recommendations: Vec<Recommendation>,
    pub performing_well: bool,
    pub needs_attention: bool,
    pub budget_exceeded: bool,
    pub approaching_budget_limit: bool,
    pub generated_at: DateTime<Utc>,
}

impl PerformanceReport {
    /// Summarizes the campaign's current metrics.
    pub fn for_campaign(campaign: &Campaign) -> Self {
        Self {
            campaign_id: campaign.id(),
            name: campaign.name().to_string(),
            status: campaign.status(),
            metrics: campaign.metrics().clone(),
            score: campaign.performance_score(),
            grade: campaign.performance_grade(),
            recommendations: campaign.recommendations(),
            performing_well: campaign.is_performing_well(),
            needs_attention: campaign.needs_attention(),
            budget_exceeded: campaign.has_exceeded_budget(),
            approaching_budget_limit: campaign.is_approaching_budget_limit(),
            generated_at: Utc::now(),
        }
    }
}

/// Metrics of one trend bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceDataPoint {
    pub timestamp: DateTime<Utc>,
    pub metrics: CampaignMetrics,
}

/// Performance of a campaign over a period, rebuilt from its tracked events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodReport {
    pub campaign_id: CampaignId,
    pub name: String,
    pub period: TimePeriod,
    pub metrics: CampaignMetrics,
    pub score: f64,
    pub grade: PerformanceGrade,
    pub recommendations: Vec<Recommendation>,
    pub trends: Vec<PerformanceDataPoint>,
    pub generated_at: DateTime<Utc>,
}

impl PeriodReport {
    /// Builds the report from the campaign's events within the period.
    ///
    /// Events outside the period are ignored. The totals are the merge of
    /// every trend bucket.
    pub fn build(
        campaign: &Campaign,
        period: TimePeriod,
        events: &[TrackedEvent],
    ) -> Result<Self, MoneyError> {
        let currency = campaign.metrics().currency();
        let trends = trend_points(&period, events, currency)?;

        let mut metrics = CampaignMetrics::new(currency.clone());
        for point in &trends {
            metrics.merge(&point.metrics)?;
        }

        Ok(Self {
            campaign_id: campaign.id(),
            name: campaign.name().to_string(),
            period,
            score: metrics.performance_score(),
            grade: metrics.performance_grade(),
            recommendations: metrics.recommendations(),
            metrics,
            trends,
            generated_at: Utc::now(),
        })
    }
}

/// Folds the events into one data point per bucket of the period.
pub fn trend_points(
    period: &TimePeriod,
    events: &[TrackedEvent],
    currency: &Currency,
) -> Result<Vec<PerformanceDataPoint>, MoneyError> {
    period
        .buckets()
        .into_iter()
        .map(|bucket| {
            let mut metrics = CampaignMetrics::new(currency.clone());
            for event in events.iter().filter(|e| bucket.contains(e.occurred_at)) {
                metrics.record(event)?;
            }
            Ok(PerformanceDataPoint {
                timestamp: bucket.start,
                metrics,
            })
        })
        .collect()
}

/// One campaign's standing within a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignComparison {
    pub campaign_id: CampaignId,
    pub name: String,
    pub metrics: CampaignMetrics,
    pub score: f64,
    /// 1 for the best score.
    pub rank: usize,
}

/// Campaigns ranked by their performance over the same period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceComparison {
    pub period: TimePeriod,
    pub campaigns: Vec<CampaignComparison>,
    pub best_performer: Option<CampaignId>,
    pub worst_performer: Option<CampaignId>,
    pub average_score: f64,
    pub generated_at: DateTime<Utc>,
}

impl PerformanceComparison {
    /// Ranks period reports by score, best first. Ties keep input order.
    pub fn rank(period: TimePeriod, reports: Vec<PeriodReport>) -> Self {
        let mut reports = reports;
        reports.sort_by(|a, b| b.score.total_cmp(&a.score));

        let average_score = if reports.is_empty() {
            0.0
        } else {
            reports.iter().map(|r| r.score).sum::<f64>() / reports.len() as f64
        };

        let campaigns: Vec<_> = reports
            .into_iter()
            .enumerate()
            .map(|(i, report)| CampaignComparison {
                campaign_id: report.campaign_id,
                name: report.name,
                metrics: report.metrics,
                score: report.score,
                rank: i + 1,
            })
            .collect();

        Self {
            period,
            best_performer: campaigns.first().map(|c| c.campaign_id),
            worst_performer: campaigns.last().map(|c| c.campaign_id),
            campaigns,
            average_score,
            generated_at: Utc::now(),
        }
    }
}
