//! Campaign service orchestrating the aggregate and its collaborators.

use std::future::Future;
use std::time::Instant;

use common::CampaignId;
use domain::{
    ActivateCampaign, Aggregate, Campaign, CampaignError, CampaignEvent, CampaignStatus,
    CancelCampaign, Command, CommandResult, CompleteCampaign, CreateCampaign, DeleteCampaign,
    PauseCampaign, RescheduleCampaign, ResumeCampaign, TrackCampaignEvent, TrackedEvent,
    UpdateBudget, UpdateCampaignDetails, UpdateSettings, UpdateTargetingRules,
    ValidationErrors,
};
use event_bus::EventPublisher;
use tracing::{debug, info, warn};

use crate::alerts::{budget_alerts, performance_alerts};
use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use crate::period::TimePeriod;
use crate::ports::{
    CampaignRepository, NotificationService, RepositoryError, SaveOptions, TargetingService,
    TrackedEventRepository,
};
use crate::publishing::envelopes_for;
use crate::query::{ListCriteria, Page};
use crate::report::{PerformanceComparison, PerformanceReport, PeriodReport};

/// Most campaigns a single comparison may cover.
pub const MAX_COMPARED_CAMPAIGNS: usize = 20;

/// Service for managing campaigns.
///
/// Every command follows the same sequence: validate the input, load the
/// campaign, apply the change, persist it with an optimistic version check,
/// then publish the recorded events. Publishing, notifications and the
/// tracked event log are best-effort and only run once the change is stored.
pub struct CampaignService<R, T, N, P, E>
where
    R: CampaignRepository,
    T: TargetingService,
    N: NotificationService,
    P: EventPublisher,
    E: TrackedEventRepository,
{
    repository: R,
    targeting: T,
    notifications: N,
    publisher: P,
    event_log: E,
    config: ServiceConfig,
}

impl<R, T, N, P, E> CampaignService<R, T, N, P, E>
where
    R: CampaignRepository,
    T: TargetingService,
    N: NotificationService,
    P: EventPublisher,
    E: TrackedEventRepository,
{
    /// Creates a new campaign service with the default configuration.
    pub fn new(
        repository: R,
        targeting: T,
        notifications: N,
        publisher: P,
        event_log: E,
    ) -> Self {
        Self::with_config(
            repository,
            targeting,
            notifications,
            publisher,
            event_log,
            ServiceConfig::default(),
        )
    }

    pub fn with_config(
        repository: R,
        targeting: T,
        notifications: N,
        publisher: P,
        event_log: E,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repository,
            targeting,
            notifications,
            publisher,
            event_log,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn notifications(&self) -> &N {
        &self.notifications
    }

    pub fn event_log(&self) -> &E {
        &self.event_log
    }

    // Commands

    /// Creates a draft campaign.
    ///
    /// The name must be unused among live campaigns and the targeting system
    /// must accept every rule.
    #[tracing::instrument(skip(self, cmd), fields(campaign_id = %cmd.campaign_id))]
    pub async fn create_campaign(&self, cmd: CreateCampaign) -> Result<CommandResult<Campaign>> {
        observed("create", async move {
            cmd.validate()?;
            self.ensure_name_available(&cmd.name).await?;
            self.targeting
                .validate_targeting_rules(&cmd.targeting_rules)
                .await
                .map_err(|e| ServiceError::from_targeting("validate targeting rules", e))?;

            let campaign = Campaign::create(cmd, self.config.default_currency.clone())?;
            let result = self.commit(campaign, SaveOptions::expect_new()).await?;

            info!(name = %result.aggregate.name(), "campaign created");
            Ok(result)
        })
        .await
    }

    /// Activates a draft campaign or resumes a paused one.
    #[tracing::instrument(skip(self, cmd), fields(campaign_id = %cmd.campaign_id))]
    pub async fn activate_campaign(
        &self,
        cmd: ActivateCampaign,
    ) -> Result<CommandResult<Campaign>> {
        observed("activate", async move {
            cmd.validate()?;
            let mut previous = CampaignStatus::Draft;
            let result = self
                .execute(cmd.campaign_id, |campaign| {
                    previous = campaign.status();
                    campaign.activate()
                })
                .await?;

            info!(from = %previous, "campaign activated");
            if previous == CampaignStatus::Draft {
                let outcome = self
                    .notifications
                    .send_campaign_started(cmd.campaign_id)
                    .await;
                notification_outcome("campaign started", outcome);
            }
            Ok(result)
        })
        .await
    }

    #[tracing::instrument(skip(self, cmd), fields(campaign_id = %cmd.campaign_id))]
    pub async fn pause_campaign(&self, cmd: PauseCampaign) -> Result<CommandResult<Campaign>> {
        observed("pause", async move {
            cmd.validate()?;
            let result = self
                .execute(cmd.campaign_id, |campaign| campaign.pause())
                .await?;
            info!("campaign paused");
            Ok(result)
        })
        .await
    }

    #[tracing::instrument(skip(self, cmd), fields(campaign_id = %cmd.campaign_id))]
    pub async fn resume_campaign(&self, cmd: ResumeCampaign) -> Result<CommandResult<Campaign>> {
        observed("resume", async move {
            cmd.validate()?;
            let result = self
                .execute(cmd.campaign_id, |campaign| campaign.resume())
                .await?;
            info!("campaign resumed");
            Ok(result)
        })
        .await
    }

    #[tracing::instrument(skip(self, cmd), fields(campaign_id = %cmd.campaign_id))]
    pub async fn complete_campaign(
        &self,
        cmd: CompleteCampaign,
    ) -> Result<CommandResult<Campaign>> {
        observed("complete", async move {
            cmd.validate()?;
            let result = self
                .execute(cmd.campaign_id, |campaign| campaign.complete())
                .await?;

            info!("campaign completed");
            let outcome = self
                .notifications
                .send_campaign_ended(cmd.campaign_id)
                .await;
            notification_outcome("campaign ended", outcome);
            Ok(result)
        })
        .await
    }

    #[tracing::instrument(skip(self, cmd), fields(campaign_id = %cmd.campaign_id))]
    pub async fn cancel_campaign(&self, cmd: CancelCampaign) -> Result<CommandResult<Campaign>> {
        observed("cancel", async move {
            cmd.validate()?;
            let result = self
                .execute(cmd.campaign_id, |campaign| campaign.cancel(&cmd.reason))
                .await?;
            info!(reason = %cmd.reason, "campaign cancelled");
            Ok(result)
        })
        .await
    }

    /// Replaces the targeting rules after the targeting system accepted them.
    #[tracing::instrument(skip(self, cmd), fields(campaign_id = %cmd.campaign_id))]
    pub async fn update_targeting_rules(
        &self,
        cmd: UpdateTargetingRules,
    ) -> Result<CommandResult<Campaign>> {
        observed("update_targeting_rules", async move {
            cmd.validate()?;
            let mut campaign = self.load(cmd.campaign_id).await?;
            campaign.ensure_targeting_editable()?;
            self.targeting
                .validate_targeting_rules(&cmd.rules)
                .await
                .map_err(|e| ServiceError::from_targeting("validate targeting rules", e))?;

            let loaded_version = campaign.version();
            campaign.update_targeting_rules(cmd.rules)?;
            let result = self
                .commit(campaign, SaveOptions::expect_version(loaded_version))
                .await?;

            info!(
                rules = result.aggregate.targeting_rules().len(),
                "targeting rules updated"
            );
            Ok(result)
        })
        .await
    }

    #[tracing::instrument(skip(self, cmd), fields(campaign_id = %cmd.campaign_id))]
    pub async fn update_budget(&self, cmd: UpdateBudget) -> Result<CommandResult<Campaign>> {
        observed("update_budget", async move {
            cmd.validate()?;
            let result = self
                .execute(cmd.campaign_id, |campaign| campaign.update_budget(cmd.budget))
                .await?;
            info!(budget = ?result.aggregate.budget(), "budget updated");
            Ok(result)
        })
        .await
    }

    #[tracing::instrument(skip(self, cmd), fields(campaign_id = %cmd.campaign_id))]
    pub async fn update_settings(&self, cmd: UpdateSettings) -> Result<CommandResult<Campaign>> {
        observed("update_settings", async move {
            cmd.validate()?;
            let result = self
                .execute(cmd.campaign_id, |campaign| {
                    campaign.update_settings(cmd.settings)
                })
                .await?;
            info!("settings updated");
            Ok(result)
        })
        .await
    }

    #[tracing::instrument(skip(self, cmd), fields(campaign_id = %cmd.campaign_id))]
    pub async fn reschedule_campaign(
        &self,
        cmd: RescheduleCampaign,
    ) -> Result<CommandResult<Campaign>> {
        observed("reschedule", async move {
            cmd.validate()?;
            let result = self
                .execute(cmd.campaign_id, |campaign| {
                    campaign.reschedule(cmd.start_date, cmd.end_date)
                })
                .await?;
            info!(start_date = %cmd.start_date, "campaign rescheduled");
            Ok(result)
        })
        .await
    }

    /// Renames or re-describes a campaign. A new name must be unused.
    #[tracing::instrument(skip(self, cmd), fields(campaign_id = %cmd.campaign_id))]
    pub async fn update_details(
        &self,
        cmd: UpdateCampaignDetails,
    ) -> Result<CommandResult<Campaign>> {
        observed("update_details", async move {
            cmd.validate()?;
            let mut campaign = self.load(cmd.campaign_id).await?;
            if campaign.name() != cmd.name {
                self.ensure_name_available(&cmd.name).await?;
            }

            let loaded_version = campaign.version();
            campaign.update_details(cmd.name, cmd.description)?;
            let result = self
                .commit(campaign, SaveOptions::expect_version(loaded_version))
                .await?;

            info!(name = %result.aggregate.name(), "details updated");
            Ok(result)
        })
        .await
    }

    /// Records a customer interaction, appends it to the event log and
    /// evaluates alerts on the result.
    ///
    /// A failed append is logged and counted but does not fail the command,
    /// since the campaign totals are already stored.
    #[tracing::instrument(
        skip(self, cmd),
        fields(campaign_id = %cmd.campaign_id, kind = cmd.event.kind.as_str())
    )]
    pub async fn track_event(&self, cmd: TrackCampaignEvent) -> Result<CommandResult<Campaign>> {
        observed("track_event", async move {
            cmd.validate()?;
            let event = cmd.event.clone();
            let result = self
                .execute(cmd.campaign_id, |campaign| campaign.track_event(cmd.event))
                .await?;

            debug!("event tracked");
            self.log_event(cmd.campaign_id, &event).await;
            if self.config.alerts_enabled {
                self.send_alerts(&result.aggregate).await;
            }
            Ok(result)
        })
        .await
    }

    /// Soft-deletes a campaign that is not running.
    #[tracing::instrument(skip(self, cmd), fields(campaign_id = %cmd.campaign_id))]
    pub async fn delete_campaign(&self, cmd: DeleteCampaign) -> Result<()> {
        observed("delete", async move {
            cmd.validate()?;
            let campaign = self.load(cmd.campaign_id).await?;
            let current = campaign.status();
            if !current.can_delete() {
                return Err(CampaignError::InvalidTransition {
                    current,
                    action: "delete",
                }
                .into());
            }

            self.repository
                .delete(cmd.campaign_id)
                .await
                .map_err(|e| ServiceError::from_repository("delete campaign", e))?;

            info!(reason = ?cmd.reason, "campaign deleted");
            Ok(())
        })
        .await
    }

    // Queries

    #[tracing::instrument(skip(self))]
    pub async fn get_campaign(&self, campaign_id: CampaignId) -> Result<Campaign> {
        self.load(campaign_id).await
    }

    /// Returns one page of campaigns matching the criteria.
    #[tracing::instrument(skip(self))]
    pub async fn list_campaigns(&self, criteria: &ListCriteria) -> Result<Page<Campaign>> {
        criteria.validate()?;
        let items = self
            .repository
            .list(criteria)
            .await
            .map_err(|e| ServiceError::from_repository("list campaigns", e))?;
        let total = self
            .repository
            .count(criteria)
            .await
            .map_err(|e| ServiceError::from_repository("count campaigns", e))?;

        Ok(Page::new(items, total, criteria.page, criteria.limit))
    }

    #[tracing::instrument(skip(self))]
    pub async fn count_campaigns(&self, criteria: &ListCriteria) -> Result<u64> {
        criteria.validate()?;
        self.repository
            .count(criteria)
            .await
            .map_err(|e| ServiceError::from_repository("count campaigns", e))
    }

    #[tracing::instrument(skip(self))]
    pub async fn campaign_exists_by_name(&self, name: &str) -> Result<bool> {
        self.repository
            .exists_by_name(name)
            .await
            .map_err(|e| ServiceError::from_repository("check campaign name", e))
    }

    #[tracing::instrument(skip(self))]
    pub async fn performance_report(&self, campaign_id: CampaignId) -> Result<PerformanceReport> {
        let campaign = self.load(campaign_id).await?;
        Ok(PerformanceReport::for_campaign(&campaign))
    }

    /// Returns the most recent tracked events of a campaign, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn recent_events(
        &self,
        campaign_id: CampaignId,
        limit: usize,
    ) -> Result<Vec<TrackedEvent>> {
        self.load(campaign_id).await?;
        self.event_log
            .find_by_campaign(campaign_id, limit)
            .await
            .map_err(|e| ServiceError::from_event_log("load tracked events", e))
    }

    /// Rebuilds a campaign's metrics and trends over a period from its
    /// tracked events.
    #[tracing::instrument(skip(self), fields(start = %period.start, end = %period.end))]
    pub async fn period_report(
        &self,
        campaign_id: CampaignId,
        period: TimePeriod,
    ) -> Result<PeriodReport> {
        period.validate()?;
        let campaign = self.load(campaign_id).await?;
        self.build_period_report(&campaign, period).await
    }

    /// Ranks campaigns by their performance over the same period.
    #[tracing::instrument(skip(self, campaign_ids), fields(campaigns = campaign_ids.len()))]
    pub async fn compare_performance(
        &self,
        campaign_ids: &[CampaignId],
        period: TimePeriod,
    ) -> Result<PerformanceComparison> {
        let mut errors = match period.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        if campaign_ids.is_empty() {
            errors.add("campaignIds", "at least one campaign is required");
        } else if campaign_ids.len() > MAX_COMPARED_CAMPAIGNS {
            errors.add(
                "campaignIds",
                format!("at most {MAX_COMPARED_CAMPAIGNS} campaigns can be compared"),
            );
        }
        errors.into_result()?;

        let mut reports = Vec::with_capacity(campaign_ids.len());
        for &campaign_id in campaign_ids {
            let campaign = self.load(campaign_id).await?;
            reports.push(self.build_period_report(&campaign, period).await?);
        }
        Ok(PerformanceComparison::rank(period, reports))
    }

    // Internals

    async fn build_period_report(
        &self,
        campaign: &Campaign,
        period: TimePeriod,
    ) -> Result<PeriodReport> {
        let events = self
            .event_log
            .find_in_period(campaign.id(), &period)
            .await
            .map_err(|e| ServiceError::from_event_log("load tracked events", e))?;
        PeriodReport::build(campaign, period, &events)
            .map_err(|e| CampaignError::from(e).into())
    }

    async fn log_event(&self, campaign_id: CampaignId, event: &TrackedEvent) {
        if let Err(e) = self.event_log.append(campaign_id, event).await {
            warn!(error = %e, "failed to append tracked event");
            metrics::counter!("campaign_event_log_failures_total").increment(1);
        }
    }

    async fn load(&self, campaign_id: CampaignId) -> Result<Campaign> {
        self.repository
            .find_by_id(campaign_id)
            .await
            .map_err(|e| ServiceError::from_repository("load campaign", e))?
            .ok_or(ServiceError::NotFound(campaign_id))
    }

    async fn ensure_name_available(&self, name: &str) -> Result<()> {
        let taken = self
            .repository
            .exists_by_name(name)
            .await
            .map_err(|e| ServiceError::from_repository("check campaign name", e))?;
        if taken {
            return Err(ServiceError::Conflict(
                RepositoryError::DuplicateName(name.to_string()).to_string(),
            ));
        }
        Ok(())
    }

    /// Loads the campaign, applies `mutate` and commits the result against
    /// the loaded version.
    async fn execute<F>(
        &self,
        campaign_id: CampaignId,
        mutate: F,
    ) -> Result<CommandResult<Campaign>>
    where
        F: FnOnce(&mut Campaign) -> std::result::Result<(), CampaignError>,
    {
        let mut campaign = self.load(campaign_id).await?;
        let loaded_version = campaign.version();
        mutate(&mut campaign)?;
        self.commit(campaign, SaveOptions::expect_version(loaded_version))
            .await
    }

    /// Persists the campaign, then publishes the events it recorded.
    ///
    /// Events are drained before the save so that nothing recorded by a
    /// failed save can be published later.
    async fn commit(
        &self,
        mut campaign: Campaign,
        options: SaveOptions,
    ) -> Result<CommandResult<Campaign>> {
        let events = campaign.take_events();
        self.repository
            .save(&campaign, options)
            .await
            .map_err(|e| ServiceError::from_repository("save campaign", e))?;

        self.publish(&campaign, &events).await;

        Ok(CommandResult {
            new_version: campaign.version(),
            aggregate: campaign,
            events,
        })
    }

    async fn publish(&self, campaign: &Campaign, events: &[CampaignEvent]) {
        let envelopes = match envelopes_for(campaign, events) {
            Ok(envelopes) => envelopes,
            Err(e) => {
                warn!(error = %e, "failed to build event envelopes");
                metrics::counter!("campaign_event_publish_failures_total")
                    .increment(events.len() as u64);
                return;
            }
        };

        for envelope in envelopes {
            let event_type = envelope.event_type.clone();
            match self.publisher.publish(envelope).await {
                Ok(()) => {
                    metrics::counter!("campaign_events_published_total").increment(1);
                }
                Err(e) => {
                    warn!(error = %e, %event_type, "failed to publish event");
                    metrics::counter!("campaign_event_publish_failures_total").increment(1);
                }
            }
        }
    }

    async fn send_alerts(&self, campaign: &Campaign) {
        let campaign_id = campaign.id();

        for alert in performance_alerts(campaign) {
            let outcome = self
                .notifications
                .send_performance_alert(campaign_id, &alert)
                .await;
            if outcome.is_ok() {
                let label = alert.alert_type.as_str();
                metrics::counter!("campaign_alerts_sent_total", "alert" => label).increment(1);
            }
            notification_outcome("performance alert", outcome);
        }

        for alert in budget_alerts(campaign) {
            let outcome = self
                .notifications
                .send_budget_alert(campaign_id, &alert)
                .await;
            if outcome.is_ok() {
                let label = alert.alert_type.as_str();
                metrics::counter!("campaign_alerts_sent_total", "alert" => label).increment(1);
            }
            notification_outcome("budget alert", outcome);
        }
    }
}

/// Runs a command future and records its outcome and duration.
async fn observed<T>(
    operation: &'static str,
    command: impl Future<Output = Result<T>>,
) -> Result<T> {
    let started = Instant::now();
    let result = command.await;

    let outcome = match &result {
        Ok(_) => "success",
        Err(e) => e.kind().as_str(),
    };
    metrics::counter!("campaign_commands_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
    metrics::histogram!("campaign_command_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());

    if let Err(e) = &result {
        debug!(operation, error = %e, "command rejected");
    }
    result
}

fn notification_outcome(
    notification: &'static str,
    outcome: std::result::Result<(), crate::ports::NotificationError>,
) {
    if let Err(e) = outcome {
        warn!(error = %e, notification, "failed to send notification");
        metrics::counter!("campaign_notification_failures_total").increment(1);
    }
}
