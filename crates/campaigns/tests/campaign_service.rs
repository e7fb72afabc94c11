//! Integration tests for the campaign service against the in-memory ports.

use campaigns::{
    BudgetAlertType, CampaignRepository, CampaignService, Granularity, InMemoryCampaignRepository,
    InMemoryNotificationService, InMemoryTargetingService, InMemoryTrackedEventRepository,
    ListCriteria, Notification, PerformanceAlertType, SaveOptions, ServiceConfig, ServiceError,
    SortField, SortOrder, TimePeriod,
};
use chrono::{Duration, Utc};
use common::{CampaignId, RuleId, UserId, Version};
use domain::{
    ActivateCampaign, Aggregate, CampaignError, CampaignSettings, CampaignStatus, CampaignType,
    CancelCampaign, Channel, CompleteCampaign, CreateCampaign, Currency, DeleteCampaign,
    DomainEvent, ErrorKind, Money, PauseCampaign, RescheduleCampaign, ResumeCampaign,
    TrackCampaignEvent, TrackedEvent, UpdateBudget, UpdateCampaignDetails, UpdateSettings,
    UpdateTargetingRules,
};
use event_bus::InMemoryEventPublisher;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

type TestService = CampaignService<
    InMemoryCampaignRepository,
    InMemoryTargetingService,
    InMemoryNotificationService,
    InMemoryEventPublisher,
    InMemoryTrackedEventRepository,
>;

struct TestHarness {
    service: TestService,
    repository: InMemoryCampaignRepository,
    targeting: InMemoryTargetingService,
    notifications: InMemoryNotificationService,
    publisher: InMemoryEventPublisher,
    event_log: InMemoryTrackedEventRepository,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    fn with_config(config: ServiceConfig) -> Self {
        let repository = InMemoryCampaignRepository::new();
        let targeting = InMemoryTargetingService::new();
        let notifications = InMemoryNotificationService::new();
        let publisher = InMemoryEventPublisher::new();
        let event_log = InMemoryTrackedEventRepository::new();

        let service = CampaignService::with_config(
            repository.clone(),
            targeting.clone(),
            notifications.clone(),
            publisher.clone(),
            event_log.clone(),
            config,
        );

        Self {
            service,
            repository,
            targeting,
            notifications,
            publisher,
            event_log,
        }
    }

    async fn create(&self, name: &str) -> CampaignId {
        let cmd = create_cmd(name);
        let campaign_id = cmd.campaign_id;
        self.service.create_campaign(cmd).await.unwrap();
        campaign_id
    }

    async fn create_active(&self, name: &str) -> CampaignId {
        let campaign_id = self.create(name).await;
        self.service
            .activate_campaign(ActivateCampaign::new(campaign_id))
            .await
            .unwrap();
        campaign_id
    }
}

fn create_cmd(name: &str) -> CreateCampaign {
    CreateCampaign::new(
        name,
        CampaignType::Promotion,
        vec![RuleId::new()],
        Utc::now() - Duration::days(1),
        UserId::new(),
    )
}

fn eur(amount: Decimal) -> Money {
    Money::new(amount, Currency::eur()).unwrap()
}

mod create {
    use super::*;

    #[tokio::test]
    async fn test_create_persists_and_publishes() {
        let h = TestHarness::new();
        let cmd = create_cmd("Spring Sale").with_description("Seasonal discount");
        let campaign_id = cmd.campaign_id;

        let result = h.service.create_campaign(cmd).await.unwrap();

        assert_eq!(result.new_version, Version::first());
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.aggregate.status(), CampaignStatus::Draft);
        assert!(result.aggregate.pending_events().is_empty());

        let stored = h.service.get_campaign(campaign_id).await.unwrap();
        assert_eq!(stored.name(), "Spring Sale");
        assert_eq!(stored.description(), "Seasonal discount");

        assert_eq!(h.publisher.event_types().await, vec!["CampaignCreated"]);
        let envelope = &h.publisher.published().await[0];
        assert_eq!(envelope.aggregate_id, campaign_id.to_string());
        assert_eq!(envelope.aggregate_version, Version::first());
    }

    #[tokio::test]
    async fn test_create_uses_budget_currency_for_metrics() {
        let h = TestHarness::new();
        let budget = Money::new(dec!(500), Currency::usd()).unwrap();

        let result = h
            .service
            .create_campaign(create_cmd("Dollars").with_budget(budget))
            .await
            .unwrap();

        assert_eq!(result.aggregate.metrics().currency(), &Currency::usd());
    }

    #[tokio::test]
    async fn test_create_falls_back_to_configured_currency() {
        let config = ServiceConfig {
            default_currency: Currency::usd(),
            ..ServiceConfig::default()
        };
        let h = TestHarness::with_config(config);

        let result = h
            .service
            .create_campaign(create_cmd("No Budget"))
            .await
            .unwrap();

        assert_eq!(result.aggregate.metrics().currency(), &Currency::usd());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let h = TestHarness::new();
        let mut cmd = create_cmd("");
        cmd.targeting_rules.clear();

        let err = h.service.create_campaign(cmd).await.unwrap_err();

        match err {
            ServiceError::Validation(errors) => {
                assert!(errors.has_field("name"));
                assert!(errors.has_field("targetingRules"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(h.repository.is_empty().await);
        assert_eq!(h.publisher.event_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_name() {
        let h = TestHarness::new();
        h.create("Holiday").await;

        let err = h
            .service
            .create_campaign(create_cmd("Holiday"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(h.repository.len().await, 1);
        assert_eq!(h.publisher.event_count().await, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_targeting_rule() {
        let h = TestHarness::new();
        let rule = RuleId::new();
        h.targeting.mark_unknown(rule).await;
        let mut cmd = create_cmd("Targeted");
        cmd.targeting_rules = vec![rule];

        let err = h.service.create_campaign(cmd).await.unwrap_err();

        match err {
            ServiceError::Validation(errors) => assert!(errors.has_field("targetingRules")),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(h.repository.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_surfaces_targeting_outage() {
        let h = TestHarness::new();
        h.targeting.set_fail(true);

        let err = h
            .service
            .create_campaign(create_cmd("Outage"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert!(h.repository.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_save_publishes_nothing() {
        let h = TestHarness::new();
        h.repository.set_fail_on_save(true);

        let err = h
            .service
            .create_campaign(create_cmd("Unsaved"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert_eq!(h.publisher.event_count().await, 0);
        assert!(h.repository.is_empty().await);
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_fail_command() {
        let h = TestHarness::new();
        h.publisher.set_fail_on_publish(true);
        let cmd = create_cmd("Quiet");
        let campaign_id = cmd.campaign_id;

        let result = h.service.create_campaign(cmd).await.unwrap();

        assert_eq!(result.events.len(), 1);
        assert_eq!(h.publisher.event_count().await, 0);
        assert!(h.service.get_campaign(campaign_id).await.is_ok());
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_activate_notifies_start() {
        let h = TestHarness::new();
        let campaign_id = h.create("Launch").await;

        let result = h
            .service
            .activate_campaign(ActivateCampaign::new(campaign_id))
            .await
            .unwrap();

        assert_eq!(result.aggregate.status(), CampaignStatus::Active);
        assert_eq!(result.new_version, Version::new(2));
        assert_eq!(
            h.notifications.sent().await,
            vec![Notification::CampaignStarted(campaign_id)]
        );
        assert_eq!(
            h.publisher.event_types().await,
            vec!["CampaignCreated", "CampaignActivated"]
        );
    }

    #[tokio::test]
    async fn test_activate_from_paused_resumes_without_notification() {
        let h = TestHarness::new();
        let campaign_id = h.create_active("Pausing").await;
        h.service
            .pause_campaign(PauseCampaign::new(campaign_id))
            .await
            .unwrap();
        h.notifications.clear().await;

        let result = h
            .service
            .activate_campaign(ActivateCampaign::new(campaign_id))
            .await
            .unwrap();

        assert_eq!(result.aggregate.status(), CampaignStatus::Active);
        assert_eq!(result.events[0].event_type(), "CampaignResumed");
        assert_eq!(h.notifications.sent_count().await, 0);
    }

    #[tokio::test]
    async fn test_full_lifecycle_versions_and_events() {
        let h = TestHarness::new();
        let campaign_id = h.create_active("Lifecycle").await;

        h.service
            .pause_campaign(PauseCampaign::new(campaign_id))
            .await
            .unwrap();
        h.service
            .resume_campaign(ResumeCampaign::new(campaign_id))
            .await
            .unwrap();
        let result = h
            .service
            .complete_campaign(CompleteCampaign::new(campaign_id))
            .await
            .unwrap();

        assert_eq!(result.aggregate.status(), CampaignStatus::Completed);
        assert_eq!(result.new_version, Version::new(5));
        assert_eq!(
            h.publisher.event_types().await,
            vec![
                "CampaignCreated",
                "CampaignActivated",
                "CampaignPaused",
                "CampaignResumed",
                "CampaignCompleted",
            ]
        );
        let versions: Vec<i64> = h
            .publisher
            .events_for_aggregate(&campaign_id.to_string())
            .await
            .iter()
            .map(|e| e.aggregate_version.as_i64())
            .collect();
        assert_eq!(versions, vec![1, 2, 3, 4, 5]);
        assert_eq!(
            h.notifications.sent().await,
            vec![
                Notification::CampaignStarted(campaign_id),
                Notification::CampaignEnded(campaign_id),
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_transition_changes_nothing() {
        let h = TestHarness::new();
        let campaign_id = h.create("Draft Only").await;

        let err = h
            .service
            .pause_campaign(PauseCampaign::new(campaign_id))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Campaign(CampaignError::InvalidTransition {
                current: CampaignStatus::Draft,
                action: "pause",
            })
        ));
        assert_eq!(err.kind(), ErrorKind::BusinessRule);
        assert_eq!(
            h.repository.stored_version(campaign_id).await,
            Some(Version::first())
        );
        assert_eq!(h.publisher.event_count().await, 1);
    }

    #[tokio::test]
    async fn test_activate_before_start_date_is_rejected() {
        let h = TestHarness::new();
        let mut cmd = create_cmd("Future");
        cmd.start_date = Utc::now() + Duration::days(7);
        let campaign_id = cmd.campaign_id;
        h.service.create_campaign(cmd).await.unwrap();

        let err = h
            .service
            .activate_campaign(ActivateCampaign::new(campaign_id))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Campaign(CampaignError::StartDateInFuture { .. })
        ));
        assert_eq!(h.notifications.sent_count().await, 0);
    }

    #[tokio::test]
    async fn test_cancel_requires_reason() {
        let h = TestHarness::new();
        let campaign_id = h.create_active("Cancelling").await;

        let err = h
            .service
            .cancel_campaign(CancelCampaign::new(campaign_id, "  "))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let result = h
            .service
            .cancel_campaign(CancelCampaign::new(campaign_id, "Budget cut"))
            .await
            .unwrap();
        assert_eq!(result.aggregate.status(), CampaignStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_missing_campaign_is_not_found() {
        let h = TestHarness::new();
        let missing = CampaignId::new();

        let err = h
            .service
            .activate_campaign(ActivateCampaign::new(missing))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(id) if id == missing));
        assert!(h.repository.is_empty().await);
        assert_eq!(h.publisher.event_count().await, 0);
        assert_eq!(h.notifications.sent_count().await, 0);
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_command() {
        let h = TestHarness::new();
        let campaign_id = h.create("Unheard").await;
        h.notifications.set_fail_on_send(true);

        let result = h
            .service
            .activate_campaign(ActivateCampaign::new(campaign_id))
            .await
            .unwrap();

        assert_eq!(result.aggregate.status(), CampaignStatus::Active);
        assert_eq!(h.notifications.sent_count().await, 0);
        assert_eq!(h.publisher.event_count().await, 2);
    }
}

mod updates {
    use super::*;

    #[tokio::test]
    async fn test_targeting_locked_while_active() {
        let h = TestHarness::new();
        let campaign_id = h.create_active("Locked").await;

        let err = h
            .service
            .update_targeting_rules(UpdateTargetingRules::new(campaign_id, vec![RuleId::new()]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Campaign(CampaignError::TargetingLocked { .. })
        ));
    }

    #[tokio::test]
    async fn test_targeting_lock_is_checked_before_targeting_system() {
        let h = TestHarness::new();
        let active = h.create_active("Running").await;
        let done = h.create_active("Finished").await;
        h.service
            .complete_campaign(CompleteCampaign::new(done))
            .await
            .unwrap();
        h.targeting.set_fail(true);

        let err = h
            .service
            .update_targeting_rules(UpdateTargetingRules::new(active, vec![RuleId::new()]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BusinessRule);
        assert!(matches!(
            err,
            ServiceError::Campaign(CampaignError::TargetingLocked { .. })
        ));

        let err = h
            .service
            .update_targeting_rules(UpdateTargetingRules::new(done, vec![RuleId::new()]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Campaign(CampaignError::Terminal { .. })
        ));
    }

    #[tokio::test]
    async fn test_targeting_update_checks_rules_first() {
        let h = TestHarness::new();
        let campaign_id = h.create("Retarget").await;
        let rule = RuleId::new();
        h.targeting.mark_unknown(rule).await;

        let err = h
            .service
            .update_targeting_rules(UpdateTargetingRules::new(campaign_id, vec![rule]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let replacement = vec![RuleId::new(), RuleId::new()];
        let result = h
            .service
            .update_targeting_rules(UpdateTargetingRules::new(campaign_id, replacement.clone()))
            .await
            .unwrap();
        assert_eq!(result.aggregate.targeting_rules(), replacement.as_slice());
        assert_eq!(result.new_version, Version::new(2));
    }

    #[tokio::test]
    async fn test_budget_update_in_other_currency_is_rejected() {
        let h = TestHarness::new();
        let campaign_id = h.create("Budgeted").await;

        let usd = Money::new(dec!(100), Currency::usd()).unwrap();
        let err = h
            .service
            .update_budget(UpdateBudget::new(campaign_id, Some(usd)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let result = h
            .service
            .update_budget(UpdateBudget::new(campaign_id, Some(eur(dec!(100)))))
            .await
            .unwrap();
        assert_eq!(result.aggregate.budget(), Some(&eur(dec!(100))));
    }

    #[tokio::test]
    async fn test_reschedule_draft() {
        let h = TestHarness::new();
        let campaign_id = h.create("Moving").await;
        let start = Utc::now() + Duration::days(3);
        let end = start + Duration::days(10);

        let result = h
            .service
            .reschedule_campaign(RescheduleCampaign::new(campaign_id, start, Some(end)))
            .await
            .unwrap();

        assert_eq!(result.aggregate.start_date(), start);
        assert_eq!(result.aggregate.end_date(), Some(end));
    }

    #[tokio::test]
    async fn test_rename_checks_uniqueness() {
        let h = TestHarness::new();
        h.create("Taken").await;
        let campaign_id = h.create("Original").await;

        let err = h
            .service
            .update_details(UpdateCampaignDetails::new(campaign_id, "Taken", ""))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // keeping the current name is not a conflict with itself
        h.service
            .update_details(UpdateCampaignDetails::new(campaign_id, "Original", "New copy"))
            .await
            .unwrap();

        let result = h
            .service
            .update_details(UpdateCampaignDetails::new(campaign_id, "Renamed", "New copy"))
            .await
            .unwrap();
        assert_eq!(result.aggregate.name(), "Renamed");
        assert!(!h.service.campaign_exists_by_name("Original").await.unwrap());
        assert!(h.service.campaign_exists_by_name("Renamed").await.unwrap());
    }

    #[tokio::test]
    async fn test_settings_update_publishes_and_bumps_version() {
        let h = TestHarness::new();
        let campaign_id = h.create("Omnichannel").await;
        let settings = CampaignSettings::for_channels([Channel::Email, Channel::Sms]);

        let result = h
            .service
            .update_settings(UpdateSettings::new(campaign_id, settings.clone()))
            .await
            .unwrap();

        assert_eq!(result.new_version, Version::new(2));
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.aggregate.settings(), &settings);

        let stored = h.service.get_campaign(campaign_id).await.unwrap();
        assert_eq!(stored.settings(), &settings);
        assert_eq!(stored.version(), Version::new(2));
        assert_eq!(
            h.publisher.event_types().await,
            vec!["CampaignCreated", "CampaignSettingsUpdated"]
        );
    }

    #[tokio::test]
    async fn test_invalid_settings_report_nested_fields() {
        let h = TestHarness::new();
        let campaign_id = h.create("Misconfigured").await;
        let mut settings = CampaignSettings::for_channels([Channel::Email]);
        settings.channels.clear();
        settings.max_impressions = Some(0);

        let err = h
            .service
            .update_settings(UpdateSettings::new(campaign_id, settings))
            .await
            .unwrap_err();

        match err {
            ServiceError::Validation(errors) => {
                assert!(errors.has_field("settings.channels"));
                assert!(errors.has_field("settings.maxImpressions"));
            }
            other => panic!("unexpected error {other:?}"),
        }

        let stored = h.service.get_campaign(campaign_id).await.unwrap();
        assert_eq!(stored.version(), Version::first());
        assert_eq!(h.publisher.event_types().await, vec!["CampaignCreated"]);
    }

    #[tokio::test]
    async fn test_updates_rejected_once_terminal() {
        let h = TestHarness::new();
        let campaign_id = h.create_active("Done").await;
        h.service
            .complete_campaign(CompleteCampaign::new(campaign_id))
            .await
            .unwrap();

        let err = h
            .service
            .update_budget(UpdateBudget::new(campaign_id, None))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Campaign(CampaignError::Terminal { .. })
        ));
    }

    #[tokio::test]
    async fn test_stale_write_is_a_conflict() {
        let h = TestHarness::new();
        let campaign_id = h.create("Contended").await;
        let mut stale = h.service.get_campaign(campaign_id).await.unwrap();

        h.service
            .activate_campaign(ActivateCampaign::new(campaign_id))
            .await
            .unwrap();

        let loaded_version = stale.version();
        stale.update_details("Contended", "lost update").unwrap();
        let err = h
            .repository
            .save(&stale, SaveOptions::expect_version(loaded_version))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        let current = h.service.get_campaign(campaign_id).await.unwrap();
        assert_eq!(current.status(), CampaignStatus::Active);
        assert_eq!(current.description(), "");
    }
}

mod tracking {
    use super::*;

    #[tokio::test]
    async fn test_tracked_events_update_metrics() {
        let h = TestHarness::new();
        let campaign_id = h.create_active("Tracked").await;

        for _ in 0..10 {
            h.service
                .track_event(TrackCampaignEvent::new(
                    campaign_id,
                    TrackedEvent::impression(),
                ))
                .await
                .unwrap();
        }
        h.service
            .track_event(TrackCampaignEvent::new(
                campaign_id,
                TrackedEvent::click().with_cost(eur(dec!(2))),
            ))
            .await
            .unwrap();
        let result = h
            .service
            .track_event(TrackCampaignEvent::new(
                campaign_id,
                TrackedEvent::conversion().with_revenue(eur(dec!(10))),
            ))
            .await
            .unwrap();

        let metrics = result.aggregate.metrics();
        assert_eq!(metrics.impressions(), 10);
        assert_eq!(metrics.clicks(), 1);
        assert_eq!(metrics.conversions(), 1);
        assert_eq!(metrics.ctr(), 10.0);
        assert_eq!(metrics.roi(), 400.0);
        assert_eq!(result.new_version, Version::new(14));
    }

    #[tokio::test]
    async fn test_negative_roi_sends_performance_alert() {
        let h = TestHarness::new();
        let campaign_id = h.create_active("Losing").await;
        h.notifications.clear().await;

        h.service
            .track_event(TrackCampaignEvent::new(
                campaign_id,
                TrackedEvent::click().with_cost(eur(dec!(5))),
            ))
            .await
            .unwrap();

        let sent = h.notifications.sent_for(campaign_id).await;
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            Notification::PerformanceAlert(_, alert) => {
                assert_eq!(alert.alert_type, PerformanceAlertType::NegativeRoi);
                assert_eq!(alert.current_value, -100.0);
            }
            other => panic!("unexpected notification {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exceeded_budget_sends_both_budget_alerts() {
        let h = TestHarness::new();
        let cmd = create_cmd("Overspent").with_budget(eur(dec!(100)));
        let campaign_id = cmd.campaign_id;
        h.service.create_campaign(cmd).await.unwrap();

        h.service
            .track_event(TrackCampaignEvent::new(
                campaign_id,
                TrackedEvent::conversion()
                    .with_cost(eur(dec!(120)))
                    .with_revenue(eur(dec!(500))),
            ))
            .await
            .unwrap();

        let budget_alerts: Vec<BudgetAlertType> = h
            .notifications
            .sent()
            .await
            .into_iter()
            .filter_map(|n| match n {
                Notification::BudgetAlert(_, alert) => Some(alert.alert_type),
                _ => None,
            })
            .collect();
        assert_eq!(
            budget_alerts,
            vec![BudgetAlertType::ApproachingLimit, BudgetAlertType::Exceeded]
        );
    }

    #[tokio::test]
    async fn test_alerts_can_be_disabled() {
        let config = ServiceConfig {
            alerts_enabled: false,
            ..ServiceConfig::default()
        };
        let h = TestHarness::with_config(config);
        let campaign_id = h.create("Silent").await;

        h.service
            .track_event(TrackCampaignEvent::new(
                campaign_id,
                TrackedEvent::click().with_cost(eur(dec!(5))),
            ))
            .await
            .unwrap();

        assert_eq!(h.notifications.sent_count().await, 0);
    }

    #[tokio::test]
    async fn test_currency_mismatch_is_rejected() {
        let h = TestHarness::new();
        let campaign_id = h.create("Euro Only").await;
        let usd = Money::new(dec!(5), Currency::usd()).unwrap();

        let err = h
            .service
            .track_event(TrackCampaignEvent::new(
                campaign_id,
                TrackedEvent::click().with_cost(usd),
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Campaign(CampaignError::Money(_))));
        let stored = h.service.get_campaign(campaign_id).await.unwrap();
        assert_eq!(stored.metrics().clicks(), 0);
        assert_eq!(stored.version(), Version::first());
    }
}

mod reporting {
    use super::*;

    fn hours_ago(event: TrackedEvent, hours: i64) -> TrackedEvent {
        let mut event = event;
        event.occurred_at = Utc::now() - Duration::hours(hours);
        event
    }

    async fn track(h: &TestHarness, campaign_id: CampaignId, event: TrackedEvent) {
        h.service
            .track_event(TrackCampaignEvent::new(campaign_id, event))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_tracked_events_are_logged() {
        let h = TestHarness::new();
        let campaign_id = h.create_active("Logged").await;
        let older = hours_ago(TrackedEvent::impression(), 2);
        let newer = hours_ago(TrackedEvent::click(), 1);
        track(&h, campaign_id, older.clone()).await;
        track(&h, campaign_id, newer.clone()).await;

        let recent = h.service.recent_events(campaign_id, 10).await.unwrap();
        assert_eq!(recent, vec![newer, older]);
        assert_eq!(h.event_log.len().await, 2);

        let err = h
            .service
            .recent_events(CampaignId::new(), 10)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_event_log_failure_does_not_fail_tracking() {
        let h = TestHarness::new();
        let campaign_id = h.create_active("Unlogged").await;
        h.event_log.set_fail_on_append(true);

        let result = h
            .service
            .track_event(TrackCampaignEvent::new(campaign_id, TrackedEvent::click()))
            .await
            .unwrap();

        assert_eq!(result.aggregate.metrics().clicks(), 1);
        assert!(h.event_log.is_empty().await);
    }

    #[tokio::test]
    async fn test_rejected_event_is_not_logged() {
        let h = TestHarness::new();
        let campaign_id = h.create_active("Strict").await;
        let usd = Money::new(dec!(1), Currency::usd()).unwrap();

        h.service
            .track_event(TrackCampaignEvent::new(
                campaign_id,
                TrackedEvent::click().with_cost(usd),
            ))
            .await
            .unwrap_err();

        assert!(h.event_log.is_empty().await);
    }

    #[tokio::test]
    async fn test_period_report_only_counts_events_in_period() {
        let h = TestHarness::new();
        let campaign_id = h.create_active("Windowed").await;
        track(&h, campaign_id, hours_ago(TrackedEvent::impression(), 50)).await;
        track(&h, campaign_id, hours_ago(TrackedEvent::impression(), 30)).await;
        track(
            &h,
            campaign_id,
            hours_ago(TrackedEvent::click().with_cost(eur(dec!(2))), 3),
        )
        .await;

        let now = Utc::now();
        let period = TimePeriod::new(now - Duration::hours(36), now)
            .with_granularity(Granularity::Hour);
        let report = h
            .service
            .period_report(campaign_id, period)
            .await
            .unwrap();

        assert_eq!(report.trends.len(), 36);
        assert_eq!(report.metrics.impressions(), 1);
        assert_eq!(report.metrics.clicks(), 1);
        assert_eq!(report.metrics.cost(), &eur(dec!(2)));
        let busy_buckets = report
            .trends
            .iter()
            .filter(|point| point.metrics.impressions() + point.metrics.clicks() > 0)
            .count();
        assert_eq!(busy_buckets, 2);

        let snapshot = h.service.performance_report(campaign_id).await.unwrap();
        assert_eq!(snapshot.metrics.impressions(), 2);
    }

    #[tokio::test]
    async fn test_period_report_rejects_invalid_period() {
        let h = TestHarness::new();
        let campaign_id = h.create("Backwards").await;
        let now = Utc::now();

        let err = h
            .service
            .period_report(campaign_id, TimePeriod::new(now, now - Duration::days(1)))
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(errors) => assert!(errors.has_field("end")),
            other => panic!("unexpected error {other:?}"),
        }

        let err = h
            .service
            .period_report(CampaignId::new(), TimePeriod::last_days(7))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_compare_performance_ranks_campaigns() {
        let h = TestHarness::new();
        let idle = h.create_active("Idle").await;
        let busy = h.create_active("Busy").await;
        for event in [
            TrackedEvent::impression(),
            TrackedEvent::click().with_cost(eur(dec!(1))),
            TrackedEvent::conversion().with_revenue(eur(dec!(4))),
        ] {
            track(&h, busy, hours_ago(event, 1)).await;
        }

        let comparison = h
            .service
            .compare_performance(&[idle, busy], TimePeriod::last_days(1))
            .await
            .unwrap();

        assert_eq!(comparison.best_performer, Some(busy));
        assert_eq!(comparison.worst_performer, Some(idle));
        let ranked: Vec<_> = comparison
            .campaigns
            .iter()
            .map(|c| (c.name.as_str(), c.rank))
            .collect();
        assert_eq!(ranked, vec![("Busy", 1), ("Idle", 2)]);
    }

    #[tokio::test]
    async fn test_compare_performance_validates_input() {
        let h = TestHarness::new();

        let err = h
            .service
            .compare_performance(&[], TimePeriod::last_days(1))
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(errors) => assert!(errors.has_field("campaignIds")),
            other => panic!("unexpected error {other:?}"),
        }

        let known = h.create("Known").await;
        let err = h
            .service
            .compare_performance(&[known, CampaignId::new()], TimePeriod::last_days(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn test_delete_active_is_rejected() {
        let h = TestHarness::new();
        let campaign_id = h.create_active("Running").await;

        let err = h
            .service
            .delete_campaign(DeleteCampaign::new(campaign_id))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Campaign(CampaignError::InvalidTransition {
                action: "delete",
                ..
            })
        ));
        assert!(!h.repository.is_deleted(campaign_id).await);
    }

    #[tokio::test]
    async fn test_deleted_campaign_disappears_and_frees_name() {
        let h = TestHarness::new();
        let campaign_id = h.create("Retired").await;

        h.service
            .delete_campaign(DeleteCampaign::new(campaign_id).with_reason("duplicate"))
            .await
            .unwrap();

        assert!(h.repository.is_deleted(campaign_id).await);
        assert!(matches!(
            h.service.get_campaign(campaign_id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(!h.service.campaign_exists_by_name("Retired").await.unwrap());
        h.create("Retired").await;
    }
}

mod queries {
    use super::*;

    #[tokio::test]
    async fn test_list_filters_sorts_and_pages() {
        let h = TestHarness::new();
        for name in ["Alpha", "Bravo", "Charlie", "Delta", "Echo"] {
            h.create(name).await;
        }
        let active = h.create_active("Foxtrot").await;

        let criteria = ListCriteria::new()
            .status(CampaignStatus::Draft)
            .sort(SortField::Name, SortOrder::Asc)
            .page(2, 2);
        let page = h.service.list_campaigns(&criteria).await.unwrap();

        let names: Vec<&str> = page.items.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["Charlie", "Delta"]);
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);
        assert!(page.has_previous);

        let active_only = ListCriteria::new().status(CampaignStatus::Active);
        let page = h.service.list_campaigns(&active_only).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id(), active);
        assert_eq!(h.service.count_campaigns(&active_only).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_search_and_type() {
        let h = TestHarness::new();
        h.create("Summer Promo").await;
        let mut cmd = create_cmd("Summer Loyalty");
        cmd.campaign_type = CampaignType::Loyalty;
        h.service.create_campaign(cmd).await.unwrap();

        let page = h
            .service
            .list_campaigns(&ListCriteria::new().search("summer"))
            .await
            .unwrap();
        assert_eq!(page.total, 2);

        let page = h
            .service
            .list_campaigns(&ListCriteria::new().campaign_type(CampaignType::Loyalty))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name(), "Summer Loyalty");
    }

    #[tokio::test]
    async fn test_list_rejects_invalid_paging() {
        let h = TestHarness::new();

        let err = h
            .service
            .list_campaigns(&ListCriteria::new().page(0, 500))
            .await
            .unwrap_err();

        match err {
            ServiceError::Validation(errors) => {
                assert!(errors.has_field("page"));
                assert!(errors.has_field("limit"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_count_rejects_invalid_paging() {
        let h = TestHarness::new();
        h.create("Counted").await;

        let err = h
            .service
            .count_campaigns(&ListCriteria::new().page(0, 500))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let total = h.service.count_campaigns(&ListCriteria::new()).await.unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_performance_report() {
        let h = TestHarness::new();
        let campaign_id = h.create_active("Reported").await;
        for event in [
            TrackedEvent::impression(),
            TrackedEvent::click().with_cost(eur(dec!(1))),
            TrackedEvent::conversion().with_revenue(eur(dec!(4))),
        ] {
            h.service
                .track_event(TrackCampaignEvent::new(campaign_id, event))
                .await
                .unwrap();
        }

        let report = h.service.performance_report(campaign_id).await.unwrap();

        assert_eq!(report.campaign_id, campaign_id);
        assert_eq!(report.status, CampaignStatus::Active);
        assert_eq!(report.metrics.conversions(), 1);
        assert_eq!(report.score, 100.0);
        assert!(report.performing_well);
        assert!(!report.budget_exceeded);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["name"], "Reported");
        assert!(json.get("performingWell").is_some());
    }
}
