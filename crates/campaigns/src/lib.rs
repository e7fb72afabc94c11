//! Campaign management service.
//!
//! Orchestrates the [`domain::Campaign`] aggregate against its collaborators:
//!
//! - [`ports::CampaignRepository`] stores campaign state with optimistic
//!   version checks
//! - [`event_bus::EventPublisher`] receives the recorded events after a
//!   successful save
//! - [`ports::TargetingService`] vets targeting rules
//! - [`ports::NotificationService`] delivers alerts and lifecycle notices
//! - [`ports::TrackedEventRepository`] keeps every tracked interaction for
//!   period reports
//!
//! In-memory implementations of every port live next to their traits.

pub mod alerts;
pub mod config;
pub mod error;
pub mod period;
pub mod ports;
pub mod publishing;
pub mod query;
pub mod report;
pub mod service;
pub mod telemetry;

pub use alerts::{
    AlertSeverity, BudgetAlert, BudgetAlertType, PerformanceAlert, PerformanceAlertType,
    budget_alerts, performance_alerts,
};
pub use config::{LogFormat, ServiceConfig};
pub use error::{Result, ServiceError};
pub use period::{Granularity, TimePeriod};
pub use ports::{
    CampaignRepository, InMemoryCampaignRepository, InMemoryNotificationService,
    InMemoryTargetingService, InMemoryTrackedEventRepository, Notification, NotificationError,
    NotificationService, RepositoryError, SaveOptions, TargetingError, TargetingService,
    TrackedEventError, TrackedEventRepository,
};
pub use publishing::{EVENT_SOURCE, envelopes_for};
pub use query::{ListCriteria, Page, SortField, SortOrder};
pub use report::{
    CampaignComparison, PerformanceComparison, PerformanceDataPoint, PerformanceReport,
    PeriodReport,
};
pub use service::CampaignService;
pub use telemetry::{TelemetryError, init_tracing, install_metrics_recorder};
