//! Domain layer for the campaign management core.
//!
//! This crate provides the core domain abstractions including:
//! - Aggregate trait for entities that record domain events
//! - DomainEvent trait for domain events
//! - Command trait and CommandResult for command processing
//! - Money and currency value objects with checked arithmetic
//! - Campaign aggregate with its state machine and metrics engine

pub mod aggregate;
pub mod campaign;
pub mod command;
pub mod error;
pub mod money;
pub mod validation;

pub use aggregate::{Aggregate, DomainEvent};
pub use campaign::{
    ActivateCampaign, BUDGET_WARNING_RATIO, Campaign, CampaignError, CampaignEvent,
    CampaignMetrics, CampaignSettings, CampaignState, CampaignStatus, CampaignType,
    CancelCampaign, Channel, CompleteCampaign, CreateCampaign, DeleteCampaign, DerivedMetrics,
    PauseCampaign, PerformanceGrade, Recommendation, RescheduleCampaign, ResumeCampaign,
    TrackCampaignEvent, TrackedEvent, TrackedEventKind, UpdateBudget, UpdateCampaignDetails,
    UpdateSettings, UpdateTargetingRules,
};
pub use command::{Command, CommandResult};
pub use error::ErrorKind;
pub use money::{Currency, Money, MoneyError};
pub use validation::{FieldError, ValidationErrors};
