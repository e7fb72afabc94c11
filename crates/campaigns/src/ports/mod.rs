//! Ports to the collaborators the campaign service depends on.
//!
//! Each port is an async trait with an in-memory implementation for tests
//! and embedding.

pub mod notification;
pub mod repository;
pub mod targeting;
pub mod tracked_events;

pub use notification::{
    InMemoryNotificationService, Notification, NotificationError, NotificationService,
};
pub use repository::{
    CampaignRepository, InMemoryCampaignRepository, RepositoryError, SaveOptions,
};
pub use targeting::{InMemoryTargetingService, TargetingError, TargetingService};
pub use tracked_events::{
    InMemoryTrackedEventRepository, TrackedEventError, TrackedEventRepository,
};
