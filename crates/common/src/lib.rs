//! Shared identifiers and versioning used across the campaign workspace.

pub mod types;
pub mod version;

pub use types::{CampaignId, CustomerId, EventId, IdParseError, RuleId, UserId};
pub use version::Version;
