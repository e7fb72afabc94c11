//! Service error types.

use common::CampaignId;
use domain::{CampaignError, ErrorKind, ValidationErrors};
use thiserror::Error;

use crate::ports::{RepositoryError, TargetingError, TrackedEventError};

/// Errors returned by the campaign service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Command input failed validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// The aggregate rejected the operation.
    #[error(transparent)]
    Campaign(#[from] CampaignError),

    #[error("Campaign not found: {0}")]
    NotFound(CampaignId),

    /// Duplicate name or a concurrent modification.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A collaborator failed while performing the named operation.
    #[error("{operation} failed: {source}")]
    Infrastructure {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::Campaign(e) => e.kind(),
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::Infrastructure { .. } => ErrorKind::Infrastructure,
        }
    }

    /// Maps a repository failure raised during `operation`.
    pub(crate) fn from_repository(operation: &'static str, err: RepositoryError) -> Self {
        match err {
            RepositoryError::VersionConflict { .. } | RepositoryError::DuplicateName(_) => {
                ServiceError::Conflict(err.to_string())
            }
            RepositoryError::NotFound(id) => ServiceError::NotFound(id),
            RepositoryError::Unavailable(_) => ServiceError::Infrastructure {
                operation,
                source: Box::new(err),
            },
        }
    }

    /// Maps a tracked event log failure raised during `operation`.
    pub(crate) fn from_event_log(operation: &'static str, err: TrackedEventError) -> Self {
        ServiceError::Infrastructure {
            operation,
            source: Box::new(err),
        }
    }

    /// Maps a targeting failure raised during `operation`.
    pub(crate) fn from_targeting(operation: &'static str, err: TargetingError) -> Self {
        match err {
            TargetingError::InvalidRules(_) => ServiceError::Validation(ValidationErrors::single(
                "targetingRules",
                err.to_string(),
            )),
            TargetingError::Unavailable(_) => ServiceError::Infrastructure {
                operation,
                source: Box::new(err),
            },
        }
    }
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;
