//! Persistence port and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::{CampaignId, Version};
use domain::{Aggregate, Campaign, ErrorKind};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::query::ListCriteria;

/// Options for saving a campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Version the stored record is expected to be at.
    /// `Version::default()` means no record may exist yet. If None, no
    /// version check is performed.
    pub expected_version: Option<Version>,
}

impl SaveOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the stored campaign to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the campaign not to exist yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::default()),
        }
    }
}

/// Errors raised by a campaign repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The stored version did not match the expected one.
    #[error(
        "Version conflict for campaign {campaign_id}: expected {expected}, found {actual}"
    )]
    VersionConflict {
        campaign_id: CampaignId,
        expected: Version,
        actual: Version,
    },

    /// Another live campaign already uses the name.
    #[error("A campaign named {0:?} already exists")]
    DuplicateName(String),

    /// No live campaign has the id.
    #[error("Campaign not found: {0}")]
    NotFound(CampaignId),

    /// The backing store could not be reached.
    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepositoryError::VersionConflict { .. } | RepositoryError::DuplicateName(_) => {
                ErrorKind::Conflict
            }
            RepositoryError::NotFound(_) => ErrorKind::NotFound,
            RepositoryError::Unavailable(_) => ErrorKind::Infrastructure,
        }
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Storage for campaign aggregates.
///
/// Deleted campaigns are kept but hidden: lookups, listings and the name
/// uniqueness check only see live campaigns.
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Inserts or replaces a campaign.
    ///
    /// Fails with `VersionConflict` if `options.expected_version` does not
    /// match the stored version, and with `DuplicateName` if another live
    /// campaign has the same name.
    async fn save(&self, campaign: &Campaign, options: SaveOptions) -> Result<()>;

    async fn find_by_id(&self, id: CampaignId) -> Result<Option<Campaign>>;

    /// Looks up a live campaign by exact, case-sensitive name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Campaign>>;

    /// Returns the filtered, sorted page selected by the criteria.
    async fn list(&self, criteria: &ListCriteria) -> Result<Vec<Campaign>>;

    /// Counts campaigns passing the filters, ignoring pagination.
    async fn count(&self, criteria: &ListCriteria) -> Result<u64>;

    /// Soft-deletes a campaign.
    async fn delete(&self, id: CampaignId) -> Result<()>;

    async fn exists_by_name(&self, name: &str) -> Result<bool> {
        Ok(self.find_by_name(name).await?.is_some())
    }
}

#[derive(Debug, Clone)]
struct StoredCampaign {
    campaign: Campaign,
    deleted: bool,
}

/// In-memory campaign repository for testing and embedding.
///
/// Cloning shares the underlying storage.
#[derive(Clone, Default)]
pub struct InMemoryCampaignRepository {
    campaigns: Arc<RwLock<HashMap<CampaignId, StoredCampaign>>>,
    fail_on_save: Arc<AtomicBool>,
}

impl InMemoryCampaignRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent save fail with `Unavailable` until reset.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.fail_on_save.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of live campaigns.
    pub async fn len(&self) -> usize {
        self.campaigns
            .read()
            .await
            .values()
            .filter(|s| !s.deleted)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Returns true if the campaign exists and was soft-deleted.
    pub async fn is_deleted(&self, id: CampaignId) -> bool {
        self.campaigns
            .read()
            .await
            .get(&id)
            .is_some_and(|s| s.deleted)
    }

    /// Returns the stored version of a campaign, live or deleted.
    pub async fn stored_version(&self, id: CampaignId) -> Option<Version> {
        self.campaigns
            .read()
            .await
            .get(&id)
            .map(|s| s.campaign.version())
    }

    /// Removes every campaign.
    pub async fn clear(&self) {
        self.campaigns.write().await.clear();
    }

    fn filtered(
        store: &HashMap<CampaignId, StoredCampaign>,
        criteria: &ListCriteria,
    ) -> Vec<Campaign> {
        store
            .values()
            .filter(|s| !s.deleted && criteria.matches(&s.campaign))
            .map(|s| s.campaign.clone())
            .collect()
    }
}

#[async_trait]
impl CampaignRepository for InMemoryCampaignRepository {
    async fn save(&self, campaign: &Campaign, options: SaveOptions) -> Result<()> {
        if self.fail_on_save.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "save rejected by test toggle".to_string(),
            ));
        }

        let id = campaign.id();
        let mut store = self.campaigns.write().await;
        let existing = store.get(&id);

        let current_version = existing
            .map(|s| s.campaign.version())
            .unwrap_or_default();
        if let Some(expected) = options.expected_version {
            if current_version != expected {
                return Err(RepositoryError::VersionConflict {
                    campaign_id: id,
                    expected,
                    actual: current_version,
                });
            }
        }
        if existing.is_some_and(|s| s.deleted) {
            return Err(RepositoryError::NotFound(id));
        }

        let name_taken = store
            .values()
            .any(|s| !s.deleted && s.campaign.id() != id && s.campaign.name() == campaign.name());
        if name_taken {
            return Err(RepositoryError::DuplicateName(campaign.name().to_string()));
        }

        store.insert(
            id,
            StoredCampaign {
                campaign: campaign.clone(),
                deleted: false,
            },
        );
        Ok(())
    }

    async fn find_by_id(&self, id: CampaignId) -> Result<Option<Campaign>> {
        Ok(self
            .campaigns
            .read()
            .await
            .get(&id)
            .filter(|s| !s.deleted)
            .map(|s| s.campaign.clone()))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Campaign>> {
        Ok(self
            .campaigns
            .read()
            .await
            .values()
            .find(|s| !s.deleted && s.campaign.name() == name)
            .map(|s| s.campaign.clone()))
    }

    async fn list(&self, criteria: &ListCriteria) -> Result<Vec<Campaign>> {
        let store = self.campaigns.read().await;
        let mut campaigns = Self::filtered(&store, criteria);
        campaigns.sort_by(|a, b| criteria.compare(a, b));

        Ok(campaigns
            .into_iter()
            .skip(criteria.offset())
            .take(criteria.limit as usize)
            .collect())
    }

    async fn count(&self, criteria: &ListCriteria) -> Result<u64> {
        let store = self.campaigns.read().await;
        Ok(Self::filtered(&store, criteria).len() as u64)
    }

    async fn delete(&self, id: CampaignId) -> Result<()> {
        let mut store = self.campaigns.write().await;
        match store.get_mut(&id) {
            Some(stored) if !stored.deleted => {
                stored.deleted = true;
                Ok(())
            }
            _ => Err(RepositoryError::NotFound(id)),
        }
    }
}
