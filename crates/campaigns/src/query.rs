//! Listing criteria and paginated results.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use common::UserId;
use domain::{Aggregate, Campaign, CampaignStatus, CampaignType, ValidationErrors};
use serde::{Deserialize, Serialize};

/// Largest page size a listing may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Page size used when none is given.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Field a listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    Status,
    #[default]
    CreatedAt,
    UpdatedAt,
}

/// Direction of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filters, ordering and pagination for campaign listings.
///
/// Every filter is optional. The defaults are page 1, 20 items per page,
/// newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCriteria {
    /// Filter by status.
    pub status: Option<CampaignStatus>,

    /// Filter by campaign type.
    pub campaign_type: Option<CampaignType>,

    /// Filter by the user who created the campaign.
    pub created_by: Option<UserId>,

    /// Filter to campaigns starting at or after this time.
    pub starts_after: Option<DateTime<Utc>>,

    /// Filter to campaigns starting at or before this time.
    pub starts_before: Option<DateTime<Utc>>,

    /// Case-insensitive substring match on name or description.
    pub search: Option<String>,

    /// One-based page number.
    pub page: u32,

    /// Items per page.
    pub limit: u32,

    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Default for ListCriteria {
    fn default() -> Self {
        Self {
            status: None,
            campaign_type: None,
            created_by: None,
            starts_after: None,
            starts_before: None,
            search: None,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl ListCriteria {
    /// Creates criteria that match every campaign.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by status.
    pub fn status(mut self, status: CampaignStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filters by campaign type.
    pub fn campaign_type(mut self, campaign_type: CampaignType) -> Self {
        self.campaign_type = Some(campaign_type);
        self
    }

    /// Filters by creator.
    pub fn created_by(mut self, user_id: UserId) -> Self {
        self.created_by = Some(user_id);
        self
    }

    /// Filters to campaigns starting within the window (inclusive).
    pub fn starting_between(mut self, after: DateTime<Utc>, before: DateTime<Utc>) -> Self {
        self.starts_after = Some(after);
        self.starts_before = Some(before);
        self
    }

    /// Filters by a search term on name and description.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Selects a page.
    pub fn page(mut self, page: u32, limit: u32) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }

    /// Orders the listing.
    pub fn sort(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_by = field;
        self.sort_order = order;
        self
    }

    /// Reports every out-of-range pagination field and an inverted date window.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.page < 1 {
            errors.add("page", "must be at least 1");
        }
        if self.limit < 1 || self.limit > MAX_PAGE_LIMIT {
            errors.add("limit", format!("must be between 1 and {MAX_PAGE_LIMIT}"));
        }
        if let (Some(after), Some(before)) = (self.starts_after, self.starts_before) {
            if after > before {
                errors.add("startsBefore", "must not be earlier than startsAfter");
            }
        }
        errors.into_result()
    }

    /// Returns true if the campaign passes every filter.
    pub fn matches(&self, campaign: &Campaign) -> bool {
        if self.status.is_some_and(|s| s != campaign.status()) {
            return false;
        }
        if self.campaign_type.is_some_and(|t| t != campaign.campaign_type()) {
            return false;
        }
        if self.created_by.is_some_and(|u| u != campaign.created_by()) {
            return false;
        }
        if self.starts_after.is_some_and(|t| campaign.start_date() < t) {
            return false;
        }
        if self.starts_before.is_some_and(|t| campaign.start_date() > t) {
            return false;
        }
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            return campaign.name().to_lowercase().contains(&term)
                || campaign.description().to_lowercase().contains(&term);
        }
        true
    }

    /// Orders two campaigns by the configured field and direction.
    ///
    /// Ties fall back to the campaign id so the order is total.
    pub fn compare(&self, a: &Campaign, b: &Campaign) -> Ordering {
        let ordering = match self.sort_by {
            SortField::Name => a.name().cmp(b.name()),
            SortField::Status => a.status().as_str().cmp(b.status().as_str()),
            SortField::CreatedAt => a.created_at().cmp(&b.created_at()),
            SortField::UpdatedAt => a.updated_at().cmp(&b.updated_at()),
        };
        let ordering = match self.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        };
        ordering.then_with(|| a.id().cmp(&b.id()))
    }

    /// Number of items to skip for the selected page.
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.limit as usize)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of items matching the filters across all pages.
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    /// Wraps one page of items with the totals a caller needs to paginate.
    pub fn new(items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX)
        };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }

    /// Converts the items while keeping the pagination data.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}
