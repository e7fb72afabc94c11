//! Reporting windows for period-based performance analysis.

use chrono::{DateTime, Duration, Months, Utc};
use domain::ValidationErrors;
use serde::{Deserialize, Serialize};

/// Most trend buckets a single period may be split into.
pub const MAX_BUCKETS: usize = 1_000;

/// Width of one trend bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    #[default]
    Day,
    Week,
    Month,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        }
    }

    /// Start of the bucket following the one starting at `from`.
    fn advance(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Granularity::Hour => from.checked_add_signed(Duration::hours(1)),
            Granularity::Day => from.checked_add_signed(Duration::days(1)),
            Granularity::Week => from.checked_add_signed(Duration::weeks(1)),
            Granularity::Month => from.checked_add_months(Months::new(1)),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A half-open time window `[start, end)` split into trend buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimePeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub granularity: Granularity,
}

impl TimePeriod {
    /// A period bucketed by day.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            granularity: Granularity::Day,
        }
    }

    /// The `days` days leading up to now.
    pub fn last_days(days: i64) -> Self {
        let end = Utc::now();
        Self::new(end - Duration::days(days), end)
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.end <= self.start {
            errors.add("end", "must be after start");
        } else if self.bucket_count() > MAX_BUCKETS {
            errors.add(
                "granularity",
                format!(
                    "{} buckets exceed {MAX_BUCKETS} for this period",
                    self.granularity
                ),
            );
        }
        errors.into_result()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    /// Consecutive sub-periods covering the whole period, the last one
    /// truncated at `end`. Empty when the period is empty.
    pub fn buckets(&self) -> Vec<TimePeriod> {
        let mut buckets = Vec::new();
        let mut from = self.start;
        while from < self.end && buckets.len() <= MAX_BUCKETS {
            let to = self
                .granularity
                .advance(from)
                .map_or(self.end, |next| next.min(self.end));
            buckets.push(TimePeriod {
                start: from,
                end: to,
                granularity: self.granularity,
            });
            from = to;
        }
        buckets
    }

    fn bucket_count(&self) -> usize {
        let mut count = 0;
        let mut from = self.start;
        while from < self.end && count <= MAX_BUCKETS {
            count += 1;
            from = match self.granularity.advance(from) {
                Some(next) => next,
                None => break,
            };
        }
        count
    }
}
