use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::period::Period;

/// A single feedback response as supplied by the data source.
///
/// `created_at` stays as the raw ISO-8601 text; it is only parsed when a
/// period filter needs it, so malformed values load without complaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub user_id: String,
    pub score: i32,
    pub reason: String,
    pub created_at: String,
    pub company_id: String,
    pub role: String,
}

/// Criteria for one filter call. Empty `roles` / `scores` sets match everything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSpec {
    pub period: Period,
    pub roles: BTreeSet<String>,
    pub scores: BTreeSet<i32>,
    pub range_start: Option<NaiveDate>,
    pub range_end: Option<NaiveDate>,
}

impl FilterSpec {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_scores<I>(mut self, scores: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        self.scores = scores.into_iter().collect();
        self
    }

    pub fn with_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.range_start = start;
        self.range_end = end;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SatisfactionBreakdown {
    pub promoters: usize,
    pub passives: usize,
    pub detractors: usize,
    pub total: usize,
    pub score: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleSummary {
    pub role: String,
    pub count: usize,
    pub avg_score: f64,
    pub satisfaction: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreBucket {
    pub score: i32,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackTrend {
    pub week_start: NaiveDate,
    pub count: usize,
    pub avg_score: f64,
    pub satisfaction: i32,
}

/// Weekly series plus the number of records left out for unparseable dates.
#[derive(Debug, Clone, Serialize)]
pub struct TrendSeries {
    pub weeks: Vec<FeedbackTrend>,
    pub skipped: usize,
}
