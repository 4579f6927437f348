use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{FeedbackError, Result};
use crate::models::{FeedbackRecord, FilterSpec};
use crate::period::{end_of_day, parse_timestamp, start_of_day, Clock, Period, SystemClock};

/// How the analyzer treats bad filter input and unparseable timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Unknown periods and incomplete custom ranges match everything; records
    /// whose `created_at` does not parse are dropped by the period predicate.
    #[default]
    Permissive,
    /// Same checks, but reported as errors instead of degrading.
    Strict,
}

/// Resolved period predicate, computed once per call.
#[derive(Debug, Clone, Copy)]
enum Window {
    Open,
    After(DateTime<Utc>),
    Between(DateTime<Utc>, DateTime<Utc>),
}

impl Window {
    fn contains(&self, at: DateTime<Utc>) -> bool {
        match *self {
            Window::Open => true,
            Window::After(cutoff) => at > cutoff,
            Window::Between(start, end) => at > start && at < end,
        }
    }
}

/// Selects feedback records by period, role and score.
pub struct FeedbackAnalyzer<C = SystemClock> {
    clock: C,
    mode: FilterMode,
}

impl FeedbackAnalyzer<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for FeedbackAnalyzer<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> FeedbackAnalyzer<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            mode: FilterMode::Permissive,
        }
    }

    pub fn strict(mut self) -> Self {
        self.mode = FilterMode::Strict;
        self
    }

    pub fn with_mode(mut self, mode: FilterMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Returns the records matching every engaged predicate, in collection order.
    ///
    /// Predicates run period, then role, then score. An empty role or score
    /// set disengages that predicate; `Period::All` disengages the period one
    /// and no timestamps are parsed at all.
    pub fn filter(
        &self,
        records: &[FeedbackRecord],
        spec: &FilterSpec,
    ) -> Result<Vec<FeedbackRecord>> {
        let window = self.resolve_window(spec)?;
        let mut malformed = 0usize;
        let mut filtered = Vec::new();

        for record in records {
            if !matches!(window, Window::Open) {
                match parse_timestamp(&record.created_at) {
                    Some(at) if window.contains(at) => {}
                    Some(_) => continue,
                    None => {
                        if self.mode == FilterMode::Strict {
                            return Err(FeedbackError::MalformedTimestamp {
                                user_id: record.user_id.clone(),
                                value: record.created_at.clone(),
                            });
                        }
                        malformed += 1;
                        continue;
                    }
                }
            }

            if !spec.roles.is_empty() && !spec.roles.contains(&record.role) {
                continue;
            }

            if !spec.scores.is_empty() && !spec.scores.contains(&record.score) {
                continue;
            }

            filtered.push(record.clone());
        }

        if malformed > 0 {
            warn!(
                malformed,
                period = %spec.period,
                "excluded records with unparseable created_at"
            );
        }
        debug!(
            period = %spec.period,
            roles = spec.roles.len(),
            scores = spec.scores.len(),
            input = records.len(),
            matched = filtered.len(),
            "filtered feedback"
        );

        Ok(filtered)
    }

    fn resolve_window(&self, spec: &FilterSpec) -> Result<Window> {
        let strict = self.mode == FilterMode::Strict;

        match &spec.period {
            Period::All => Ok(Window::Open),
            Period::Custom => match (spec.range_start, spec.range_end) {
                (Some(start), Some(end)) => {
                    if strict && start > end {
                        return Err(FeedbackError::InvalidFilterSpec(format!(
                            "custom range starts {start} after it ends {end}"
                        )));
                    }
                    Ok(Window::Between(start_of_day(start), end_of_day(end)))
                }
                _ if strict => Err(FeedbackError::InvalidFilterSpec(
                    "custom period needs both a start and an end date".to_string(),
                )),
                _ => Ok(Window::Open),
            },
            Period::Unrecognized(raw) => {
                if strict {
                    Err(FeedbackError::InvalidFilterSpec(format!(
                        "unknown period {raw:?}"
                    )))
                } else {
                    Ok(Window::Open)
                }
            }
            relative => Ok(relative
                .cutoff(self.clock.now())
                .map_or(Window::Open, Window::After)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::FixedClock;
    use chrono::{NaiveDate, TimeZone};

    fn record(user_id: &str, score: i32, role: &str, created_at: &str) -> FeedbackRecord {
        FeedbackRecord {
            user_id: user_id.to_string(),
            score,
            reason: format!("reason from {user_id}"),
            created_at: created_at.to_string(),
            company_id: "acme".to_string(),
            role: role.to_string(),
        }
    }

    fn analyzer_at(y: i32, m: u32, d: u32) -> FeedbackAnalyzer<FixedClock> {
        FeedbackAnalyzer::with_clock(FixedClock(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()))
    }

    fn ids(records: &[FeedbackRecord]) -> Vec<&str> {
        records.iter().map(|r| r.user_id.as_str()).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn all_period_with_no_criteria_returns_everything() {
        let records = vec![
            record("a", 9, "admin", "2024-01-01T00:00:00Z"),
            record("b", 3, "user", "not a date"),
            record("c", 7, "user", "2023-05-05T10:00:00Z"),
        ];

        let filtered = analyzer_at(2024, 6, 8).filter(&records, &FilterSpec::all()).unwrap();
        assert_eq!(filtered, records);
    }

    #[test]
    fn week_cutoff_is_strictly_after() {
        let records = vec![
            record("inside", 8, "user", "2024-06-02T00:00:01"),
            record("boundary", 8, "user", "2024-06-01T00:00:00"),
            record("older", 8, "user", "2024-05-20T09:00:00"),
        ];

        let spec = FilterSpec::all().with_period(Period::Week);
        let filtered = analyzer_at(2024, 6, 8).filter(&records, &spec).unwrap();
        assert_eq!(ids(&filtered), vec!["inside"]);
    }

    #[test]
    fn relative_periods_use_their_lookback() {
        let records = vec![
            record("hour", 8, "user", "2024-06-07T23:00:00Z"),
            record("days", 8, "user", "2024-05-20T00:00:00Z"),
            record("months", 8, "user", "2024-04-01T00:00:00Z"),
            record("half-year", 8, "user", "2023-12-01T00:00:00Z"),
            record("ancient", 8, "user", "2022-01-01T00:00:00Z"),
        ];
        let analyzer = analyzer_at(2024, 6, 8);
        let run = |period: Period| {
            let filtered = analyzer
                .filter(&records, &FilterSpec::all().with_period(period))
                .unwrap();
            filtered.len()
        };

        assert_eq!(run(Period::Today), 1);
        assert_eq!(run(Period::Week), 1);
        assert_eq!(run(Period::Month), 2);
        assert_eq!(run(Period::Quarter), 3);
        assert_eq!(run(Period::Year), 4);
    }

    #[test]
    fn custom_range_excludes_exact_day_bounds() {
        let records = vec![
            record("midnight", 9, "user", "2024-01-10T00:00:00"),
            record("noon", 9, "user", "2024-01-10T12:00:00"),
            record("late", 9, "user", "2024-01-10T23:59:59"),
            record("last-but-one-ms", 9, "user", "2024-01-10T23:59:59.998"),
            record("end-of-day", 9, "user", "2024-01-10T23:59:59.999"),
            record("next-day", 9, "user", "2024-01-11T00:00:00"),
        ];

        let spec = FilterSpec::all()
            .with_period(Period::Custom)
            .with_range(Some(date(2024, 1, 10)), Some(date(2024, 1, 10)));
        let filtered = analyzer_at(2024, 6, 8).filter(&records, &spec).unwrap();
        assert_eq!(ids(&filtered), vec!["noon", "late", "last-but-one-ms"]);
    }

    #[test]
    fn custom_range_to_last_representable_day_does_not_overflow() {
        let records = vec![
            record("before", 9, "user", "2023-12-31T23:00:00Z"),
            record("inside", 9, "user", "2024-06-07T00:00:00Z"),
            record("far-future", 9, "user", "9999-12-31T23:59:59Z"),
        ];

        let spec = FilterSpec::all()
            .with_period(Period::Custom)
            .with_range(Some(date(2024, 1, 1)), Some(NaiveDate::MAX));
        for analyzer in [analyzer_at(2024, 6, 8), analyzer_at(2024, 6, 8).strict()] {
            let filtered = analyzer.filter(&records, &spec).unwrap();
            assert_eq!(ids(&filtered), vec!["inside", "far-future"]);
        }
    }

    #[test]
    fn relative_period_with_clock_at_earliest_instant_does_not_overflow() {
        let records = vec![record("a", 9, "user", "2024-06-07T00:00:00Z")];
        let analyzer = FeedbackAnalyzer::with_clock(FixedClock(DateTime::<Utc>::MIN_UTC));

        let filtered = analyzer
            .filter(&records, &FilterSpec::all().with_period(Period::Year))
            .unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn mixed_case_period_labels_do_not_filter() {
        let records = vec![
            record("old", 9, "user", "2020-01-01T00:00:00Z"),
            record("recent", 9, "user", "2024-06-07T00:00:00Z"),
        ];

        for label in ["Week", "CUSTOM", " month "] {
            let spec = FilterSpec::all()
                .with_period(Period::from(label))
                .with_range(Some(date(2024, 6, 1)), Some(date(2024, 6, 7)));
            let filtered = analyzer_at(2024, 6, 8).filter(&records, &spec).unwrap();
            assert_eq!(filtered.len(), 2, "label {label:?}");
        }
    }

    #[test]
    fn custom_without_both_bounds_acts_as_all() {
        let records = vec![
            record("a", 9, "user", "2020-01-01T00:00:00Z"),
            record("b", 9, "user", "garbage"),
        ];

        let spec = FilterSpec::all()
            .with_period(Period::Custom)
            .with_range(Some(date(2024, 1, 10)), None);
        let filtered = analyzer_at(2024, 6, 8).filter(&records, &spec).unwrap();
        assert_eq!(filtered, records);
    }

    #[test]
    fn unrecognized_period_passes_everything() {
        let records = vec![record("a", 9, "user", "2001-01-01T00:00:00Z")];
        let spec = FilterSpec::all().with_period(Period::from("fortnight"));

        let filtered = analyzer_at(2024, 6, 8).filter(&records, &spec).unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn malformed_timestamps_are_excluded_when_period_engaged() {
        let records = vec![
            record("good", 9, "user", "2024-06-07T00:00:00Z"),
            record("bad", 9, "user", "last tuesday"),
        ];

        let spec = FilterSpec::all().with_period(Period::Year);
        let filtered = analyzer_at(2024, 6, 8).filter(&records, &spec).unwrap();
        assert_eq!(ids(&filtered), vec!["good"]);
    }

    #[test]
    fn role_and_score_sets_combine_conjunctively() {
        let records = vec![
            record("a", 10, "admin", "2024-06-07T00:00:00Z"),
            record("b", 3, "admin", "2024-06-07T00:00:00Z"),
            record("c", 10, "user", "2024-06-07T00:00:00Z"),
            record("d", 9, "manager", "2024-06-07T00:00:00Z"),
        ];

        let spec = FilterSpec::all()
            .with_roles(["admin", "manager"])
            .with_scores([9, 10]);
        let filtered = analyzer_at(2024, 6, 8).filter(&records, &spec).unwrap();
        assert_eq!(ids(&filtered), vec!["a", "d"]);
    }

    #[test]
    fn strict_mode_rejects_unknown_period() {
        let err = analyzer_at(2024, 6, 8)
            .strict()
            .filter(&[], &FilterSpec::all().with_period(Period::from("fortnight")))
            .unwrap_err();
        assert!(matches!(err, FeedbackError::InvalidFilterSpec(_)));
    }

    #[test]
    fn strict_mode_rejects_incomplete_or_inverted_custom_range() {
        let analyzer = analyzer_at(2024, 6, 8).strict();

        let missing = FilterSpec::all()
            .with_period(Period::Custom)
            .with_range(None, Some(date(2024, 1, 10)));
        assert!(matches!(
            analyzer.filter(&[], &missing),
            Err(FeedbackError::InvalidFilterSpec(_))
        ));

        let inverted = FilterSpec::all()
            .with_period(Period::Custom)
            .with_range(Some(date(2024, 2, 1)), Some(date(2024, 1, 1)));
        assert!(matches!(
            analyzer.filter(&[], &inverted),
            Err(FeedbackError::InvalidFilterSpec(_))
        ));
    }

    #[test]
    fn strict_mode_reports_malformed_timestamp() {
        let records = vec![record("bad", 9, "user", "soon")];
        let err = analyzer_at(2024, 6, 8)
            .with_mode(FilterMode::Strict)
            .filter(&records, &FilterSpec::all().with_period(Period::Month))
            .unwrap_err();

        match err {
            FeedbackError::MalformedTimestamp { user_id, value } => {
                assert_eq!(user_id, "bad");
                assert_eq!(value, "soon");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn strict_mode_ignores_timestamps_when_period_is_all() {
        let records = vec![record("bad", 9, "user", "soon")];
        let filtered = analyzer_at(2024, 6, 8)
            .strict()
            .filter(&records, &FilterSpec::all())
            .unwrap();
        assert_eq!(filtered.len(), 1);
    }
}
