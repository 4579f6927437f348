use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{
    FeedbackRecord, FeedbackTrend, RoleSummary, SatisfactionBreakdown, ScoreBucket, TrendSeries,
};
use crate::period::parse_timestamp;

pub const PROMOTER_MIN: i32 = 9;
pub const DETRACTOR_MAX: i32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Promoter,
    Passive,
    Detractor,
}

pub fn categorize(score: i32) -> Category {
    if score >= PROMOTER_MIN {
        Category::Promoter
    } else if score <= DETRACTOR_MAX {
        Category::Detractor
    } else {
        Category::Passive
    }
}

pub fn total_responses(records: &[FeedbackRecord]) -> usize {
    records.len()
}

/// (promoters - detractors) / total * 100, rounded half away from zero.
/// Empty input scores `0`.
pub fn satisfaction_score(records: &[FeedbackRecord]) -> i32 {
    satisfaction_breakdown(records).score
}

pub fn satisfaction_breakdown(records: &[FeedbackRecord]) -> SatisfactionBreakdown {
    let mut breakdown = SatisfactionBreakdown {
        promoters: 0,
        passives: 0,
        detractors: 0,
        total: records.len(),
        score: 0,
    };

    for record in records {
        match categorize(record.score) {
            Category::Promoter => breakdown.promoters += 1,
            Category::Passive => breakdown.passives += 1,
            Category::Detractor => breakdown.detractors += 1,
        }
    }

    breakdown.score = net_percent(
        breakdown.promoters as i64 - breakdown.detractors as i64,
        breakdown.total as i64,
    );
    breakdown
}

// Integer arithmetic keeps exact halves (e.g. 12.5) from drifting.
fn net_percent(net: i64, total: i64) -> i32 {
    if total == 0 {
        return 0;
    }
    let magnitude = (2 * net.abs() * 100 + total) / (2 * total);
    (net.signum() * magnitude) as i32
}

fn average(sum: i64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

pub fn summarize_by_role(records: &[FeedbackRecord]) -> Vec<RoleSummary> {
    let mut by_role: HashMap<&str, Vec<&FeedbackRecord>> = HashMap::new();

    for record in records {
        by_role.entry(record.role.as_str()).or_default().push(record);
    }

    let mut summaries: Vec<RoleSummary> = by_role
        .into_iter()
        .map(|(role, members)| {
            let total: i64 = members.iter().map(|r| r.score as i64).sum();
            let net: i64 = members
                .iter()
                .map(|r| match categorize(r.score) {
                    Category::Promoter => 1,
                    Category::Passive => 0,
                    Category::Detractor => -1,
                })
                .sum();
            RoleSummary {
                role: role.to_string(),
                count: members.len(),
                avg_score: average(total, members.len()),
                satisfaction: net_percent(net, members.len() as i64),
            }
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.role.cmp(&b.role)));
    summaries
}

pub fn score_distribution(records: &[FeedbackRecord]) -> Vec<ScoreBucket> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.score).or_insert(0) += 1;
    }

    let total = records.len();
    counts
        .into_iter()
        .map(|(score, count)| ScoreBucket {
            score,
            count,
            percent: (count as f64 / total as f64) * 100.0,
        })
        .collect()
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn weekly_trends(records: &[FeedbackRecord]) -> TrendSeries {
    let mut weeks: BTreeMap<NaiveDate, (usize, i64, i64)> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in records {
        let Some(at) = parse_timestamp(&record.created_at) else {
            skipped += 1;
            continue;
        };

        let entry = weeks.entry(week_start(at.date_naive())).or_insert((0, 0, 0));
        entry.0 += 1;
        entry.1 += record.score as i64;
        entry.2 += match categorize(record.score) {
            Category::Promoter => 1,
            Category::Passive => 0,
            Category::Detractor => -1,
        };
    }

    let weeks = weeks
        .into_iter()
        .map(|(week_start, (count, total, net))| FeedbackTrend {
            week_start,
            count,
            avg_score: average(total, count),
            satisfaction: net_percent(net, count as i64),
        })
        .collect();

    TrendSeries { weeks, skipped }
}
