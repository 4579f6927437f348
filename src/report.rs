use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::metrics;
use crate::models::{FeedbackRecord, FilterSpec};
use crate::period::{parse_timestamp, Period};

fn describe_filter(spec: &FilterSpec) -> String {
    let mut parts = Vec::new();

    match (&spec.period, spec.range_start, spec.range_end) {
        (Period::Custom, Some(start), Some(end)) => {
            parts.push(format!("period custom ({start} to {end})"));
        }
        (period, _, _) => parts.push(format!("period {period}")),
    }

    if !spec.roles.is_empty() {
        let roles: Vec<&str> = spec.roles.iter().map(String::as_str).collect();
        parts.push(format!("roles {}", roles.join(", ")));
    }

    if !spec.scores.is_empty() {
        let scores: Vec<String> = spec.scores.iter().map(i32::to_string).collect();
        parts.push(format!("scores {}", scores.join(", ")));
    }

    parts.join("; ")
}

pub fn build_report(
    label: Option<&str>,
    spec: &FilterSpec,
    records: &[FeedbackRecord],
    filtered: &[FeedbackRecord],
) -> String {
    let overall = metrics::satisfaction_breakdown(records);
    let subset = metrics::satisfaction_breakdown(filtered);
    let roles = metrics::summarize_by_role(filtered);
    let distribution = metrics::score_distribution(filtered);

    let mut output = String::new();
    let label = label.unwrap_or("all companies");

    let _ = writeln!(output, "# Customer Feedback Report");
    let _ = writeln!(output, "Generated for {} ({})", label, describe_filter(spec));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Headline");
    let _ = writeln!(output, "- Total responses: {}", overall.total);
    let _ = writeln!(output, "- Satisfaction score: {}", overall.score);
    let _ = writeln!(
        output,
        "- Promoters {} / passives {} / detractors {}",
        overall.promoters, overall.passives, overall.detractors
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Filtered Responses");

    if filtered.is_empty() {
        let _ = writeln!(output, "No responses match this filter.");
        return output;
    }

    let _ = writeln!(
        output,
        "{} responses, satisfaction {} (promoters {} / passives {} / detractors {})",
        subset.total, subset.score, subset.promoters, subset.passives, subset.detractors
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Role Mix");
    for summary in roles.iter() {
        let _ = writeln!(
            output,
            "- {}: {} responses (avg score {:.1}, satisfaction {})",
            summary.role, summary.count, summary.avg_score, summary.satisfaction
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Score Distribution");
    for bucket in distribution.iter() {
        let _ = writeln!(
            output,
            "- {}: {} ({:.1}%)",
            bucket.score, bucket.count, bucket.percent
        );
    }

    let mut recent: Vec<(Option<DateTime<Utc>>, &FeedbackRecord)> = filtered
        .iter()
        .map(|record| (parse_timestamp(&record.created_at), record))
        .collect();
    // None sorts below Some, so reversing puts unparseable dates last.
    recent.sort_by(|a, b| b.0.cmp(&a.0));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Comments");
    for (_, record) in recent.iter().take(5) {
        let reason = if record.reason.trim().is_empty() {
            "(no comment)"
        } else {
            record.reason.trim()
        };
        let _ = writeln!(
            output,
            "- [{}] {} ({}) on {}: {}",
            record.score, record.user_id, record.role, record.created_at, reason
        );
    }

    output
}
