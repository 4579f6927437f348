use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::FeedbackRecord;

/// Maps one `feedback` row. NULL `reason` / `role` read as empty text.
fn record_from_row(row: &PgRow) -> Result<FeedbackRecord, sqlx::Error> {
    let user_id: Uuid = row.try_get("user_id")?;
    let company_id: Uuid = row.try_get("company_id")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let reason: Option<String> = row.try_get("reason")?;
    let role: Option<String> = row.try_get("role")?;

    Ok(FeedbackRecord {
        user_id: user_id.to_string(),
        score: row.try_get("score")?,
        reason: reason.unwrap_or_default(),
        created_at: created_at.to_rfc3339(),
        company_id: company_id.to_string(),
        role: role.unwrap_or_default(),
    })
}

/// Reads feedback rows, oldest first. Optionally limited to one company.
pub async fn fetch_feedback(
    pool: &PgPool,
    company_id: Option<&str>,
) -> anyhow::Result<Vec<FeedbackRecord>> {
    let mut query = String::from(
        "SELECT user_id, score, reason, created_at, company_id, role \
         FROM feedback",
    );

    let company = company_id.map(Uuid::parse_str).transpose()?;
    if company.is_some() {
        query.push_str(" WHERE company_id = $1");
    }
    query.push_str(" ORDER BY created_at");

    let mut rows = sqlx::query(&query);
    if let Some(value) = company {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut feedback = Vec::with_capacity(records.len());

    for row in records.iter() {
        feedback.push(record_from_row(row)?);
    }

    Ok(feedback)
}
