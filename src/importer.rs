//! One-time (re-runnable) import of legacy donation rows from the
//! fundraising spreadsheet.
//!
//! Each row is `[name, amount, date?]`. Rows missing a name or amount
//! are skipped; remaining rows are deduplicated against the donations
//! collection by composite key before insert, so a crashed or repeated
//! run never double-imports. Per-row failures are logged and the run
//! continues.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::db::{self, DbPool};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportOutcome {
    pub imported: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// The duplicate-detection token: donor name concatenated with the raw
/// amount text. Two genuinely distinct donations with the same (name,
/// amount) pair collapse under this key.
pub fn composite_key(name: &str, raw_amount: &str) -> String {
    format!("{}{}", name.trim(), raw_amount.trim())
}

fn amount_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[0-9]{1,3}(?:,[0-9]{3})+(?:\.[0-9]+)?|[0-9]+(?:\.[0-9]+)?")
            .expect("amount regex")
    })
}

/// Lenient numeric parse of a spreadsheet amount cell. Currency prefixes
/// and thousands separators are tolerated; anything without a usable
/// non-negative number yields `None`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.starts_with('-') {
        return None;
    }
    let matched = amount_regex().find(trimmed)?;
    let cleaned = matched.as_str().replace(',', "");
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

/// Imports spreadsheet rows into the donations collection, one linear
/// pass in row order, skipping duplicates by composite key.
pub async fn import_rows(pool: &DbPool, rows: &[Vec<String>]) -> ImportOutcome {
    let mut outcome = ImportOutcome::default();

    for (index, row) in rows.iter().enumerate() {
        let name = row.first().map(|s| s.trim()).unwrap_or("");
        let raw_amount = row.get(1).map(|s| s.trim()).unwrap_or("");
        let date = row.get(2).map(|s| s.trim()).filter(|s| !s.is_empty());

        // Incomplete rows carry nothing worth importing.
        if name.is_empty() || raw_amount.is_empty() {
            outcome.skipped += 1;
            continue;
        }

        let Some(amount) = parse_amount(raw_amount) else {
            tracing::warn!("row {}: unparsable amount {:?}, skipping", index + 1, raw_amount);
            outcome.skipped += 1;
            continue;
        };

        let key = composite_key(name, raw_amount);
        match db::find_donation_by_composite_key(pool, &key).await {
            Ok(Some(_)) => {
                outcome.duplicates += 1;
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!("row {}: duplicate check failed: {}", index + 1, e);
                outcome.failed += 1;
                continue;
            }
        }

        let id = Uuid::new_v4().to_string();
        let donated_at = date.map(str::to_string);
        match db::add_donation(
            pool,
            &id,
            name,
            amount,
            &Some(key),
            &donated_at,
            chrono::Utc::now(),
        )
        .await
        {
            Ok(()) => {
                tracing::info!("migrated: {} - MMK{}", name, raw_amount);
                outcome.imported += 1;
            }
            Err(e) => {
                tracing::error!("row {}: insert failed: {}", index + 1, e);
                outcome.failed += 1;
            }
        }
    }

    outcome
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Range-based cell fetch from the Google Sheets values API
/// (read-only, API-key auth). A failure here aborts the whole run.
pub async fn fetch_sheet_rows(
    sheet_id: &str,
    range: &str,
    api_key: &str,
) -> anyhow::Result<Vec<Vec<String>>> {
    let encoded_range: String = url::form_urlencoded::byte_serialize(range.as_bytes()).collect();
    let url = format!(
        "https://sheets.googleapis.com/v4/spreadsheets/{}/values/{}?key={}",
        sheet_id, encoded_range, api_key
    );

    let client = reqwest::Client::new();
    let resp = client
        .get(&url)
        .header("User-Agent", "DevAid/1.0")
        .send()
        .await?;

    if !resp.status().is_success() {
        anyhow::bail!("Sheets API returned {}", resp.status());
    }

    let body: ValueRange = resp.json().await?;
    let rows = body
        .values
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| match cell {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect()
        })
        .collect();
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_parse_leniently() {
        assert_eq!(parse_amount("5000"), Some(5000.0));
        assert_eq!(parse_amount("5,000"), Some(5000.0));
        assert_eq!(parse_amount("MMK 12,500.75"), Some(12500.75));
        assert_eq!(parse_amount(" 300 "), Some(300.0));
        assert_eq!(parse_amount("bad"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("-100"), None);
    }

    #[test]
    fn composite_key_concatenates_name_and_raw_amount() {
        assert_eq!(composite_key("Jane", "5000"), "Jane5000");
        assert_eq!(composite_key(" Jane ", " 5,000 "), "Jane5,000");
    }
}
