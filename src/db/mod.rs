use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use std::env;
use std::fs;
use std::path::Path;

pub mod models;
pub mod page;

use models::{DonatedBack, Donation, DonationKey, ItemType, KeyStatus};
use page::PageStart;

pub type DbPool = Pool<SqliteConnectionManager>;

const SCHEMA: &str = include_str!("schema.sql");

pub async fn init_pool() -> anyhow::Result<DbPool> {
    let path = env::var("DB_PATH").unwrap_or_else(|_| "data/devaid.db".to_string());
    init_pool_at(Path::new(&path))
}

/// Opens (and if needed creates) the database at an explicit path and
/// applies the schema. Tests use this to point at a throwaway file.
pub fn init_pool_at(path: &Path) -> anyhow::Result<DbPool> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let manager = SqliteConnectionManager::file(path);
    let pool = Pool::builder()
        // Tolerate transient contention on the shared file
        .max_size(10)
        .connection_timeout(std::time::Duration::from_secs(60))
        .build(manager)
        .map_err(|e| anyhow::anyhow!("Failed to create DB pool: {}", e))?;

    let conn = pool.get()?;
    conn.execute_batch(SCHEMA)?;

    Ok(pool)
}

fn parse_timestamp(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

const DONATION_COLUMNS: &str = "id, name, amount, composite_key, donated_at, created_at";

fn donation_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Donation> {
    let created_raw: String = row.get(5)?;
    Ok(Donation {
        id: row.get(0)?,
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        // Documents without a usable amount count as zero everywhere.
        amount: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
        composite_key: row.get(3)?,
        donated_at: row.get(4)?,
        created_at: parse_timestamp(5, created_raw)?,
    })
}

pub async fn add_donation(
    pool: &DbPool,
    id: &str,
    name: &str,
    amount: f64,
    composite_key: &Option<String>,
    donated_at: &Option<String>,
    created_at: DateTime<Utc>,
) -> anyhow::Result<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO donations (id, name, amount, composite_key, donated_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            name,
            amount,
            composite_key,
            donated_at,
            created_at.to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Full collection scan in fetch (insertion) order. The aggregation
/// routines depend on this order for stable tie-breaking.
pub async fn list_donations(pool: &DbPool) -> anyhow::Result<Vec<Donation>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {DONATION_COLUMNS} FROM donations ORDER BY rowid"
    ))?;
    let rows = stmt
        .query_map([], donation_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// One page of the amount-descending view.
///
/// `After` resumes strictly after the cursor row; `At` resumes at the
/// anchor row inclusively (the forward-scan stand-in for a backward
/// cursor, kept with its known duplicate/skip limitation).
pub async fn page_donations(
    pool: &DbPool,
    start: &PageStart,
    limit: u32,
) -> anyhow::Result<Vec<Donation>> {
    let conn = pool.get()?;
    let rows = match start {
        PageStart::First => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {DONATION_COLUMNS} FROM donations
                 ORDER BY COALESCE(amount, 0) DESC, id ASC LIMIT ?1"
            ))?;
            let rows = stmt
                .query_map(params![limit], donation_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
        PageStart::After(cursor) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {DONATION_COLUMNS} FROM donations
                 WHERE COALESCE(amount, 0) < ?1 OR (COALESCE(amount, 0) = ?1 AND id > ?2)
                 ORDER BY COALESCE(amount, 0) DESC, id ASC LIMIT ?3"
            ))?;
            let rows = stmt
                .query_map(params![cursor.amount, cursor.id, limit], donation_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
        PageStart::At(anchor) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {DONATION_COLUMNS} FROM donations
                 WHERE COALESCE(amount, 0) < ?1 OR (COALESCE(amount, 0) = ?1 AND id >= ?2)
                 ORDER BY COALESCE(amount, 0) DESC, id ASC LIMIT ?3"
            ))?;
            let rows = stmt
                .query_map(params![anchor.amount, anchor.id, limit], donation_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
    };
    Ok(rows)
}

/// Substring filter over donor name and composite key, scanning the whole
/// collection. The admin search view pages nothing once a filter is set.
pub async fn search_donations(pool: &DbPool, query: &str) -> anyhow::Result<Vec<Donation>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {DONATION_COLUMNS} FROM donations
         WHERE instr(lower(name), lower(?1)) > 0
            OR instr(lower(COALESCE(composite_key, '')), lower(?1)) > 0
         ORDER BY rowid"
    ))?;
    let rows = stmt
        .query_map(params![query], donation_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub async fn get_donation(pool: &DbPool, id: &str) -> anyhow::Result<Option<Donation>> {
    let conn = pool.get()?;
    let donation = conn
        .query_row(
            &format!("SELECT {DONATION_COLUMNS} FROM donations WHERE id = ?1"),
            params![id],
            donation_from_row,
        )
        .optional()?;
    Ok(donation)
}

pub async fn find_donation_by_composite_key(
    pool: &DbPool,
    composite_key: &str,
) -> anyhow::Result<Option<Donation>> {
    let conn = pool.get()?;
    let donation = conn
        .query_row(
            &format!("SELECT {DONATION_COLUMNS} FROM donations WHERE composite_key = ?1 LIMIT 1"),
            params![composite_key],
            donation_from_row,
        )
        .optional()?;
    Ok(donation)
}

/// Last write wins; there is no optimistic locking on donation edits.
pub async fn update_donation(
    pool: &DbPool,
    id: &str,
    name: Option<&str>,
    amount: Option<f64>,
) -> anyhow::Result<bool> {
    let conn = pool.get()?;
    let changed = conn.execute(
        "UPDATE donations
         SET name = COALESCE(?2, name), amount = COALESCE(?3, amount)
         WHERE id = ?1",
        params![id, name, amount],
    )?;
    Ok(changed > 0)
}

pub async fn delete_donation(pool: &DbPool, id: &str) -> anyhow::Result<bool> {
    let conn = pool.get()?;
    let changed = conn.execute("DELETE FROM donations WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

const DONATED_BACK_COLUMNS: &str =
    "id, organization_name, count, items, type_of_items, total, location, created_at";

fn donated_back_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DonatedBack> {
    let type_raw: String = row.get(4)?;
    let created_raw: String = row.get(7)?;
    Ok(DonatedBack {
        id: row.get(0)?,
        organization_name: row.get(1)?,
        count: row.get(2)?,
        items: row.get(3)?,
        type_of_items: ItemType::parse_lenient(&type_raw),
        total: row.get::<_, Option<f64>>(5)?.unwrap_or(0.0),
        location: row.get(6)?,
        created_at: parse_timestamp(7, created_raw)?,
    })
}

pub async fn list_donated_back(pool: &DbPool) -> anyhow::Result<Vec<DonatedBack>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {DONATED_BACK_COLUMNS} FROM donation_details ORDER BY rowid"
    ))?;
    let rows = stmt
        .query_map([], donated_back_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub async fn add_donated_back(pool: &DbPool, record: &DonatedBack) -> anyhow::Result<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO donation_details
             (id, organization_name, count, items, type_of_items, total, location, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            record.id,
            record.organization_name,
            record.count,
            record.items,
            record.type_of_items.as_str(),
            record.total,
            record.location,
            record.created_at.to_rfc3339()
        ],
    )?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn update_donated_back(
    pool: &DbPool,
    id: &str,
    organization_name: Option<&str>,
    count: Option<i64>,
    items: Option<&str>,
    type_of_items: Option<ItemType>,
    total: Option<f64>,
    location: &Option<String>,
) -> anyhow::Result<bool> {
    let conn = pool.get()?;
    let changed = conn.execute(
        "UPDATE donation_details
         SET organization_name = COALESCE(?2, organization_name),
             count = COALESCE(?3, count),
             items = COALESCE(?4, items),
             type_of_items = COALESCE(?5, type_of_items),
             total = COALESCE(?6, total),
             location = COALESCE(?7, location)
         WHERE id = ?1",
        params![
            id,
            organization_name,
            count,
            items,
            type_of_items.map(ItemType::as_str),
            total,
            location
        ],
    )?;
    Ok(changed > 0)
}

pub async fn delete_donated_back(pool: &DbPool, id: &str) -> anyhow::Result<bool> {
    let conn = pool.get()?;
    let changed = conn.execute("DELETE FROM donation_details WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

fn donation_key_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DonationKey> {
    let created_raw: String = row.get(3)?;
    let status_raw: String = row.get(4)?;
    Ok(DonationKey {
        id: row.get(0)?,
        unique_key: row.get(1)?,
        payment_method: row.get(2)?,
        created_at: parse_timestamp(3, created_raw)?,
        status: KeyStatus::parse_lenient(&status_raw),
    })
}

pub async fn add_donation_key(pool: &DbPool, key: &DonationKey) -> anyhow::Result<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO donation_keys (id, unique_key, payment_method, created_at, status)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            key.id,
            key.unique_key,
            key.payment_method,
            key.created_at.to_rfc3339(),
            key.status.as_str()
        ],
    )?;
    Ok(())
}

pub async fn find_donation_key(
    pool: &DbPool,
    unique_key: &str,
) -> anyhow::Result<Option<DonationKey>> {
    let conn = pool.get()?;
    let key = conn
        .query_row(
            "SELECT id, unique_key, payment_method, created_at, status
             FROM donation_keys WHERE unique_key = ?1 LIMIT 1",
            params![unique_key],
            donation_key_from_row,
        )
        .optional()?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_pool() -> (tempfile::TempDir, DbPool) {
        let dir = tempfile::tempdir().expect("tempdir");
        let pool = init_pool_at(&dir.path().join("devaid-test.db")).expect("init pool");
        (dir, pool)
    }

    #[tokio::test]
    async fn schema_applies_and_round_trips_a_donation() {
        let (_dir, pool) = test_pool();
        let now = Utc::now();
        add_donation(&pool, "d-1", "Jane", 5000.0, &None, &None, now)
            .await
            .expect("add_donation");

        let fetched = get_donation(&pool, "d-1").await.expect("get").expect("found");
        assert_eq!(fetched.name, "Jane");
        assert_eq!(fetched.amount, 5000.0);
        assert!(fetched.composite_key.is_none());
    }

    #[tokio::test]
    async fn missing_amount_reads_as_zero() {
        let (_dir, pool) = test_pool();
        let conn = pool.get().expect("conn");
        conn.execute(
            "INSERT INTO donations (id, name, amount, created_at) VALUES (?1, ?2, NULL, ?3)",
            params!["d-null", "NoAmount", Utc::now().to_rfc3339()],
        )
        .expect("raw insert");
        drop(conn);

        let all = list_donations(&pool).await.expect("list");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].amount, 0.0);
    }

    #[tokio::test]
    async fn composite_key_lookup_finds_only_matching_rows() {
        let (_dir, pool) = test_pool();
        let now = Utc::now();
        add_donation(&pool, "d-1", "Jane", 100.0, &Some("Jane100".into()), &None, now)
            .await
            .expect("add");

        let hit = find_donation_by_composite_key(&pool, "Jane100")
            .await
            .expect("query");
        assert_eq!(hit.map(|d| d.id), Some("d-1".to_string()));

        let miss = find_donation_by_composite_key(&pool, "John100")
            .await
            .expect("query");
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn update_is_partial_and_delete_reports_absence() {
        let (_dir, pool) = test_pool();
        let now = Utc::now();
        add_donation(&pool, "d-1", "Jane", 100.0, &None, &None, now)
            .await
            .expect("add");

        assert!(update_donation(&pool, "d-1", None, Some(250.0)).await.expect("update"));
        let fetched = get_donation(&pool, "d-1").await.expect("get").expect("found");
        assert_eq!(fetched.name, "Jane");
        assert_eq!(fetched.amount, 250.0);

        assert!(!update_donation(&pool, "missing", Some("x"), None).await.expect("update"));
        assert!(delete_donation(&pool, "d-1").await.expect("delete"));
        assert!(!delete_donation(&pool, "d-1").await.expect("delete"));
    }
}
