use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use devaid::{db, importer};

/// Migrates legacy donation rows from the fundraising spreadsheet into
/// the donations collection. Re-runnable: rows already present (by
/// composite key) are skipped.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if it exists
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "devaid=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting donation migration...");

    let sheet_id = env::var("GOOGLE_SHEET_ID").expect("GOOGLE_SHEET_ID must be set");
    let api_key = env::var("GOOGLE_SHEETS_API_KEY").expect("GOOGLE_SHEETS_API_KEY must be set");
    let range = env::var("SHEET_RANGE").unwrap_or_else(|_| "Sheet1!A2:C25".to_string());

    let pool = db::init_pool().await?;

    let rows = importer::fetch_sheet_rows(&sheet_id, &range, &api_key).await?;
    if rows.is_empty() {
        tracing::info!("No data found in the sheet.");
        return Ok(());
    }

    let outcome = importer::import_rows(&pool, &rows).await;
    tracing::info!(
        "Migration complete: {} imported, {} duplicates skipped, {} rows skipped, {} failed",
        outcome.imported,
        outcome.duplicates,
        outcome.skipped,
        outcome.failed
    );

    Ok(())
}
