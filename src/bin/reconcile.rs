//! preplist-reconcile: compute (or reuse) today's prep list and print it as JSON.
//!
//! Usage: `preplist-reconcile [--force]`
//!
//! `--force` clears today's list, completed rows included, and regenerates it
//! from current stock. Intended for the opening inventory count or cron.

use std::sync::Arc;

use serde::Serialize;

use preplist_lib::error::PrepErrorReport;
use preplist_lib::services::{Reconciliation, ReconciliationService};
use preplist_lib::types::PrepSummary;
use preplist_lib::{load_config, PrepDb, PrepError, SqliteStore};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Output {
    #[serde(flatten)]
    reconciliation: Reconciliation,
    summary: PrepSummary,
}

async fn run(force: bool) -> Result<Output, PrepError> {
    let config = load_config()?;
    let today = config.today()?;
    let db = PrepDb::open_configured(config.db_path.as_deref())?;
    let store = Arc::new(SqliteStore::new(db));

    let service =
        ReconciliationService::new(Arc::clone(&store), Arc::clone(&store), Arc::clone(&store))
            .with_classifier(config.classifier())
            .with_default_estimated_time(config.default_estimated_time);
    let reconciliation = service.reconcile(today, force).await?;
    let summary = reconciliation.list.summary();
    Ok(Output {
        reconciliation,
        summary,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut force = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--force" | "-f" => force = true,
            other => anyhow::bail!("Unknown argument: {other}. Usage: preplist-reconcile [--force]"),
        }
    }

    match run(force).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            let report = PrepErrorReport::from(&e);
            eprintln!("{}", serde_json::to_string_pretty(&report)?);
            std::process::exit(if report.can_retry { 75 } else { 1 });
        }
    }
}
