//! Recert batch evaluator.

#![forbid(unsafe_code)]

mod evaluation;
mod evaluator_config;
mod report;

use std::sync::Arc;

use chrono::Utc;
use recert_core::AppError;
use recert_infrastructure::{load_access_snapshot, load_policy_document};
use tracing::info;

use crate::evaluator_config::{EvaluatorConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = EvaluatorConfig::load()?;
    info!(
        policy_path = %config.policy_path.display(),
        snapshot_path = %config.snapshot_path.display(),
        "starting evaluation"
    );

    let policy = Arc::new(load_policy_document(config.policy_path.as_path()).await?);
    let snapshot = load_access_snapshot(config.snapshot_path.as_path()).await?;

    let report = evaluation::evaluate(&config, policy, &snapshot, Utc::now()).await?;
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|error| AppError::Internal(format!("failed to render report: {error}")))?;
    println!("{rendered}");

    Ok(())
}
