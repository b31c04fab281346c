use crate::Config;
use crate::database::postgres_repository::PostgresRepository;
use crate::db::init_pool;
use chrono::{Duration, Utc};

#[derive(Debug, Clone, Copy)]
pub struct MaintenanceResult {
    pub attempts_pruned: u64,
    pub resets_purged: u64,
}

/// Scheduled cleanup: drop ledger rows past the retention horizon and
/// reset tokens past their expiry. Safe to run repeatedly; rows inside
/// the lockout window are never old enough to qualify.
pub async fn run_maintenance(config: &Config) -> Result<MaintenanceResult, String> {
    let pool = init_pool(&config.database)
        .await
        .map_err(|err| format!("Failed to initialize database pool: {err}"))?;

    let repo = PostgresRepository { pool: pool.clone() };

    let cutoff = Utc::now() - Duration::days(config.maintenance.ledger_retention_days);
    let attempts_pruned = repo
        .prune_attempts_before(cutoff)
        .await
        .map_err(|err| format!("Failed to prune attempt ledger: {err:?}"))?;

    let resets_purged = repo
        .purge_expired_password_resets()
        .await
        .map_err(|err| format!("Failed to purge expired password resets: {err:?}"))?;

    pool.close().await;

    Ok(MaintenanceResult { attempts_pruned, resets_purged })
}
