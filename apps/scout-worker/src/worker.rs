//! Background maintenance loop: re-drives deferred ingestions, sweeps
//! expired sessions, and purges expired durable cache rows. Everything here
//! is idempotent and safe to run alongside the API process.

use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tracing::{error, info};

use scout_service::ScoutService;

const POLL_INTERVAL_MS: u64 = 5_000;
const REPROCESS_BATCH_LIMIT: i64 = 25;
const MAINTENANCE_INTERVAL_SECONDS: i64 = 300;

pub async fn run_worker(service: Arc<ScoutService>) -> color_eyre::Result<()> {
	let mut last_maintenance = OffsetDateTime::now_utc();

	loop {
		match service.reprocess_pending_ingestions(REPROCESS_BATCH_LIMIT).await {
			Ok(report) if report.processed > 0 => {
				info!(
					processed = report.processed,
					ingested = report.ingested,
					deferred = report.deferred,
					failed = report.failed,
					"Reprocessed pending ingestions."
				);
			},
			Ok(_) => {},
			Err(err) => {
				error!(error = %err, "Ingestion reprocessing failed.");
			},
		}

		let now = OffsetDateTime::now_utc();

		if now - last_maintenance >= Duration::seconds(MAINTENANCE_INTERVAL_SECONDS) {
			if let Err(err) = service.sweep_expired_sessions().await {
				error!(error = %err, "Session sweep failed.");
			}

			match service.purge_expired_expansions().await {
				Ok(purged) if purged > 0 => {
					info!(count = purged, "Purged expired expansion cache rows.");
				},
				Ok(_) => {},
				Err(err) => {
					error!(error = %err, "Expansion cache purge failed.");
				},
			}

			last_maintenance = now;
		}

		tokio::time::sleep(std::time::Duration::from_millis(POLL_INTERVAL_MS)).await;
	}
}
