use std::sync::Arc;

use scout_service::{Providers, ScoutService};
use scout_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<ScoutService>,
}
impl AppState {
	pub async fn new(config: scout_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self { service: Arc::new(ScoutService::new(config, db)) })
	}

	pub async fn with_providers(
		config: scout_config::Config,
		providers: Providers,
	) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self { service: Arc::new(ScoutService::with_providers(config, db, providers)) })
	}
}
