use std::sync::Arc;

use clap::Parser;

mod worker;

#[derive(Debug, Parser)]
struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	config: std::path::PathBuf,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();
	let config = scout_config::load(&args.config)?;

	init_tracing(&config)?;

	let db = scout_storage::db::Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let service = Arc::new(scout_service::ScoutService::new(config, db));

	tracing::info!("Worker started.");

	worker::run_worker(service).await
}

fn init_tracing(config: &scout_config::Config) -> color_eyre::Result<()> {
	let filter = tracing_subscriber::EnvFilter::try_new(&config.service.log_level)
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	Ok(())
}
