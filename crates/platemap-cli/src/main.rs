mod collect;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "platemap-cli")]
#[command(about = "Platemap command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch current listings from the platform and upsert them.
    Collect {
        /// Collect a single area by slug instead of all configured areas.
        #[arg(long)]
        area: Option<String>,
    },
    /// Insert the fixed development sample listings.
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = platemap_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = platemap_db::PoolConfig::from_app_config(&config);
    let pool = platemap_db::connect_pool(&config.database_url, pool_config).await?;
    platemap_db::run_migrations(&pool).await?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Collect { area } => collect::run(&pool, &config, area.as_deref()).await,
        Commands::Seed => {
            let (new_count, updated_count) = platemap_db::seed::seed_sample_restaurants(&pool)
                .await?;
            println!("seeded sample listings: {new_count} new, {updated_count} updated");
            Ok(())
        }
    }
}
