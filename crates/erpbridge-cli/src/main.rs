mod erp;
mod sync;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::erp::{CustomerCommands, OrderCommands, StockCommands};
use crate::sync::SyncCommands;

#[derive(Debug, Parser)]
#[command(name = "erpbridge-cli")]
#[command(about = "ERP to storefront catalog bridge")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Catalog synchronization runs
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
    /// Live ERP stock queries
    Stock {
        #[command(subcommand)]
        command: StockCommands,
    },
    /// Order pass-through to the ERP
    Order {
        #[command(subcommand)]
        command: OrderCommands,
    },
    /// ERP customer master data
    Customer {
        #[command(subcommand)]
        command: CustomerCommands,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("erpbridge-cli ready; run with --help for commands");
        return Ok(());
    };

    let config = erpbridge_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Sync { command } => sync::run(&config, command).await,
        Commands::Stock { command } => erp::run_stock(&config, command).await,
        Commands::Order { command } => erp::run_order(&config, command).await,
        Commands::Customer { command } => erp::run_customer(&config, command).await,
        Commands::Db { command } => run_db(&config, command).await,
    }
}

async fn connect(config: &erpbridge_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = erpbridge_db::PoolConfig::from_app_config(config);
    let pool = erpbridge_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}

async fn run_db(config: &erpbridge_core::AppConfig, command: DbCommands) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    match command {
        DbCommands::Ping => {
            erpbridge_db::health_check(&pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = erpbridge_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
