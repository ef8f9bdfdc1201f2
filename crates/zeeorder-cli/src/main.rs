mod export;
mod import;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "zeeorder-cli")]
#[command(about = "Zee Ordering catalog maintenance")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Load products into the catalog
    Import {
        #[command(subcommand)]
        command: ImportCommands,
    },
    /// Render documents offline
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
}

#[derive(Debug, Subcommand)]
enum ImportCommands {
    /// Import a CSV file with `SKUCode`/`Remark` headers
    Csv {
        path: PathBuf,
        /// Parse and report without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Import from the configured Google spreadsheet
    Sheets {
        #[arg(long)]
        spreadsheet_id: Option<String>,
        #[arg(long)]
        range: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Subcommand)]
enum ExportCommands {
    /// Render an order JSON file to PDF
    Order {
        input: PathBuf,
        /// Output file; defaults to `<order ref>.pdf` in the current directory
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, env = "ZEE_UPLOADS_DIR", default_value = "./public/uploads")]
        uploads_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Db { command }) => {
            let (pool, _) = connect().await?;
            match command {
                DbCommands::Ping => {
                    zeeorder_db::ping(&pool).await?;
                    println!("database reachable");
                }
                DbCommands::Migrate => {
                    let applied = zeeorder_db::run_migrations(&pool).await?;
                    println!("applied {applied} migrations");
                }
            }
        }
        Some(Commands::Import { command }) => match command {
            ImportCommands::Csv { path, dry_run } => {
                let (pool, config) = connect().await?;
                import::run_import_csv(&pool, &config, &path, dry_run).await?;
            }
            ImportCommands::Sheets {
                spreadsheet_id,
                range,
                dry_run,
            } => {
                let (pool, config) = connect().await?;
                import::run_import_sheets(
                    &pool,
                    &config,
                    spreadsheet_id.as_deref(),
                    range.as_deref(),
                    dry_run,
                )
                .await?;
            }
        },
        Some(Commands::Export { command }) => match command {
            ExportCommands::Order {
                input,
                out,
                uploads_dir,
            } => {
                let written = export::run_export_order(&input, out.as_deref(), &uploads_dir)?;
                println!("wrote {}", written.display());
            }
        },
        None => println!("zeeorder-cli: pass --help for available commands"),
    }

    Ok(())
}

async fn connect() -> anyhow::Result<(sqlx::PgPool, zeeorder_core::AppConfig)> {
    let config = zeeorder_core::load_app_config()?;
    let pool_config = zeeorder_db::PoolConfig::from_app_config(&config);
    let pool = zeeorder_db::connect_pool(&config.database_url, pool_config).await?;
    Ok((pool, config))
}
