use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use db_infra::config::db::{ConnectionProfile, DbKind};
use db_infra::infra::db::{orchestrate_setup, SetupPaths};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,sqlx=warn,sea_orm=warn";

#[derive(Clone, Copy, ValueEnum)]
enum Db {
    Postgres,
    SqliteFile,
}

#[derive(Parser)]
#[command(name = "db-setup")]
#[command(about = "Create the application database and load its schema and sample data")]
struct Args {
    /// Database type
    #[arg(
        short,
        long,
        value_enum,
        default_value = "postgres",
        help = "Database type: postgres, sqlite-file"
    )]
    db: Db,

    /// Schema document, applied first
    #[arg(long, default_value = "db/schema.sql")]
    schema: PathBuf,

    /// Seed document, applied after the schema
    #[arg(long, default_value = "db/seed.sql")]
    seed: PathBuf,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .without_time()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(false)
        .with_file(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args = Args::try_parse().unwrap_or_else(|e| e.exit());

    let db_kind = match args.db {
        Db::Postgres => DbKind::Postgres,
        Db::SqliteFile => DbKind::SqliteFile,
    };

    let profile = match ConnectionProfile::from_env(db_kind) {
        Ok(profile) => profile,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let paths = SetupPaths {
        schema: args.schema,
        seed: args.seed,
    };

    if let Err(e) = orchestrate_setup(&profile, &paths).await {
        eprintln!("Database setup failed: {e}");
        std::process::exit(1);
    }
}
