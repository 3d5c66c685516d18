use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use db_infra::config::db::{ConnectionProfile, DbKind};
use db_infra::infra::db::orchestrate_migration;
use migration::MigrationCommand;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,sqlx=warn,sea_orm=warn";

#[derive(Clone, Copy, ValueEnum)]
enum Command {
    /// Apply every pending migration file
    Up,
    /// List applied and pending migrations
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum Db {
    Postgres,
    SqliteFile,
}

#[derive(Parser)]
#[command(name = "migrate")]
#[command(about = "Apply forward-only SQL migrations from a directory")]
struct Args {
    /// Migration command to run
    #[arg(value_enum, default_value = "up")]
    command: Command,

    /// Database type
    #[arg(
        short,
        long,
        value_enum,
        default_value = "postgres",
        help = "Database type: postgres, sqlite-file"
    )]
    db: Db,

    /// Directory holding the `.sql` migration files
    #[arg(long, default_value = "db/migrations")]
    dir: PathBuf,
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

    // Usage errors exit with 2, help and version with 0.
    let args = Args::try_parse().unwrap_or_else(|e| e.exit());

    let command = match args.command {
        Command::Up => MigrationCommand::Up,
        Command::Status => MigrationCommand::Status,
    };

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

    if let Err(e) = orchestrate_migration(&profile, &args.dir, command).await {
        eprintln!("Migration failed: {e}");
        std::process::exit(1);
    }
}
