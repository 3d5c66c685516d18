//! Forward-only SQL migrations driven by a directory of `.sql` files and a
//! `migrations` ledger table.

use std::collections::HashSet;
use std::path::Path;

pub use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};

mod error;
mod files;
mod ledger;
mod runner;

pub use error::MigrationError;
pub use files::{list_migration_files, MigrationFile, MIGRATION_SUFFIX};
pub use ledger::{ensure_ledger, load_applied_names, record_applied};
pub use runner::{apply_pending, MigrationState, MigrationStatus, StatusReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationCommand {
    /// Apply all pending migrations.
    Up,
    /// Report applied/pending migrations without changing anything.
    Status,
}

/// What a single `migrate` call saw and did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    /// Migration files found on disk.
    pub defined: usize,
    /// Ledger rows present before the command ran.
    pub previously_applied: usize,
    /// Names applied by this call, in apply order.
    pub newly_applied: Vec<String>,
}

/// Ensure the ledger, then apply every pending file under `dir` in name order.
pub async fn run_up<C>(db: &C, dir: &Path) -> Result<Vec<String>, MigrationError>
where
    C: ConnectionTrait + TransactionTrait,
{
    ensure_ledger(db).await?;
    let files = list_migration_files(dir)?;
    let applied: HashSet<String> = load_applied_names(db).await?.into_iter().collect();

    apply_pending(db, &files, &applied).await
}

/// Ensure the ledger, then compare it against the files under `dir`.
pub async fn status<C>(db: &C, dir: &Path) -> Result<StatusReport, MigrationError>
where
    C: ConnectionTrait,
{
    ensure_ledger(db).await?;
    let files = list_migration_files(dir)?;
    let applied = load_applied_names(db).await?;

    Ok(StatusReport::build(&files, &applied))
}

/// Migration entry point shared by the CLI and tests.
pub async fn migrate<C>(
    db: &C,
    dir: &Path,
    command: MigrationCommand,
) -> Result<MigrationSummary, MigrationError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let before = get_diagnostics(db, dir).await?;

    tracing::info!("▶ cmd={command:?}  profile={}", before.profile);
    tracing::info!("▶ migrations dir: {}", dir.display());
    tracing::info!(
        "▶ BEFORE: {} migration file(s) defined, {} applied",
        before.defined,
        before.applied
    );

    let result = match command {
        MigrationCommand::Up => run_up(db, dir).await,
        MigrationCommand::Status => status(db, dir).await.map(|report| {
            log_status(&report);
            Vec::new()
        }),
    };

    match result {
        Ok(newly_applied) => {
            if command == MigrationCommand::Up {
                let after = get_diagnostics(db, dir).await?;
                tracing::info!(
                    "▶ AFTER: {} migration file(s) defined, {} applied",
                    after.defined,
                    after.applied
                );
                tracing::info!("All migrations completed successfully");
            }
            tracing::info!("✅ {command:?} OK for {}", before.profile);
            Ok(MigrationSummary {
                defined: before.defined,
                previously_applied: before.applied,
                newly_applied,
            })
        }
        Err(e) => {
            tracing::error!("❌ {command:?} failed for {}: {e}", before.profile);
            Err(e)
        }
    }
}

fn log_status(report: &StatusReport) {
    for entry in &report.entries {
        let mark = match entry.state {
            MigrationState::Applied => "applied",
            MigrationState::Pending => "pending",
        };
        tracing::info!("  {mark:<8} {}", entry.name);
    }
    for name in &report.orphaned {
        tracing::warn!("  orphaned {name} (in ledger, no file on disk)");
    }
}

#[derive(Debug)]
struct Diagnostics {
    profile: String,
    defined: usize,
    applied: usize,
}

async fn get_diagnostics<C>(db: &C, dir: &Path) -> Result<Diagnostics, MigrationError>
where
    C: ConnectionTrait,
{
    let profile = format!("{:?}", db.get_database_backend());
    // A listing failure is reported by the command itself, after the ledger exists.
    let defined = list_migration_files(dir).map(|f| f.len()).unwrap_or(0);
    let applied = count_applied_migrations(db).await?;

    Ok(Diagnostics {
        profile,
        defined,
        applied,
    })
}

/// Number of rows in the ledger; 0 when the ledger table does not exist yet.
pub async fn count_applied_migrations<C>(db: &C) -> Result<usize, DbErr>
where
    C: ConnectionTrait,
{
    match load_applied_names(db).await {
        Ok(names) => Ok(names.len()),
        Err(e) if is_missing_ledger(&e) => {
            tracing::debug!(error = %e, "ledger table not present yet");
            Ok(0)
        }
        Err(e) => Err(e),
    }
}

/// Name of the most recently applied migration, if any.
pub async fn get_latest_migration_version<C>(db: &C) -> Result<Option<String>, DbErr>
where
    C: ConnectionTrait,
{
    match load_applied_names(db).await {
        Ok(mut names) => Ok(names.pop()),
        Err(e) if is_missing_ledger(&e) => {
            tracing::debug!(error = %e, "ledger table not present yet");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// True when `err` says the `migrations` table itself is absent. Postgres
/// reports `relation "migrations" does not exist`, SQLite
/// `no such table: migrations`.
fn is_missing_ledger(err: &DbErr) -> bool {
    match err {
        DbErr::Exec(_) | DbErr::Query(_) => {
            let msg = err.to_string();
            msg.contains("migrations")
                && (msg.contains("no such table") || msg.contains("does not exist"))
        }
        _ => false,
    }
}
