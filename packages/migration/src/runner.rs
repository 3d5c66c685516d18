use std::collections::HashSet;

use sea_orm::{ConnectionTrait, DbErr, TransactionTrait};
use tracing::{debug, error, info, warn};

use crate::error::MigrationError;
use crate::files::MigrationFile;
use crate::ledger;

/// Apply every file not in `applied`, in the order given.
///
/// Each file runs in its own transaction together with its ledger insert.
/// The first failure is rolled back and returned; later files are never
/// attempted. Returns the names applied by this call.
pub async fn apply_pending<C>(
    db: &C,
    files: &[MigrationFile],
    applied: &HashSet<String>,
) -> Result<Vec<String>, MigrationError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let mut newly_applied = Vec::new();

    for file in files {
        if applied.contains(&file.name) {
            debug!(migration = %file.name, "already applied, skipping");
            continue;
        }

        info!("Running migration: {}", file.name);
        let sql = file.read_sql()?;
        apply_one(db, &file.name, &sql).await?;
        info!("Migration {} completed successfully", file.name);

        newly_applied.push(file.name.clone());
    }

    Ok(newly_applied)
}

async fn apply_one<C>(db: &C, name: &str, sql: &str) -> Result<(), MigrationError>
where
    C: TransactionTrait,
{
    let failed = |source: DbErr| MigrationError::Failed {
        name: name.to_string(),
        source,
    };

    let txn = db.begin().await.map_err(failed)?;

    let body = async {
        txn.execute_unprepared(sql).await?;
        ledger::record_applied(&txn, name).await
    }
    .await;

    match body {
        Ok(()) => txn.commit().await.map_err(failed),
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                warn!(migration = name, error = %rollback_err, "rollback failed");
            }
            error!("Error running migration {name}: {e}");
            Err(failed(e))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    Applied,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub name: String,
    pub state: MigrationState,
}

/// Applied/pending view of a migrations directory against the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub entries: Vec<MigrationStatus>,
    /// Ledger names with no matching file on disk.
    pub orphaned: Vec<String>,
}

impl StatusReport {
    pub fn build(files: &[MigrationFile], applied: &[String]) -> Self {
        let applied_set: HashSet<&str> = applied.iter().map(String::as_str).collect();
        let on_disk: HashSet<&str> = files.iter().map(|f| f.name.as_str()).collect();

        let entries = files
            .iter()
            .map(|f| MigrationStatus {
                name: f.name.clone(),
                state: if applied_set.contains(f.name.as_str()) {
                    MigrationState::Applied
                } else {
                    MigrationState::Pending
                },
            })
            .collect();

        let orphaned = applied
            .iter()
            .filter(|name| !on_disk.contains(name.as_str()))
            .cloned()
            .collect();

        Self { entries, orphaned }
    }

    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.state == MigrationState::Pending)
            .map(|e| e.name.as_str())
    }
}
