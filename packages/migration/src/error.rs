use std::io;
use std::path::PathBuf;

use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to list migrations directory {}: {source}", path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read migration {name}: {source}")]
    ReadFile {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("migration ledger error: {0}")]
    Ledger(#[from] DbErr),

    /// The migration's transaction was rolled back; nothing after it was attempted.
    #[error("migration {name} failed: {source}")]
    Failed {
        name: String,
        #[source]
        source: DbErr,
    },
}

impl MigrationError {
    /// Name of the migration file involved, if the error is tied to one.
    pub fn migration_name(&self) -> Option<&str> {
        match self {
            MigrationError::ReadFile { name, .. } | MigrationError::Failed { name, .. } => {
                Some(name)
            }
            MigrationError::ListDir { .. } | MigrationError::Ledger(_) => None,
        }
    }
}
