use std::io;
use std::path::PathBuf;

use migration::MigrationError;
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbInfraError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: DbErr,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{step} failed: {source}")]
    Statement {
        step: &'static str,
        #[source]
        source: DbErr,
    },

    #[error(transparent)]
    Migration(#[from] MigrationError),
}

impl DbInfraError {
    pub fn config(message: impl Into<String>) -> Self {
        DbInfraError::Config {
            message: message.into(),
        }
    }

    pub(crate) fn statement(step: &'static str) -> impl FnOnce(DbErr) -> Self {
        move |source| DbInfraError::Statement { step, source }
    }
}
