//! One-time provisioning: create the target database, then load the schema
//! and seed documents.
//!
//! Schema and seed are not wrapped in a transaction. A seed failure after a
//! successful schema load leaves the schema's objects in place.

use std::path::{Path, PathBuf};

use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use tracing::{error, info};

use crate::config::db::{ConnectionProfile, DbKind, DbTarget};
use crate::error::DbInfraError;
use crate::infra::db::core::{build_pool, close_pool};
use crate::infra::db::diagnostics::setup_counters;

pub const DEFAULT_SCHEMA_PATH: &str = "db/schema.sql";
pub const DEFAULT_SEED_PATH: &str = "db/seed.sql";

/// Locations of the two SQL documents applied by the bootstrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupPaths {
    pub schema: PathBuf,
    pub seed: PathBuf,
}

impl Default for SetupPaths {
    fn default() -> Self {
        Self {
            schema: PathBuf::from(DEFAULT_SCHEMA_PATH),
            seed: PathBuf::from(DEFAULT_SEED_PATH),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseStatus {
    Created,
    AlreadyExists,
}

/// Make sure the profile's target database exists.
///
/// Postgres: connects to the administrative database, looks the name up in
/// `pg_database` and issues `CREATE DATABASE` only when it is missing. The
/// administrative pool is closed on every path.
///
/// SQLite: the file is created on first connect, so only its directory is
/// prepared here.
pub async fn ensure_database_exists(
    profile: &ConnectionProfile,
) -> Result<DatabaseStatus, DbInfraError> {
    match profile.kind {
        DbKind::Postgres => {
            let admin = build_pool(profile, DbTarget::Admin).await?;
            let result = create_database_if_missing(&admin, &profile.database).await;
            close_pool(admin, "admin").await;

            if let Err(e) = &result {
                error!("Error creating database: {e}");
            }
            result
        }
        DbKind::SqliteFile => {
            let existed = tokio::fs::try_exists(profile.sqlite_path())
                .await
                .map_err(|source| DbInfraError::Io {
                    path: profile.sqlite_path(),
                    source,
                })?;
            ensure_sqlite_dir(profile).await?;

            if existed {
                Ok(DatabaseStatus::AlreadyExists)
            } else {
                info!("Database file will be created at {}", profile.sqlite_path().display());
                setup_counters::database_created();
                Ok(DatabaseStatus::Created)
            }
        }
    }
}

/// Existence check and create, against an open administrative connection.
pub async fn create_database_if_missing<C>(
    admin: &C,
    database: &str,
) -> Result<DatabaseStatus, DbInfraError>
where
    C: ConnectionTrait,
{
    let exists = admin
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT 1 FROM pg_database WHERE datname = $1",
            [database.into()],
        ))
        .await
        .map_err(DbInfraError::statement("database existence check"))?
        .is_some();

    if exists {
        info!("Database {database} already exists");
        return Ok(DatabaseStatus::AlreadyExists);
    }

    info!("Creating database...");
    admin
        .execute_unprepared(&format!("CREATE DATABASE {}", quote_ident(database)))
        .await
        .map_err(DbInfraError::statement("create database"))?;
    info!("Database created successfully!");
    setup_counters::database_created();

    Ok(DatabaseStatus::Created)
}

/// Open the target database and apply schema then seed. The pool is closed
/// whatever the outcome.
pub async fn apply_schema_and_seed(
    profile: &ConnectionProfile,
    paths: &SetupPaths,
) -> Result<(), DbInfraError> {
    let pool = build_pool(profile, DbTarget::Target).await?;
    let result = apply_schema_and_seed_with(&pool, paths).await;
    close_pool(pool, "target").await;

    if let Err(e) = &result {
        error!("Error setting up database: {e}");
    }
    result
}

/// Schema then seed against an open connection. Stops at the first failure.
pub async fn apply_schema_and_seed_with<C>(db: &C, paths: &SetupPaths) -> Result<(), DbInfraError>
where
    C: ConnectionTrait,
{
    info!("Creating tables...");
    run_sql_file(db, &paths.schema, "schema").await?;
    info!("Tables created successfully!");

    info!("Inserting sample data...");
    run_sql_file(db, &paths.seed, "seed").await?;
    info!("Sample data inserted successfully!");

    Ok(())
}

/// Read `path` in full and execute it as one unprepared batch.
async fn run_sql_file<C>(db: &C, path: &Path, step: &'static str) -> Result<(), DbInfraError>
where
    C: ConnectionTrait,
{
    let sql = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DbInfraError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    db.execute_unprepared(&sql)
        .await
        .map_err(DbInfraError::statement(step))?;
    setup_counters::sql_file_applied();

    Ok(())
}

pub(crate) async fn ensure_sqlite_dir(profile: &ConnectionProfile) -> Result<(), DbInfraError> {
    tokio::fs::create_dir_all(&profile.sqlite_dir)
        .await
        .map_err(|source| DbInfraError::Io {
            path: profile.sqlite_dir.clone(),
            source,
        })
}

/// Quote a Postgres identifier. Database names cannot be bound as parameters.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
