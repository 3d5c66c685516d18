use std::path::Path;

use migration::{migrate, MigrationCommand, MigrationSummary};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::{debug, error, info, warn};

use crate::config::db::{ConnectionProfile, DbKind, DbTarget};
use crate::error::DbInfraError;
use crate::infra::db::bootstrap::{self, SetupPaths};
use crate::infra::db::diagnostics::{migration_counters, setup_counters};

fn get_db_engine(db_kind: DbKind) -> &'static str {
    match db_kind {
        DbKind::Postgres => "postgresql",
        DbKind::SqliteFile => "sqlite",
    }
}

/// Open a single-connection pool against `target`.
///
/// There is no retry: an unreachable server fails the run immediately.
pub async fn build_pool(
    profile: &ConnectionProfile,
    target: DbTarget,
) -> Result<DatabaseConnection, DbInfraError> {
    if profile.kind == DbKind::SqliteFile {
        bootstrap::ensure_sqlite_dir(profile).await?;
    }

    let url = profile.url(target);
    let sanitized = sanitize_db_url(&url);

    let mut opt = ConnectOptions::new(&url);
    opt.min_connections(1).max_connections(1).sqlx_logging(true);

    let pool = Database::connect(opt).await.map_err(|source| {
        error!("pool=connect_failed url={} err={}", sanitized, source);
        DbInfraError::Connect {
            target: sanitized.clone(),
            source,
        }
    })?;

    info!(
        "pool=create engine={} target={:?} url={}",
        get_db_engine(profile.kind),
        target,
        sanitized
    );
    Ok(pool)
}

/// Close a pool, logging rather than returning a close failure so the
/// caller's own result is what reaches the top level.
pub async fn close_pool(pool: DatabaseConnection, label: &str) {
    match pool.close().await {
        Ok(()) => debug!(pool = label, "pool=closed"),
        Err(e) => warn!(pool = label, error = %e, "failed to close database pool"),
    }
}

/// Sanitize database URL by masking password in connection strings.
pub fn sanitize_db_url(url: &str) -> String {
    let Some((auth_part, host_part)) = url.rsplit_once('@') else {
        return url.to_string();
    };
    let Some((scheme, userinfo)) = auth_part.split_once("://") else {
        return url.to_string();
    };

    match userinfo.split_once(':') {
        Some((user, _password)) => format!("{scheme}://{user}:***@{host_part}"),
        None => url.to_string(),
    }
}

/// Connect to the target database, run `command`, and close the pool on every path.
pub async fn orchestrate_migration(
    profile: &ConnectionProfile,
    dir: &Path,
    command: MigrationCommand,
) -> Result<MigrationSummary, DbInfraError> {
    info!(
        "migrate=start db_kind={:?} engine={} database={} dir={}",
        profile.kind,
        get_db_engine(profile.kind),
        profile.database,
        dir.display()
    );

    let pool = build_pool(profile, DbTarget::Target).await?;
    let result = orchestrate_migration_internal(&pool, dir, command).await;
    close_pool(pool, "migrate").await;

    info!("migrate=done");
    migration_counters::log_snapshot("migrate_orchestration");

    result
}

/// Migration body against an already-open pool. Does not close it.
pub async fn orchestrate_migration_internal(
    pool: &DatabaseConnection,
    dir: &Path,
    command: MigrationCommand,
) -> Result<MigrationSummary, DbInfraError> {
    migration_counters::run_started();

    match migrate(pool, dir, command).await {
        Ok(summary) => {
            if command == MigrationCommand::Up {
                let applied = summary.newly_applied.len();
                migration_counters::add_applied(applied);
                migration_counters::add_skipped(summary.defined.saturating_sub(applied));
            }
            Ok(summary)
        }
        Err(e) => {
            migration_counters::migration_failed();
            error!("Migration error: {e}");
            Err(e.into())
        }
    }
}

/// Ensure the target database exists, then load the schema and seed files.
pub async fn orchestrate_setup(
    profile: &ConnectionProfile,
    paths: &SetupPaths,
) -> Result<(), DbInfraError> {
    info!(
        "setup=start db_kind={:?} engine={} database={}",
        profile.kind,
        get_db_engine(profile.kind),
        profile.database
    );

    let result = async {
        bootstrap::ensure_database_exists(profile).await?;
        bootstrap::apply_schema_and_seed(profile, paths).await
    }
    .await;

    match &result {
        Ok(()) => info!("Database setup completed!"),
        Err(e) => {
            setup_counters::setup_failed();
            error!("Setup failed: {e}");
        }
    }
    setup_counters::log_snapshot("setup_orchestration");

    result
}
