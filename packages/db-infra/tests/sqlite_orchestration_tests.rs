//! Bootstrapper and migration orchestration against SQLite files.
//!
//! Run:
//!   cargo test -p db-infra --test sqlite_orchestration_tests

use std::fs;
use std::path::PathBuf;

use db_infra::config::db::{ConnectionProfile, DbKind, DbTarget};
use db_infra::infra::db::{
    apply_schema_and_seed, ensure_database_exists, migration_counters, DatabaseStatus, SetupPaths,
};
use db_infra::{build_pool, close_pool, orchestrate_migration, orchestrate_setup, DbInfraError};
use migration::{MigrationCommand, MigrationError};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use tempfile::TempDir;

struct Workspace {
    tmp: TempDir,
    profile: ConnectionProfile,
}

impl Workspace {
    fn new() -> Self {
        test_support::logging::init();

        let tmp = tempfile::tempdir().unwrap();
        let sqlite_dir = tmp.path().join("data").display().to_string();
        let database = test_support::unique_db_name("edtech");
        let profile = ConnectionProfile::from_lookup(DbKind::SqliteFile, |key| match key {
            "SQLITE_DB_DIR" => Some(sqlite_dir.clone()),
            "POSTGRES_DB" => Some(database.clone()),
            _ => None,
        })
        .unwrap();

        Self { tmp, profile }
    }

    fn write(&self, rel: &str, sql: &str) -> PathBuf {
        let path = self.tmp.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, sql).unwrap();
        path
    }

    fn setup_paths(&self, schema: &str, seed: &str) -> SetupPaths {
        SetupPaths {
            schema: self.write("db/schema.sql", schema),
            seed: self.write("db/seed.sql", seed),
        }
    }

    fn migrations_dir(&self) -> PathBuf {
        let dir = self.tmp.path().join("db/migrations");
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    async fn scalar(&self, sql: &str) -> Option<i64> {
        let pool = build_pool(&self.profile, DbTarget::Target).await.unwrap();
        let row = pool
            .query_one(Statement::from_string(DatabaseBackend::Sqlite, sql))
            .await
            .unwrap();
        let value = row.map(|r| r.try_get_by_index::<i64>(0).unwrap());
        close_pool(pool, "test").await;
        value
    }

    async fn table_exists(&self, table: &str) -> bool {
        let sql = format!(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '{table}'"
        );
        self.scalar(&sql).await == Some(1)
    }
}

const SCHEMA: &str = "
CREATE TABLE clubs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    is_published BOOLEAN NOT NULL DEFAULT 1
);
CREATE TABLE club_tags (
    club_id INTEGER NOT NULL REFERENCES clubs (id),
    category TEXT NOT NULL,
    value TEXT NOT NULL
);
";

const SEED: &str = "
INSERT INTO clubs (name) VALUES ('Chess Club');
INSERT INTO clubs (name) VALUES ('Robotics Society');
INSERT INTO club_tags (club_id, category, value) VALUES (1, 'interest', 'strategy');
";

#[tokio::test]
async fn setup_creates_database_and_loads_schema_and_seed() {
    let ws = Workspace::new();
    let paths = ws.setup_paths(SCHEMA, SEED);

    orchestrate_setup(&ws.profile, &paths).await.unwrap();

    assert!(ws.profile.sqlite_path().exists());
    assert_eq!(ws.scalar("SELECT COUNT(*) FROM clubs").await, Some(2));
    assert_eq!(ws.scalar("SELECT COUNT(*) FROM club_tags").await, Some(1));
}

#[tokio::test]
async fn ensure_database_exists_is_idempotent() {
    let ws = Workspace::new();

    assert_eq!(
        ensure_database_exists(&ws.profile).await.unwrap(),
        DatabaseStatus::Created
    );

    let pool = build_pool(&ws.profile, DbTarget::Target).await.unwrap();
    close_pool(pool, "test").await;

    assert_eq!(
        ensure_database_exists(&ws.profile).await.unwrap(),
        DatabaseStatus::AlreadyExists
    );
}

#[tokio::test]
async fn seed_failure_keeps_schema_tables() {
    let ws = Workspace::new();
    let paths = ws.setup_paths(SCHEMA, "INSERT INTO no_such_table VALUES (1);");

    let err = orchestrate_setup(&ws.profile, &paths).await.unwrap_err();

    assert!(matches!(err, DbInfraError::Statement { step: "seed", .. }));
    assert!(ws.table_exists("clubs").await);
    assert!(ws.table_exists("club_tags").await);
}

#[tokio::test]
async fn rerunning_setup_fails_on_existing_objects() {
    let ws = Workspace::new();
    let paths = ws.setup_paths(SCHEMA, SEED);
    orchestrate_setup(&ws.profile, &paths).await.unwrap();

    let err = apply_schema_and_seed(&ws.profile, &paths).await.unwrap_err();

    assert!(matches!(err, DbInfraError::Statement { step: "schema", .. }));
    assert_eq!(ws.scalar("SELECT COUNT(*) FROM clubs").await, Some(2));
}

#[tokio::test]
async fn missing_schema_file_aborts_before_seed() {
    let ws = Workspace::new();
    let paths = SetupPaths {
        schema: ws.tmp.path().join("db/missing.sql"),
        seed: ws.write("db/seed.sql", "CREATE TABLE should_not_exist (id INTEGER);"),
    };

    let err = orchestrate_setup(&ws.profile, &paths).await.unwrap_err();

    match err {
        DbInfraError::Io { path, .. } => assert!(path.ends_with("missing.sql")),
        other => panic!("expected Io error, got {other:?}"),
    }
    assert!(!ws.table_exists("should_not_exist").await);
}

#[tokio::test]
async fn migrate_applies_pending_then_becomes_a_no_op() {
    let ws = Workspace::new();
    let dir = ws.migrations_dir();
    ws.write("db/migrations/001_users.sql", "CREATE TABLE users (id INTEGER PRIMARY KEY);");
    ws.write(
        "db/migrations/002_profiles.sql",
        "ALTER TABLE users ADD COLUMN display_name TEXT;",
    );

    let before = migration_counters::snapshot();
    let first = orchestrate_migration(&ws.profile, &dir, MigrationCommand::Up)
        .await
        .unwrap();
    let second = orchestrate_migration(&ws.profile, &dir, MigrationCommand::Up)
        .await
        .unwrap();
    let after = migration_counters::snapshot();

    assert_eq!(first.newly_applied, vec!["001_users.sql", "002_profiles.sql"]);
    assert!(second.newly_applied.is_empty());
    assert_eq!(second.previously_applied, 2);
    assert_eq!(ws.scalar("SELECT COUNT(*) FROM migrations").await, Some(2));
    assert!(after.migrations_applied_total >= before.migrations_applied_total + 2);
    assert!(after.migrations_skipped_total >= before.migrations_skipped_total + 2);
}

#[tokio::test]
async fn migrate_failure_surfaces_the_failing_file() {
    let ws = Workspace::new();
    let dir = ws.migrations_dir();
    ws.write("db/migrations/001_a.sql", "CREATE TABLE a (id INTEGER);");
    ws.write("db/migrations/002_b.sql", "THIS IS NOT SQL;");
    ws.write("db/migrations/003_c.sql", "CREATE TABLE c (id INTEGER);");

    let err = orchestrate_migration(&ws.profile, &dir, MigrationCommand::Up)
        .await
        .unwrap_err();

    match &err {
        DbInfraError::Migration(inner @ MigrationError::Failed { .. }) => {
            assert_eq!(inner.migration_name(), Some("002_b.sql"));
        }
        other => panic!("expected a failed migration, got {other:?}"),
    }
    assert_eq!(ws.scalar("SELECT COUNT(*) FROM migrations").await, Some(1));
    assert!(!ws.table_exists("c").await);
}

#[tokio::test]
async fn status_does_not_apply_anything() {
    let ws = Workspace::new();
    let dir = ws.migrations_dir();
    ws.write("db/migrations/001_a.sql", "CREATE TABLE a (id INTEGER);");

    let summary = orchestrate_migration(&ws.profile, &dir, MigrationCommand::Status)
        .await
        .unwrap();

    assert_eq!(summary.defined, 1);
    assert!(summary.newly_applied.is_empty());
    assert!(!ws.table_exists("a").await);
    assert!(ws.table_exists("migrations").await);
}

fn profile_at(sqlite_dir: &std::path::Path, database: &str) -> ConnectionProfile {
    let sqlite_dir = sqlite_dir.display().to_string();
    let database = database.to_string();
    ConnectionProfile::from_lookup(DbKind::SqliteFile, |key| match key {
        "SQLITE_DB_DIR" => Some(sqlite_dir.clone()),
        "POSTGRES_DB" => Some(database.clone()),
        _ => None,
    })
    .unwrap()
}

#[tokio::test]
async fn unopenable_database_file_is_a_connect_error() {
    test_support::logging::init();
    let tmp = tempfile::tempdir().unwrap();
    // A directory where the database file should be.
    fs::create_dir(tmp.path().join("edtech.db")).unwrap();
    let profile = profile_at(tmp.path(), "edtech");

    let err = build_pool(&profile, DbTarget::Target).await.unwrap_err();

    match err {
        DbInfraError::Connect { target, .. } => assert!(target.starts_with("sqlite://")),
        other => panic!("expected Connect error, got {other:?}"),
    }
}

#[tokio::test]
async fn migrate_fails_before_touching_files_when_connect_fails() {
    test_support::logging::init();
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir(tmp.path().join("edtech.db")).unwrap();
    let profile = profile_at(tmp.path(), "edtech");

    let err = orchestrate_migration(&profile, &tmp.path().join("migrations"), MigrationCommand::Up)
        .await
        .unwrap_err();

    assert!(matches!(err, DbInfraError::Connect { .. }));
}

#[tokio::test]
async fn sqlite_dir_under_a_regular_file_is_an_io_error() {
    test_support::logging::init();
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("not-a-dir");
    fs::write(&blocker, "").unwrap();
    let profile = profile_at(&blocker.join("data"), "edtech");

    let err = orchestrate_setup(&profile, &SetupPaths::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DbInfraError::Io { .. }));
}
