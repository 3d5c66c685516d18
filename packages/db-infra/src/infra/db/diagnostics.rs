/// Process-wide counters for migration runs, logged as a snapshot at the end
/// of each orchestration.
pub mod migration_counters {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static RUNS_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static MIGRATIONS_APPLIED_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static MIGRATIONS_SKIPPED_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static MIGRATION_FAILED_TOTAL: AtomicUsize = AtomicUsize::new(0);

    pub fn run_started() {
        RUNS_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_applied(n: usize) {
        MIGRATIONS_APPLIED_TOTAL.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_skipped(n: usize) {
        MIGRATIONS_SKIPPED_TOTAL.fetch_add(n, Ordering::Relaxed);
    }

    pub fn migration_failed() {
        MIGRATION_FAILED_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    #[derive(Debug, Clone, Copy)]
    pub struct Snapshot {
        pub runs_total: usize,
        pub migrations_applied_total: usize,
        pub migrations_skipped_total: usize,
        pub migration_failed_total: usize,
    }

    pub fn snapshot() -> Snapshot {
        Snapshot {
            runs_total: RUNS_TOTAL.load(Ordering::Relaxed),
            migrations_applied_total: MIGRATIONS_APPLIED_TOTAL.load(Ordering::Relaxed),
            migrations_skipped_total: MIGRATIONS_SKIPPED_TOTAL.load(Ordering::Relaxed),
            migration_failed_total: MIGRATION_FAILED_TOTAL.load(Ordering::Relaxed),
        }
    }

    pub fn log_snapshot(context: &str) {
        let s = snapshot();
        tracing::info!(
            context = context,
            runs_total = s.runs_total,
            migrations_applied_total = s.migrations_applied_total,
            migrations_skipped_total = s.migrations_skipped_total,
            migration_failed_total = s.migration_failed_total,
            "db_migration_counters_snapshot"
        );
    }
}

/// Counters for the schema/seed bootstrap.
pub mod setup_counters {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static DATABASES_CREATED_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static SQL_FILES_APPLIED_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static SETUP_FAILED_TOTAL: AtomicUsize = AtomicUsize::new(0);

    pub fn database_created() {
        DATABASES_CREATED_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sql_file_applied() {
        SQL_FILES_APPLIED_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    pub fn setup_failed() {
        SETUP_FAILED_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    #[derive(Debug, Clone, Copy)]
    pub struct Snapshot {
        pub databases_created_total: usize,
        pub sql_files_applied_total: usize,
        pub setup_failed_total: usize,
    }

    pub fn snapshot() -> Snapshot {
        Snapshot {
            databases_created_total: DATABASES_CREATED_TOTAL.load(Ordering::Relaxed),
            sql_files_applied_total: SQL_FILES_APPLIED_TOTAL.load(Ordering::Relaxed),
            setup_failed_total: SETUP_FAILED_TOTAL.load(Ordering::Relaxed),
        }
    }

    pub fn log_snapshot(context: &str) {
        let s = snapshot();
        tracing::info!(
            context = context,
            databases_created_total = s.databases_created_total,
            sql_files_applied_total = s.sql_files_applied_total,
            setup_failed_total = s.setup_failed_total,
            "db_setup_counters_snapshot"
        );
    }
}
