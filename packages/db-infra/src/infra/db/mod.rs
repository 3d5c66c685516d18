pub mod bootstrap;
pub mod core;
pub mod diagnostics;

pub use self::bootstrap::{
    apply_schema_and_seed, ensure_database_exists, DatabaseStatus, SetupPaths,
};
pub use self::core::{
    build_pool, close_pool, orchestrate_migration, orchestrate_migration_internal,
    orchestrate_setup, sanitize_db_url,
};
pub use self::diagnostics::{migration_counters, setup_counters};
