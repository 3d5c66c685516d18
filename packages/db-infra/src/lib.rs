//! Shared database configuration, provisioning and migration orchestration.
//! Used by the `db-setup` and `migrate` binaries.

pub mod config;
pub mod error;
pub mod infra;

pub use config::db;
pub use error::DbInfraError;
pub use infra::db::core::{
    build_pool, close_pool, orchestrate_migration, orchestrate_migration_internal,
    orchestrate_setup, sanitize_db_url,
};
