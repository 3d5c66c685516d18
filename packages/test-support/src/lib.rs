//! Test support utilities shared by the database tooling crates.
//!
//! Unique names keep test databases and ledgers from colliding between runs;
//! `logging::init` installs a test-friendly subscriber once per process.

use ulid::Ulid;

pub mod logging;

/// Generate a unique string with the given prefix
///
/// # Examples
/// ```
/// use test_support::unique_str;
///
/// let id1 = unique_str("ledger");
/// let id2 = unique_str("ledger");
/// assert_ne!(id1, id2);
/// assert!(id1.starts_with("ledger-"));
/// ```
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new())
}

/// Generate a unique database name that satisfies the `_test` suffix rule.
///
/// Lowercase and underscore-separated, so it needs no quoting as a Postgres
/// identifier and stays well under the 63 byte identifier limit for short
/// prefixes.
///
/// # Examples
/// ```
/// use test_support::unique_db_name;
///
/// let name = unique_db_name("setup");
/// assert!(name.starts_with("setup_"));
/// assert!(name.ends_with("_test"));
/// ```
pub fn unique_db_name(prefix: &str) -> String {
    format!("{}_{}_test", prefix, Ulid::new().to_string().to_lowercase())
}
