use std::env;
use std::path::PathBuf;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::DbInfraError;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_USER: &str = "postgres";
pub const DEFAULT_PASSWORD: &str = "postgres";
pub const DEFAULT_DATABASE: &str = "edtech";
pub const DEFAULT_ADMIN_DATABASE: &str = "postgres";
pub const DEFAULT_SQLITE_DIR: &str = "data";

const HOST_KEYS: [&str; 2] = ["POSTGRES_HOST", "REACT_APP_DB_HOST"];
const PORT_KEYS: [&str; 2] = ["POSTGRES_PORT", "REACT_APP_DB_PORT"];
const USER_KEYS: [&str; 2] = ["POSTGRES_USER", "REACT_APP_DB_USER"];
const PASSWORD_KEYS: [&str; 2] = ["POSTGRES_PASSWORD", "REACT_APP_DB_PASSWORD"];
const DATABASE_KEYS: [&str; 2] = ["POSTGRES_DB", "REACT_APP_DB_NAME"];

/// Characters escaped in the userinfo part of a connection URL.
const USERINFO: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Database engine the tools talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    /// PostgreSQL server (production)
    Postgres,
    /// Local SQLite file at `<sqlite_dir>/<database>.db`
    SqliteFile,
}

/// Which database on the server a pool is opened against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbTarget {
    /// The server's administrative database, used to create the target
    Admin,
    /// The application database named by the profile
    Target,
}

impl From<DbKind> for sea_orm::DatabaseBackend {
    fn from(kind: DbKind) -> Self {
        match kind {
            DbKind::Postgres => sea_orm::DatabaseBackend::Postgres,
            DbKind::SqliteFile => sea_orm::DatabaseBackend::Sqlite,
        }
    }
}

/// Connection settings resolved once at startup and passed to every component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub kind: DbKind,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub admin_database: String,
    pub sqlite_dir: PathBuf,
}

impl ConnectionProfile {
    /// Read the profile from the process environment.
    pub fn from_env(kind: DbKind) -> Result<Self, DbInfraError> {
        Self::from_lookup(kind, |key| env::var(key).ok())
    }

    /// Build a profile from any key lookup. Unset and empty values fall back
    /// to the defaults.
    ///
    /// Each setting is read from its `POSTGRES_*` name first, then from the
    /// `REACT_APP_DB_*` name used by the application's existing `.env` files.
    pub fn from_lookup<F>(kind: DbKind, lookup: F) -> Result<Self, DbInfraError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first_set = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| lookup(*key).filter(|v| !v.is_empty()))
        };
        let var = |keys: &[&str], default: &str| {
            first_set(keys).unwrap_or_else(|| default.to_string())
        };

        let port = match first_set(&PORT_KEYS) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                DbInfraError::config(format!(
                    "POSTGRES_PORT/REACT_APP_DB_PORT must be a valid port number, got: '{raw}'"
                ))
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            kind,
            host: var(&HOST_KEYS, DEFAULT_HOST),
            port,
            user: var(&USER_KEYS, DEFAULT_USER),
            password: var(&PASSWORD_KEYS, DEFAULT_PASSWORD),
            database: var(&DATABASE_KEYS, DEFAULT_DATABASE),
            admin_database: var(&["POSTGRES_ADMIN_DB"], DEFAULT_ADMIN_DATABASE),
            sqlite_dir: PathBuf::from(var(&["SQLITE_DB_DIR"], DEFAULT_SQLITE_DIR)),
        })
    }

    pub fn database_name(&self, target: DbTarget) -> &str {
        match target {
            DbTarget::Admin => &self.admin_database,
            DbTarget::Target => &self.database,
        }
    }

    /// SQLite file backing the target database.
    pub fn sqlite_path(&self) -> PathBuf {
        self.sqlite_dir.join(format!("{}.db", self.database))
    }

    /// Connection URL for `target`. Contains the password; log it only
    /// through `sanitize_db_url`.
    pub fn url(&self, target: DbTarget) -> String {
        match self.kind {
            DbKind::Postgres => {
                let user = utf8_percent_encode(&self.user, USERINFO);
                let password = utf8_percent_encode(&self.password, USERINFO);
                let db_name = self.database_name(target);
                format!(
                    "postgresql://{user}:{password}@{}:{}/{db_name}",
                    self.host, self.port
                )
            }
            // A SQLite file has no separate administrative database.
            DbKind::SqliteFile => format!("sqlite://{}?mode=rwc", self.sqlite_path().display()),
        }
    }
}
