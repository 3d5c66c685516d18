//! Discovery of migration files on disk.
//!
//! Apply order is the ascending byte-wise order of file names, nothing else.
//! Authors control ordering with zero-padded prefixes (`001_`, `002_`, ...).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::MigrationError;

/// Only directory entries ending with this suffix are migrations.
pub const MIGRATION_SUFFIX: &str = ".sql";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub name: String,
    pub path: PathBuf,
}

impl MigrationFile {
    /// Read the whole file as UTF-8 SQL text.
    pub fn read_sql(&self) -> Result<String, MigrationError> {
        fs::read_to_string(&self.path).map_err(|source| MigrationError::ReadFile {
            name: self.name.clone(),
            source,
        })
    }
}

/// List the `.sql` files directly inside `dir`, sorted ascending by name.
///
/// The directory is read fresh on every call. Entries whose names are not
/// valid UTF-8 are ignored, as are subdirectories.
pub fn list_migration_files(dir: &Path) -> Result<Vec<MigrationFile>, MigrationError> {
    let list_err = |source: io::Error| MigrationError::ListDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        let path = entry.path();

        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if !name.ends_with(MIGRATION_SUFFIX) || !path.is_file() {
            continue;
        }

        files.push(MigrationFile { name, path });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}
