use std::path::PathBuf;

/// File name of the census database inside the data directory.
pub const DEFAULT_DB_FILE: &str = "census.sqlite";

/// Storage configuration for a data-entry session.
///
/// The CLI fills this from its flags and environment, then hands the
/// resolved path to the SQLite layer.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Directory that holds the census database.
    pub data_dir: Option<PathBuf>,

    /// Explicit path to the SQLite database file.
    /// Defaults to `{data_dir}/census.sqlite` if not specified.
    pub sqlite_path: Option<PathBuf>,
}

impl ServiceConfig {
    /// Resolve the SQLite database path, falling back to `{data_dir}/census.sqlite`,
    /// or `census.sqlite` in the working directory when no data dir is set.
    pub fn resolve_sqlite_path(&self) -> PathBuf {
        self.sqlite_path.clone().unwrap_or_else(|| {
            self.data_dir
                .as_ref()
                .map(|d| d.join(DEFAULT_DB_FILE))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE))
        })
    }
}
