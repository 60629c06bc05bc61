//! Process configuration read from the environment.
//!
//! Back-end selection and paths come from three variables; all of them have
//! development defaults so a bare process starts up without any setup.

use std::path::PathBuf;

use tracing::warn;

/// Data directory of the file back end.
pub const ENV_DATA_DIR: &str = "LAVADERO_DATA_DIR";

/// SQLite database file of the SQL back end.
pub const ENV_DB_PATH: &str = "LAVADERO_DB_PATH";

/// Key string for the secrets-at-rest cipher.
pub const ENV_ENCRYPTION_KEY: &str = "LAVADERO_ENCRYPTION_KEY";

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_DB_PATH: &str = "lavadero.db";
const DEFAULT_ENCRYPTION_KEY: &str = "lavadero-dev-encryption-key";

/// Data directory for [`crate::FileStorage::from_env`].
pub fn data_dir() -> PathBuf {
    std::env::var(ENV_DATA_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Database path for [`crate::SqliteStorage::from_env`].
pub fn db_path() -> PathBuf {
    std::env::var(ENV_DB_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH))
}

/// Encryption key string. Falls back to a development key with a warning;
/// production deployments must set `LAVADERO_ENCRYPTION_KEY`.
pub fn encryption_key() -> String {
    std::env::var(ENV_ENCRYPTION_KEY).unwrap_or_else(|_| {
        warn!(
            var = ENV_ENCRYPTION_KEY,
            "encryption key not configured, using the development default"
        );
        DEFAULT_ENCRYPTION_KEY.to_string()
    })
}
