//! # lavadero-storage: Persistence Back Ends for Lavadero POS
//!
//! Two interchangeable implementations of one [`Storage`] contract:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        trait Storage                                 │
//! │        (users, configs, catalog, customers, vehicles,               │
//! │         work orders, inventory, sales)                              │
//! │                    ┌──────────┴──────────┐                          │
//! │                    │                     │                          │
//! │          ┌─────────▼────────┐  ┌─────────▼────────┐                 │
//! │          │   FileStorage    │  │  SqliteStorage   │                 │
//! │          │  one JSON file   │  │  sqlx + SQLite,  │                 │
//! │          │  per collection, │  │  WAL, embedded   │                 │
//! │          │  atomic renames  │  │  migrations      │                 │
//! │          └──────────────────┘  └──────────────────┘                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Shared guarantees, regardless of engine:
//!
//! - ids are UUID v4 strings and timestamps are storage-assigned
//! - money is exact decimal text, never a binary float
//! - missing rows surface as `Ok(None)` / `Ok(false)`, never as errors
//! - DNIT secrets are AES-GCM encrypted at rest, passwords argon2-hashed
//! - work-order numbers are a gap-free monotone sequence per store
//!
//! The [`bootstrap`] module seeds the default admin account on first run.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod file;
pub mod sqlite;
pub mod storage;

mod numbering;

pub use bootstrap::{
    ensure_default_admin, BootstrapOptions, DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME,
};
pub use error::{StorageError, StorageResult};
pub use file::FileStorage;
pub use sqlite::{SqliteConfig, SqliteStorage};
pub use storage::Storage;
