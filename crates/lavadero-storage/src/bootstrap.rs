//! First-run bootstrap: guarantees an administrator account exists.
//!
//! Runs once at process start, after the back end is initialized. Creating
//! the account is unconditional; resetting a drifted admin password back to
//! the default is destructive and only happens when explicitly requested
//! through [`BootstrapOptions::reset_admin_password`] (a deliberately changed
//! admin password must survive a restart).

use tracing::{info, warn};

use lavadero_core::crypto::verify_password;
use lavadero_core::types::{NewUser, SubscriptionType, UserRole, UserUpdate};

use crate::error::StorageResult;
use crate::storage::Storage;

/// Username of the bootstrap administrator.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Initial password of the bootstrap administrator. Meant to be changed on
/// first login.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Invoice allowance granted to the bootstrap administrator.
const DEFAULT_ADMIN_INVOICE_LIMIT: i64 = 999_999;

/// Bootstrap behavior switches.
#[derive(Debug, Clone, Default)]
pub struct BootstrapOptions {
    /// When set, an existing admin whose password no longer matches the
    /// default is reset back to it. Off by default.
    pub reset_admin_password: bool,
}

/// Ensures the default administrator account exists.
///
/// Idempotent: a second run against the same store is a no-op unless
/// `reset_admin_password` is set and the stored password has drifted.
pub async fn ensure_default_admin(
    storage: &dyn Storage,
    options: &BootstrapOptions,
) -> StorageResult<()> {
    match storage.get_user_by_username(DEFAULT_ADMIN_USERNAME).await? {
        None => {
            let admin = storage
                .create_user(NewUser {
                    username: DEFAULT_ADMIN_USERNAME.to_string(),
                    password: DEFAULT_ADMIN_PASSWORD.to_string(),
                    role: UserRole::Admin,
                    subscription_type: SubscriptionType::Enterprise,
                    monthly_invoice_limit: DEFAULT_ADMIN_INVOICE_LIMIT,
                    created_by: None,
                })
                .await?;
            info!(id = %admin.id, username = DEFAULT_ADMIN_USERNAME, "Created default admin user");
        }
        Some(admin) => {
            if options.reset_admin_password
                && !verify_password(DEFAULT_ADMIN_PASSWORD, &admin.password)
            {
                warn!(
                    id = %admin.id,
                    username = DEFAULT_ADMIN_USERNAME,
                    "Resetting admin password to the default as requested"
                );
                storage
                    .update_user(
                        &admin.id,
                        UserUpdate {
                            password: Some(DEFAULT_ADMIN_PASSWORD.to_string()),
                            ..Default::default()
                        },
                    )
                    .await?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileStorage;
    use tempfile::TempDir;

    async fn storage() -> (TempDir, FileStorage) {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path(), "bootstrap-test-key");
        storage.init().await.unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn test_creates_admin_once() {
        let (_dir, storage) = storage().await;
        let options = BootstrapOptions::default();

        ensure_default_admin(&storage, &options).await.unwrap();
        ensure_default_admin(&storage, &options).await.unwrap();

        let users = storage.list_users().await.unwrap();
        assert_eq!(users.len(), 1);

        let admin = &users[0];
        assert_eq!(admin.username, DEFAULT_ADMIN_USERNAME);
        assert_eq!(admin.role, UserRole::Admin);
        assert_eq!(admin.subscription_type, SubscriptionType::Enterprise);
        assert!(verify_password(DEFAULT_ADMIN_PASSWORD, &admin.password));
    }

    #[tokio::test]
    async fn test_changed_password_survives_restart() {
        let (_dir, storage) = storage().await;
        let options = BootstrapOptions::default();
        ensure_default_admin(&storage, &options).await.unwrap();

        let admin = storage
            .get_user_by_username(DEFAULT_ADMIN_USERNAME)
            .await
            .unwrap()
            .unwrap();
        storage
            .update_user(
                &admin.id,
                UserUpdate {
                    password: Some("contraseña-nueva".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // Same as a restart without the reset flag: the password stays.
        ensure_default_admin(&storage, &options).await.unwrap();

        let admin = storage.get_user(&admin.id).await.unwrap().unwrap();
        assert!(verify_password("contraseña-nueva", &admin.password));
        assert!(!verify_password(DEFAULT_ADMIN_PASSWORD, &admin.password));
    }

    #[tokio::test]
    async fn test_reset_flag_restores_default_password() {
        let (_dir, storage) = storage().await;
        ensure_default_admin(&storage, &BootstrapOptions::default())
            .await
            .unwrap();

        let admin = storage
            .get_user_by_username(DEFAULT_ADMIN_USERNAME)
            .await
            .unwrap()
            .unwrap();
        storage
            .update_user(
                &admin.id,
                UserUpdate {
                    password: Some("olvidada".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        ensure_default_admin(
            &storage,
            &BootstrapOptions {
                reset_admin_password: true,
            },
        )
        .await
        .unwrap();

        let admin = storage.get_user(&admin.id).await.unwrap().unwrap();
        assert!(verify_password(DEFAULT_ADMIN_PASSWORD, &admin.password));
    }
}
