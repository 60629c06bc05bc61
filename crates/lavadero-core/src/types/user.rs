//! User accounts: roles, subscription limits, and the safe projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enumerations
// =============================================================================

/// Access role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
    Readonly,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::User
    }
}

/// Subscription tier controlling the monthly invoice allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionType {
    Free,
    Basic,
    Premium,
    Enterprise,
}

impl Default for SubscriptionType {
    fn default() -> Self {
        SubscriptionType::Free
    }
}

// =============================================================================
// User
// =============================================================================

/// A user account.
///
/// `password` holds the argon2 PHC hash - the plaintext is hashed inside
/// `create_user`/`update_user` and never persisted or logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    /// Unique login name (case-insensitively unique in the SQL back end).
    pub username: String,
    /// Argon2 PHC hash string, never plaintext.
    pub password: String,
    pub role: UserRole,
    pub subscription_type: SubscriptionType,
    /// Invoices allowed per month under the subscription.
    pub monthly_invoice_limit: i64,
    /// Invoices issued in the current usage window.
    pub current_month_invoices: i64,
    /// When the usage window resets.
    pub usage_reset_date: DateTime<Utc>,
    pub is_active: bool,
    pub is_blocked: bool,
    pub failed_login_attempts: i64,
    /// The user who created this account, if any.
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Projection safe to hand outside the storage layer: no hash, ever.
    pub fn to_safe(&self) -> SafeUser {
        SafeUser {
            id: self.id.clone(),
            username: self.username.clone(),
            role: self.role,
            subscription_type: self.subscription_type,
            monthly_invoice_limit: self.monthly_invoice_limit,
            current_month_invoices: self.current_month_invoices,
            usage_reset_date: self.usage_reset_date,
            is_active: self.is_active,
            is_blocked: self.is_blocked,
            failed_login_attempts: self.failed_login_attempts,
            created_by: self.created_by.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Externally-visible user shape. Omits the password hash entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeUser {
    pub id: String,
    pub username: String,
    pub role: UserRole,
    pub subscription_type: SubscriptionType,
    pub monthly_invoice_limit: i64,
    pub current_month_invoices: i64,
    pub usage_reset_date: DateTime<Utc>,
    pub is_active: bool,
    pub is_blocked: bool,
    pub failed_login_attempts: i64,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Payloads
// =============================================================================

/// Create payload. `password` is plaintext here; the storage layer hashes
/// it before the record is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub subscription_type: SubscriptionType,
    pub monthly_invoice_limit: i64,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Partial update. `password`, when set, is plaintext and gets re-hashed
/// by the storage layer before `apply` runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
    pub subscription_type: Option<SubscriptionType>,
    pub monthly_invoice_limit: Option<i64>,
    pub current_month_invoices: Option<i64>,
    pub usage_reset_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub is_blocked: Option<bool>,
    pub failed_login_attempts: Option<i64>,
}

impl UserUpdate {
    /// Copies the set fields onto `user` and refreshes `updated_at`.
    pub fn apply(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(password) = self.password {
            user.password = password;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(subscription_type) = self.subscription_type {
            user.subscription_type = subscription_type;
        }
        if let Some(limit) = self.monthly_invoice_limit {
            user.monthly_invoice_limit = limit;
        }
        if let Some(count) = self.current_month_invoices {
            user.current_month_invoices = count;
        }
        if let Some(reset) = self.usage_reset_date {
            user.usage_reset_date = reset;
        }
        if let Some(active) = self.is_active {
            user.is_active = active;
        }
        if let Some(blocked) = self.is_blocked {
            user.is_blocked = blocked;
        }
        if let Some(attempts) = self.failed_login_attempts {
            user.failed_login_attempts = attempts;
        }
        user.updated_at = Utc::now();
    }
}
