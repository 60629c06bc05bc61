//! Company fiscal configuration and the DNIT electronic-invoicing endpoint
//! configuration, including the encrypted-secret handling rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Company Config
// =============================================================================

/// Fiscal identity of the business: RUC, razón social, and the timbrado
/// authorization window used on invoices.
///
/// Logically a singleton: callers only ever consume the first row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CompanyConfig {
    pub id: String,
    pub ruc: String,
    pub razon_social: String,
    /// Timbrado authorization number.
    pub timbrado: String,
    /// Start of the timbrado validity window (opaque date text).
    pub timbrado_desde: String,
    /// End of the timbrado validity window (opaque date text).
    pub timbrado_hasta: String,
    /// Establishment code, first segment of invoice numbers (e.g. "001").
    pub establecimiento: String,
    /// Expedition point, second segment of invoice numbers (e.g. "001").
    pub punto_expedicion: String,
    pub direccion: Option<String>,
    pub moneda: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/replace payload for the company configuration singleton.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCompanyConfig {
    pub ruc: String,
    pub razon_social: String,
    pub timbrado: String,
    pub timbrado_desde: String,
    pub timbrado_hasta: String,
    pub establecimiento: String,
    pub punto_expedicion: String,
    #[serde(default)]
    pub direccion: Option<String>,
    pub moneda: String,
}

// =============================================================================
// DNIT Config
// =============================================================================

/// Whether the DNIT endpoint is called in testing or production mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    Testing,
    Production,
}

impl Default for OperationMode {
    fn default() -> Self {
        OperationMode::Testing
    }
}

/// DNIT electronic-invoicing connection settings.
///
/// `auth_token` and `certificate_password` are encrypted at rest; the
/// storage layer decrypts them on read, so an in-memory value here is
/// always plaintext. `certificate_data` is the certificate blob itself
/// and is not treated as a secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct DnitConfig {
    pub id: String,
    pub endpoint_url: String,
    pub auth_token: Option<String>,
    pub certificate_data: Option<String>,
    pub certificate_password: Option<String>,
    pub operation_mode: OperationMode,
    pub is_active: bool,
    /// When the endpoint was last probed.
    pub last_connection_test: Option<DateTime<Utc>>,
    /// Outcome text of the last probe.
    pub last_connection_result: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DnitConfig {
    /// Projection safe to hand outside the storage layer: secrets are
    /// reported only as presence flags.
    pub fn to_safe(&self) -> SafeDnitConfig {
        SafeDnitConfig {
            id: self.id.clone(),
            endpoint_url: self.endpoint_url.clone(),
            has_auth_token: self.auth_token.is_some(),
            has_certificate_password: self.certificate_password.is_some(),
            operation_mode: self.operation_mode,
            is_active: self.is_active,
            last_connection_test: self.last_connection_test,
            last_connection_result: self.last_connection_result.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Externally-visible DNIT configuration shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeDnitConfig {
    pub id: String,
    pub endpoint_url: String,
    pub has_auth_token: bool,
    pub has_certificate_password: bool,
    pub operation_mode: OperationMode,
    pub is_active: bool,
    pub last_connection_test: Option<DateTime<Utc>>,
    pub last_connection_result: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/replace payload. Secrets arrive plaintext and are encrypted by
/// the storage layer before the record is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDnitConfig {
    pub endpoint_url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub certificate_data: Option<String>,
    #[serde(default)]
    pub certificate_password: Option<String>,
    #[serde(default)]
    pub operation_mode: OperationMode,
    #[serde(default)]
    pub is_active: bool,
}

/// Partial update. Secret fields, when set, arrive plaintext and are
/// re-encrypted by the storage layer before `apply` runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnitConfigUpdate {
    pub endpoint_url: Option<String>,
    pub auth_token: Option<String>,
    pub certificate_data: Option<String>,
    pub certificate_password: Option<String>,
    pub operation_mode: Option<OperationMode>,
    pub is_active: Option<bool>,
    pub last_connection_test: Option<DateTime<Utc>>,
    pub last_connection_result: Option<String>,
}

impl DnitConfigUpdate {
    /// Copies the set fields onto `config` and refreshes `updated_at`.
    pub fn apply(self, config: &mut DnitConfig) {
        if let Some(endpoint_url) = self.endpoint_url {
            config.endpoint_url = endpoint_url;
        }
        if let Some(auth_token) = self.auth_token {
            config.auth_token = Some(auth_token);
        }
        if let Some(certificate_data) = self.certificate_data {
            config.certificate_data = Some(certificate_data);
        }
        if let Some(certificate_password) = self.certificate_password {
            config.certificate_password = Some(certificate_password);
        }
        if let Some(operation_mode) = self.operation_mode {
            config.operation_mode = operation_mode;
        }
        if let Some(is_active) = self.is_active {
            config.is_active = is_active;
        }
        if let Some(test) = self.last_connection_test {
            config.last_connection_test = Some(test);
        }
        if let Some(result) = self.last_connection_result {
            config.last_connection_result = Some(result);
        }
        config.updated_at = Utc::now();
    }
}
