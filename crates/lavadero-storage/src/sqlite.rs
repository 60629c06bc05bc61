//! # SQLite Back End
//!
//! Tables mirror the entities one-to-one: TEXT timestamps and decimals,
//! INTEGER booleans, TEXT enums with CHECK constraints. Schema lives in
//! embedded migrations applied at connection time.
//!
//! ## Connection Setup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  SqliteConfig::new(path)                                             │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SqliteStorage::new(config, key).await                               │
//! │       ├── pool: WAL, synchronous NORMAL, foreign_keys ON,            │
//! │       │         create-if-missing                                    │
//! │       ├── run embedded migrations                                    │
//! │       └── probe INSERT ... RETURNING support once; creates fall      │
//! │           back to insert-then-echo when the engine lacks it          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Multi-step writes
//! Combo + bridge rows, sale + line items, and work-order insert + counter
//! bump each run inside one transaction - partial writes are impossible.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use lavadero_core::crypto::{hash_password, SecretCipher};
use lavadero_core::types::{
    Category, CategoryUpdate, CompanyConfig, Customer, CustomerUpdate, DnitConfig,
    DnitConfigUpdate, InventoryItem, InventoryItemUpdate, NewCategory, NewCompanyConfig,
    NewCustomer, NewDnitConfig, NewInventoryItem, NewSale, NewSaleItem, NewService,
    NewServiceCombo, NewUser, NewVehicle, NewWorkOrder, NewWorkOrderItem, Sale, SaleItem, Service,
    ServiceCombo, ServiceComboItem, ServiceComboUpdate, ServiceUpdate, StockAlert, User,
    UserUpdate, Vehicle, VehicleUpdate, WorkOrder, WorkOrderItem, WorkOrderStatus,
    WorkOrderUpdate,
};

use crate::config;
use crate::error::{StorageError, StorageResult};
use crate::numbering;
use crate::storage::Storage;

/// Embedded migrations from the workspace `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

// =============================================================================
// Configuration
// =============================================================================

/// SQLite back-end configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = SqliteConfig::new("/var/lib/lavadero/lavadero.db")
///     .max_connections(5);
/// ```
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Path to the database file. Created if it doesn't exist.
    pub database_path: PathBuf,

    /// Maximum pool size. Default: 5.
    pub max_connections: u32,

    /// Minimum connections kept alive. Default: 1.
    pub min_connections: u32,

    /// Acquire timeout. Default: 30 seconds.
    pub connect_timeout: Duration,

    /// Whether to apply migrations on connect. Default: true.
    pub run_migrations: bool,
}

impl SqliteConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SqliteConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// In-memory database for tests. A single connection, since every
    /// `:memory:` connection is its own database.
    pub fn in_memory() -> Self {
        SqliteConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Insert Plumbing
// =============================================================================
// One insert function per table. The row is fully constructed in Rust before
// anything is written, so the RETURNING branch and the echo branch produce
// the same shape.

macro_rules! insert_fn {
    ($fn_name:ident, $ty:ty, $sql:literal, [$($field:ident),+ $(,)?]) => {
        async fn $fn_name<'e, E>(&self, executor: E, row: &$ty) -> StorageResult<$ty>
        where
            E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
        {
            if self.supports_returning {
                let created = sqlx::query_as::<_, $ty>(concat!($sql, " RETURNING *"))
                    $(.bind(&row.$field))+
                    .fetch_one(executor)
                    .await?;
                Ok(created)
            } else {
                sqlx::query($sql)
                    $(.bind(&row.$field))+
                    .execute(executor)
                    .await?;
                Ok(row.clone())
            }
        }
    };
}

// =============================================================================
// SqliteStorage
// =============================================================================

/// The SQLite storage back end.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
    cipher: SecretCipher,
    supports_returning: bool,
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage")
            .field("supports_returning", &self.supports_returning)
            .finish_non_exhaustive()
    }
}

impl SqliteStorage {
    /// Opens (creating if needed) the database, applies migrations, and
    /// probes for `RETURNING` support.
    pub async fn new(config: SqliteConfig, encryption_key: &str) -> StorageResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing SQLite storage"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?
            // WAL: readers don't block the writer and vice versa
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_with(connect_options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        if config.run_migrations {
            MIGRATOR.run(&pool).await?;
            debug!("Migrations applied");
        }

        let supports_returning = probe_returning(&pool).await?;
        info!(supports_returning, "SQLite storage ready");

        Ok(SqliteStorage {
            pool,
            cipher: SecretCipher::new(encryption_key),
            supports_returning,
        })
    }

    /// Opens the database from `LAVADERO_DB_PATH` / `LAVADERO_ENCRYPTION_KEY`.
    pub async fn from_env() -> StorageResult<Self> {
        Self::new(SqliteConfig::new(config::db_path()), &config::encryption_key()).await
    }

    /// Closes the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // -------------------------------------------------------------------------
    // Per-table inserts
    // -------------------------------------------------------------------------

    insert_fn!(
        insert_user_row,
        User,
        "INSERT INTO users (id, username, password, role, subscription_type, \
         monthly_invoice_limit, current_month_invoices, usage_reset_date, is_active, \
         is_blocked, failed_login_attempts, created_by, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        [
            id,
            username,
            password,
            role,
            subscription_type,
            monthly_invoice_limit,
            current_month_invoices,
            usage_reset_date,
            is_active,
            is_blocked,
            failed_login_attempts,
            created_by,
            created_at,
            updated_at,
        ]
    );

    insert_fn!(
        insert_company_config_row,
        CompanyConfig,
        "INSERT INTO company_config (id, ruc, razon_social, timbrado, timbrado_desde, \
         timbrado_hasta, establecimiento, punto_expedicion, direccion, moneda, \
         created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        [
            id,
            ruc,
            razon_social,
            timbrado,
            timbrado_desde,
            timbrado_hasta,
            establecimiento,
            punto_expedicion,
            direccion,
            moneda,
            created_at,
            updated_at,
        ]
    );

    insert_fn!(
        insert_dnit_config_row,
        DnitConfig,
        "INSERT INTO dnit_config (id, endpoint_url, auth_token, certificate_data, \
         certificate_password, operation_mode, is_active, last_connection_test, \
         last_connection_result, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        [
            id,
            endpoint_url,
            auth_token,
            certificate_data,
            certificate_password,
            operation_mode,
            is_active,
            last_connection_test,
            last_connection_result,
            created_at,
            updated_at,
        ]
    );

    insert_fn!(
        insert_category_row,
        Category,
        "INSERT INTO categories (id, nombre, tipo, color, activa, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        [id, nombre, tipo, color, activa, created_at, updated_at]
    );

    insert_fn!(
        insert_customer_row,
        Customer,
        "INSERT INTO customers (id, nombre, doc_tipo, doc_numero, regimen_turismo, pais, \
         pasaporte, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        [
            id,
            nombre,
            doc_tipo,
            doc_numero,
            regimen_turismo,
            pais,
            pasaporte,
            created_at,
            updated_at,
        ]
    );

    insert_fn!(
        insert_vehicle_row,
        Vehicle,
        "INSERT INTO vehicles (id, customer_id, placa, marca, modelo, color, created_at, \
         updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        [id, customer_id, placa, marca, modelo, color, created_at, updated_at]
    );

    insert_fn!(
        insert_service_row,
        Service,
        "INSERT INTO services (id, nombre, precio, duracion_min, categoria, activo, \
         created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        [id, nombre, precio, duracion_min, categoria, activo, created_at, updated_at]
    );

    insert_fn!(
        insert_combo_row,
        ServiceCombo,
        "INSERT INTO service_combos (id, nombre, precio_total, activo, created_at, \
         updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        [id, nombre, precio_total, activo, created_at, updated_at]
    );

    insert_fn!(
        insert_combo_item_row,
        ServiceComboItem,
        "INSERT INTO service_combo_items (id, combo_id, service_id, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?)",
        [id, combo_id, service_id, created_at, updated_at]
    );

    insert_fn!(
        insert_work_order_row,
        WorkOrder,
        "INSERT INTO work_orders (id, numero, customer_id, vehicle_id, estado, \
         fecha_entrada, fecha_inicio, fecha_fin, fecha_entrega, total, created_at, \
         updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        [
            id,
            numero,
            customer_id,
            vehicle_id,
            estado,
            fecha_entrada,
            fecha_inicio,
            fecha_fin,
            fecha_entrega,
            total,
            created_at,
            updated_at,
        ]
    );

    insert_fn!(
        insert_work_order_item_row,
        WorkOrderItem,
        "INSERT INTO work_order_items (id, work_order_id, service_id, combo_id, nombre, \
         precio, cantidad, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        [
            id,
            work_order_id,
            service_id,
            combo_id,
            nombre,
            precio,
            cantidad,
            created_at,
            updated_at,
        ]
    );

    insert_fn!(
        insert_inventory_row,
        InventoryItem,
        "INSERT INTO inventory_items (id, nombre, precio, stock_actual, stock_minimo, \
         estado_alerta, activo, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        [
            id,
            nombre,
            precio,
            stock_actual,
            stock_minimo,
            estado_alerta,
            activo,
            created_at,
            updated_at,
        ]
    );

    insert_fn!(
        insert_sale_row,
        Sale,
        "INSERT INTO sales (id, numero_factura, customer_id, work_order_id, subtotal, \
         impuestos, total, medio_pago, timbrado_usado, created_by, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        [
            id,
            numero_factura,
            customer_id,
            work_order_id,
            subtotal,
            impuestos,
            total,
            medio_pago,
            timbrado_usado,
            created_by,
            created_at,
            updated_at,
        ]
    );

    insert_fn!(
        insert_sale_item_row,
        SaleItem,
        "INSERT INTO sale_items (id, sale_id, service_id, combo_id, inventory_item_id, \
         nombre, cantidad, precio_unitario, subtotal, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        [
            id,
            sale_id,
            service_id,
            combo_id,
            inventory_item_id,
            nombre,
            cantidad,
            precio_unitario,
            subtotal,
            created_at,
            updated_at,
        ]
    );

    // -------------------------------------------------------------------------
    // Shared helpers
    // -------------------------------------------------------------------------

    /// Decrypts the stored secret fields back to plaintext for the caller.
    fn decrypt_dnit(&self, mut cfg: DnitConfig) -> StorageResult<DnitConfig> {
        if let Some(token) = cfg.auth_token {
            cfg.auth_token = Some(self.cipher.decrypt(&token)?);
        }
        if let Some(password) = cfg.certificate_password {
            cfg.certificate_password = Some(self.cipher.decrypt(&password)?);
        }
        Ok(cfg)
    }

    /// Next invoice number over the given connection (pool conn or open tx).
    async fn mint_invoice_number(&self, conn: &mut SqliteConnection) -> StorageResult<String> {
        let cfg: Option<CompanyConfig> =
            sqlx::query_as("SELECT * FROM company_config LIMIT 1")
                .fetch_optional(&mut *conn)
                .await?;

        let numbers: Vec<String> = sqlx::query_scalar("SELECT numero_factura FROM sales")
            .fetch_all(&mut *conn)
            .await?;

        let (establecimiento, punto) = cfg
            .as_ref()
            .map(|c| (c.establecimiento.as_str(), c.punto_expedicion.as_str()))
            .unwrap_or((numbering::DEFAULT_SEGMENT, numbering::DEFAULT_SEGMENT));
        let seq = numbering::max_invoice_seq(numbers.iter().map(String::as_str)) + 1;

        Ok(numbering::format_invoice_number(establecimiento, punto, seq))
    }
}

/// Detects whether this SQLite build supports `INSERT ... RETURNING`
/// (available since 3.35). Runs once at startup on a dedicated connection
/// because temp tables are per-connection.
async fn probe_returning(pool: &SqlitePool) -> StorageResult<bool> {
    let mut conn = pool.acquire().await?;

    sqlx::query("CREATE TEMP TABLE _returning_probe (id INTEGER)")
        .execute(&mut *conn)
        .await?;

    let supported = sqlx::query("INSERT INTO _returning_probe (id) VALUES (1) RETURNING id")
        .fetch_one(&mut *conn)
        .await
        .is_ok();

    sqlx::query("DROP TABLE _returning_probe")
        .execute(&mut *conn)
        .await?;

    Ok(supported)
}

// =============================================================================
// Storage Implementation
// =============================================================================

#[async_trait]
impl Storage for SqliteStorage {
    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    async fn get_user(&self, id: &str) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        // username is UNIQUE COLLATE NOCASE; the comparison inherits it.
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(&self) -> StorageResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn create_user(&self, input: NewUser) -> StorageResult<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: input.username,
            password: hash_password(&input.password)?,
            role: input.role,
            subscription_type: input.subscription_type,
            monthly_invoice_limit: input.monthly_invoice_limit,
            current_month_invoices: 0,
            usage_reset_date: now,
            is_active: true,
            is_blocked: false,
            failed_login_attempts: 0,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %user.id, username = %user.username, "Creating user");
        self.insert_user_row(&self.pool, &user).await
    }

    async fn update_user(&self, id: &str, mut update: UserUpdate) -> StorageResult<Option<User>> {
        if let Some(password) = update.password.take() {
            update.password = Some(hash_password(&password)?);
        }

        let Some(mut user) = self.get_user(id).await? else {
            return Ok(None);
        };
        update.apply(&mut user);

        sqlx::query(
            "UPDATE users SET username = ?, password = ?, role = ?, subscription_type = ?, \
             monthly_invoice_limit = ?, current_month_invoices = ?, usage_reset_date = ?, \
             is_active = ?, is_blocked = ?, failed_login_attempts = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&user.username)
        .bind(&user.password)
        .bind(user.role)
        .bind(user.subscription_type)
        .bind(user.monthly_invoice_limit)
        .bind(user.current_month_invoices)
        .bind(user.usage_reset_date)
        .bind(user.is_active)
        .bind(user.is_blocked)
        .bind(user.failed_login_attempts)
        .bind(user.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Some(user))
    }

    async fn delete_user(&self, id: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Company configuration
    // -------------------------------------------------------------------------

    async fn get_company_config(&self) -> StorageResult<Option<CompanyConfig>> {
        let cfg = sqlx::query_as::<_, CompanyConfig>("SELECT * FROM company_config LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(cfg)
    }

    async fn save_company_config(&self, input: NewCompanyConfig) -> StorageResult<CompanyConfig> {
        let existing = self.get_company_config().await?;
        let now = Utc::now();

        match existing {
            Some(mut cfg) => {
                cfg.ruc = input.ruc;
                cfg.razon_social = input.razon_social;
                cfg.timbrado = input.timbrado;
                cfg.timbrado_desde = input.timbrado_desde;
                cfg.timbrado_hasta = input.timbrado_hasta;
                cfg.establecimiento = input.establecimiento;
                cfg.punto_expedicion = input.punto_expedicion;
                cfg.direccion = input.direccion;
                cfg.moneda = input.moneda;
                cfg.updated_at = now;

                sqlx::query(
                    "UPDATE company_config SET ruc = ?, razon_social = ?, timbrado = ?, \
                     timbrado_desde = ?, timbrado_hasta = ?, establecimiento = ?, \
                     punto_expedicion = ?, direccion = ?, moneda = ?, updated_at = ? \
                     WHERE id = ?",
                )
                .bind(&cfg.ruc)
                .bind(&cfg.razon_social)
                .bind(&cfg.timbrado)
                .bind(&cfg.timbrado_desde)
                .bind(&cfg.timbrado_hasta)
                .bind(&cfg.establecimiento)
                .bind(&cfg.punto_expedicion)
                .bind(&cfg.direccion)
                .bind(&cfg.moneda)
                .bind(cfg.updated_at)
                .bind(&cfg.id)
                .execute(&self.pool)
                .await?;

                Ok(cfg)
            }
            None => {
                let cfg = CompanyConfig {
                    id: Uuid::new_v4().to_string(),
                    ruc: input.ruc,
                    razon_social: input.razon_social,
                    timbrado: input.timbrado,
                    timbrado_desde: input.timbrado_desde,
                    timbrado_hasta: input.timbrado_hasta,
                    establecimiento: input.establecimiento,
                    punto_expedicion: input.punto_expedicion,
                    direccion: input.direccion,
                    moneda: input.moneda,
                    created_at: now,
                    updated_at: now,
                };
                self.insert_company_config_row(&self.pool, &cfg).await
            }
        }
    }

    // -------------------------------------------------------------------------
    // DNIT configuration
    // -------------------------------------------------------------------------

    async fn get_dnit_config(&self) -> StorageResult<Option<DnitConfig>> {
        let stored = sqlx::query_as::<_, DnitConfig>("SELECT * FROM dnit_config LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        match stored {
            Some(cfg) => Ok(Some(self.decrypt_dnit(cfg)?)),
            None => Ok(None),
        }
    }

    async fn save_dnit_config(&self, input: NewDnitConfig) -> StorageResult<DnitConfig> {
        let existing = sqlx::query_as::<_, DnitConfig>("SELECT * FROM dnit_config LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        let now = Utc::now();

        let auth_token = match &input.auth_token {
            Some(token) => Some(self.cipher.encrypt(token)?),
            None => None,
        };
        let certificate_password = match &input.certificate_password {
            Some(password) => Some(self.cipher.encrypt(password)?),
            None => None,
        };

        let (id, created_at) = existing
            .map(|c| (c.id, c.created_at))
            .unwrap_or_else(|| (Uuid::new_v4().to_string(), now));

        let stored = DnitConfig {
            id: id.clone(),
            endpoint_url: input.endpoint_url,
            auth_token,
            certificate_data: input.certificate_data,
            certificate_password,
            operation_mode: input.operation_mode,
            is_active: input.is_active,
            last_connection_test: None,
            last_connection_result: None,
            created_at,
            updated_at: now,
        };

        // Replace wholesale: delete any previous row, insert the new one.
        sqlx::query("DELETE FROM dnit_config")
            .execute(&self.pool)
            .await?;
        let stored = self.insert_dnit_config_row(&self.pool, &stored).await?;

        self.decrypt_dnit(stored)
    }

    async fn update_dnit_config(
        &self,
        mut update: DnitConfigUpdate,
    ) -> StorageResult<Option<DnitConfig>> {
        let Some(mut stored) =
            sqlx::query_as::<_, DnitConfig>("SELECT * FROM dnit_config LIMIT 1")
                .fetch_optional(&self.pool)
                .await?
        else {
            return Ok(None);
        };

        // Touched secrets arrive plaintext; re-encrypt before they land.
        if let Some(token) = update.auth_token.take() {
            update.auth_token = Some(self.cipher.encrypt(&token)?);
        }
        if let Some(password) = update.certificate_password.take() {
            update.certificate_password = Some(self.cipher.encrypt(&password)?);
        }

        update.apply(&mut stored);

        sqlx::query(
            "UPDATE dnit_config SET endpoint_url = ?, auth_token = ?, certificate_data = ?, \
             certificate_password = ?, operation_mode = ?, is_active = ?, \
             last_connection_test = ?, last_connection_result = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&stored.endpoint_url)
        .bind(&stored.auth_token)
        .bind(&stored.certificate_data)
        .bind(&stored.certificate_password)
        .bind(stored.operation_mode)
        .bind(stored.is_active)
        .bind(stored.last_connection_test)
        .bind(&stored.last_connection_result)
        .bind(stored.updated_at)
        .bind(&stored.id)
        .execute(&self.pool)
        .await?;

        self.decrypt_dnit(stored).map(Some)
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    async fn get_category(&self, id: &str) -> StorageResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    async fn list_categories(&self) -> StorageResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY nombre ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    async fn create_category(&self, input: NewCategory) -> StorageResult<Category> {
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4().to_string(),
            nombre: input.nombre,
            tipo: input.tipo,
            color: input.color,
            activa: true,
            created_at: now,
            updated_at: now,
        };
        self.insert_category_row(&self.pool, &category).await
    }

    async fn update_category(
        &self,
        id: &str,
        update: CategoryUpdate,
    ) -> StorageResult<Option<Category>> {
        let Some(mut category) = self.get_category(id).await? else {
            return Ok(None);
        };
        update.apply(&mut category);

        sqlx::query(
            "UPDATE categories SET nombre = ?, tipo = ?, color = ?, activa = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&category.nombre)
        .bind(category.tipo)
        .bind(&category.color)
        .bind(category.activa)
        .bind(category.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Some(category))
    }

    async fn delete_category(&self, id: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Customers
    // -------------------------------------------------------------------------

    async fn get_customer(&self, id: &str) -> StorageResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(customer)
    }

    async fn list_customers(&self) -> StorageResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    async fn create_customer(&self, input: NewCustomer) -> StorageResult<Customer> {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            nombre: input.nombre,
            doc_tipo: input.doc_tipo,
            doc_numero: input.doc_numero,
            regimen_turismo: input.regimen_turismo,
            pais: input.pais,
            pasaporte: input.pasaporte,
            created_at: now,
            updated_at: now,
        };
        self.insert_customer_row(&self.pool, &customer).await
    }

    async fn update_customer(
        &self,
        id: &str,
        update: CustomerUpdate,
    ) -> StorageResult<Option<Customer>> {
        let Some(mut customer) = self.get_customer(id).await? else {
            return Ok(None);
        };
        update.apply(&mut customer);

        sqlx::query(
            "UPDATE customers SET nombre = ?, doc_tipo = ?, doc_numero = ?, \
             regimen_turismo = ?, pais = ?, pasaporte = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&customer.nombre)
        .bind(customer.doc_tipo)
        .bind(&customer.doc_numero)
        .bind(customer.regimen_turismo)
        .bind(&customer.pais)
        .bind(&customer.pasaporte)
        .bind(customer.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Some(customer))
    }

    async fn delete_customer(&self, id: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Vehicles
    // -------------------------------------------------------------------------

    async fn get_vehicle(&self, id: &str) -> StorageResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(vehicle)
    }

    async fn list_vehicles(&self) -> StorageResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(vehicles)
    }

    async fn list_vehicles_by_customer(&self, customer_id: &str) -> StorageResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE customer_id = ? \
             ORDER BY created_at DESC, rowid DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(vehicles)
    }

    async fn create_vehicle(&self, input: NewVehicle) -> StorageResult<Vehicle> {
        let now = Utc::now();
        let vehicle = Vehicle {
            id: Uuid::new_v4().to_string(),
            customer_id: input.customer_id,
            placa: input.placa,
            marca: input.marca,
            modelo: input.modelo,
            color: input.color,
            created_at: now,
            updated_at: now,
        };
        self.insert_vehicle_row(&self.pool, &vehicle).await
    }

    async fn update_vehicle(
        &self,
        id: &str,
        update: VehicleUpdate,
    ) -> StorageResult<Option<Vehicle>> {
        let Some(mut vehicle) = self.get_vehicle(id).await? else {
            return Ok(None);
        };
        update.apply(&mut vehicle);

        sqlx::query(
            "UPDATE vehicles SET placa = ?, marca = ?, modelo = ?, color = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&vehicle.placa)
        .bind(&vehicle.marca)
        .bind(&vehicle.modelo)
        .bind(&vehicle.color)
        .bind(vehicle.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Some(vehicle))
    }

    async fn delete_vehicle(&self, id: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Services
    // -------------------------------------------------------------------------

    async fn get_service(&self, id: &str) -> StorageResult<Option<Service>> {
        let service = sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(service)
    }

    async fn list_services(&self) -> StorageResult<Vec<Service>> {
        let services = sqlx::query_as::<_, Service>("SELECT * FROM services ORDER BY nombre ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(services)
    }

    async fn create_service(&self, input: NewService) -> StorageResult<Service> {
        let now = Utc::now();
        let service = Service {
            id: Uuid::new_v4().to_string(),
            nombre: input.nombre,
            precio: input.precio,
            duracion_min: input.duracion_min,
            categoria: input.categoria,
            activo: true,
            created_at: now,
            updated_at: now,
        };
        self.insert_service_row(&self.pool, &service).await
    }

    async fn update_service(
        &self,
        id: &str,
        update: ServiceUpdate,
    ) -> StorageResult<Option<Service>> {
        let Some(mut service) = self.get_service(id).await? else {
            return Ok(None);
        };
        update.apply(&mut service);

        sqlx::query(
            "UPDATE services SET nombre = ?, precio = ?, duracion_min = ?, categoria = ?, \
             activo = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&service.nombre)
        .bind(&service.precio)
        .bind(service.duracion_min)
        .bind(&service.categoria)
        .bind(service.activo)
        .bind(service.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Some(service))
    }

    async fn delete_service(&self, id: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM services WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Service combos
    // -------------------------------------------------------------------------

    async fn get_service_combo(&self, id: &str) -> StorageResult<Option<ServiceCombo>> {
        let combo = sqlx::query_as::<_, ServiceCombo>("SELECT * FROM service_combos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(combo)
    }

    async fn list_service_combos(&self) -> StorageResult<Vec<ServiceCombo>> {
        let combos =
            sqlx::query_as::<_, ServiceCombo>("SELECT * FROM service_combos ORDER BY nombre ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(combos)
    }

    async fn create_service_combo(
        &self,
        input: NewServiceCombo,
        service_ids: Vec<String>,
    ) -> StorageResult<ServiceCombo> {
        let now = Utc::now();
        let combo = ServiceCombo {
            id: Uuid::new_v4().to_string(),
            nombre: input.nombre,
            precio_total: input.precio_total,
            activo: true,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;

        let combo = self.insert_combo_row(&mut *tx, &combo).await?;
        for service_id in service_ids {
            let item = ServiceComboItem {
                id: Uuid::new_v4().to_string(),
                combo_id: combo.id.clone(),
                service_id,
                created_at: now,
                updated_at: now,
            };
            self.insert_combo_item_row(&mut *tx, &item).await?;
        }

        tx.commit().await?;
        Ok(combo)
    }

    async fn update_service_combo(
        &self,
        id: &str,
        update: ServiceComboUpdate,
    ) -> StorageResult<Option<ServiceCombo>> {
        let Some(mut combo) = self.get_service_combo(id).await? else {
            return Ok(None);
        };
        update.apply(&mut combo);

        sqlx::query(
            "UPDATE service_combos SET nombre = ?, precio_total = ?, activo = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&combo.nombre)
        .bind(&combo.precio_total)
        .bind(combo.activo)
        .bind(combo.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Some(combo))
    }

    async fn delete_service_combo(&self, id: &str) -> StorageResult<bool> {
        // Bridge rows go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM service_combos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_combo_items(&self, combo_id: &str) -> StorageResult<Vec<ServiceComboItem>> {
        let items = sqlx::query_as::<_, ServiceComboItem>(
            "SELECT * FROM service_combo_items WHERE combo_id = ?",
        )
        .bind(combo_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    // -------------------------------------------------------------------------
    // Work orders
    // -------------------------------------------------------------------------

    async fn get_work_order(&self, id: &str) -> StorageResult<Option<WorkOrder>> {
        let order = sqlx::query_as::<_, WorkOrder>("SELECT * FROM work_orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    async fn list_work_orders(&self) -> StorageResult<Vec<WorkOrder>> {
        let orders = sqlx::query_as::<_, WorkOrder>(
            "SELECT * FROM work_orders ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn list_work_orders_by_status(
        &self,
        status: WorkOrderStatus,
    ) -> StorageResult<Vec<WorkOrder>> {
        let orders = sqlx::query_as::<_, WorkOrder>(
            "SELECT * FROM work_orders WHERE estado = ? \
             ORDER BY created_at DESC, rowid DESC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn create_work_order(&self, input: NewWorkOrder) -> StorageResult<WorkOrder> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Bump the sequence inside the same transaction as the insert:
        // concurrent creators serialize on the counter row and can never
        // observe the same numero.
        sqlx::query("UPDATE work_order_counter SET value = value + 1 WHERE id = 1")
            .execute(&mut *tx)
            .await?;
        let numero: i64 = sqlx::query_scalar("SELECT value FROM work_order_counter WHERE id = 1")
            .fetch_one(&mut *tx)
            .await?;

        let order = WorkOrder {
            id: Uuid::new_v4().to_string(),
            numero,
            customer_id: input.customer_id,
            vehicle_id: input.vehicle_id,
            estado: input.estado,
            fecha_entrada: input.fecha_entrada.unwrap_or(now),
            fecha_inicio: None,
            fecha_fin: None,
            fecha_entrega: None,
            total: input.total,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %order.id, numero, "Creating work order");
        let order = self.insert_work_order_row(&mut *tx, &order).await?;

        tx.commit().await?;
        Ok(order)
    }

    async fn update_work_order(
        &self,
        id: &str,
        update: WorkOrderUpdate,
    ) -> StorageResult<Option<WorkOrder>> {
        let Some(mut order) = self.get_work_order(id).await? else {
            return Ok(None);
        };
        update.apply(&mut order);

        sqlx::query(
            "UPDATE work_orders SET estado = ?, fecha_inicio = ?, fecha_fin = ?, \
             fecha_entrega = ?, total = ?, updated_at = ? WHERE id = ?",
        )
        .bind(order.estado)
        .bind(order.fecha_inicio)
        .bind(order.fecha_fin)
        .bind(order.fecha_entrega)
        .bind(&order.total)
        .bind(order.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Some(order))
    }

    async fn delete_work_order(&self, id: &str) -> StorageResult<bool> {
        // Line items go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM work_orders WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn next_work_order_number(&self) -> StorageResult<i64> {
        let value: i64 = sqlx::query_scalar("SELECT value FROM work_order_counter WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(value + 1)
    }

    async fn add_work_order_item(
        &self,
        input: NewWorkOrderItem,
    ) -> StorageResult<WorkOrderItem> {
        let now = Utc::now();
        let item = WorkOrderItem {
            id: Uuid::new_v4().to_string(),
            work_order_id: input.work_order_id,
            service_id: input.service_id,
            combo_id: input.combo_id,
            nombre: input.nombre,
            precio: input.precio,
            cantidad: input.cantidad,
            created_at: now,
            updated_at: now,
        };
        self.insert_work_order_item_row(&self.pool, &item).await
    }

    async fn list_work_order_items(
        &self,
        work_order_id: &str,
    ) -> StorageResult<Vec<WorkOrderItem>> {
        let items = sqlx::query_as::<_, WorkOrderItem>(
            "SELECT * FROM work_order_items WHERE work_order_id = ?",
        )
        .bind(work_order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn delete_work_order_item(&self, id: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM work_order_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Inventory
    // -------------------------------------------------------------------------

    async fn get_inventory_item(&self, id: &str) -> StorageResult<Option<InventoryItem>> {
        let item = sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn list_inventory_items(&self) -> StorageResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory_items ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn create_inventory_item(
        &self,
        input: NewInventoryItem,
    ) -> StorageResult<InventoryItem> {
        let now = Utc::now();
        let item = InventoryItem {
            id: Uuid::new_v4().to_string(),
            nombre: input.nombre,
            precio: input.precio,
            stock_actual: input.stock_actual,
            stock_minimo: input.stock_minimo,
            estado_alerta: StockAlert::derive(input.stock_actual, input.stock_minimo),
            activo: true,
            created_at: now,
            updated_at: now,
        };
        self.insert_inventory_row(&self.pool, &item).await
    }

    async fn update_inventory_item(
        &self,
        id: &str,
        update: InventoryItemUpdate,
    ) -> StorageResult<Option<InventoryItem>> {
        let Some(mut item) = self.get_inventory_item(id).await? else {
            return Ok(None);
        };
        update.apply(&mut item);
        self.write_inventory_row(&item).await?;
        Ok(Some(item))
    }

    async fn delete_inventory_item(&self, id: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_inventory_stock(
        &self,
        id: &str,
        stock_actual: i64,
    ) -> StorageResult<Option<InventoryItem>> {
        let Some(mut item) = self.get_inventory_item(id).await? else {
            return Ok(None);
        };
        item.stock_actual = stock_actual;
        item.estado_alerta = StockAlert::derive(stock_actual, item.stock_minimo);
        item.updated_at = Utc::now();
        self.write_inventory_row(&item).await?;
        Ok(Some(item))
    }

    // -------------------------------------------------------------------------
    // Sales
    // -------------------------------------------------------------------------

    async fn get_sale(&self, id: &str) -> StorageResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sale)
    }

    async fn list_sales(&self) -> StorageResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            "SELECT * FROM sales ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }

    async fn create_sale(&self, input: NewSale, items: Vec<NewSaleItem>) -> StorageResult<Sale> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let numero_factura = match input.numero_factura {
            Some(numero) => numero,
            None => self.mint_invoice_number(&mut tx).await?,
        };

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            numero_factura,
            customer_id: input.customer_id,
            work_order_id: input.work_order_id,
            subtotal: input.subtotal,
            impuestos: input.impuestos,
            total: input.total,
            medio_pago: input.medio_pago,
            timbrado_usado: input.timbrado_usado,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %sale.id, numero_factura = %sale.numero_factura, "Creating sale");
        let sale = self.insert_sale_row(&mut *tx, &sale).await?;

        for item in items {
            let row = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                service_id: item.service_id,
                combo_id: item.combo_id,
                inventory_item_id: item.inventory_item_id,
                nombre: item.nombre,
                cantidad: item.cantidad,
                precio_unitario: item.precio_unitario,
                subtotal: item.subtotal,
                created_at: now,
                updated_at: now,
            };
            self.insert_sale_item_row(&mut *tx, &row).await?;
        }

        tx.commit().await?;
        Ok(sale)
    }

    async fn delete_sale(&self, id: &str) -> StorageResult<bool> {
        // Line items go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM sales WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_sale_items(&self, sale_id: &str) -> StorageResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>("SELECT * FROM sale_items WHERE sale_id = ?")
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn next_invoice_number(&self) -> StorageResult<String> {
        let mut conn = self.pool.acquire().await?;
        self.mint_invoice_number(&mut conn).await
    }
}

impl SqliteStorage {
    /// Writes every mutable column of an inventory row back.
    async fn write_inventory_row(&self, item: &InventoryItem) -> StorageResult<()> {
        sqlx::query(
            "UPDATE inventory_items SET nombre = ?, precio = ?, stock_actual = ?, \
             stock_minimo = ?, estado_alerta = ?, activo = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&item.nombre)
        .bind(&item.precio)
        .bind(item.stock_actual)
        .bind(item.stock_minimo)
        .bind(item.estado_alerta)
        .bind(item.activo)
        .bind(item.updated_at)
        .bind(&item.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lavadero_core::types::{CategoryKind, DocType, PaymentMethod};
    use lavadero_core::verify_password;

    async fn storage() -> SqliteStorage {
        SqliteStorage::new(SqliteConfig::in_memory(), "sqlite-backend-test-key")
            .await
            .unwrap()
    }

    fn new_customer(nombre: &str) -> NewCustomer {
        NewCustomer {
            nombre: nombre.to_string(),
            doc_tipo: DocType::Ruc,
            doc_numero: "80012345-6".to_string(),
            regimen_turismo: false,
            pais: None,
            pasaporte: None,
        }
    }

    fn new_service(nombre: &str, precio: &str) -> NewService {
        NewService {
            nombre: nombre.to_string(),
            precio: precio.to_string(),
            duracion_min: 30,
            categoria: None,
        }
    }

    async fn customer_with_vehicle(storage: &SqliteStorage) -> (Customer, Vehicle) {
        let customer = storage.create_customer(new_customer("Ana")).await.unwrap();
        let vehicle = storage
            .create_vehicle(NewVehicle {
                customer_id: customer.id.clone(),
                placa: "ABC123".to_string(),
                marca: "Toyota".to_string(),
                modelo: "Hilux".to_string(),
                color: None,
            })
            .await
            .unwrap();
        (customer, vehicle)
    }

    #[tokio::test]
    async fn test_create_assigns_unique_ids() {
        let storage = storage().await;
        let a = storage.create_service(new_service("Lavado", "50000")).await.unwrap();
        let b = storage.create_service(new_service("Encerado", "30000")).await.unwrap();

        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_decimal_text_round_trip() {
        let storage = storage().await;
        let created = storage.create_service(new_service("Lavado", "123.45")).await.unwrap();
        let fetched = storage.get_service(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.precio, "123.45");
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let storage = storage().await;
        let service = storage.create_service(new_service("Lavado", "50000")).await.unwrap();

        assert!(storage.delete_service(&service.id).await.unwrap());
        assert!(!storage.delete_service(&service.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_username_unique_case_insensitive() {
        let storage = storage().await;
        storage
            .create_user(NewUser {
                username: "Admin2".to_string(),
                password: "secret123".to_string(),
                role: Default::default(),
                subscription_type: Default::default(),
                monthly_invoice_limit: 50,
                created_by: None,
            })
            .await
            .unwrap();

        let err = storage
            .create_user(NewUser {
                username: "admin2".to_string(),
                password: "secret123".to_string(),
                role: Default::default(),
                subscription_type: Default::default(),
                monthly_invoice_limit: 50,
                created_by: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UniqueViolation { .. }));

        // Lookup follows the same collation.
        let found = storage.get_user_by_username("ADMIN2").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_user_password_is_hashed_and_rehashed() {
        let storage = storage().await;
        let user = storage
            .create_user(NewUser {
                username: "cajero1".to_string(),
                password: "secret123".to_string(),
                role: Default::default(),
                subscription_type: Default::default(),
                monthly_invoice_limit: 50,
                created_by: None,
            })
            .await
            .unwrap();
        assert!(verify_password("secret123", &user.password));

        let updated = storage
            .update_user(
                &user.id,
                UserUpdate {
                    password: Some("nuevo-secreto".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(verify_password("nuevo-secreto", &updated.password));
        assert!(!verify_password("secret123", &updated.password));
    }

    #[tokio::test]
    async fn test_vehicle_requires_existing_customer() {
        let storage = storage().await;
        let err = storage
            .create_vehicle(NewVehicle {
                customer_id: "no-such-customer".to_string(),
                placa: "ABC123".to_string(),
                marca: "Toyota".to_string(),
                modelo: "Hilux".to_string(),
                color: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_work_order_numbers_are_sequential() {
        let storage = storage().await;
        let (customer, vehicle) = customer_with_vehicle(&storage).await;

        assert_eq!(storage.next_work_order_number().await.unwrap(), 1);

        for expected in 1..=3 {
            let order = storage
                .create_work_order(NewWorkOrder {
                    customer_id: customer.id.clone(),
                    vehicle_id: vehicle.id.clone(),
                    estado: Default::default(),
                    fecha_entrada: None,
                    total: "0".to_string(),
                })
                .await
                .unwrap();
            assert_eq!(order.numero, expected);
        }

        assert_eq!(storage.next_work_order_number().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_work_order_flow_with_status_filter() {
        let storage = storage().await;
        let (customer, vehicle) = customer_with_vehicle(&storage).await;

        let order = storage
            .create_work_order(NewWorkOrder {
                customer_id: customer.id.clone(),
                vehicle_id: vehicle.id.clone(),
                estado: Default::default(),
                fecha_entrada: None,
                total: "80000".to_string(),
            })
            .await
            .unwrap();

        storage
            .add_work_order_item(NewWorkOrderItem {
                work_order_id: order.id.clone(),
                service_id: None,
                combo_id: None,
                nombre: "Lavado completo".to_string(),
                precio: "80000".to_string(),
                cantidad: 1,
            })
            .await
            .unwrap();
        assert_eq!(storage.list_work_order_items(&order.id).await.unwrap().len(), 1);

        storage
            .update_work_order(
                &order.id,
                WorkOrderUpdate {
                    estado: Some(WorkOrderStatus::EnProceso),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        let en_proceso = storage
            .list_work_orders_by_status(WorkOrderStatus::EnProceso)
            .await
            .unwrap();
        assert_eq!(en_proceso.len(), 1);
        assert!(storage
            .list_work_orders_by_status(WorkOrderStatus::Terminado)
            .await
            .unwrap()
            .is_empty());

        // Cascade: deleting the order removes its items.
        assert!(storage.delete_work_order(&order.id).await.unwrap());
        assert!(storage.list_work_order_items(&order.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dnit_secrets_encrypted_at_rest() {
        let storage = storage().await;
        storage
            .save_dnit_config(NewDnitConfig {
                endpoint_url: "https://sifen-test.set.gov.py".to_string(),
                auth_token: Some("tok-abc".to_string()),
                certificate_data: None,
                certificate_password: None,
                operation_mode: Default::default(),
                is_active: true,
            })
            .await
            .unwrap();

        // The stored column never contains the plaintext token.
        let stored: String = sqlx::query_scalar("SELECT auth_token FROM dnit_config")
            .fetch_one(&storage.pool)
            .await
            .unwrap();
        assert!(!stored.contains("tok-abc"));

        let fetched = storage.get_dnit_config().await.unwrap().unwrap();
        assert_eq!(fetched.auth_token.as_deref(), Some("tok-abc"));
        assert!(fetched.to_safe().has_auth_token);
    }

    #[tokio::test]
    async fn test_stock_alert_transitions() {
        let storage = storage().await;
        let item = storage
            .create_inventory_item(NewInventoryItem {
                nombre: "Shampoo".to_string(),
                precio: "15000".to_string(),
                stock_actual: 10,
                stock_minimo: 5,
            })
            .await
            .unwrap();
        assert_eq!(item.estado_alerta, StockAlert::Normal);

        let item = storage.update_inventory_stock(&item.id, 3).await.unwrap().unwrap();
        assert_eq!(item.estado_alerta, StockAlert::Bajo);

        let item = storage.update_inventory_stock(&item.id, 0).await.unwrap().unwrap();
        assert_eq!(item.estado_alerta, StockAlert::Critico);
    }

    #[tokio::test]
    async fn test_catalog_lists_alphabetical() {
        let storage = storage().await;
        storage.create_service(new_service("Pulido", "90000")).await.unwrap();
        storage.create_service(new_service("Aspirado", "20000")).await.unwrap();
        storage.create_service(new_service("Lavado", "50000")).await.unwrap();

        let names: Vec<String> = storage
            .list_services()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.nombre)
            .collect();
        assert_eq!(names, vec!["Aspirado", "Lavado", "Pulido"]);
    }

    #[tokio::test]
    async fn test_combo_create_and_cascade_delete() {
        let storage = storage().await;
        let a = storage.create_service(new_service("Lavado", "50000")).await.unwrap();
        let b = storage.create_service(new_service("Encerado", "30000")).await.unwrap();

        let combo = storage
            .create_service_combo(
                NewServiceCombo {
                    nombre: "Combo full".to_string(),
                    precio_total: "70000".to_string(),
                },
                vec![a.id.clone(), b.id.clone()],
            )
            .await
            .unwrap();
        assert_eq!(storage.list_combo_items(&combo.id).await.unwrap().len(), 2);

        assert!(storage.delete_service_combo(&combo.id).await.unwrap());
        assert!(storage.list_combo_items(&combo.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_combo_rolls_back_on_bad_service() {
        let storage = storage().await;
        let err = storage
            .create_service_combo(
                NewServiceCombo {
                    nombre: "Combo roto".to_string(),
                    precio_total: "70000".to_string(),
                },
                vec!["no-such-service".to_string()],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ForeignKeyViolation { .. }));

        // Nothing half-written: the combo itself rolled back too.
        assert!(storage.list_service_combos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sale_with_items_and_minted_invoice_number() {
        let storage = storage().await;
        assert_eq!(storage.next_invoice_number().await.unwrap(), "001-001-0000001");

        let sale = storage
            .create_sale(
                NewSale {
                    numero_factura: None,
                    customer_id: None,
                    work_order_id: None,
                    subtotal: "100000".to_string(),
                    impuestos: "9091".to_string(),
                    total: "100000".to_string(),
                    medio_pago: PaymentMethod::Efectivo,
                    timbrado_usado: None,
                    created_by: None,
                },
                vec![NewSaleItem {
                    service_id: None,
                    combo_id: None,
                    inventory_item_id: None,
                    nombre: "Lavado".to_string(),
                    cantidad: 2,
                    precio_unitario: "50000".to_string(),
                    subtotal: "100000".to_string(),
                }],
            )
            .await
            .unwrap();

        assert_eq!(sale.numero_factura, "001-001-0000001");
        assert_eq!(storage.next_invoice_number().await.unwrap(), "001-001-0000002");
        assert_eq!(storage.list_sale_items(&sale.id).await.unwrap().len(), 1);

        assert!(storage.delete_sale(&sale.id).await.unwrap());
        assert!(storage.list_sale_items(&sale.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invoice_prefix_uses_company_config() {
        let storage = storage().await;
        storage
            .save_company_config(NewCompanyConfig {
                ruc: "80012345-6".to_string(),
                razon_social: "Lavadero El Rápido".to_string(),
                timbrado: "15551234".to_string(),
                timbrado_desde: "2026-01-01".to_string(),
                timbrado_hasta: "2026-12-31".to_string(),
                establecimiento: "002".to_string(),
                punto_expedicion: "003".to_string(),
                direccion: None,
                moneda: "PYG".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(storage.next_invoice_number().await.unwrap(), "002-003-0000001");
    }

    #[tokio::test]
    async fn test_duplicate_invoice_number_rejected() {
        let storage = storage().await;
        let input = NewSale {
            numero_factura: Some("001-001-0000042".to_string()),
            customer_id: None,
            work_order_id: None,
            subtotal: "100".to_string(),
            impuestos: "0".to_string(),
            total: "100".to_string(),
            medio_pago: PaymentMethod::Efectivo,
            timbrado_usado: None,
            created_by: None,
        };
        storage.create_sale(input.clone(), Vec::new()).await.unwrap();

        let err = storage.create_sale(input, Vec::new()).await.unwrap_err();
        assert!(matches!(err, StorageError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_company_config_is_singleton() {
        let storage = storage().await;
        let first = storage
            .save_company_config(NewCompanyConfig {
                ruc: "80012345-6".to_string(),
                razon_social: "Antes".to_string(),
                timbrado: "1".to_string(),
                timbrado_desde: "2026-01-01".to_string(),
                timbrado_hasta: "2026-12-31".to_string(),
                establecimiento: "001".to_string(),
                punto_expedicion: "001".to_string(),
                direccion: None,
                moneda: "PYG".to_string(),
            })
            .await
            .unwrap();

        let second = storage
            .save_company_config(NewCompanyConfig {
                ruc: "80012345-6".to_string(),
                razon_social: "Después".to_string(),
                timbrado: "2".to_string(),
                timbrado_desde: "2026-01-01".to_string(),
                timbrado_hasta: "2026-12-31".to_string(),
                establecimiento: "001".to_string(),
                punto_expedicion: "001".to_string(),
                direccion: None,
                moneda: "PYG".to_string(),
            })
            .await
            .unwrap();

        // Same row, replaced in place.
        assert_eq!(first.id, second.id);
        let fetched = storage.get_company_config().await.unwrap().unwrap();
        assert_eq!(fetched.razon_social, "Después");
    }

    #[tokio::test]
    async fn test_category_crud() {
        let storage = storage().await;
        let category = storage
            .create_category(NewCategory {
                nombre: "Lavados".to_string(),
                tipo: CategoryKind::Servicios,
                color: Some("#00aaff".to_string()),
            })
            .await
            .unwrap();
        assert!(category.activa);

        let updated = storage
            .update_category(
                &category.id,
                CategoryUpdate {
                    activa: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(!updated.activa);
        assert_eq!(updated.nombre, "Lavados");

        assert!(storage.delete_category(&category.id).await.unwrap());
        assert!(storage.get_category(&category.id).await.unwrap().is_none());
    }
}
