//! # JSON-File Back End
//!
//! One JSON document per collection under a data directory, plus `meta.json`
//! for the work-order counter. Every operation is a whole-document
//! read-modify-write.
//!
//! ## Layout
//! ```text
//! <data_dir>/
//! ├── users.json               [User, ...]
//! ├── company_config.json      CompanyConfig | null
//! ├── dnit_config.json         DnitConfig | null   (secret fields ciphertext)
//! ├── categories.json          [Category, ...]
//! ├── customers.json           [Customer, ...]
//! ├── vehicles.json            [Vehicle, ...]
//! ├── services.json            [Service, ...]
//! ├── service_combos.json      [ServiceCombo, ...]
//! ├── service_combo_items.json [ServiceComboItem, ...]
//! ├── work_orders.json         [WorkOrder, ...]
//! ├── work_order_items.json    [WorkOrderItem, ...]
//! ├── inventory_items.json     [InventoryItem, ...]
//! ├── sales.json               [Sale, ...]
//! ├── sale_items.json          [SaleItem, ...]
//! └── meta.json                { "nextWorkOrderNumber": n }
//! ```
//!
//! ## Concurrency
//! A `tokio::sync::Mutex` serializes writers inside the process. Writers in
//! other processes are NOT coordinated; this back end assumes a single
//! writing process, which is the deployment shape it exists for.
//!
//! ## Failure policy
//! Reads degrade: a missing or unparseable document logs a warning and acts
//! as empty/absent. Writes never degrade: any I/O or serialization failure
//! is returned to the caller.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
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

// =============================================================================
// Document Names
// =============================================================================

const USERS: &str = "users.json";
const COMPANY_CONFIG: &str = "company_config.json";
const DNIT_CONFIG: &str = "dnit_config.json";
const CATEGORIES: &str = "categories.json";
const CUSTOMERS: &str = "customers.json";
const VEHICLES: &str = "vehicles.json";
const SERVICES: &str = "services.json";
const SERVICE_COMBOS: &str = "service_combos.json";
const SERVICE_COMBO_ITEMS: &str = "service_combo_items.json";
const WORK_ORDERS: &str = "work_orders.json";
const WORK_ORDER_ITEMS: &str = "work_order_items.json";
const INVENTORY_ITEMS: &str = "inventory_items.json";
const SALES: &str = "sales.json";
const SALE_ITEMS: &str = "sale_items.json";
const META: &str = "meta.json";

const COLLECTIONS: &[&str] = &[
    USERS,
    CATEGORIES,
    CUSTOMERS,
    VEHICLES,
    SERVICES,
    SERVICE_COMBOS,
    SERVICE_COMBO_ITEMS,
    WORK_ORDERS,
    WORK_ORDER_ITEMS,
    INVENTORY_ITEMS,
    SALES,
    SALE_ITEMS,
];

const SINGLETONS: &[&str] = &[COMPANY_CONFIG, DNIT_CONFIG];

// =============================================================================
// Metadata Document
// =============================================================================

/// Counters that live outside any collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Meta {
    next_work_order_number: i64,
}

impl Default for Meta {
    fn default() -> Self {
        Meta {
            next_work_order_number: 1,
        }
    }
}

// =============================================================================
// Record Access Helpers
// =============================================================================

/// Uniform access to the fields every persisted record carries, so the
/// CRUD plumbing below can be written once.
trait Record {
    fn id(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
}

macro_rules! record {
    ($($ty:ty),+ $(,)?) => {
        $(impl Record for $ty {
            fn id(&self) -> &str {
                &self.id
            }
            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }
        })+
    };
}

record!(
    User,
    Category,
    Customer,
    Vehicle,
    Service,
    ServiceCombo,
    ServiceComboItem,
    WorkOrder,
    WorkOrderItem,
    InventoryItem,
    Sale,
    SaleItem,
);

// =============================================================================
// FileStorage
// =============================================================================

/// The JSON-file storage back end.
pub struct FileStorage {
    data_dir: PathBuf,
    cipher: SecretCipher,
    /// Serializes writers inside this process.
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for FileStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStorage")
            .field("data_dir", &self.data_dir)
            .finish_non_exhaustive()
    }
}

impl FileStorage {
    /// Creates a handle over the given data directory. Call [`init`] once
    /// before use.
    ///
    /// [`init`]: FileStorage::init
    pub fn new(data_dir: impl Into<PathBuf>, encryption_key: &str) -> Self {
        FileStorage {
            data_dir: data_dir.into(),
            cipher: SecretCipher::new(encryption_key),
            write_lock: Mutex::new(()),
        }
    }

    /// Creates a handle from `LAVADERO_DATA_DIR` / `LAVADERO_ENCRYPTION_KEY`.
    pub fn from_env() -> Self {
        Self::new(config::data_dir(), &config::encryption_key())
    }

    /// Creates the data directory and seeds every missing document: `[]`
    /// for collections, `null` for singletons, a fresh counter for
    /// `meta.json`. Idempotent; existing documents are left untouched.
    pub async fn init(&self) -> StorageResult<()> {
        info!(data_dir = %self.data_dir.display(), "Initializing file storage");

        fs::create_dir_all(&self.data_dir).await?;

        for file in COLLECTIONS {
            self.seed_if_missing(file, b"[]").await?;
        }
        for file in SINGLETONS {
            self.seed_if_missing(file, b"null").await?;
        }

        if !self.path(META).exists() {
            self.write_meta(&Meta::default()).await?;
        }

        debug!("File storage documents ready");
        Ok(())
    }

    fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    async fn seed_if_missing(&self, file: &str, contents: &[u8]) -> StorageResult<()> {
        let path = self.path(file);
        if !path.exists() {
            fs::write(&path, contents).await?;
        }
        Ok(())
    }

    // =========================================================================
    // Document I/O
    // =========================================================================

    /// Reads a collection document. Missing or corrupt documents degrade to
    /// an empty collection with a logged warning.
    async fn read_collection<T: DeserializeOwned>(&self, file: &str) -> Vec<T> {
        let path = self.path(file);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(file, error = %e, "collection read failed, treating as empty");
                }
                return Vec::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(items) => items,
            Err(e) => {
                warn!(file, error = %e, "collection document corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    /// Writes a collection document. Goes through a sibling temp file and a
    /// rename so a crash mid-write never leaves a truncated document.
    async fn write_collection<T: Serialize>(&self, file: &str, items: &[T]) -> StorageResult<()> {
        let bytes = serde_json::to_vec_pretty(items)?;
        self.write_document(file, &bytes).await
    }

    async fn read_singleton<T: DeserializeOwned>(&self, file: &str) -> Option<T> {
        let path = self.path(file);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(file, error = %e, "singleton read failed, treating as absent");
                }
                return None;
            }
        };

        match serde_json::from_slice::<Option<T>>(&bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!(file, error = %e, "singleton document corrupt, treating as absent");
                None
            }
        }
    }

    async fn write_singleton<T: Serialize>(&self, file: &str, value: &T) -> StorageResult<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_document(file, &bytes).await
    }

    async fn write_document(&self, file: &str, bytes: &[u8]) -> StorageResult<()> {
        let path = self.path(file);
        let tmp = self.path(&format!("{file}.tmp"));
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Reads the counter document. A missing or corrupt `meta.json` is
    /// rebuilt from the highest `numero` already issued, so the sequence
    /// can move forward but never hand out a number twice.
    async fn read_meta(&self) -> Meta {
        if let Some(meta) = self.read_singleton::<Meta>(META).await {
            return meta;
        }

        let orders: Vec<WorkOrder> = self.read_collection(WORK_ORDERS).await;
        let highest = orders.iter().map(|o| o.numero).max().unwrap_or(0);
        if highest > 0 {
            warn!(highest, "counter document unreadable, rebuilt from issued work orders");
        }
        Meta {
            next_work_order_number: highest + 1,
        }
    }

    async fn write_meta(&self, meta: &Meta) -> StorageResult<()> {
        self.write_singleton(META, meta).await
    }

    // =========================================================================
    // Generic CRUD Plumbing
    // =========================================================================
    // These helpers take the write lock themselves. Operations touching more
    // than one document take the lock once at the top and use the raw
    // read/write helpers instead - the lock is not reentrant.

    async fn get_by_id<T>(&self, file: &str, id: &str) -> Option<T>
    where
        T: Record + DeserializeOwned,
    {
        self.read_collection::<T>(file)
            .await
            .into_iter()
            .find(|t| t.id() == id)
    }

    async fn list_newest_first<T>(&self, file: &str) -> Vec<T>
    where
        T: Record + DeserializeOwned,
    {
        let mut items: Vec<T> = self.read_collection(file).await;
        items.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        items
    }

    async fn insert_item<T>(&self, file: &str, item: &T) -> StorageResult<()>
    where
        T: Record + Serialize + DeserializeOwned + Clone,
    {
        let _guard = self.write_lock.lock().await;
        let mut items: Vec<T> = self.read_collection(file).await;
        items.push(item.clone());
        self.write_collection(file, &items).await
    }

    async fn update_by_id<T, F>(&self, file: &str, id: &str, mutate: F) -> StorageResult<Option<T>>
    where
        T: Record + Serialize + DeserializeOwned + Clone,
        F: FnOnce(&mut T),
    {
        let _guard = self.write_lock.lock().await;
        let mut items: Vec<T> = self.read_collection(file).await;
        let Some(item) = items.iter_mut().find(|t| t.id() == id) else {
            return Ok(None);
        };
        mutate(item);
        let updated = item.clone();
        self.write_collection(file, &items).await?;
        Ok(Some(updated))
    }

    async fn delete_by_id<T>(&self, file: &str, id: &str) -> StorageResult<bool>
    where
        T: Record + Serialize + DeserializeOwned,
    {
        let _guard = self.write_lock.lock().await;
        let mut items: Vec<T> = self.read_collection(file).await;
        let before = items.len();
        items.retain(|t| t.id() != id);
        if items.len() == before {
            return Ok(false);
        }
        self.write_collection(file, &items).await?;
        Ok(true)
    }

    /// Deletes a parent record and every child whose `child_key` matches it,
    /// under one lock acquisition.
    async fn delete_with_children<P, C, K>(
        &self,
        parent_file: &str,
        child_file: &str,
        id: &str,
        child_key: K,
    ) -> StorageResult<bool>
    where
        P: Record + Serialize + DeserializeOwned,
        C: Record + Serialize + DeserializeOwned,
        K: Fn(&C) -> &str,
    {
        let _guard = self.write_lock.lock().await;

        let mut parents: Vec<P> = self.read_collection(parent_file).await;
        let before = parents.len();
        parents.retain(|p| p.id() != id);
        if parents.len() == before {
            return Ok(false);
        }
        self.write_collection(parent_file, &parents).await?;

        let mut children: Vec<C> = self.read_collection(child_file).await;
        children.retain(|c| child_key(c) != id);
        self.write_collection(child_file, &children).await?;

        Ok(true)
    }

    // =========================================================================
    // Secret Handling
    // =========================================================================

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

    fn next_invoice_number_from(&self, sales: &[Sale], cfg: Option<&CompanyConfig>) -> String {
        let (establecimiento, punto) = cfg
            .map(|c| (c.establecimiento.as_str(), c.punto_expedicion.as_str()))
            .unwrap_or((numbering::DEFAULT_SEGMENT, numbering::DEFAULT_SEGMENT));
        let seq = numbering::max_invoice_seq(sales.iter().map(|s| s.numero_factura.as_str())) + 1;
        numbering::format_invoice_number(establecimiento, punto, seq)
    }
}

// =============================================================================
// Storage Implementation
// =============================================================================

#[async_trait]
impl Storage for FileStorage {
    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    async fn get_user(&self, id: &str) -> StorageResult<Option<User>> {
        Ok(self.get_by_id(USERS, id).await)
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        Ok(self
            .read_collection::<User>(USERS)
            .await
            .into_iter()
            .find(|u| u.username == username))
    }

    async fn list_users(&self) -> StorageResult<Vec<User>> {
        Ok(self.list_newest_first(USERS).await)
    }

    async fn create_user(&self, input: NewUser) -> StorageResult<User> {
        let _guard = self.write_lock.lock().await;
        let mut users: Vec<User> = self.read_collection(USERS).await;

        if users.iter().any(|u| u.username == input.username) {
            return Err(StorageError::UniqueViolation {
                field: "users.username".to_string(),
            });
        }

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
        users.push(user.clone());
        self.write_collection(USERS, &users).await?;
        Ok(user)
    }

    async fn update_user(&self, id: &str, mut update: UserUpdate) -> StorageResult<Option<User>> {
        if let Some(password) = update.password.take() {
            update.password = Some(hash_password(&password)?);
        }
        self.update_by_id::<User, _>(USERS, id, |u| update.apply(u))
            .await
    }

    async fn delete_user(&self, id: &str) -> StorageResult<bool> {
        self.delete_by_id::<User>(USERS, id).await
    }

    // -------------------------------------------------------------------------
    // Company configuration
    // -------------------------------------------------------------------------

    async fn get_company_config(&self) -> StorageResult<Option<CompanyConfig>> {
        Ok(self.read_singleton(COMPANY_CONFIG).await)
    }

    async fn save_company_config(&self, input: NewCompanyConfig) -> StorageResult<CompanyConfig> {
        let _guard = self.write_lock.lock().await;
        let existing: Option<CompanyConfig> = self.read_singleton(COMPANY_CONFIG).await;

        let now = Utc::now();
        let (id, created_at) = existing
            .map(|c| (c.id, c.created_at))
            .unwrap_or_else(|| (Uuid::new_v4().to_string(), now));

        let config = CompanyConfig {
            id,
            ruc: input.ruc,
            razon_social: input.razon_social,
            timbrado: input.timbrado,
            timbrado_desde: input.timbrado_desde,
            timbrado_hasta: input.timbrado_hasta,
            establecimiento: input.establecimiento,
            punto_expedicion: input.punto_expedicion,
            direccion: input.direccion,
            moneda: input.moneda,
            created_at,
            updated_at: now,
        };

        self.write_singleton(COMPANY_CONFIG, &config).await?;
        Ok(config)
    }

    // -------------------------------------------------------------------------
    // DNIT configuration
    // -------------------------------------------------------------------------

    async fn get_dnit_config(&self) -> StorageResult<Option<DnitConfig>> {
        match self.read_singleton::<DnitConfig>(DNIT_CONFIG).await {
            Some(cfg) => Ok(Some(self.decrypt_dnit(cfg)?)),
            None => Ok(None),
        }
    }

    async fn save_dnit_config(&self, input: NewDnitConfig) -> StorageResult<DnitConfig> {
        let _guard = self.write_lock.lock().await;
        let existing: Option<DnitConfig> = self.read_singleton(DNIT_CONFIG).await;

        let now = Utc::now();
        let (id, created_at) = existing
            .map(|c| (c.id, c.created_at))
            .unwrap_or_else(|| (Uuid::new_v4().to_string(), now));

        let auth_token = match &input.auth_token {
            Some(token) => Some(self.cipher.encrypt(token)?),
            None => None,
        };
        let certificate_password = match &input.certificate_password {
            Some(password) => Some(self.cipher.encrypt(password)?),
            None => None,
        };

        let stored = DnitConfig {
            id,
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

        self.write_singleton(DNIT_CONFIG, &stored).await?;
        self.decrypt_dnit(stored)
    }

    async fn update_dnit_config(
        &self,
        mut update: DnitConfigUpdate,
    ) -> StorageResult<Option<DnitConfig>> {
        let _guard = self.write_lock.lock().await;
        let Some(mut stored) = self.read_singleton::<DnitConfig>(DNIT_CONFIG).await else {
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
        self.write_singleton(DNIT_CONFIG, &stored).await?;
        self.decrypt_dnit(stored).map(Some)
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    async fn get_category(&self, id: &str) -> StorageResult<Option<Category>> {
        Ok(self.get_by_id(CATEGORIES, id).await)
    }

    async fn list_categories(&self) -> StorageResult<Vec<Category>> {
        let mut categories: Vec<Category> = self.read_collection(CATEGORIES).await;
        categories.sort_by(|a, b| a.nombre.cmp(&b.nombre));
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
        self.insert_item(CATEGORIES, &category).await?;
        Ok(category)
    }

    async fn update_category(
        &self,
        id: &str,
        update: CategoryUpdate,
    ) -> StorageResult<Option<Category>> {
        self.update_by_id::<Category, _>(CATEGORIES, id, |c| update.apply(c))
            .await
    }

    async fn delete_category(&self, id: &str) -> StorageResult<bool> {
        self.delete_by_id::<Category>(CATEGORIES, id).await
    }

    // -------------------------------------------------------------------------
    // Customers
    // -------------------------------------------------------------------------

    async fn get_customer(&self, id: &str) -> StorageResult<Option<Customer>> {
        Ok(self.get_by_id(CUSTOMERS, id).await)
    }

    async fn list_customers(&self) -> StorageResult<Vec<Customer>> {
        Ok(self.list_newest_first(CUSTOMERS).await)
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
        self.insert_item(CUSTOMERS, &customer).await?;
        Ok(customer)
    }

    async fn update_customer(
        &self,
        id: &str,
        update: CustomerUpdate,
    ) -> StorageResult<Option<Customer>> {
        self.update_by_id::<Customer, _>(CUSTOMERS, id, |c| update.apply(c))
            .await
    }

    async fn delete_customer(&self, id: &str) -> StorageResult<bool> {
        self.delete_by_id::<Customer>(CUSTOMERS, id).await
    }

    // -------------------------------------------------------------------------
    // Vehicles
    // -------------------------------------------------------------------------

    async fn get_vehicle(&self, id: &str) -> StorageResult<Option<Vehicle>> {
        Ok(self.get_by_id(VEHICLES, id).await)
    }

    async fn list_vehicles(&self) -> StorageResult<Vec<Vehicle>> {
        Ok(self.list_newest_first(VEHICLES).await)
    }

    async fn list_vehicles_by_customer(&self, customer_id: &str) -> StorageResult<Vec<Vehicle>> {
        let mut vehicles: Vec<Vehicle> = self
            .read_collection::<Vehicle>(VEHICLES)
            .await
            .into_iter()
            .filter(|v| v.customer_id == customer_id)
            .collect();
        vehicles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
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
        self.insert_item(VEHICLES, &vehicle).await?;
        Ok(vehicle)
    }

    async fn update_vehicle(
        &self,
        id: &str,
        update: VehicleUpdate,
    ) -> StorageResult<Option<Vehicle>> {
        self.update_by_id::<Vehicle, _>(VEHICLES, id, |v| update.apply(v))
            .await
    }

    async fn delete_vehicle(&self, id: &str) -> StorageResult<bool> {
        self.delete_by_id::<Vehicle>(VEHICLES, id).await
    }

    // -------------------------------------------------------------------------
    // Services
    // -------------------------------------------------------------------------

    async fn get_service(&self, id: &str) -> StorageResult<Option<Service>> {
        Ok(self.get_by_id(SERVICES, id).await)
    }

    async fn list_services(&self) -> StorageResult<Vec<Service>> {
        let mut services: Vec<Service> = self.read_collection(SERVICES).await;
        services.sort_by(|a, b| a.nombre.cmp(&b.nombre));
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
        self.insert_item(SERVICES, &service).await?;
        Ok(service)
    }

    async fn update_service(
        &self,
        id: &str,
        update: ServiceUpdate,
    ) -> StorageResult<Option<Service>> {
        self.update_by_id::<Service, _>(SERVICES, id, |s| update.apply(s))
            .await
    }

    async fn delete_service(&self, id: &str) -> StorageResult<bool> {
        self.delete_by_id::<Service>(SERVICES, id).await
    }

    // -------------------------------------------------------------------------
    // Service combos
    // -------------------------------------------------------------------------

    async fn get_service_combo(&self, id: &str) -> StorageResult<Option<ServiceCombo>> {
        Ok(self.get_by_id(SERVICE_COMBOS, id).await)
    }

    async fn list_service_combos(&self) -> StorageResult<Vec<ServiceCombo>> {
        let mut combos: Vec<ServiceCombo> = self.read_collection(SERVICE_COMBOS).await;
        combos.sort_by(|a, b| a.nombre.cmp(&b.nombre));
        Ok(combos)
    }

    async fn create_service_combo(
        &self,
        input: NewServiceCombo,
        service_ids: Vec<String>,
    ) -> StorageResult<ServiceCombo> {
        let _guard = self.write_lock.lock().await;

        let now = Utc::now();
        let combo = ServiceCombo {
            id: Uuid::new_v4().to_string(),
            nombre: input.nombre,
            precio_total: input.precio_total,
            activo: true,
            created_at: now,
            updated_at: now,
        };

        // Combo document first; bridge rows only land once the parent exists.
        let mut combos: Vec<ServiceCombo> = self.read_collection(SERVICE_COMBOS).await;
        combos.push(combo.clone());
        self.write_collection(SERVICE_COMBOS, &combos).await?;

        let mut items: Vec<ServiceComboItem> = self.read_collection(SERVICE_COMBO_ITEMS).await;
        for service_id in service_ids {
            items.push(ServiceComboItem {
                id: Uuid::new_v4().to_string(),
                combo_id: combo.id.clone(),
                service_id,
                created_at: now,
                updated_at: now,
            });
        }
        self.write_collection(SERVICE_COMBO_ITEMS, &items).await?;

        Ok(combo)
    }

    async fn update_service_combo(
        &self,
        id: &str,
        update: ServiceComboUpdate,
    ) -> StorageResult<Option<ServiceCombo>> {
        self.update_by_id::<ServiceCombo, _>(SERVICE_COMBOS, id, |c| update.apply(c))
            .await
    }

    async fn delete_service_combo(&self, id: &str) -> StorageResult<bool> {
        self.delete_with_children::<ServiceCombo, ServiceComboItem, _>(
            SERVICE_COMBOS,
            SERVICE_COMBO_ITEMS,
            id,
            |item| &item.combo_id,
        )
        .await
    }

    async fn list_combo_items(&self, combo_id: &str) -> StorageResult<Vec<ServiceComboItem>> {
        Ok(self
            .read_collection::<ServiceComboItem>(SERVICE_COMBO_ITEMS)
            .await
            .into_iter()
            .filter(|item| item.combo_id == combo_id)
            .collect())
    }

    // -------------------------------------------------------------------------
    // Work orders
    // -------------------------------------------------------------------------

    async fn get_work_order(&self, id: &str) -> StorageResult<Option<WorkOrder>> {
        Ok(self.get_by_id(WORK_ORDERS, id).await)
    }

    async fn list_work_orders(&self) -> StorageResult<Vec<WorkOrder>> {
        Ok(self.list_newest_first(WORK_ORDERS).await)
    }

    async fn list_work_orders_by_status(
        &self,
        status: WorkOrderStatus,
    ) -> StorageResult<Vec<WorkOrder>> {
        let mut orders: Vec<WorkOrder> = self
            .read_collection::<WorkOrder>(WORK_ORDERS)
            .await
            .into_iter()
            .filter(|o| o.estado == status)
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn create_work_order(&self, input: NewWorkOrder) -> StorageResult<WorkOrder> {
        let _guard = self.write_lock.lock().await;

        let mut meta = self.read_meta().await;
        let numero = meta.next_work_order_number;
        let now = Utc::now();

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

        // Order document first, counter second: a failure between the two
        // repeats a number on retry instead of leaving a gap.
        let mut orders: Vec<WorkOrder> = self.read_collection(WORK_ORDERS).await;
        orders.push(order.clone());
        self.write_collection(WORK_ORDERS, &orders).await?;

        meta.next_work_order_number = numero + 1;
        self.write_meta(&meta).await?;

        Ok(order)
    }

    async fn update_work_order(
        &self,
        id: &str,
        update: WorkOrderUpdate,
    ) -> StorageResult<Option<WorkOrder>> {
        self.update_by_id::<WorkOrder, _>(WORK_ORDERS, id, |o| update.apply(o))
            .await
    }

    async fn delete_work_order(&self, id: &str) -> StorageResult<bool> {
        self.delete_with_children::<WorkOrder, WorkOrderItem, _>(
            WORK_ORDERS,
            WORK_ORDER_ITEMS,
            id,
            |item| &item.work_order_id,
        )
        .await
    }

    async fn next_work_order_number(&self) -> StorageResult<i64> {
        Ok(self.read_meta().await.next_work_order_number)
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
        self.insert_item(WORK_ORDER_ITEMS, &item).await?;
        Ok(item)
    }

    async fn list_work_order_items(
        &self,
        work_order_id: &str,
    ) -> StorageResult<Vec<WorkOrderItem>> {
        Ok(self
            .read_collection::<WorkOrderItem>(WORK_ORDER_ITEMS)
            .await
            .into_iter()
            .filter(|item| item.work_order_id == work_order_id)
            .collect())
    }

    async fn delete_work_order_item(&self, id: &str) -> StorageResult<bool> {
        self.delete_by_id::<WorkOrderItem>(WORK_ORDER_ITEMS, id).await
    }

    // -------------------------------------------------------------------------
    // Inventory
    // -------------------------------------------------------------------------

    async fn get_inventory_item(&self, id: &str) -> StorageResult<Option<InventoryItem>> {
        Ok(self.get_by_id(INVENTORY_ITEMS, id).await)
    }

    async fn list_inventory_items(&self) -> StorageResult<Vec<InventoryItem>> {
        Ok(self.list_newest_first(INVENTORY_ITEMS).await)
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
        self.insert_item(INVENTORY_ITEMS, &item).await?;
        Ok(item)
    }

    async fn update_inventory_item(
        &self,
        id: &str,
        update: InventoryItemUpdate,
    ) -> StorageResult<Option<InventoryItem>> {
        self.update_by_id::<InventoryItem, _>(INVENTORY_ITEMS, id, |i| update.apply(i))
            .await
    }

    async fn delete_inventory_item(&self, id: &str) -> StorageResult<bool> {
        self.delete_by_id::<InventoryItem>(INVENTORY_ITEMS, id).await
    }

    async fn update_inventory_stock(
        &self,
        id: &str,
        stock_actual: i64,
    ) -> StorageResult<Option<InventoryItem>> {
        self.update_by_id::<InventoryItem, _>(INVENTORY_ITEMS, id, |item| {
            item.stock_actual = stock_actual;
            item.estado_alerta = StockAlert::derive(stock_actual, item.stock_minimo);
            item.updated_at = Utc::now();
        })
        .await
    }

    // -------------------------------------------------------------------------
    // Sales
    // -------------------------------------------------------------------------

    async fn get_sale(&self, id: &str) -> StorageResult<Option<Sale>> {
        Ok(self.get_by_id(SALES, id).await)
    }

    async fn list_sales(&self) -> StorageResult<Vec<Sale>> {
        Ok(self.list_newest_first(SALES).await)
    }

    async fn create_sale(&self, input: NewSale, items: Vec<NewSaleItem>) -> StorageResult<Sale> {
        let _guard = self.write_lock.lock().await;

        let mut sales: Vec<Sale> = self.read_collection(SALES).await;
        let numero_factura = match input.numero_factura {
            Some(numero) => numero,
            None => {
                let config: Option<CompanyConfig> = self.read_singleton(COMPANY_CONFIG).await;
                self.next_invoice_number_from(&sales, config.as_ref())
            }
        };

        if sales.iter().any(|s| s.numero_factura == numero_factura) {
            return Err(StorageError::UniqueViolation {
                field: "sales.numero_factura".to_string(),
            });
        }

        let now = Utc::now();
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

        sales.push(sale.clone());
        self.write_collection(SALES, &sales).await?;

        let mut all_items: Vec<SaleItem> = self.read_collection(SALE_ITEMS).await;
        for item in items {
            all_items.push(SaleItem {
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
            });
        }
        self.write_collection(SALE_ITEMS, &all_items).await?;

        Ok(sale)
    }

    async fn delete_sale(&self, id: &str) -> StorageResult<bool> {
        self.delete_with_children::<Sale, SaleItem, _>(SALES, SALE_ITEMS, id, |item| {
            &item.sale_id
        })
        .await
    }

    async fn list_sale_items(&self, sale_id: &str) -> StorageResult<Vec<SaleItem>> {
        Ok(self
            .read_collection::<SaleItem>(SALE_ITEMS)
            .await
            .into_iter()
            .filter(|item| item.sale_id == sale_id)
            .collect())
    }

    async fn next_invoice_number(&self) -> StorageResult<String> {
        let sales: Vec<Sale> = self.read_collection(SALES).await;
        let config: Option<CompanyConfig> = self.read_singleton(COMPANY_CONFIG).await;
        Ok(self.next_invoice_number_from(&sales, config.as_ref()))
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

    async fn storage() -> (tempfile::TempDir, FileStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), "file-backend-test-key");
        storage.init().await.unwrap();
        (dir, storage)
    }

    fn new_customer(nombre: &str) -> NewCustomer {
        NewCustomer {
            nombre: nombre.to_string(),
            doc_tipo: DocType::Ci,
            doc_numero: "1234567".to_string(),
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

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let (_dir, storage) = storage().await;
        storage.create_category(NewCategory {
            nombre: "Lavados".to_string(),
            tipo: CategoryKind::Servicios,
            color: None,
        })
        .await
        .unwrap();

        // Re-running init must not wipe existing documents.
        storage.init().await.unwrap();
        assert_eq!(storage.list_categories().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_assigns_unique_ids() {
        let (_dir, storage) = storage().await;
        let a = storage.create_service(new_service("Lavado", "50000")).await.unwrap();
        let b = storage.create_service(new_service("Encerado", "30000")).await.unwrap();

        assert!(!a.id.is_empty());
        assert!(!b.id.is_empty());
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_decimal_text_round_trip() {
        let (_dir, storage) = storage().await;
        let created = storage.create_service(new_service("Lavado", "123.45")).await.unwrap();
        let fetched = storage.get_service(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.precio, "123.45");
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let (_dir, storage) = storage().await;
        let service = storage.create_service(new_service("Lavado", "50000")).await.unwrap();

        assert!(storage.delete_service(&service.id).await.unwrap());
        assert!(!storage.delete_service(&service.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let (_dir, storage) = storage().await;
        let result = storage
            .update_service("no-such-id", ServiceUpdate::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_user_password_is_hashed() {
        let (_dir, storage) = storage().await;
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

        assert!(!user.password.contains("secret123"));
        assert!(verify_password("secret123", &user.password));
        assert!(!verify_password("secret124", &user.password));

        let fetched = storage.get_user_by_username("cajero1").await.unwrap().unwrap();
        assert_eq!(fetched.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let (_dir, storage) = storage().await;
        let input = NewUser {
            username: "cajero1".to_string(),
            password: "secret123".to_string(),
            role: Default::default(),
            subscription_type: Default::default(),
            monthly_invoice_limit: 50,
            created_by: None,
        };
        storage.create_user(input.clone()).await.unwrap();

        let err = storage.create_user(input).await.unwrap_err();
        assert!(matches!(err, StorageError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_dnit_secrets_encrypted_at_rest() {
        let (dir, storage) = storage().await;
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

        // The raw document never contains the plaintext token.
        let raw = std::fs::read_to_string(dir.path().join("dnit_config.json")).unwrap();
        assert!(!raw.contains("tok-abc"));

        // The read path decrypts it back.
        let fetched = storage.get_dnit_config().await.unwrap().unwrap();
        assert_eq!(fetched.auth_token.as_deref(), Some("tok-abc"));
    }

    #[tokio::test]
    async fn test_dnit_update_reencrypts_touched_secret() {
        let (dir, storage) = storage().await;
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

        let updated = storage
            .update_dnit_config(DnitConfigUpdate {
                auth_token: Some("tok-xyz".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.auth_token.as_deref(), Some("tok-xyz"));

        let raw = std::fs::read_to_string(dir.path().join("dnit_config.json")).unwrap();
        assert!(!raw.contains("tok-xyz"));
    }

    #[tokio::test]
    async fn test_work_order_numbers_are_sequential() {
        let (_dir, storage) = storage().await;
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
    async fn test_counter_rebuilt_from_corrupt_meta() {
        let (dir, storage) = storage().await;
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

        let order_input = || NewWorkOrder {
            customer_id: customer.id.clone(),
            vehicle_id: vehicle.id.clone(),
            estado: Default::default(),
            fecha_entrada: None,
            total: "0".to_string(),
        };
        storage.create_work_order(order_input()).await.unwrap();
        storage.create_work_order(order_input()).await.unwrap();

        // Clobber the counter document; issued numbers must not come back.
        std::fs::write(dir.path().join("meta.json"), b"{not json").unwrap();

        assert_eq!(storage.next_work_order_number().await.unwrap(), 3);
        let order = storage.create_work_order(order_input()).await.unwrap();
        assert_eq!(order.numero, 3);
    }

    #[tokio::test]
    async fn test_customer_vehicle_work_order_flow() {
        let (_dir, storage) = storage().await;

        let customer = storage.create_customer(new_customer("Juan Pérez")).await.unwrap();
        let vehicle = storage
            .create_vehicle(NewVehicle {
                customer_id: customer.id.clone(),
                placa: "XYZ987".to_string(),
                marca: "Nissan".to_string(),
                modelo: "Frontier".to_string(),
                color: Some("blanco".to_string()),
            })
            .await
            .unwrap();

        let by_customer = storage.list_vehicles_by_customer(&customer.id).await.unwrap();
        assert_eq!(by_customer.len(), 1);
        assert_eq!(by_customer[0].id, vehicle.id);

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
        assert_eq!(order.estado, WorkOrderStatus::Recibido);

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
        assert_eq!(en_proceso[0].id, order.id);

        assert!(storage
            .list_work_orders_by_status(WorkOrderStatus::Terminado)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_stock_alert_transitions() {
        let (_dir, storage) = storage().await;
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
        let (_dir, storage) = storage().await;
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
        let (_dir, storage) = storage().await;
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

        let items = storage.list_combo_items(&combo.id).await.unwrap();
        assert_eq!(items.len(), 2);

        assert!(storage.delete_service_combo(&combo.id).await.unwrap());
        assert!(storage.list_combo_items(&combo.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sale_with_items_and_minted_invoice_number() {
        let (_dir, storage) = storage().await;

        // No company config yet: both prefix segments fall back to 001.
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

        let items = storage.list_sale_items(&sale.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].subtotal, "100000");

        assert!(storage.delete_sale(&sale.id).await.unwrap());
        assert!(storage.list_sale_items(&sale.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invoice_prefix_uses_company_config() {
        let (_dir, storage) = storage().await;
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
        let (_dir, storage) = storage().await;
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
    async fn test_customers_list_newest_first() {
        let (_dir, storage) = storage().await;
        storage.create_customer(new_customer("Primero")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        storage.create_customer(new_customer("Segundo")).await.unwrap();

        let customers = storage.list_customers().await.unwrap();
        assert_eq!(customers[0].nombre, "Segundo");
        assert_eq!(customers[1].nombre, "Primero");
    }
}
