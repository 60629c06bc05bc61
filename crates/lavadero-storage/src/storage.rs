//! # Storage Contract
//!
//! The single capability interface both back ends conform to. A process picks
//! one implementation at startup and holds it as `Box<dyn Storage>`; nothing
//! above this trait knows which engine is underneath.
//!
//! ## Back End Selection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Process start                                                       │
//! │       │                                                             │
//! │       ├── file mode  ──► FileStorage::new(data_dir, key).init()     │
//! │       │                                                             │
//! │       └── sqlite mode ─► SqliteStorage::new(config, key)            │
//! │                                                                     │
//! │  Either way: Box<dyn Storage> from here on.                         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Normative Guarantees
//! - `create_*` mints the id (UUID v4) and both timestamps; callers never
//!   supply them.
//! - `update_*` / `delete_*` on a missing id return `Ok(None)` / `Ok(false)`,
//!   never an error.
//! - Ordering: categories, services, and combos list alphabetically by
//!   `nombre`; every other collection lists newest-first.
//! - Money fields are exact decimal text end to end; no back end ever parses
//!   them into binary floats.

use async_trait::async_trait;

use lavadero_core::types::{
    Category, CategoryUpdate, CompanyConfig, Customer, CustomerUpdate, DnitConfig,
    DnitConfigUpdate, InventoryItem, InventoryItemUpdate, NewCategory, NewCompanyConfig,
    NewCustomer, NewDnitConfig, NewInventoryItem, NewSale, NewSaleItem, NewService,
    NewServiceCombo, NewUser, NewVehicle, NewWorkOrder, NewWorkOrderItem, Sale, SaleItem, Service,
    ServiceCombo, ServiceComboItem, ServiceUpdate, ServiceComboUpdate, User, UserUpdate, Vehicle,
    VehicleUpdate, WorkOrder, WorkOrderItem, WorkOrderStatus, WorkOrderUpdate,
};

use crate::error::StorageResult;

/// The storage contract. One trait, two engines.
#[async_trait]
pub trait Storage: Send + Sync {
    // =========================================================================
    // Users
    // =========================================================================

    async fn get_user(&self, id: &str) -> StorageResult<Option<User>>;

    /// Case-insensitive in the SQL back end (username is unique NOCASE there).
    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>>;

    async fn list_users(&self) -> StorageResult<Vec<User>>;

    /// Hashes the plaintext password before anything is written.
    async fn create_user(&self, input: NewUser) -> StorageResult<User>;

    /// Re-hashes the password when the update carries a new one.
    async fn update_user(&self, id: &str, update: UserUpdate) -> StorageResult<Option<User>>;

    async fn delete_user(&self, id: &str) -> StorageResult<bool>;

    // =========================================================================
    // Company configuration (singleton)
    // =========================================================================

    async fn get_company_config(&self) -> StorageResult<Option<CompanyConfig>>;

    /// Insert-or-replace: there is at most one company configuration.
    async fn save_company_config(&self, input: NewCompanyConfig) -> StorageResult<CompanyConfig>;

    // =========================================================================
    // DNIT configuration (singleton, secrets encrypted at rest)
    // =========================================================================

    /// Returns the configuration with secrets decrypted to plaintext.
    async fn get_dnit_config(&self) -> StorageResult<Option<DnitConfig>>;

    /// Encrypts `auth_token` / `certificate_password` before writing.
    async fn save_dnit_config(&self, input: NewDnitConfig) -> StorageResult<DnitConfig>;

    /// Partial update; touched secrets are re-encrypted.
    async fn update_dnit_config(
        &self,
        update: DnitConfigUpdate,
    ) -> StorageResult<Option<DnitConfig>>;

    // =========================================================================
    // Categories
    // =========================================================================

    async fn get_category(&self, id: &str) -> StorageResult<Option<Category>>;
    async fn list_categories(&self) -> StorageResult<Vec<Category>>;
    async fn create_category(&self, input: NewCategory) -> StorageResult<Category>;
    async fn update_category(
        &self,
        id: &str,
        update: CategoryUpdate,
    ) -> StorageResult<Option<Category>>;
    async fn delete_category(&self, id: &str) -> StorageResult<bool>;

    // =========================================================================
    // Customers
    // =========================================================================

    async fn get_customer(&self, id: &str) -> StorageResult<Option<Customer>>;
    async fn list_customers(&self) -> StorageResult<Vec<Customer>>;
    async fn create_customer(&self, input: NewCustomer) -> StorageResult<Customer>;
    async fn update_customer(
        &self,
        id: &str,
        update: CustomerUpdate,
    ) -> StorageResult<Option<Customer>>;
    async fn delete_customer(&self, id: &str) -> StorageResult<bool>;

    // =========================================================================
    // Vehicles
    // =========================================================================

    async fn get_vehicle(&self, id: &str) -> StorageResult<Option<Vehicle>>;
    async fn list_vehicles(&self) -> StorageResult<Vec<Vehicle>>;
    async fn list_vehicles_by_customer(&self, customer_id: &str) -> StorageResult<Vec<Vehicle>>;
    async fn create_vehicle(&self, input: NewVehicle) -> StorageResult<Vehicle>;
    async fn update_vehicle(
        &self,
        id: &str,
        update: VehicleUpdate,
    ) -> StorageResult<Option<Vehicle>>;
    async fn delete_vehicle(&self, id: &str) -> StorageResult<bool>;

    // =========================================================================
    // Services
    // =========================================================================

    async fn get_service(&self, id: &str) -> StorageResult<Option<Service>>;
    async fn list_services(&self) -> StorageResult<Vec<Service>>;
    async fn create_service(&self, input: NewService) -> StorageResult<Service>;
    async fn update_service(
        &self,
        id: &str,
        update: ServiceUpdate,
    ) -> StorageResult<Option<Service>>;
    async fn delete_service(&self, id: &str) -> StorageResult<bool>;

    // =========================================================================
    // Service combos
    // =========================================================================

    async fn get_service_combo(&self, id: &str) -> StorageResult<Option<ServiceCombo>>;
    async fn list_service_combos(&self) -> StorageResult<Vec<ServiceCombo>>;

    /// Creates the combo and one bridge row per member service as a single
    /// all-or-nothing unit.
    async fn create_service_combo(
        &self,
        input: NewServiceCombo,
        service_ids: Vec<String>,
    ) -> StorageResult<ServiceCombo>;

    async fn update_service_combo(
        &self,
        id: &str,
        update: ServiceComboUpdate,
    ) -> StorageResult<Option<ServiceCombo>>;

    /// Removes the combo together with its bridge rows.
    async fn delete_service_combo(&self, id: &str) -> StorageResult<bool>;

    async fn list_combo_items(&self, combo_id: &str) -> StorageResult<Vec<ServiceComboItem>>;

    // =========================================================================
    // Work orders
    // =========================================================================

    async fn get_work_order(&self, id: &str) -> StorageResult<Option<WorkOrder>>;
    async fn list_work_orders(&self) -> StorageResult<Vec<WorkOrder>>;
    async fn list_work_orders_by_status(
        &self,
        status: WorkOrderStatus,
    ) -> StorageResult<Vec<WorkOrder>>;

    /// Assigns `numero` from the monotone sequence; numbers are never reused.
    async fn create_work_order(&self, input: NewWorkOrder) -> StorageResult<WorkOrder>;

    async fn update_work_order(
        &self,
        id: &str,
        update: WorkOrderUpdate,
    ) -> StorageResult<Option<WorkOrder>>;

    async fn delete_work_order(&self, id: &str) -> StorageResult<bool>;

    /// Peeks at the number the next created order would receive. Does not
    /// consume it.
    async fn next_work_order_number(&self) -> StorageResult<i64>;

    async fn add_work_order_item(&self, input: NewWorkOrderItem)
        -> StorageResult<WorkOrderItem>;
    async fn list_work_order_items(
        &self,
        work_order_id: &str,
    ) -> StorageResult<Vec<WorkOrderItem>>;
    async fn delete_work_order_item(&self, id: &str) -> StorageResult<bool>;

    // =========================================================================
    // Inventory
    // =========================================================================

    async fn get_inventory_item(&self, id: &str) -> StorageResult<Option<InventoryItem>>;
    async fn list_inventory_items(&self) -> StorageResult<Vec<InventoryItem>>;
    async fn create_inventory_item(&self, input: NewInventoryItem)
        -> StorageResult<InventoryItem>;
    async fn update_inventory_item(
        &self,
        id: &str,
        update: InventoryItemUpdate,
    ) -> StorageResult<Option<InventoryItem>>;
    async fn delete_inventory_item(&self, id: &str) -> StorageResult<bool>;

    /// Sets the stock level and recomputes `estado_alerta` from it.
    async fn update_inventory_stock(
        &self,
        id: &str,
        stock_actual: i64,
    ) -> StorageResult<Option<InventoryItem>>;

    // =========================================================================
    // Sales
    // =========================================================================

    async fn get_sale(&self, id: &str) -> StorageResult<Option<Sale>>;
    async fn list_sales(&self) -> StorageResult<Vec<Sale>>;

    /// Writes the sale and all of its line items as a single all-or-nothing
    /// unit. Mints the invoice number when the payload leaves it out.
    async fn create_sale(&self, input: NewSale, items: Vec<NewSaleItem>) -> StorageResult<Sale>;

    /// Removes the sale together with its line items.
    async fn delete_sale(&self, id: &str) -> StorageResult<bool>;

    async fn list_sale_items(&self, sale_id: &str) -> StorageResult<Vec<SaleItem>>;

    /// Next invoice number, formatted `EEE-PPP-NNNNNNN` from the company
    /// configuration's establecimiento / punto de expedición (falling back
    /// to `001`/`001`) and the highest existing sequence plus one.
    async fn next_invoice_number(&self) -> StorageResult<String>;
}
