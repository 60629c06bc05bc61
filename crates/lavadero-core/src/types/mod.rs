//! # Domain Types
//!
//! Entity records, create payloads, and partial-update payloads for every
//! collection the storage layer persists.
//!
//! ## Conventions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Entity        - the persisted record. `id` is a storage-minted     │
//! │                  UUID v4 string; `created_at`/`updated_at` are      │
//! │                  stamped by the storage layer, never by callers.    │
//! │  New<Entity>   - create payload: business fields only.              │
//! │  <Entity>Update- partial update: every field Option; `apply()`      │
//! │                  copies the set fields and refreshes `updated_at`.  │
//! │  Safe<Entity>  - outward projection with secrets removed (User,     │
//! │                  DnitConfig only).                                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All money fields (`precio`, `total`, `subtotal`, ...) are exact decimal
//! text (see [`crate::decimal`]) - never binary floating point. Entities
//! serialize camelCase so the JSON documents written by the file back end
//! keep their original persisted field names.

mod catalog;
mod config;
mod customer;
mod inventory;
mod sale;
mod user;
mod work_order;

pub use catalog::{
    Category, CategoryKind, CategoryUpdate, NewCategory, NewService, NewServiceCombo, Service,
    ServiceCombo, ServiceComboItem, ServiceComboUpdate, ServiceUpdate,
};
pub use config::{
    CompanyConfig, DnitConfig, DnitConfigUpdate, NewCompanyConfig, NewDnitConfig, OperationMode,
    SafeDnitConfig,
};
pub use customer::{
    Customer, CustomerUpdate, DocType, NewCustomer, NewVehicle, Vehicle, VehicleUpdate,
};
pub use inventory::{InventoryItem, InventoryItemUpdate, NewInventoryItem, StockAlert};
pub use sale::{NewSale, NewSaleItem, PaymentMethod, Sale, SaleItem};
pub use user::{NewUser, SafeUser, SubscriptionType, User, UserRole, UserUpdate};
pub use work_order::{
    NewWorkOrder, NewWorkOrderItem, WorkOrder, WorkOrderItem, WorkOrderStatus, WorkOrderUpdate,
};
