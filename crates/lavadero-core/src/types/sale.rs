//! Sales (invoices) and their line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payment method of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Efectivo,
    TarjetaCredito,
    TarjetaDebito,
    Transferencia,
    Cheque,
}

/// A completed sale. `numero_factura` is unique; when the caller leaves it
/// out, the storage layer mints the next invoice number from the company
/// configuration's establishment and expedition-point codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub numero_factura: String,
    pub customer_id: Option<String>,
    /// The work order this sale settles, if any.
    pub work_order_id: Option<String>,
    /// Exact decimal text.
    pub subtotal: String,
    /// Exact decimal text.
    pub impuestos: String,
    /// Exact decimal text.
    pub total: String,
    pub medio_pago: PaymentMethod,
    /// Timbrado in force when the invoice was issued.
    pub timbrado_usado: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    /// Minted by the storage layer when absent.
    #[serde(default)]
    pub numero_factura: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub work_order_id: Option<String>,
    pub subtotal: String,
    pub impuestos: String,
    pub total: String,
    pub medio_pago: PaymentMethod,
    #[serde(default)]
    pub timbrado_usado: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// A line on a sale: a service, a combo, or an inventory item, with name
/// and unit price captured at sale time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub service_id: Option<String>,
    pub combo_id: Option<String>,
    pub inventory_item_id: Option<String>,
    /// Snapshot name at sale time.
    pub nombre: String,
    pub cantidad: i64,
    /// Exact decimal text.
    pub precio_unitario: String,
    /// Exact decimal text.
    pub subtotal: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Line payload for `create_sale`. The parent `sale_id` is assigned by the
/// storage layer when the sale and its lines are written together.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSaleItem {
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub combo_id: Option<String>,
    #[serde(default)]
    pub inventory_item_id: Option<String>,
    pub nombre: String,
    pub cantidad: i64,
    pub precio_unitario: String,
    pub subtotal: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_wire_values() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::TarjetaCredito).unwrap(),
            "\"tarjeta_credito\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Cheque).unwrap(),
            "\"cheque\""
        );
        let parsed: PaymentMethod = serde_json::from_str("\"transferencia\"").unwrap();
        assert_eq!(parsed, PaymentMethod::Transferencia);
    }
}
