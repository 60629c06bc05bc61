//! Inventory items and the derived stock-alert level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert level derived from the current stock against the minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum StockAlert {
    Normal,
    Bajo,
    Critico,
}

impl Default for StockAlert {
    fn default() -> Self {
        StockAlert::Normal
    }
}

impl StockAlert {
    /// Alert level for a given stock position: `critico` at or below zero,
    /// `bajo` at or below the minimum, `normal` otherwise.
    pub fn derive(stock_actual: i64, stock_minimo: i64) -> Self {
        if stock_actual <= 0 {
            StockAlert::Critico
        } else if stock_actual <= stock_minimo {
            StockAlert::Bajo
        } else {
            StockAlert::Normal
        }
    }
}

/// A stocked product that can appear on sales.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub nombre: String,
    /// Exact decimal text.
    pub precio: String,
    pub stock_actual: i64,
    pub stock_minimo: i64,
    /// Derived by stock movements, not set directly by callers.
    pub estado_alerta: StockAlert,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    pub nombre: String,
    pub precio: String,
    pub stock_actual: i64,
    pub stock_minimo: i64,
}

/// Partial update. Changing stock through here does not recompute the
/// alert level; stock movements go through the dedicated stock operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemUpdate {
    pub nombre: Option<String>,
    pub precio: Option<String>,
    pub stock_actual: Option<i64>,
    pub stock_minimo: Option<i64>,
    pub estado_alerta: Option<StockAlert>,
    pub activo: Option<bool>,
}

impl InventoryItemUpdate {
    pub fn apply(self, item: &mut InventoryItem) {
        if let Some(nombre) = self.nombre {
            item.nombre = nombre;
        }
        if let Some(precio) = self.precio {
            item.precio = precio;
        }
        if let Some(stock_actual) = self.stock_actual {
            item.stock_actual = stock_actual;
        }
        if let Some(stock_minimo) = self.stock_minimo {
            item.stock_minimo = stock_minimo;
        }
        if let Some(estado_alerta) = self.estado_alerta {
            item.estado_alerta = estado_alerta;
        }
        if let Some(activo) = self.activo {
            item.activo = activo;
        }
        item.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_levels() {
        assert_eq!(StockAlert::derive(10, 5), StockAlert::Normal);
        assert_eq!(StockAlert::derive(6, 5), StockAlert::Normal);
        assert_eq!(StockAlert::derive(5, 5), StockAlert::Bajo);
        assert_eq!(StockAlert::derive(3, 5), StockAlert::Bajo);
        assert_eq!(StockAlert::derive(0, 5), StockAlert::Critico);
        assert_eq!(StockAlert::derive(-2, 5), StockAlert::Critico);
    }

    #[test]
    fn test_alert_wire_values() {
        assert_eq!(
            serde_json::to_string(&StockAlert::Critico).unwrap(),
            "\"critico\""
        );
        let parsed: StockAlert = serde_json::from_str("\"bajo\"").unwrap();
        assert_eq!(parsed, StockAlert::Bajo);
    }
}
