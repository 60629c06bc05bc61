//! Work orders: the lifecycle of a vehicle moving through the wash, plus
//! the line items attached to each order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    Recibido,
    EnProceso,
    Terminado,
    Entregado,
    Cancelado,
}

impl Default for WorkOrderStatus {
    fn default() -> Self {
        WorkOrderStatus::Recibido
    }
}

/// A work order. `numero` is a sequential human-facing number minted by
/// the storage layer; it is never reused, even across process restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: String,
    pub numero: i64,
    pub customer_id: String,
    pub vehicle_id: String,
    pub estado: WorkOrderStatus,
    pub fecha_entrada: DateTime<Utc>,
    pub fecha_inicio: Option<DateTime<Utc>>,
    pub fecha_fin: Option<DateTime<Utc>>,
    pub fecha_entrega: Option<DateTime<Utc>>,
    /// Exact decimal text.
    pub total: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkOrder {
    pub customer_id: String,
    pub vehicle_id: String,
    #[serde(default)]
    pub estado: WorkOrderStatus,
    /// Defaults to the creation instant when absent.
    #[serde(default)]
    pub fecha_entrada: Option<DateTime<Utc>>,
    pub total: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderUpdate {
    pub estado: Option<WorkOrderStatus>,
    pub fecha_inicio: Option<DateTime<Utc>>,
    pub fecha_fin: Option<DateTime<Utc>>,
    pub fecha_entrega: Option<DateTime<Utc>>,
    pub total: Option<String>,
}

impl WorkOrderUpdate {
    pub fn apply(self, order: &mut WorkOrder) {
        if let Some(estado) = self.estado {
            order.estado = estado;
        }
        if let Some(fecha_inicio) = self.fecha_inicio {
            order.fecha_inicio = Some(fecha_inicio);
        }
        if let Some(fecha_fin) = self.fecha_fin {
            order.fecha_fin = Some(fecha_fin);
        }
        if let Some(fecha_entrega) = self.fecha_entrega {
            order.fecha_entrega = Some(fecha_entrega);
        }
        if let Some(total) = self.total {
            order.total = total;
        }
        order.updated_at = Utc::now();
    }
}

/// A line on a work order: either a service or a combo, with the name and
/// price captured at the moment of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderItem {
    pub id: String,
    pub work_order_id: String,
    pub service_id: Option<String>,
    pub combo_id: Option<String>,
    /// Snapshot of the service/combo name at sale time.
    pub nombre: String,
    /// Snapshot price, exact decimal text.
    pub precio: String,
    pub cantidad: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkOrderItem {
    pub work_order_id: String,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub combo_id: Option<String>,
    pub nombre: String,
    pub precio: String,
    pub cantidad: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_values() {
        assert_eq!(
            serde_json::to_string(&WorkOrderStatus::EnProceso).unwrap(),
            "\"en_proceso\""
        );
        let parsed: WorkOrderStatus = serde_json::from_str("\"entregado\"").unwrap();
        assert_eq!(parsed, WorkOrderStatus::Entregado);
    }

    #[test]
    fn test_update_preserves_unset_dates() {
        let now = Utc::now();
        let mut order = WorkOrder {
            id: "wo-1".to_string(),
            numero: 7,
            customer_id: "c-1".to_string(),
            vehicle_id: "v-1".to_string(),
            estado: WorkOrderStatus::Recibido,
            fecha_entrada: now,
            fecha_inicio: None,
            fecha_fin: None,
            fecha_entrega: None,
            total: "50000".to_string(),
            created_at: now,
            updated_at: now,
        };

        WorkOrderUpdate {
            estado: Some(WorkOrderStatus::EnProceso),
            fecha_inicio: Some(now),
            ..Default::default()
        }
        .apply(&mut order);

        assert_eq!(order.estado, WorkOrderStatus::EnProceso);
        assert!(order.fecha_inicio.is_some());
        assert!(order.fecha_fin.is_none());
        assert_eq!(order.total, "50000");
    }
}
