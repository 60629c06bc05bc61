//! Customers and their vehicles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Customer
// =============================================================================

/// Identity document type of a customer.
///
/// Wire values keep their official spelling, not snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum DocType {
    #[serde(rename = "CI")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "CI"))]
    Ci,
    Pasaporte,
    #[serde(rename = "RUC")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "RUC"))]
    Ruc,
    Extranjero,
}

/// A customer of the car wash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub nombre: String,
    pub doc_tipo: DocType,
    pub doc_numero: String,
    /// Tourism tax regime (affects invoicing of foreign customers).
    pub regimen_turismo: bool,
    pub pais: Option<String>,
    pub pasaporte: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub nombre: String,
    pub doc_tipo: DocType,
    pub doc_numero: String,
    #[serde(default)]
    pub regimen_turismo: bool,
    #[serde(default)]
    pub pais: Option<String>,
    #[serde(default)]
    pub pasaporte: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdate {
    pub nombre: Option<String>,
    pub doc_tipo: Option<DocType>,
    pub doc_numero: Option<String>,
    pub regimen_turismo: Option<bool>,
    pub pais: Option<String>,
    pub pasaporte: Option<String>,
}

impl CustomerUpdate {
    pub fn apply(self, customer: &mut Customer) {
        if let Some(nombre) = self.nombre {
            customer.nombre = nombre;
        }
        if let Some(doc_tipo) = self.doc_tipo {
            customer.doc_tipo = doc_tipo;
        }
        if let Some(doc_numero) = self.doc_numero {
            customer.doc_numero = doc_numero;
        }
        if let Some(regimen_turismo) = self.regimen_turismo {
            customer.regimen_turismo = regimen_turismo;
        }
        if let Some(pais) = self.pais {
            customer.pais = Some(pais);
        }
        if let Some(pasaporte) = self.pasaporte {
            customer.pasaporte = Some(pasaporte);
        }
        customer.updated_at = Utc::now();
    }
}

// =============================================================================
// Vehicle
// =============================================================================

/// A vehicle, always owned by a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    /// Must reference an existing customer.
    pub customer_id: String,
    pub placa: String,
    pub marca: String,
    pub modelo: String,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVehicle {
    pub customer_id: String,
    pub placa: String,
    pub marca: String,
    pub modelo: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleUpdate {
    pub placa: Option<String>,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub color: Option<String>,
}

impl VehicleUpdate {
    pub fn apply(self, vehicle: &mut Vehicle) {
        if let Some(placa) = self.placa {
            vehicle.placa = placa;
        }
        if let Some(marca) = self.marca {
            vehicle.marca = marca;
        }
        if let Some(modelo) = self.modelo {
            vehicle.modelo = modelo;
        }
        if let Some(color) = self.color {
            vehicle.color = Some(color);
        }
        vehicle.updated_at = Utc::now();
    }
}
