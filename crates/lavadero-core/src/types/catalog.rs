//! The sellable catalog: categories, individual services, and combos
//! (bundles of services sold at a single total price).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Category
// =============================================================================

/// Which catalog a category applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Servicios,
    Productos,
    Ambos,
}

/// A catalog category. `activa` is business-level deactivation, not
/// storage-level deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub nombre: String,
    pub tipo: CategoryKind,
    pub color: Option<String>,
    pub activa: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub nombre: String,
    pub tipo: CategoryKind,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
    pub nombre: Option<String>,
    pub tipo: Option<CategoryKind>,
    pub color: Option<String>,
    pub activa: Option<bool>,
}

impl CategoryUpdate {
    pub fn apply(self, category: &mut Category) {
        if let Some(nombre) = self.nombre {
            category.nombre = nombre;
        }
        if let Some(tipo) = self.tipo {
            category.tipo = tipo;
        }
        if let Some(color) = self.color {
            category.color = Some(color);
        }
        if let Some(activa) = self.activa {
            category.activa = activa;
        }
        category.updated_at = Utc::now();
    }
}

// =============================================================================
// Service
// =============================================================================

/// A single washable service (e.g. "Lavado completo").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub nombre: String,
    /// Exact decimal text, preserved verbatim through every layer.
    pub precio: String,
    /// Expected duration in minutes.
    pub duracion_min: i64,
    pub categoria: Option<String>,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewService {
    pub nombre: String,
    pub precio: String,
    pub duracion_min: i64,
    #[serde(default)]
    pub categoria: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUpdate {
    pub nombre: Option<String>,
    pub precio: Option<String>,
    pub duracion_min: Option<i64>,
    pub categoria: Option<String>,
    pub activo: Option<bool>,
}

impl ServiceUpdate {
    pub fn apply(self, service: &mut Service) {
        if let Some(nombre) = self.nombre {
            service.nombre = nombre;
        }
        if let Some(precio) = self.precio {
            service.precio = precio;
        }
        if let Some(duracion_min) = self.duracion_min {
            service.duracion_min = duracion_min;
        }
        if let Some(categoria) = self.categoria {
            service.categoria = Some(categoria);
        }
        if let Some(activo) = self.activo {
            service.activo = activo;
        }
        service.updated_at = Utc::now();
    }
}

// =============================================================================
// Service Combo
// =============================================================================

/// A bundle of services sold at one total price.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ServiceCombo {
    pub id: String,
    pub nombre: String,
    /// Exact decimal text.
    pub precio_total: String,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewServiceCombo {
    pub nombre: String,
    pub precio_total: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceComboUpdate {
    pub nombre: Option<String>,
    pub precio_total: Option<String>,
    pub activo: Option<bool>,
}

impl ServiceComboUpdate {
    pub fn apply(self, combo: &mut ServiceCombo) {
        if let Some(nombre) = self.nombre {
            combo.nombre = nombre;
        }
        if let Some(precio_total) = self.precio_total {
            combo.precio_total = precio_total;
        }
        if let Some(activo) = self.activo {
            combo.activo = activo;
        }
        combo.updated_at = Utc::now();
    }
}

/// Bridge row linking a combo to one of its member services. Created and
/// deleted together with the combo, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ServiceComboItem {
    pub id: String,
    pub combo_id: String,
    pub service_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
