//! # Validation Module
//!
//! Input validation for every create payload.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                               │
//! │                                                                     │
//! │  Layer 1: Request handler                                           │
//! │  ├── Type validation (deserialization)                              │
//! │  └── THIS MODULE: business rule validation                          │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 2: Storage back end                                          │
//! │  ├── UNIQUE constraints (username, numero, numero_factura)          │
//! │  └── Foreign key constraints (SQL back end)                         │
//! │                                                                     │
//! │  Storage never re-validates business rules: a payload that passes   │
//! │  this module is assumed well-formed by both back ends.              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use lavadero_core::validation::{validate_username, validate_decimal_text};
//!
//! validate_username("admin").unwrap();
//! validate_decimal_text("precio", "123.45").unwrap();
//! ```

use crate::decimal;
use crate::error::{ValidationError, ValidationResult};
use crate::types::{
    NewCategory, NewCompanyConfig, NewCustomer, NewDnitConfig, NewInventoryItem, NewSale,
    NewSaleItem, NewService, NewServiceCombo, NewUser, NewVehicle, NewWorkOrder, NewWorkOrderItem,
};

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a login name.
///
/// ## Rules
/// - 3 to 50 characters after trimming
/// - Letters, numbers, dots, hyphens, underscores only
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    if username.len() < 3 {
        return Err(ValidationError::OutOfRange {
            field: "username".to_string(),
            min: 3,
            max: 50,
        });
    }

    if username.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 50,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, dots, hyphens, and underscores"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a plaintext password before it gets hashed.
///
/// ## Rules
/// - At least 6 characters
/// - At most 128 characters
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.len() < 6 {
        return Err(ValidationError::OutOfRange {
            field: "password".to_string(),
            min: 6,
            max: 128,
        });
    }

    if password.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }

    Ok(())
}

/// Validates a display name (`nombre`, `razon_social`, ...).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates decimal text (see [`crate::decimal`]).
pub fn validate_decimal_text(field: &str, text: &str) -> ValidationResult<()> {
    decimal::validate(field, text)
}

/// Validates a quantity: must be positive.
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a stock count: zero is fine, negative is not.
pub fn validate_stock(field: &str, stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a required opaque identifier reference (customer_id, ...).
pub fn validate_id_ref(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Payload Validators
// =============================================================================

pub fn validate_new_user(input: &NewUser) -> ValidationResult<()> {
    validate_username(&input.username)?;
    validate_password(&input.password)?;
    if input.monthly_invoice_limit < 0 {
        return Err(ValidationError::OutOfRange {
            field: "monthlyInvoiceLimit".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

pub fn validate_new_company_config(input: &NewCompanyConfig) -> ValidationResult<()> {
    validate_name("ruc", &input.ruc)?;
    validate_name("razonSocial", &input.razon_social)?;
    validate_name("timbrado", &input.timbrado)?;
    validate_name("establecimiento", &input.establecimiento)?;
    validate_name("puntoExpedicion", &input.punto_expedicion)?;
    validate_name("moneda", &input.moneda)?;
    Ok(())
}

pub fn validate_new_dnit_config(input: &NewDnitConfig) -> ValidationResult<()> {
    if input.endpoint_url.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "endpointUrl".to_string(),
        });
    }
    Ok(())
}

pub fn validate_new_category(input: &NewCategory) -> ValidationResult<()> {
    validate_name("nombre", &input.nombre)
}

pub fn validate_new_customer(input: &NewCustomer) -> ValidationResult<()> {
    validate_name("nombre", &input.nombre)?;
    validate_name("docNumero", &input.doc_numero)?;
    Ok(())
}

pub fn validate_new_vehicle(input: &NewVehicle) -> ValidationResult<()> {
    validate_id_ref("customerId", &input.customer_id)?;
    validate_name("placa", &input.placa)?;
    validate_name("marca", &input.marca)?;
    validate_name("modelo", &input.modelo)?;
    Ok(())
}

pub fn validate_new_service(input: &NewService) -> ValidationResult<()> {
    validate_name("nombre", &input.nombre)?;
    validate_decimal_text("precio", &input.precio)?;
    validate_quantity("duracionMin", input.duracion_min)?;
    Ok(())
}

/// Validates a combo payload together with its member service ids.
pub fn validate_new_service_combo(
    input: &NewServiceCombo,
    service_ids: &[String],
) -> ValidationResult<()> {
    validate_name("nombre", &input.nombre)?;
    validate_decimal_text("precioTotal", &input.precio_total)?;
    if service_ids.is_empty() {
        return Err(ValidationError::Required {
            field: "serviceIds".to_string(),
        });
    }
    for id in service_ids {
        validate_id_ref("serviceIds", id)?;
    }
    Ok(())
}

pub fn validate_new_inventory_item(input: &NewInventoryItem) -> ValidationResult<()> {
    validate_name("nombre", &input.nombre)?;
    validate_decimal_text("precio", &input.precio)?;
    validate_stock("stockActual", input.stock_actual)?;
    validate_stock("stockMinimo", input.stock_minimo)?;
    Ok(())
}

pub fn validate_new_work_order(input: &NewWorkOrder) -> ValidationResult<()> {
    validate_id_ref("customerId", &input.customer_id)?;
    validate_id_ref("vehicleId", &input.vehicle_id)?;
    validate_decimal_text("total", &input.total)?;
    Ok(())
}

pub fn validate_new_work_order_item(input: &NewWorkOrderItem) -> ValidationResult<()> {
    validate_id_ref("workOrderId", &input.work_order_id)?;
    validate_name("nombre", &input.nombre)?;
    validate_decimal_text("precio", &input.precio)?;
    validate_quantity("cantidad", input.cantidad)?;
    Ok(())
}

/// Validates a sale payload together with its line items.
pub fn validate_new_sale(input: &NewSale, items: &[NewSaleItem]) -> ValidationResult<()> {
    validate_decimal_text("subtotal", &input.subtotal)?;
    validate_decimal_text("impuestos", &input.impuestos)?;
    validate_decimal_text("total", &input.total)?;
    for item in items {
        validate_name("nombre", &item.nombre)?;
        validate_quantity("cantidad", item.cantidad)?;
        validate_decimal_text("precioUnitario", &item.precio_unitario)?;
        validate_decimal_text("subtotal", &item.subtotal)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CategoryKind, DocType, PaymentMethod};

    #[test]
    fn test_validate_username() {
        assert!(validate_username("admin").is_ok());
        assert!(validate_username("maria.gonzalez").is_ok());

        assert!(validate_username("").is_err());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"a".repeat(60)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret123").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"x".repeat(200)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("nombre", "Lavado Premium").is_ok());
        assert!(validate_name("nombre", "   ").is_err());
        assert!(validate_name("nombre", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_new_service() {
        let mut input = NewService {
            nombre: "Lavado completo".to_string(),
            precio: "50000".to_string(),
            duracion_min: 45,
            categoria: None,
        };
        assert!(validate_new_service(&input).is_ok());

        input.precio = "12.3.4".to_string();
        assert!(validate_new_service(&input).is_err());

        input.precio = "50000".to_string();
        input.duracion_min = 0;
        assert!(validate_new_service(&input).is_err());
    }

    #[test]
    fn test_validate_new_combo_requires_services() {
        let input = NewServiceCombo {
            nombre: "Combo full".to_string(),
            precio_total: "80000".to_string(),
        };
        assert!(validate_new_service_combo(&input, &[]).is_err());
        assert!(validate_new_service_combo(&input, &["s-1".to_string()]).is_ok());
    }

    #[test]
    fn test_validate_new_customer() {
        let input = NewCustomer {
            nombre: "Juan Pérez".to_string(),
            doc_tipo: DocType::Ci,
            doc_numero: "1234567".to_string(),
            regimen_turismo: false,
            pais: None,
            pasaporte: None,
        };
        assert!(validate_new_customer(&input).is_ok());

        let bad = NewCustomer {
            doc_numero: "".to_string(),
            ..input
        };
        assert!(validate_new_customer(&bad).is_err());
    }

    #[test]
    fn test_validate_new_category() {
        let input = NewCategory {
            nombre: "Lavados".to_string(),
            tipo: CategoryKind::Servicios,
            color: None,
        };
        assert!(validate_new_category(&input).is_ok());
    }

    #[test]
    fn test_validate_new_sale_checks_items() {
        let sale = NewSale {
            numero_factura: None,
            customer_id: None,
            work_order_id: None,
            subtotal: "100000".to_string(),
            impuestos: "9091".to_string(),
            total: "100000".to_string(),
            medio_pago: PaymentMethod::Efectivo,
            timbrado_usado: None,
            created_by: None,
        };
        let good = NewSaleItem {
            service_id: Some("s-1".to_string()),
            combo_id: None,
            inventory_item_id: None,
            nombre: "Lavado".to_string(),
            cantidad: 2,
            precio_unitario: "50000".to_string(),
            subtotal: "100000".to_string(),
        };
        assert!(validate_new_sale(&sale, std::slice::from_ref(&good)).is_ok());

        let bad = NewSaleItem {
            cantidad: 0,
            ..good
        };
        assert!(validate_new_sale(&sale, &[bad]).is_err());
    }
}
