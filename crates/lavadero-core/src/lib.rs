//! # lavadero-core: Pure Domain Logic for Lavadero POS
//!
//! This crate holds the domain model of the car-wash point of sale as pure
//! code with zero I/O dependencies: entity types, input validation, exact
//! decimal text arithmetic, and the password/secret cryptography utilities.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Lavadero POS Architecture                        │
//! │                                                                     │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │                   Request handlers (external)                │   │
//! │  │     parse input ──► validate ──► one storage call            │   │
//! │  └─────────────────────────────┬───────────────────────────────┘   │
//! │                                │                                    │
//! │  ┌─────────────────────────────▼───────────────────────────────┐   │
//! │  │              ★ lavadero-core (THIS CRATE) ★                  │   │
//! │  │                                                             │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │  types  │  │ decimal │  │ validation │  │  crypto   │  │   │
//! │  │   │ entities│  │  exact  │  │   rules    │  │ argon2 +  │  │   │
//! │  │   │ payloads│  │  text   │  │   checks   │  │ AES-GCM   │  │   │
//! │  │   └─────────┘  └─────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                             │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                          │   │
//! │  └─────────────────────────────┬───────────────────────────────┘   │
//! │                                │                                    │
//! │  ┌─────────────────────────────▼───────────────────────────────┐   │
//! │  │               lavadero-storage (back ends)                    │   │
//! │  │        JSON-file store          SQLite store                  │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entity records, create payloads, partial updates
//! - [`decimal`] - Exact decimal-as-text arithmetic (no floating point!)
//! - [`validation`] - Business rule validation
//! - [`crypto`] - Password hashing and secret encryption
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure**: no database, network, or file system access in this crate
//! 2. **Decimal text**: monetary values stay exact decimal strings end to end
//! 3. **Explicit Errors**: all errors are typed, never strings or panics
//! 4. **Secrets stay secret**: plaintext passwords and tokens never leave the
//!    crypto boundary - callers see hashes, ciphertext, or `Safe*` projections

// =============================================================================
// Module Declarations
// =============================================================================

pub mod crypto;
pub mod decimal;
pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use lavadero_core::User` instead of
// `use lavadero_core::types::User`

pub use crypto::{hash_password, verify_password, SecretCipher};
pub use error::{CryptoError, ValidationError, ValidationResult};
pub use types::*;
