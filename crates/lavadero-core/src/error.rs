//! # Error Types
//!
//! Domain-specific error types for lavadero-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  lavadero-core errors (this file)                                   │
//! │  ├── ValidationError  - Input validation failures                   │
//! │  └── CryptoError      - Hashing / encryption failures               │
//! │                                                                     │
//! │  lavadero-storage errors (separate crate)                           │
//! │  └── StorageError     - I/O, constraint, and engine failures        │
//! │                                                                     │
//! │  Flow: ValidationError rejects bad input BEFORE it reaches          │
//! │  storage; storage never re-validates business rules.                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field name, reason)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when a create/update payload doesn't meet requirements.
/// They are raised before the payload ever reaches a storage back end.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed decimal text, invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Crypto Error
// =============================================================================

/// Failures in the password-hashing and secret-encryption utilities.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Password hashing or hash parsing failed.
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// Symmetric encryption failed.
    #[error("encryption failed")]
    Encrypt,

    /// Symmetric decryption failed (wrong key, truncated or corrupt payload).
    #[error("decryption failed: {0}")]
    Decrypt(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
