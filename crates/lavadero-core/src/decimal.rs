//! # Decimal-as-Text Module
//!
//! Exact-precision arithmetic for monetary values carried as decimal text.
//!
//! ## Why Text Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                         │
//! │                                                                     │
//! │  In binary floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                       │
//! │                                                                     │
//! │  OUR SOLUTION: the storage layer carries every price and total      │
//! │  as the exact decimal string the caller wrote ("123.45"), at        │
//! │  every layer - input, persistence, output. Arithmetic, when a       │
//! │  derived total is needed, happens on scaled integers.               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lavadero_core::decimal;
//!
//! assert!(decimal::is_valid("123.45"));
//! assert_eq!(decimal::add("0.1", "0.2").unwrap(), "0.3");
//! assert_eq!(decimal::mul("2.50", 3).unwrap(), "7.50");
//! ```
//!
//! The storage layer itself only validates ([`is_valid`] / [`validate`]) -
//! it persists amounts verbatim and never derives totals. [`add`], [`mul`],
//! and [`sum`] exist for the consumers that do (line totals, tax breakdowns)
//! so that arithmetic stays off binary floats on their side too.

use crate::error::{ValidationError, ValidationResult};

/// Maximum fractional digits accepted in a decimal string.
///
/// Guaraní amounts have zero, foreign-currency amounts two; eight leaves
/// headroom without risking i128 overflow in intermediate products.
pub const MAX_SCALE: u32 = 8;

// =============================================================================
// Parsing
// =============================================================================

/// A decimal string parsed into scaled-integer form: `units * 10^-scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Scaled {
    units: i128,
    scale: u32,
}

/// Parses decimal text into scaled-integer form.
///
/// Accepts an optional leading `-`, digits, and at most one `.` with at
/// least one digit on each side. Rejects exponents, signs elsewhere,
/// thousands separators, and anything non-ASCII-numeric.
fn parse(text: &str) -> Option<Scaled> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    if digits.is_empty() {
        return None;
    }

    let (int_part, frac_part, has_dot) = match digits.split_once('.') {
        Some((i, f)) => (i, f, true),
        None => (digits, "", false),
    };

    if int_part.is_empty() || (has_dot && frac_part.is_empty()) {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let scale = frac_part.len() as u32;
    if scale > MAX_SCALE {
        return None;
    }

    let mut units: i128 = 0;
    for b in int_part.bytes().chain(frac_part.bytes()) {
        units = units.checked_mul(10)?.checked_add((b - b'0') as i128)?;
    }
    if negative {
        units = -units;
    }

    Some(Scaled { units, scale })
}

/// Formats scaled-integer form back into decimal text at the given scale.
fn format(units: i128, scale: u32) -> String {
    if scale == 0 {
        return units.to_string();
    }
    let sign = if units < 0 { "-" } else { "" };
    let abs = units.unsigned_abs();
    let divisor = 10u128.pow(scale);
    let int_part = abs / divisor;
    let frac_part = abs % divisor;
    format!(
        "{}{}.{:0width$}",
        sign,
        int_part,
        frac_part,
        width = scale as usize
    )
}

/// Rescales to a larger scale (multiplies units by the scale difference).
fn rescale(value: Scaled, scale: u32) -> Option<Scaled> {
    debug_assert!(scale >= value.scale);
    let factor = 10i128.checked_pow(scale - value.scale)?;
    Some(Scaled {
        units: value.units.checked_mul(factor)?,
        scale,
    })
}

// =============================================================================
// Public API
// =============================================================================

/// Checks whether `text` is well-formed decimal text.
pub fn is_valid(text: &str) -> bool {
    parse(text).is_some()
}

/// Validates decimal text for a named input field.
pub fn validate(field: &str, text: &str) -> ValidationResult<()> {
    if text.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if !is_valid(text) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be exact decimal text, e.g. \"123.45\"".to_string(),
        });
    }
    Ok(())
}

/// Adds two decimal strings exactly.
///
/// The result carries the larger of the two input scales, so
/// `add("0.1", "0.25")` is `"0.35"` and `add("1", "2")` is `"3"`.
/// Returns `None` on malformed input or overflow.
pub fn add(a: &str, b: &str) -> Option<String> {
    let a = parse(a)?;
    let b = parse(b)?;
    let scale = a.scale.max(b.scale);
    let a = rescale(a, scale)?;
    let b = rescale(b, scale)?;
    Some(format(a.units.checked_add(b.units)?, scale))
}

/// Multiplies a decimal string by an integer quantity, exactly.
pub fn mul(a: &str, qty: i64) -> Option<String> {
    let a = parse(a)?;
    Some(format(a.units.checked_mul(qty as i128)?, a.scale))
}

/// Sums an iterator of decimal strings; `"0"` for an empty iterator.
pub fn sum<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut total = "0".to_string();
    for value in values {
        total = add(&total, value)?;
    }
    Some(total)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid() {
        assert!(is_valid("0"));
        assert!(is_valid("123.45"));
        assert!(is_valid("-5.50"));
        assert!(is_valid("150000"));

        assert!(!is_valid(""));
        assert!(!is_valid("."));
        assert!(!is_valid("12."));
        assert!(!is_valid(".5"));
        assert!(!is_valid("1,5"));
        assert!(!is_valid("1e3"));
        assert!(!is_valid("12.3.4"));
        assert!(!is_valid("--1"));
        assert!(!is_valid("0.123456789")); // beyond MAX_SCALE
    }

    #[test]
    fn test_add_exact() {
        // The motivating case: no binary floating point anywhere.
        assert_eq!(add("0.1", "0.2").unwrap(), "0.3");
        assert_eq!(add("123.45", "0.55").unwrap(), "124.00");
        assert_eq!(add("1", "2").unwrap(), "3");
        assert_eq!(add("10", "-2.5").unwrap(), "7.5");
        assert!(add("abc", "1").is_none());
    }

    #[test]
    fn test_mul_preserves_scale() {
        assert_eq!(mul("2.50", 3).unwrap(), "7.50");
        assert_eq!(mul("15000", 2).unwrap(), "30000");
        assert_eq!(mul("-1.25", 4).unwrap(), "-5.00");
    }

    #[test]
    fn test_sum() {
        assert_eq!(sum(["1.10", "2.20", "3.30"]).unwrap(), "6.60");
        assert_eq!(sum([]).unwrap(), "0");
    }

    #[test]
    fn test_validate_reports_field() {
        let err = validate("precio", "12,5").unwrap_err();
        assert!(err.to_string().contains("precio"));
        assert!(validate("precio", "12.5").is_ok());
        assert!(matches!(
            validate("precio", ""),
            Err(ValidationError::Required { .. })
        ));
    }
}
