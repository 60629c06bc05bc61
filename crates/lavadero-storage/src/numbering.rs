//! Invoice number formatting shared by both back ends.
//!
//! Invoice numbers are `EEE-PPP-NNNNNNN`: the company configuration's
//! establecimiento and punto de expedición, then a seven-digit sequence.
//! When no configuration exists yet, both prefix segments fall back to `001`.

/// Default establecimiento / punto de expedición segment.
pub(crate) const DEFAULT_SEGMENT: &str = "001";

/// Formats an invoice number from its three segments.
pub(crate) fn format_invoice_number(establecimiento: &str, punto_expedicion: &str, seq: i64) -> String {
    format!("{establecimiento}-{punto_expedicion}-{seq:07}")
}

/// Highest sequence found across existing invoice numbers.
///
/// The sequence is the segment after the last `-`; numbers that do not parse
/// (hand-entered, legacy) are skipped rather than treated as errors.
pub(crate) fn max_invoice_seq<'a>(numbers: impl Iterator<Item = &'a str>) -> i64 {
    numbers
        .filter_map(|n| n.rsplit('-').next())
        .filter_map(|seq| seq.parse::<i64>().ok())
        .max()
        .unwrap_or(0)
}
