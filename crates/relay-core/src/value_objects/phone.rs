//! Phone number normalization.
//!
//! Providers send sender numbers in several forms (`+91 98765-43210`,
//! `919876543210`, `whatsapp:+91...`). Contact identity is keyed on the
//! digits alone.

/// Strip every non-digit character. Returns `None` when no digit remains.
pub fn normalize_phone_digits(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}
