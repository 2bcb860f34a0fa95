//! Printable-token checks
//!
//! A token is usable on the wire when it is present, non-empty and made of
//! visible ASCII only (`0x21..=0x7E`). Anything else, including a space,
//! is treated as a defect.

/// Lowest visible ASCII byte (`!`)
pub const PRINTABLE_MIN: u8 = 0x21;

/// Highest visible ASCII byte (`~`)
pub const PRINTABLE_MAX: u8 = 0x7E;

/// Whether a single byte is visible ASCII
#[inline]
pub fn is_printable_byte(byte: u8) -> bool {
    (PRINTABLE_MIN..=PRINTABLE_MAX).contains(&byte)
}

/// Whether `value` is a non-empty run of visible ASCII
///
/// `None` stands for a token that was never set.
///
/// ```rust
/// use softphone_sip_core::validation::has_only_printables;
///
/// assert!(has_only_printables(Some(b"a84b4c76e66710")));
/// assert!(!has_only_printables(Some(b"")));
/// assert!(!has_only_printables(Some(b"two words")));
/// assert!(!has_only_printables(None));
/// ```
pub fn has_only_printables(value: Option<&[u8]>) -> bool {
    match value {
        Some(bytes) if !bytes.is_empty() => bytes.iter().all(|&b| is_printable_byte(b)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert!(!is_printable_byte(0x20));
        assert!(is_printable_byte(0x21));
        assert!(is_printable_byte(0x7E));
        assert!(!is_printable_byte(0x7F));
        assert!(!is_printable_byte(0x00));
        assert!(!is_printable_byte(0xFF));
    }

    #[test]
    fn test_rejects_control_and_high_bytes() {
        assert!(!has_only_printables(Some(b"abc\r\n")));
        assert!(!has_only_printables(Some(&[0x61, 0x00, 0x62])));
        assert!(!has_only_printables(Some(&[0xC3, 0xA9])));
    }

    #[test]
    fn test_accepts_full_visible_range() {
        let all: Vec<u8> = (PRINTABLE_MIN..=PRINTABLE_MAX).collect();
        assert!(has_only_printables(Some(&all)));
        assert!(has_only_printables(Some(b"z9hG4bK776asdhds")));
    }
}
