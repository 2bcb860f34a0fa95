//! Property tests for identifier generation and the printable predicate

use std::collections::HashSet;

use proptest::prelude::*;
use softphone_sip_core::unique::{fill_hex, generate_guid, generate_hex, random_hex, HEX_ID_LEN};
use softphone_sip_core::validation::{has_only_printables, is_printable_byte};

proptest! {
    #[test]
    fn generated_tokens_are_printable_lower_hex(salt in any::<usize>()) {
        let token = generate_hex(Some(salt));
        prop_assert_eq!(token.len(), HEX_ID_LEN);
        prop_assert!(token.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
        prop_assert!(has_only_printables(Some(token.as_bytes())));
    }

    #[test]
    fn same_salt_still_yields_fresh_tokens(salt in any::<usize>(), count in 2usize..64) {
        let tokens: HashSet<String> = (0..count).map(|_| generate_hex(Some(salt))).collect();
        prop_assert_eq!(tokens.len(), count);
    }

    #[test]
    fn random_hex_length_is_clamped(len in 0usize..256) {
        prop_assert_eq!(random_hex(len).len(), len.min(HEX_ID_LEN));
    }

    #[test]
    fn fill_hex_overwrites_every_byte(salt in any::<usize>()) {
        let mut buf = [0u8; HEX_ID_LEN];
        fill_hex(&mut buf, Some(salt));
        prop_assert!(buf.iter().all(|&b| b != 0));
    }

    #[test]
    fn guids_with_same_salt_differ(salt in any::<usize>()) {
        prop_assert_ne!(generate_guid(Some(salt)), generate_guid(Some(salt)));
    }

    #[test]
    fn predicate_matches_bytewise_definition(bytes in proptest::collection::vec(any::<u8>(), 0..48)) {
        let expected = !bytes.is_empty() && bytes.iter().all(|b| (0x21..=0x7e).contains(b));
        prop_assert_eq!(has_only_printables(Some(bytes.as_slice())), expected);
    }

    #[test]
    fn any_space_or_control_byte_fails(prefix in "[!-~]{0,8}", bad in prop_oneof![0u8..=0x20, 0x7fu8..=0xff], suffix in "[!-~]{0,8}") {
        let mut bytes = prefix.into_bytes();
        bytes.push(bad);
        bytes.extend_from_slice(suffix.as_bytes());
        prop_assert!(!is_printable_byte(bad));
        prop_assert!(!has_only_printables(Some(bytes.as_slice())));
    }
}
