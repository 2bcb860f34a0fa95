//! Unique identifier generation
//!
//! Produces the tokens used for `Call-ID` values and `Via` branch suffixes:
//! 32 lowercase hex characters derived from the wall clock, a caller salt and
//! a process-wide counter, run through a xorshift mixer.
//!
//! **Not cryptographically secure.** The output is unique with very high
//! probability inside a process, but it is predictable to anyone who knows
//! the clock and the counter. Do not use it for nonces, anti-spoofing tags or
//! anything else where an attacker must not guess the next value.
//!
//! # Examples
//!
//! ```rust
//! use softphone_sip_core::unique::{generate_hex, random_hex, HEX_ID_LEN};
//!
//! let token = generate_hex(None);
//! assert_eq!(token.len(), HEX_ID_LEN);
//! assert!(token.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
//!
//! assert_eq!(random_hex(8).len(), 8);
//! assert_eq!(random_hex(100).len(), HEX_ID_LEN);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Length of a generated hex token
pub const HEX_ID_LEN: usize = 32;

/// Length of a generated GUID in bytes
pub const GUID_LEN: usize = 16;

/// Odd 64-bit constant derived from the golden ratio
const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Wall clock as `seconds << 32 | milliseconds`
fn clock_word() -> u64 {
    let now = Utc::now();
    ((now.timestamp() as u64) << 32) | u64::from(now.timestamp_subsec_millis())
}

#[inline]
fn xorshift(mut x: u64) -> u64 {
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x
}

/// Initial mixer state for one token
fn seed(salt: usize) -> u64 {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
    let state = xorshift(clock_word() ^ salt as u64 ^ n.wrapping_mul(GOLDEN_GAMMA));
    // zero is a fixed point of xorshift
    if state == 0 {
        GOLDEN_GAMMA
    } else {
        state
    }
}

/// Fill `out` with 32 lowercase hex characters
///
/// Without a salt the address of `out` is used, which keeps concurrently
/// built buffers apart even when the clock and counter race.
pub fn fill_hex(out: &mut [u8; HEX_ID_LEN], salt: Option<usize>) {
    let salt = salt.unwrap_or(out.as_ptr() as usize);
    let mut state = seed(salt);
    for slot in out.iter_mut() {
        state = xorshift(state);
        *slot = HEX_DIGITS[(state & 0x0f) as usize];
    }
}

/// Generate a 32-character lowercase hex token
pub fn generate_hex(salt: Option<usize>) -> String {
    let mut buf = [0u8; HEX_ID_LEN];
    fill_hex(&mut buf, salt);
    buf.iter().map(|&b| char::from(b)).collect()
}

/// Generate a hex token of `len` characters, clamped to [`HEX_ID_LEN`]
pub fn random_hex(len: usize) -> String {
    let mut token = generate_hex(None);
    token.truncate(len.min(HEX_ID_LEN));
    token
}

/// Generate 16 raw bytes with the same mixer, for binary identifiers
pub fn generate_guid(salt: Option<usize>) -> [u8; GUID_LEN] {
    let mut out = [0u8; GUID_LEN];
    let salt = salt.unwrap_or(out.as_ptr() as usize);
    let mut state = seed(salt);
    for byte in out.iter_mut() {
        state = xorshift(state);
        *byte = (state & 0xff) as u8;
    }
    out
}

/// Source of unique strings for the wrapped SIP stack
///
/// The stack normally generates its own Call-IDs, tags and branches. Handing
/// it an `IdGenerator` through its endpoint configuration replaces those
/// routines without patching the stack.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// A fresh 32-character token
    fn unique_string(&self) -> String;

    /// A fresh token of at most `len` characters
    fn random_string(&self, len: usize) -> String;

    /// A fresh 16-byte binary identifier
    fn guid(&self) -> [u8; GUID_LEN];
}

/// The default [`IdGenerator`], backed by [`generate_hex`] and [`generate_guid`]
#[derive(Debug, Default, Clone, Copy)]
pub struct HexIdGenerator;

impl IdGenerator for HexIdGenerator {
    fn unique_string(&self) -> String {
        generate_hex(None)
    }

    fn random_string(&self, len: usize) -> String {
        random_hex(len)
    }

    fn guid(&self) -> [u8; GUID_LEN] {
        generate_guid(None)
    }
}
