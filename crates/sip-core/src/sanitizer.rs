//! TX sanitizer stage
//!
//! Some stack builds emit requests whose `Call-ID` or top `Via` branch is
//! empty or full of non-printable bytes. Registrars drop such requests or,
//! worse, match them to the wrong transaction. [`TxSanitizer`] sits right
//! after the transaction layer and repairs those two fields in place:
//!
//! - `Call-ID` that fails [`has_only_printables`] gets a fresh 32-hex token
//! - a `Via` branch that fails it becomes `z9hG4bK` + 32 hex (39 bytes)
//!
//! Nothing else is inspected. Responses pass through untouched and the stage
//! never fails a send: a message it cannot repair goes out as it is.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info};

use crate::error::Result;
use crate::message::TxData;
use crate::pipeline::{TxModule, PRIORITY_TSX_LAYER};
use crate::unique::{fill_hex, HEX_ID_LEN};
use crate::validation::has_only_printables;

/// RFC 3261 branch prefix
pub const MAGIC_COOKIE: &str = "z9hG4bK";

/// Length of a synthesized branch
pub const BRANCH_LEN: usize = MAGIC_COOKIE.len() + HEX_ID_LEN;

/// Name the stage registers under
pub const SANITIZER_MODULE_NAME: &str = "mod-tx-sanitize";

/// Runs right after the transaction layer
pub const SANITIZER_PRIORITY: u32 = PRIORITY_TSX_LAYER + 1;

/// What a sanitizer pass did to one message
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeReport {
    pub call_id_fixed: bool,
    pub branch_fixed: bool,
    /// A field needed repair but the message had no pool to repair it with
    pub skipped: bool,
}

impl SanitizeReport {
    pub fn touched(&self) -> bool {
        self.call_id_fixed || self.branch_fixed
    }
}

/// Build `z9hG4bK` followed by 32 hex characters
pub fn make_branch(salt: Option<usize>) -> [u8; BRANCH_LEN] {
    let mut hex = [0u8; HEX_ID_LEN];
    fill_hex(&mut hex, salt);

    let mut branch = [0u8; BRANCH_LEN];
    branch[..MAGIC_COOKIE.len()].copy_from_slice(MAGIC_COOKIE.as_bytes());
    branch[MAGIC_COOKIE.len()..].copy_from_slice(&hex);
    branch
}

/// Repair `Call-ID` and the top `Via` branch of an outbound request
pub fn sanitize_request(tdata: &mut TxData) -> SanitizeReport {
    let mut report = SanitizeReport::default();

    let (msg, pool) = match (tdata.msg.as_mut(), tdata.pool.as_mut()) {
        (Some(msg), Some(pool)) => (msg, pool),
        (Some(msg), None) => {
            let bad_call_id = msg
                .call_id()
                .map(|id| !has_only_printables(id.value()))
                .unwrap_or(false);
            let bad_branch = msg
                .via()
                .map(|via| !has_only_printables(via.branch()))
                .unwrap_or(false);
            if bad_call_id || bad_branch {
                report.skipped = true;
                debug!(
                    tdata = %tdata.info,
                    bad_call_id, bad_branch, "sanitizer skipped: message has no pool"
                );
            }
            return report;
        }
        _ => return report,
    };
    let salt = pool.salt();

    if let Some(call_id) = msg.call_id_mut() {
        if !has_only_printables(call_id.value()) {
            let mut id = [0u8; HEX_ID_LEN];
            fill_hex(&mut id, Some(salt));
            call_id.set(pool.strdup(&id));
            report.call_id_fixed = true;
            info!("sanitizer: fixed Call-ID -> {}", call_id);
        }
    }

    if let Some(via) = msg.via_mut() {
        if !has_only_printables(via.branch()) {
            let branch = make_branch(Some(salt));
            via.set_branch(pool.strdup(&branch));
            report.branch_fixed = true;
            info!(
                "sanitizer: fixed Via branch -> {}",
                via.branch_str().unwrap_or_default()
            );
        }
    }

    report
}

/// The sanitizer as a pipeline stage
///
/// Keeps running totals so the owner can tell how often the wrapped stack
/// produced broken identifiers.
#[derive(Debug, Default)]
pub struct TxSanitizer {
    call_ids_fixed: AtomicU64,
    branches_fixed: AtomicU64,
}

impl TxSanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `Call-ID` values replaced so far
    pub fn call_ids_fixed(&self) -> u64 {
        self.call_ids_fixed.load(Ordering::Relaxed)
    }

    /// Number of branch values replaced so far
    pub fn branches_fixed(&self) -> u64 {
        self.branches_fixed.load(Ordering::Relaxed)
    }
}

impl TxModule for TxSanitizer {
    fn name(&self) -> &str {
        SANITIZER_MODULE_NAME
    }

    fn priority(&self) -> u32 {
        SANITIZER_PRIORITY
    }

    fn on_tx_request(&self, tdata: &mut TxData) -> Result<()> {
        let report = sanitize_request(tdata);
        if report.call_id_fixed {
            self.call_ids_fixed.fetch_add(1, Ordering::Relaxed);
        }
        if report.branch_fixed {
            self.branches_fixed.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    fn on_tx_response(&self, _tdata: &mut TxData) -> Result<()> {
        Ok(())
    }
}
