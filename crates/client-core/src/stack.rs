//! The seam to the wrapped SIP stack
//!
//! The client never reaches into the stack's internals. Everything it needs
//! is expressed by [`SipStack`]: library bootstrap, transports, a single
//! account's lifecycle, and the endpoint's module registry where the TX
//! sanitizer is installed.
//!
//! ```text
//!   SoftphoneClient ──► SipStack ──► EndpointHandle ──► TxPipeline
//!          ▲                │
//!          └── AccountObserver ◄── reg-state events (stack worker)
//! ```
//!
//! Identifier generation is handed to the stack through
//! [`EndpointConfig::id_generator`] instead of replacing the stack's own
//! routines at link time.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use thiserror::Error;

use softphone_sip_core::{HexIdGenerator, IdGenerator, ModuleId, TxModule, TxPipeline};

use crate::account::AccountConfig;
use crate::transport::{TransportConfig, TransportId, TransportInfo, TransportKind};

/// Identifier the stack assigns to an account
pub type AccountId = i32;

/// Result type for stack calls
pub type StackResult<T> = Result<T, StackError>;

/// A failure reported by the wrapped stack
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{title} failed: {reason} (status={status})")]
pub struct StackError {
    /// Library status code
    pub status: i32,
    /// Operation that failed
    pub title: String,
    /// Library's description of the failure
    pub reason: String,
}

impl StackError {
    pub fn new(status: i32, title: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            status,
            title: title.into(),
            reason: reason.into(),
        }
    }
}

/// Endpoint settings applied at library init
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Stack log verbosity, 0 (fatal) to 6 (trace)
    pub log_level: u32,
    /// Console log verbosity
    pub console_level: u32,
    pub user_agent: String,
    pub max_calls: u32,
    /// Source of Call-IDs, tags and branches
    pub id_generator: Arc<dyn IdGenerator>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            log_level: 3,
            console_level: 3,
            user_agent: "Softphone/1.0".to_string(),
            max_calls: 4,
            id_generator: Arc::new(HexIdGenerator),
        }
    }
}

impl EndpointConfig {
    /// Set both log levels
    pub fn with_log_level(mut self, level: u32) -> Self {
        self.log_level = level;
        self.console_level = level;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_max_calls(mut self, max_calls: u32) -> Self {
        self.max_calls = max_calls;
        self
    }

    pub fn with_id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = id_generator;
        self
    }
}

/// Handle to a live endpoint's module registry
///
/// Cloning shares the same pipeline; the handle stays valid only as long as
/// the stack keeps that endpoint alive.
#[derive(Clone, Debug)]
pub struct EndpointHandle {
    pipeline: Arc<RwLock<TxPipeline>>,
}

impl EndpointHandle {
    pub fn new(pipeline: Arc<RwLock<TxPipeline>>) -> Self {
        Self { pipeline }
    }

    /// Install a TX stage
    pub fn register_module(&self, module: Arc<dyn TxModule>) -> softphone_sip_core::Result<ModuleId> {
        self.pipeline.write().register(module)
    }

    /// Remove a TX stage
    pub fn unregister_module(&self, id: ModuleId) -> softphone_sip_core::Result<()> {
        self.pipeline.write().unregister(id)
    }

    /// Installed stage names in execution order
    pub fn module_names(&self) -> Vec<String> {
        self.pipeline
            .read()
            .stage_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

/// Registration state change reported by the stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegStateEvent {
    pub account: AccountId,
    /// Final SIP status of the last REGISTER transaction
    pub code: u16,
    pub reason: String,
    /// Expiration granted by the registrar, 0 when unregistered
    pub expiration: u32,
}

impl RegStateEvent {
    pub fn is_auth_failure(&self) -> bool {
        self.code == 401 || self.code == 403
    }
}

/// Snapshot of an account as the stack sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub id: AccountId,
    pub uri: String,
    pub reg_is_active: bool,
    /// Last registration status code, 0 before the first attempt
    pub reg_status: u16,
    pub reg_status_text: String,
    pub online_status: bool,
    pub registered_at: Option<DateTime<Utc>>,
}

/// Receives account callbacks from the stack's worker
#[async_trait]
pub trait AccountObserver: Send + Sync {
    async fn on_reg_state(&self, event: RegStateEvent);
}

/// The wrapped SIP stack
///
/// Methods mirror the stack's public control API one to one. Failures are
/// reported as [`StackError`]; none of them panic.
#[async_trait]
pub trait SipStack: Send + Sync + 'static {
    /// Create the library instance
    async fn lib_create(&self) -> StackResult<()>;

    /// Initialize the endpoint
    async fn lib_init(&self, config: EndpointConfig) -> StackResult<()>;

    /// Module registry of the live endpoint, `None` when there is none
    fn endpoint(&self) -> Option<EndpointHandle>;

    async fn transport_create(&self, kind: TransportKind, config: &TransportConfig) -> StackResult<TransportId>;

    async fn transport_info(&self, id: TransportId) -> StackResult<TransportInfo>;

    /// Start worker threads and timers
    async fn lib_start(&self) -> StackResult<()>;

    /// Create an account; `observer` receives its callbacks
    async fn account_create(
        &self,
        config: &AccountConfig,
        observer: Arc<dyn AccountObserver>,
    ) -> StackResult<AccountId>;

    /// Apply a new configuration to an existing account
    async fn account_modify(&self, id: AccountId, config: &AccountConfig) -> StackResult<()>;

    /// Register (`renew = true`) or unregister the account
    async fn set_registration(&self, id: AccountId, renew: bool) -> StackResult<()>;

    async fn set_online_status(&self, id: AccountId, online: bool) -> StackResult<()>;

    async fn account_info(&self, id: AccountId) -> StackResult<AccountInfo>;

    /// Destroy the account, unregistering it if needed
    async fn account_shutdown(&self, id: AccountId) -> StackResult<()>;

    async fn hangup_all_calls(&self) -> StackResult<()>;

    /// Wait until the stack's workers have finished pending work
    async fn drain(&self);

    /// Destroy the library, releasing every pool it owns
    async fn lib_destroy(&self) -> StackResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use softphone_sip_core::TxSanitizer;

    #[test]
    fn test_endpoint_defaults() {
        let cfg = EndpointConfig::default();
        assert_eq!(cfg.user_agent, "Softphone/1.0");
        assert_eq!(cfg.max_calls, 4);
        assert_eq!(cfg.id_generator.unique_string().len(), 32);

        let cfg = cfg.with_log_level(5);
        assert_eq!((cfg.log_level, cfg.console_level), (5, 5));
    }

    #[test]
    fn test_handle_shares_pipeline() {
        let pipeline = Arc::new(RwLock::new(TxPipeline::new()));
        let handle = EndpointHandle::new(pipeline.clone());
        let other = handle.clone();

        let id = handle.register_module(Arc::new(TxSanitizer::new())).unwrap();
        assert_eq!(other.module_names(), vec!["mod-tx-sanitize".to_string()]);
        assert_eq!(pipeline.read().len(), 1);

        other.unregister_module(id).unwrap();
        assert!(handle.module_names().is_empty());
    }

    #[test]
    fn test_auth_failure_codes() {
        let mut event = RegStateEvent {
            account: 0,
            code: 401,
            reason: "Unauthorized".into(),
            expiration: 0,
        };
        assert!(event.is_auth_failure());
        event.code = 403;
        assert!(event.is_auth_failure());
        event.code = 407;
        assert!(!event.is_auth_failure());
    }

    #[test]
    fn test_stack_error_display() {
        let err = StackError::new(171_039, "account_create", "invalid URI");
        assert_eq!(err.to_string(), "account_create failed: invalid URI (status=171039)");
    }
}
