//! The lifecycle facade
//!
//! [`SoftphoneClient`] is the context object every entry point works on. It
//! owns what would otherwise be process-wide state: the lifecycle flag, the
//! sanitizer registration, the remembered UDP transport and the single live
//! account.
//!
//! # Lifecycle
//!
//! ```text
//!  Uninitialized ──init──► LibReady ──start──► Started
//!        ▲                     │                  │
//!        └─────────────── shutdown ◄──────────────┘
//! ```
//!
//! Accounts are layered on top of `LibReady`/`Started`; at most one is live
//! and creating a new one shuts the previous one down first. `shutdown`
//! never fails and always returns to `Uninitialized`, after which `init`
//! works again.
//!
//! # Sanitizer registration
//!
//! `init` installs a [`TxSanitizer`] into the endpoint's TX pipeline right
//! after the transaction layer. Without an endpoint handle (or if the
//! endpoint rejects the stage) the failure is logged, the registration stays
//! [`ModuleRegistration::Unregistered`] and requests go out unsanitized
//! until a later `init` succeeds. Shutdown destroys the endpoint and with it
//! the registration.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use softphone_client_core::loopback::LoopbackStack;
//! use softphone_client_core::{ClientConfig, LifecycleState, SoftphoneClient, TransportKind};
//!
//! # tokio_test::block_on(async {
//! let stack = Arc::new(LoopbackStack::new());
//! let mut client = SoftphoneClient::new(stack, ClientConfig::new().without_log_subscriber());
//!
//! client.init(4).await.unwrap();
//! let tid = client.create_transport(TransportKind::Udp, Some("192.0.2.10"), 5060).await.unwrap();
//! client.start().await.unwrap();
//! assert_eq!(client.state(), LifecycleState::Started);
//! assert_eq!(client.udp_transport(), Some(tid));
//!
//! client
//!     .register_with_credentials("1001@pbx.example.com", "pbx.example.com", "1001", "secret", Some("asterisk"))
//!     .await
//!     .unwrap();
//! assert!(client.account_id().is_some());
//!
//! client.shutdown().await;
//! assert_eq!(client.state(), LifecycleState::Uninitialized);
//! # });
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use softphone_infra_common::logging::setup::{level_from_verbosity, setup_logging, LoggingConfig};
use softphone_sip_core::{HexIdGenerator, IdGenerator, ModuleId, TxModule, TxSanitizer};

use crate::account::{ensure_sip_scheme, AccountConfig};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, Operation};
use crate::registration::RegistrationObserver;
use crate::stack::{AccountId, EndpointConfig, SipStack};
use crate::transport::{TransportConfig, TransportId, TransportKind};

/// Build identifier logged once per successful init
pub const SHIM_BUILD_TAG: &str = concat!("softphone-shim-", env!("CARGO_PKG_VERSION"), "-sanitize");

/// Library lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    LibReady,
    Started,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Uninitialized => write!(f, "Uninitialized"),
            LifecycleState::LibReady => write!(f, "LibReady"),
            LifecycleState::Started => write!(f, "Started"),
        }
    }
}

/// Whether the sanitizer stage is installed in the live endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleRegistration {
    Unregistered,
    Registered(ModuleId),
}

impl ModuleRegistration {
    pub fn is_registered(&self) -> bool {
        matches!(self, ModuleRegistration::Registered(_))
    }
}

struct ActiveAccount {
    id: AccountId,
    config: AccountConfig,
}

/// Softphone context over a wrapped [`SipStack`]
///
/// Methods take `&mut self`; callers that share a client across tasks wrap
/// it in a mutex.
pub struct SoftphoneClient<S: SipStack> {
    stack: Arc<S>,
    config: ClientConfig,
    id_generator: Arc<dyn IdGenerator>,
    state: LifecycleState,
    sanitizer: Arc<TxSanitizer>,
    registration: ModuleRegistration,
    udp_transport: Option<TransportId>,
    account: Option<ActiveAccount>,
}

impl<S: SipStack> SoftphoneClient<S> {
    pub fn new(stack: Arc<S>, config: ClientConfig) -> Self {
        Self {
            stack,
            config,
            id_generator: Arc::new(HexIdGenerator),
            state: LifecycleState::Uninitialized,
            sanitizer: Arc::new(TxSanitizer::new()),
            registration: ModuleRegistration::Unregistered,
            udp_transport: None,
            account: None,
        }
    }

    /// Hand the stack a different identifier source at the next `init`
    pub fn with_id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = id_generator;
        self
    }

    pub fn stack(&self) -> &Arc<S> {
        &self.stack
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state != LifecycleState::Uninitialized
    }

    pub fn sanitizer_registration(&self) -> ModuleRegistration {
        self.registration
    }

    /// The sanitizer stage, for its repair counters
    pub fn sanitizer(&self) -> &TxSanitizer {
        &self.sanitizer
    }

    /// First UDP transport created since init
    pub fn udp_transport(&self) -> Option<TransportId> {
        self.udp_transport
    }

    pub fn account_id(&self) -> Option<AccountId> {
        self.account.as_ref().map(|a| a.id)
    }

    /// Configuration of the live account
    pub fn account_config(&self) -> Option<&AccountConfig> {
        self.account.as_ref().map(|a| &a.config)
    }

    /// Initialize the library; a second call is a no-op
    ///
    /// `log_level` is the stack verbosity, 0 (fatal) to 6 (trace).
    pub async fn init(&mut self, log_level: u32) -> ClientResult<()> {
        let op = Operation::Init;
        if self.is_ready() {
            debug!("init: already initialized");
            return Ok(());
        }

        if self.config.install_log_subscriber {
            let mut logging = LoggingConfig::new(level_from_verbosity(log_level), "softphone");
            if self.config.json_logs {
                logging = logging.with_json();
            }
            if let Err(e) = setup_logging(logging) {
                debug!("log subscriber not installed: {}", e);
            }
        }

        self.stack.lib_create().await.map_err(|e| ClientError::stack(op, e))?;

        let endpoint = EndpointConfig::default()
            .with_log_level(log_level)
            .with_user_agent(self.config.user_agent.clone())
            .with_max_calls(self.config.max_calls)
            .with_id_generator(self.id_generator.clone());

        if let Err(e) = self.stack.lib_init(endpoint).await {
            if let Err(destroy) = self.stack.lib_destroy().await {
                debug!("cleanup after failed lib_init: {}", destroy);
            }
            return Err(ClientError::stack(op, e));
        }

        self.state = LifecycleState::LibReady;
        self.install_sanitizer();

        info!("shim build: {}", SHIM_BUILD_TAG);
        info!("library initialized");
        Ok(())
    }

    /// Install the sanitizer into the live endpoint unless already there
    ///
    /// Returns whether the sanitizer is registered afterwards.
    pub fn install_sanitizer(&mut self) -> bool {
        if self.registration.is_registered() {
            return true;
        }
        if !self.is_ready() {
            error!("sanitizer not registered: library not initialized");
            return false;
        }

        let Some(endpoint) = self.stack.endpoint() else {
            error!("sanitizer not registered: no endpoint handle");
            return false;
        };

        let stage: Arc<dyn TxModule> = self.sanitizer.clone();
        match endpoint.register_module(stage) {
            Ok(id) => {
                self.registration = ModuleRegistration::Registered(id);
                info!("sanitize module registered");
                true
            }
            Err(e) => {
                error!("sanitize module registration failed: {}", e);
                false
            }
        }
    }

    /// Create a transport; port 0 lets the stack pick one
    ///
    /// The first UDP transport is remembered and bound to every account.
    pub async fn create_transport(
        &mut self,
        kind: TransportKind,
        bind_address: Option<&str>,
        port: u16,
    ) -> ClientResult<TransportId> {
        let op = Operation::CreateTransport;
        if !self.is_ready() {
            return Err(ClientError::not_ready(op));
        }

        let config = TransportConfig::new(bind_address, port);
        let id = self
            .stack
            .transport_create(kind, &config)
            .await
            .map_err(|e| ClientError::stack(op, e))?;
        let info = self
            .stack
            .transport_info(id)
            .await
            .map_err(|e| ClientError::stack(op, e))?;

        if kind == TransportKind::Udp && self.udp_transport.is_none() {
            self.udp_transport = Some(id);
        }

        info!(
            "transport created: type={} tid={} local={} public={}",
            info.type_name,
            id,
            info.local_name,
            config.public_address.as_deref().unwrap_or("(none)")
        );
        Ok(id)
    }

    /// Start the library; a second call is a no-op
    pub async fn start(&mut self) -> ClientResult<()> {
        let op = Operation::Start;
        match self.state {
            LifecycleState::Uninitialized => Err(ClientError::not_ready(op)),
            LifecycleState::Started => {
                info!("start skipped: already started");
                Ok(())
            }
            LifecycleState::LibReady => {
                self.stack.lib_start().await.map_err(|e| ClientError::stack(op, e))?;
                self.state = LifecycleState::Started;
                info!("library started");
                Ok(())
            }
        }
    }

    /// Create an account without registering it
    ///
    /// Credentials follow with [`set_credentials`](Self::set_credentials).
    pub async fn add_account(&mut self, id_uri: &str, registrar_uri: &str) -> ClientResult<()> {
        let op = Operation::AddAccount;
        if !self.is_ready() {
            return Err(ClientError::not_ready(op));
        }
        let id_uri = non_empty(op, "identity URI", id_uri)?;

        let config = AccountConfig::new(id_uri)
            .with_registrar(ensure_sip_scheme(registrar_uri))
            .with_register_on_add(false)
            .with_nat(self.config.nat.clone())
            .with_transport(self.udp_transport);

        self.replace_account(op, config).await?;
        info!("account added: {} (registration deferred)", id_uri);
        Ok(())
    }

    /// Attach digest credentials to the live account and re-register
    pub async fn set_credentials(&mut self, username: &str, password: &str, realm: Option<&str>) -> ClientResult<()> {
        let op = Operation::SetCredentials;
        let Some(account) = self.account.as_mut() else {
            return Err(ClientError::no_account(op));
        };

        let policy = &self.config.credentials;
        let mut config = account.config.clone();
        config.credentials = policy.credentials(username, password, realm);

        self.stack
            .account_modify(account.id, &config)
            .await
            .map_err(|e| ClientError::stack(op, e))?;
        account.config = config;

        info!(
            "credentials set: user={} realm={} (re-REGISTER)",
            username,
            policy.effective_realm(realm)
        );
        Ok(())
    }

    /// Send a fresh REGISTER for the live account
    pub async fn reregister(&mut self) -> ClientResult<()> {
        let op = Operation::Reregister;
        let Some(account) = self.account.as_ref() else {
            return Err(ClientError::no_account(op));
        };
        self.stack
            .set_registration(account.id, true)
            .await
            .map_err(|e| ClientError::stack(op, e))
    }

    /// One-shot registration: replace the account, install credentials,
    /// disable retry backoff and send REGISTER immediately
    pub async fn register_with_credentials(
        &mut self,
        id_uri: &str,
        registrar_uri: &str,
        username: &str,
        password: &str,
        realm: Option<&str>,
    ) -> ClientResult<()> {
        let op = Operation::RegisterWithCredentials;
        if !self.is_ready() {
            return Err(ClientError::not_ready(op));
        }
        self.drop_account().await;
        let id_uri = ensure_sip_scheme(non_empty(op, "identity URI", id_uri)?);

        let config = AccountConfig::new(id_uri.clone())
            .with_registrar(ensure_sip_scheme(registrar_uri))
            .with_register_on_add(false)
            .without_retry()
            .with_credentials(self.config.credentials.credentials(username, password, realm))
            .with_nat(self.config.nat.clone())
            .with_transport(self.udp_transport);

        info!(
            "account config: id={} reg={} user={} realm={}",
            config.id_uri,
            config.reg.registrar_uri,
            username,
            self.config.credentials.effective_realm(realm)
        );

        let id = self.replace_account(op, config).await?;
        self.stack
            .set_registration(id, true)
            .await
            .map_err(|e| ClientError::stack(op, e))?;

        info!("registration initiated for {}", id_uri);
        Ok(())
    }

    /// One-shot login: replace the account and let the stack register it on creation
    pub async fn login(
        &mut self,
        id_uri: &str,
        registrar_uri: &str,
        username: &str,
        password: &str,
        realm: Option<&str>,
    ) -> ClientResult<()> {
        let op = Operation::Login;
        if !self.is_ready() {
            return Err(ClientError::not_ready(op));
        }
        self.drop_account().await;
        let id_uri = ensure_sip_scheme(non_empty(op, "identity URI", id_uri)?);

        let config = AccountConfig::new(id_uri.clone())
            .with_registrar(ensure_sip_scheme(registrar_uri))
            .with_register_on_add(true)
            .with_credentials(self.config.credentials.credentials(username, password, realm))
            .with_nat(self.config.nat.clone())
            .with_transport(self.udp_transport);

        self.replace_account(op, config).await?;
        info!("account REGISTER sent: {}", id_uri);
        Ok(())
    }

    /// Tear everything down; never fails
    ///
    /// Waits at most the configured grace period for the stack to drain
    /// before destroying it.
    pub async fn shutdown(&mut self) {
        self.drop_account().await;

        if self.is_ready() {
            if let Err(e) = self.stack.hangup_all_calls().await {
                debug!("hangup_all_calls during shutdown: {}", e);
            }

            let grace = self.config.shutdown_grace();
            if tokio::time::timeout(grace, self.stack.drain()).await.is_err() {
                warn!("stack did not drain within {:?}", grace);
            }

            if let Err(e) = self.stack.lib_destroy().await {
                error!("lib_destroy during shutdown: {}", e);
            }

            self.state = LifecycleState::Uninitialized;
            self.registration = ModuleRegistration::Unregistered;
            self.udp_transport = None;
        }

        info!("shutdown complete");
    }

    /// Shut down the live account, if any, and create `config` in its place
    async fn replace_account(&mut self, op: Operation, config: AccountConfig) -> ClientResult<AccountId> {
        self.drop_account().await;

        let observer = Arc::new(RegistrationObserver::new(Arc::downgrade(&self.stack)));
        let id = self
            .stack
            .account_create(&config, observer)
            .await
            .map_err(|e| ClientError::stack(op, e))?;

        debug!(account = id, uri = %config.id_uri, "account created");
        self.account = Some(ActiveAccount { id, config });
        Ok(id)
    }

    async fn drop_account(&mut self) {
        if let Some(account) = self.account.take() {
            match self.stack.account_shutdown(account.id).await {
                Ok(()) => debug!(account = account.id, "previous account shut down"),
                Err(e) => warn!(account = account.id, "account shutdown failed: {}", e),
            }
        }
    }
}

impl<S: SipStack> fmt::Debug for SoftphoneClient<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftphoneClient")
            .field("state", &self.state)
            .field("registration", &self.registration)
            .field("udp_transport", &self.udp_transport)
            .field("account", &self.account_id())
            .finish()
    }
}

fn non_empty<'a>(op: Operation, what: &str, value: &'a str) -> ClientResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ClientError::invalid_argument(op, format!("empty {}", what)));
    }
    Ok(value)
}
