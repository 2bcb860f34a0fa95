//! In-memory SIP stack
//!
//! [`LoopbackStack`] implements [`SipStack`] without sockets so the facade,
//! the sanitizer and the registration observer can be exercised end to end.
//! It behaves like a real stack where the client can observe it:
//!
//! - every outbound request is built by the stack, stamped by a
//!   transaction-layer stage (`mod-tsx-layer`) using the endpoint's
//!   [`IdGenerator`], and then passed through the endpoint's [`TxPipeline`]
//!   before it is appended to the wire log
//! - registrar answers are scripted per REGISTER, defaulting to `200`
//! - reg-state callbacks are delivered by a tokio worker task, never inline
//!
//! For testing it can emit defective identifiers ([`IdMode`]), hide its
//! endpoint, or fail any operation on demand.
//!
//! ```rust
//! use std::sync::Arc;
//! use softphone_client_core::loopback::LoopbackStack;
//! use softphone_client_core::{ClientConfig, SipStack, SoftphoneClient, TransportKind};
//!
//! # tokio_test::block_on(async {
//! let stack = Arc::new(LoopbackStack::new());
//! let mut client = SoftphoneClient::new(stack.clone(), ClientConfig::new().without_log_subscriber());
//!
//! client.init(3).await.unwrap();
//! client.create_transport(TransportKind::Udp, None, 0).await.unwrap();
//! client.start().await.unwrap();
//! client.login("1001@pbx.example.com", "pbx.example.com", "1001", "secret", None).await.unwrap();
//! stack.drain().await;
//!
//! let register = &stack.wire()[0];
//! assert!(register.to_string().starts_with("REGISTER sip:pbx.example.com SIP/2.0"));
//!
//! client.shutdown().await;
//! # });
//! ```

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn, Instrument};

use softphone_sip_core::prelude::*;

use crate::account::AccountConfig;
use crate::stack::{
    AccountId, AccountInfo, AccountObserver, EndpointConfig, EndpointHandle, RegStateEvent, SipStack, StackError,
    StackResult,
};
use crate::transport::{TransportConfig, TransportId, TransportInfo, TransportKind};

/// Operation invoked in the wrong library state
pub const STATUS_EINVALIDOP: i32 = 70013;
/// Unknown transport or account
pub const STATUS_ENOTFOUND: i32 = 70006;
/// Address already bound by another transport
pub const STATUS_EADDRINUSE: i32 = 120098;
/// Malformed SIP URI
pub const STATUS_EINVALIDURI: i32 = 171039;
/// A TX stage refused to send
pub const STATUS_ETXREJECTED: i32 = 171060;
/// Failure injected with [`LoopbackStack::fail`]
pub const STATUS_EINJECTED: i32 = 70001;

/// Name of the built-in transaction-layer stage
pub const TSX_LAYER_MODULE: &str = "mod-tsx-layer";

/// Expiration requested by REGISTER
pub const DEFAULT_EXPIRES: u32 = 300;

/// First port handed out for `port = 0`
const AUTO_PORT_BASE: u16 = 40_000;

/// Stack operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackOp {
    LibCreate,
    LibInit,
    TransportCreate,
    TransportInfo,
    LibStart,
    AccountCreate,
    AccountModify,
    SetRegistration,
    SetOnlineStatus,
    AccountInfo,
    AccountShutdown,
    HangupAllCalls,
    LibDestroy,
}

impl StackOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            StackOp::LibCreate => "lib_create",
            StackOp::LibInit => "lib_init",
            StackOp::TransportCreate => "transport_create",
            StackOp::TransportInfo => "transport_info",
            StackOp::LibStart => "lib_start",
            StackOp::AccountCreate => "account_create",
            StackOp::AccountModify => "account_modify",
            StackOp::SetRegistration => "set_registration",
            StackOp::SetOnlineStatus => "set_online_status",
            StackOp::AccountInfo => "account_info",
            StackOp::AccountShutdown => "account_shutdown",
            StackOp::HangupAllCalls => "hangup_all_calls",
            StackOp::LibDestroy => "lib_destroy",
        }
    }
}

/// What the transaction layer stamps into `Call-ID` and the Via branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdMode {
    /// Tokens from the endpoint's generator
    #[default]
    WellFormed,
    /// Zero-length values
    Empty,
    /// Control and non-ASCII bytes
    Garbage,
}

/// Stamps identifiers the way the stack's transaction layer does
struct TransactionLayer {
    generator: Arc<dyn IdGenerator>,
    mode: Arc<Mutex<IdMode>>,
}

impl TransactionLayer {
    fn tokens(&self) -> (Vec<u8>, Vec<u8>) {
        match *self.mode.lock() {
            IdMode::WellFormed => (
                self.generator.unique_string().into_bytes(),
                format!("{}{}", MAGIC_COOKIE, self.generator.unique_string()).into_bytes(),
            ),
            IdMode::Empty => (Vec::new(), Vec::new()),
            IdMode::Garbage => (vec![0x00, b' ', 0x7f, 0xc3], vec![b'z', 0x01, 0x80]),
        }
    }
}

impl TxModule for TransactionLayer {
    fn name(&self) -> &str {
        TSX_LAYER_MODULE
    }

    fn priority(&self) -> u32 {
        PRIORITY_TSX_LAYER
    }

    fn on_tx_request(&self, tdata: &mut TxData) -> softphone_sip_core::Result<()> {
        let Some(msg) = tdata.msg.as_mut() else {
            return Ok(());
        };
        let (call_id, branch) = self.tokens();

        if let Some(id) = msg.call_id_mut() {
            if id.value().is_none() {
                *id = CallId::new(call_id);
            }
        }
        if let Some(via) = msg.via_mut() {
            if via.branch().is_none() {
                via.set_raw_branch(&branch);
            }
        }
        Ok(())
    }
}

struct Endpoint {
    config: EndpointConfig,
    pipeline: Arc<RwLock<TxPipeline>>,
}

struct AccountEntry {
    config: AccountConfig,
    observer: Arc<dyn AccountObserver>,
    info: AccountInfo,
    /// Call-ID reused by every REGISTER of this account
    call_id: Option<CallId>,
    cseq: u32,
}

struct Delivery {
    observer: Arc<dyn AccountObserver>,
    event: RegStateEvent,
}

struct Worker {
    tx: mpsc::UnboundedSender<Delivery>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct State {
    created: bool,
    started: bool,
    endpoint: Option<Endpoint>,
    endpoint_hidden: bool,
    transports: BTreeMap<TransportId, TransportInfo>,
    next_transport: TransportId,
    accounts: BTreeMap<AccountId, AccountEntry>,
    next_account: AccountId,
    faults: HashMap<StackOp, StackError>,
    responses: VecDeque<u16>,
    wire: Vec<Message>,
    destroyed: usize,
}

impl State {
    fn check(&self, op: StackOp) -> StackResult<()> {
        match self.faults.get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn endpoint(&self, op: StackOp) -> StackResult<&Endpoint> {
        self.endpoint
            .as_ref()
            .ok_or_else(|| StackError::new(STATUS_EINVALIDOP, op.as_str(), "library not initialized"))
    }

    fn account_mut(&mut self, op: StackOp, id: AccountId) -> StackResult<&mut AccountEntry> {
        self.accounts
            .get_mut(&id)
            .ok_or_else(|| StackError::new(STATUS_ENOTFOUND, op.as_str(), format!("no account {}", id)))
    }

    /// Run a request through the pipeline and put it on the wire
    fn transmit(&mut self, op: StackOp, msg: Message) -> StackResult<Message> {
        let pipeline = self.endpoint(op)?.pipeline.clone();

        let mut tdata = TxData::new(msg, format!("tdta{}", self.wire.len()));
        pipeline
            .read()
            .process(&mut tdata)
            .map_err(|e| StackError::new(STATUS_ETXREJECTED, op.as_str(), e.to_string()))?;
        let msg = tdata
            .msg
            .take()
            .ok_or_else(|| StackError::new(STATUS_ETXREJECTED, op.as_str(), "message dropped by TX stage"))?;

        trace!("{} -> wire", tdata);
        self.wire.push(msg.clone());
        Ok(msg)
    }

    /// Send REGISTER (`expires > 0`) or un-REGISTER and record the answer
    fn register(&mut self, op: StackOp, id: AccountId, expires: u32) -> StackResult<Delivery> {
        let endpoint = self.endpoint(op)?;
        let user_agent = endpoint.config.user_agent.clone();
        let tag = endpoint.config.id_generator.random_string(10);

        let entry = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| StackError::new(STATUS_ENOTFOUND, op.as_str(), format!("no account {}", id)))?;
        if entry.config.reg.registrar_uri.is_empty() {
            return Err(StackError::new(STATUS_EINVALIDOP, op.as_str(), "account has no registrar"));
        }
        entry.cseq += 1;

        let (kind, sent_by) = entry
            .config
            .transport_id
            .and_then(|t| self.transports.get(&t))
            .map(|t| (t.kind, t.local_name.clone()))
            .unwrap_or((TransportKind::Udp, "127.0.0.1:5060".to_string()));

        let contact = contact_uri(&entry.config.id_uri, &sent_by, entry.config.nat.sip_outbound);
        let msg = Message::request(Method::Register, entry.config.reg.registrar_uri.clone())
            .with_header(Header::Via(
                Via::new(kind.as_str(), sent_by, None).with_param("rport", None),
            ))
            .with_header(Header::other(HeaderName::MaxForwards, "70"))
            .with_header(Header::other(
                HeaderName::From,
                format!("<{}>;tag={}", entry.config.id_uri, tag),
            ))
            .with_header(Header::other(HeaderName::To, format!("<{}>", entry.config.id_uri)))
            .with_header(Header::CallId(entry.call_id.clone().unwrap_or_else(CallId::null)))
            .with_header(Header::other(HeaderName::CSeq, format!("{} REGISTER", entry.cseq)))
            .with_header(Header::other(HeaderName::UserAgent, user_agent))
            .with_header(Header::other(HeaderName::Contact, contact))
            .with_header(Header::other(HeaderName::Expires, expires.to_string()));

        let sent = self.transmit(op, msg)?;

        let code = if expires == 0 {
            200
        } else {
            self.responses.pop_front().unwrap_or(200)
        };
        let active = code == 200 && expires > 0;

        let entry = self.account_mut(op, id)?;
        if entry.call_id.is_none() {
            entry.call_id = sent.call_id().cloned();
        }
        entry.info.reg_status = code;
        entry.info.reg_status_text = reason_phrase(code).to_string();
        entry.info.reg_is_active = active;
        entry.info.registered_at = if active { Some(Utc::now()) } else { None };

        debug!(account = id, code, expires, "REGISTER answered");
        Ok(Delivery {
            observer: entry.observer.clone(),
            event: RegStateEvent {
                account: id,
                code,
                reason: reason_phrase(code).to_string(),
                expiration: if active { expires } else { 0 },
            },
        })
    }
}

/// Contact for a REGISTER: the identity's user part at the transport address
fn contact_uri(id_uri: &str, sent_by: &str, outbound: bool) -> String {
    let start = id_uri
        .find("sips:")
        .map(|i| i + 5)
        .or_else(|| id_uri.find("sip:").map(|i| i + 4))
        .unwrap_or(0);
    let user = id_uri[start..]
        .split(|c: char| c == '@' || c == '>' || c == ';')
        .next()
        .unwrap_or_default();

    let mut contact = if user.is_empty() {
        format!("<sip:{}", sent_by)
    } else {
        format!("<sip:{}@{}", user, sent_by)
    };
    if outbound {
        contact.push_str(";ob");
    }
    contact.push('>');
    contact
}

fn reason_phrase(code: u16) -> &'static str {
    match code {
        200 => "OK",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        423 => "Interval Too Brief",
        480 => "Temporarily Unavailable",
        500 => "Server Internal Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

fn has_sip_scheme(uri: &str) -> bool {
    uri.contains("sip:") || uri.contains("sips:")
}

/// In-memory [`SipStack`]
pub struct LoopbackStack {
    state: Mutex<State>,
    id_mode: Arc<Mutex<IdMode>>,
    worker: Mutex<Option<Worker>>,
    delivered: Arc<Mutex<Vec<RegStateEvent>>>,
}

impl Default for LoopbackStack {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LoopbackStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LoopbackStack")
            .field("created", &state.created)
            .field("initialized", &state.endpoint.is_some())
            .field("started", &state.started)
            .field("transports", &state.transports.len())
            .field("accounts", &state.accounts.len())
            .field("wire", &state.wire.len())
            .finish()
    }
}

impl LoopbackStack {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            id_mode: Arc::new(Mutex::new(IdMode::default())),
            worker: Mutex::new(None),
            delivered: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Stack that stamps defective identifiers from the start
    pub fn with_id_mode(mode: IdMode) -> Self {
        let stack = Self::new();
        stack.set_id_mode(mode);
        stack
    }

    pub fn set_id_mode(&self, mode: IdMode) {
        *self.id_mode.lock() = mode;
    }

    /// Queue registrar answers, consumed one per REGISTER
    pub fn script_responses(&self, codes: impl IntoIterator<Item = u16>) {
        self.state.lock().responses.extend(codes);
    }

    /// Make `op` fail with `error` until [`clear_faults`](Self::clear_faults)
    pub fn inject_fault(&self, op: StackOp, error: StackError) {
        self.state.lock().faults.insert(op, error);
    }

    /// Make `op` fail with a generic error
    pub fn fail(&self, op: StackOp) {
        self.inject_fault(op, StackError::new(STATUS_EINJECTED, op.as_str(), "injected failure"));
    }

    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    /// Pretend the endpoint handle cannot be obtained
    pub fn hide_endpoint(&self, hidden: bool) {
        self.state.lock().endpoint_hidden = hidden;
    }

    /// Every message that reached the wire, oldest first
    pub fn wire(&self) -> Vec<Message> {
        self.state.lock().wire.clone()
    }

    pub fn clear_wire(&self) {
        self.state.lock().wire.clear();
    }

    /// Reg-state events the worker has delivered
    pub fn delivered_events(&self) -> Vec<RegStateEvent> {
        self.delivered.lock().clone()
    }

    /// Ids of accounts that have not been shut down
    pub fn live_accounts(&self) -> Vec<AccountId> {
        self.state.lock().accounts.keys().copied().collect()
    }

    /// Configuration the account was created or last modified with
    pub fn account_config(&self, id: AccountId) -> Option<AccountConfig> {
        self.state.lock().accounts.get(&id).map(|a| a.config.clone())
    }

    pub fn transports(&self) -> Vec<TransportInfo> {
        self.state.lock().transports.values().cloned().collect()
    }

    /// Configuration applied by the last `lib_init`
    pub fn endpoint_config(&self) -> Option<EndpointConfig> {
        self.state.lock().endpoint.as_ref().map(|e| e.config.clone())
    }

    pub fn is_created(&self) -> bool {
        self.state.lock().created
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().endpoint.is_some()
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    /// Number of completed `lib_destroy` calls
    pub fn destroy_count(&self) -> usize {
        self.state.lock().destroyed
    }

    fn spawn_worker(&self) -> Worker {
        let (tx, mut rx) = mpsc::unbounded_channel::<Delivery>();
        let delivered = self.delivered.clone();
        // the worker reports under the span of whoever started it
        let handle = tokio::spawn(
            async move {
                while let Some(Delivery { observer, event }) = rx.recv().await {
                    trace!(account = event.account, code = event.code, "delivering reg state");
                    observer.on_reg_state(event.clone()).await;
                    delivered.lock().push(event);
                }
            }
            .in_current_span(),
        );
        Worker { tx, handle }
    }

    /// Hand an event to the worker, starting one if needed
    fn dispatch(&self, delivery: Delivery) {
        let mut worker = self.worker.lock();
        let worker = worker.get_or_insert_with(|| self.spawn_worker());
        if worker.tx.send(delivery).is_err() {
            debug!("event worker gone, reg state dropped");
        }
    }
}

#[async_trait]
impl SipStack for LoopbackStack {
    async fn lib_create(&self) -> StackResult<()> {
        let mut state = self.state.lock();
        state.check(StackOp::LibCreate)?;
        if state.created {
            return Err(StackError::new(STATUS_EINVALIDOP, "lib_create", "library already created"));
        }
        state.created = true;
        Ok(())
    }

    async fn lib_init(&self, config: EndpointConfig) -> StackResult<()> {
        let mut state = self.state.lock();
        state.check(StackOp::LibInit)?;
        if !state.created {
            return Err(StackError::new(STATUS_EINVALIDOP, "lib_init", "library not created"));
        }
        if state.endpoint.is_some() {
            return Err(StackError::new(STATUS_EINVALIDOP, "lib_init", "library already initialized"));
        }

        let mut pipeline = TxPipeline::new();
        pipeline
            .register(Arc::new(TransactionLayer {
                generator: config.id_generator.clone(),
                mode: self.id_mode.clone(),
            }))
            .map_err(|e| StackError::new(STATUS_EINVALIDOP, "lib_init", e.to_string()))?;

        debug!(user_agent = %config.user_agent, max_calls = config.max_calls, "endpoint initialized");
        state.endpoint = Some(Endpoint {
            config,
            pipeline: Arc::new(RwLock::new(pipeline)),
        });
        Ok(())
    }

    fn endpoint(&self) -> Option<EndpointHandle> {
        let state = self.state.lock();
        if state.endpoint_hidden {
            return None;
        }
        state
            .endpoint
            .as_ref()
            .map(|e| EndpointHandle::new(e.pipeline.clone()))
    }

    async fn transport_create(&self, kind: TransportKind, config: &TransportConfig) -> StackResult<TransportId> {
        let mut state = self.state.lock();
        state.check(StackOp::TransportCreate)?;
        state.endpoint(StackOp::TransportCreate)?;

        let id = state.next_transport;
        let port = match config.port {
            0 => AUTO_PORT_BASE + id as u16,
            port => port,
        };
        let host = config.bound_address.as_deref().unwrap_or("127.0.0.1");
        let local_name = format!("{}:{}", host, port);

        if state
            .transports
            .values()
            .any(|t| t.kind == kind && t.local_name == local_name)
        {
            return Err(StackError::new(
                STATUS_EADDRINUSE,
                "transport_create",
                format!("{} {} already bound", kind, local_name),
            ));
        }

        state.next_transport += 1;
        state.transports.insert(
            id,
            TransportInfo {
                id,
                kind,
                type_name: kind.as_str().to_string(),
                local_name,
            },
        );
        Ok(id)
    }

    async fn transport_info(&self, id: TransportId) -> StackResult<TransportInfo> {
        let state = self.state.lock();
        state.check(StackOp::TransportInfo)?;
        state
            .transports
            .get(&id)
            .cloned()
            .ok_or_else(|| StackError::new(STATUS_ENOTFOUND, "transport_info", format!("no transport {}", id)))
    }

    async fn lib_start(&self) -> StackResult<()> {
        let mut state = self.state.lock();
        state.check(StackOp::LibStart)?;
        state.endpoint(StackOp::LibStart)?;
        state.started = true;
        Ok(())
    }

    async fn account_create(
        &self,
        config: &AccountConfig,
        observer: Arc<dyn AccountObserver>,
    ) -> StackResult<AccountId> {
        let op = StackOp::AccountCreate;
        let (id, delivery) = {
            let mut state = self.state.lock();
            state.check(op)?;
            state.endpoint(op)?;
            validate_account(op, config)?;
            if let Some(tid) = config.transport_id {
                if !state.transports.contains_key(&tid) {
                    return Err(StackError::new(STATUS_ENOTFOUND, op.as_str(), format!("no transport {}", tid)));
                }
            }

            let id = state.next_account;
            state.next_account += 1;
            state.accounts.insert(
                id,
                AccountEntry {
                    config: config.clone(),
                    observer,
                    info: AccountInfo {
                        id,
                        uri: config.id_uri.clone(),
                        reg_is_active: false,
                        reg_status: 0,
                        reg_status_text: String::new(),
                        online_status: false,
                        registered_at: None,
                    },
                    call_id: None,
                    cseq: 0,
                },
            );
            debug!(account = id, uri = %config.id_uri, "account created");

            let delivery = if config.reg.register_on_add && config.has_registrar() {
                Some(state.register(op, id, DEFAULT_EXPIRES)?)
            } else {
                None
            };
            (id, delivery)
        };

        if let Some(delivery) = delivery {
            self.dispatch(delivery);
        }
        Ok(id)
    }

    async fn account_modify(&self, id: AccountId, config: &AccountConfig) -> StackResult<()> {
        let op = StackOp::AccountModify;
        let delivery = {
            let mut state = self.state.lock();
            state.check(op)?;
            validate_account(op, config)?;
            state.account_mut(op, id)?.config = config.clone();
            if config.has_registrar() {
                Some(state.register(op, id, DEFAULT_EXPIRES)?)
            } else {
                None
            }
        };
        if let Some(delivery) = delivery {
            self.dispatch(delivery);
        }
        Ok(())
    }

    async fn set_registration(&self, id: AccountId, renew: bool) -> StackResult<()> {
        let op = StackOp::SetRegistration;
        let delivery = {
            let mut state = self.state.lock();
            state.check(op)?;
            let expires = if renew { DEFAULT_EXPIRES } else { 0 };
            state.register(op, id, expires)?
        };
        self.dispatch(delivery);
        Ok(())
    }

    async fn set_online_status(&self, id: AccountId, online: bool) -> StackResult<()> {
        let mut state = self.state.lock();
        state.check(StackOp::SetOnlineStatus)?;
        state.account_mut(StackOp::SetOnlineStatus, id)?.info.online_status = online;
        Ok(())
    }

    async fn account_info(&self, id: AccountId) -> StackResult<AccountInfo> {
        let mut state = self.state.lock();
        state.check(StackOp::AccountInfo)?;
        Ok(state.account_mut(StackOp::AccountInfo, id)?.info.clone())
    }

    async fn account_shutdown(&self, id: AccountId) -> StackResult<()> {
        let op = StackOp::AccountShutdown;
        let mut state = self.state.lock();
        state.check(op)?;
        if state.account_mut(op, id)?.info.reg_is_active {
            // nobody is left to observe the answer
            if let Err(e) = state.register(op, id, 0) {
                warn!(account = id, "un-REGISTER on shutdown failed: {}", e);
            }
        }
        state.accounts.remove(&id);
        debug!(account = id, "account destroyed");
        Ok(())
    }

    async fn hangup_all_calls(&self) -> StackResult<()> {
        let state = self.state.lock();
        state.check(StackOp::HangupAllCalls)?;
        state.endpoint(StackOp::HangupAllCalls)?;
        Ok(())
    }

    async fn drain(&self) {
        loop {
            // events raised while draining start a new worker
            let worker = self.worker.lock().take();
            let Some(Worker { tx, handle }) = worker else {
                break;
            };
            drop(tx);
            if let Err(e) = handle.await {
                warn!("event worker ended abnormally: {}", e);
            }
        }
    }

    async fn lib_destroy(&self) -> StackResult<()> {
        {
            let mut state = self.state.lock();
            state.check(StackOp::LibDestroy)?;
            if !state.created {
                return Err(StackError::new(STATUS_EINVALIDOP, "lib_destroy", "library not created"));
            }
            state.accounts.clear();
            state.transports.clear();
            state.next_transport = 0;
            state.endpoint = None;
            state.started = false;
            state.created = false;
            state.destroyed += 1;
        }
        if let Some(worker) = self.worker.lock().take() {
            worker.handle.abort();
        }
        debug!("library destroyed");
        Ok(())
    }
}

fn validate_account(op: StackOp, config: &AccountConfig) -> StackResult<()> {
    if !has_sip_scheme(&config.id_uri) {
        return Err(StackError::new(
            STATUS_EINVALIDURI,
            op.as_str(),
            format!("invalid identity URI '{}'", config.id_uri),
        ));
    }
    if config.has_registrar() && !has_sip_scheme(&config.reg.registrar_uri) {
        return Err(StackError::new(
            STATUS_EINVALIDURI,
            op.as_str(),
            format!("invalid registrar URI '{}'", config.reg.registrar_uri),
        ));
    }
    Ok(())
}
