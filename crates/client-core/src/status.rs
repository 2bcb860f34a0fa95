//! Integer status boundary
//!
//! [`StatusFacade`] exposes the same entry points as [`SoftphoneClient`]
//! for callers that can only consume an integer: `0` for success, the
//! transport id for transport creation, and a negative code per entry point
//! otherwise. Errors are logged here and never cross the boundary as text.
//!
//! | Entry point                 | not ready | stack failure | other |
//! |-----------------------------|-----------|---------------|-------|
//! | `init`                      |           | -1            |       |
//! | `create_transport`          | -2        | -2            |       |
//! | `start`                     | -3        | -3            |       |
//! | `add_account`               | -1        | -2            |       |
//! | `set_credentials`           | -1        | -2            |       |
//! | `reregister`                | -1        | -2            |       |
//! | `register_with_credentials` | -10       | -11           |       |
//! | `login`                     | -5        | -6            | -7    |
//!
//! Absent strings are treated as empty, and transport kind codes outside
//! 0..=2 fall back to UDP.
//!
//! ```rust
//! use std::sync::Arc;
//! use softphone_client_core::loopback::LoopbackStack;
//! use softphone_client_core::{ClientConfig, StatusFacade};
//!
//! # tokio_test::block_on(async {
//! let stack = Arc::new(LoopbackStack::new());
//! let mut phone = StatusFacade::new(stack, ClientConfig::new().without_log_subscriber());
//!
//! assert_eq!(phone.start().await, -3);
//! assert_eq!(phone.init(3).await, 0);
//! assert!(phone.create_transport(0, None, 0).await >= 0);
//! assert_eq!(phone.start().await, 0);
//! assert_eq!(phone.login(Some("1001@pbx"), Some("pbx"), Some("1001"), Some("pw"), None).await, 0);
//! phone.shutdown().await;
//! # });
//! ```

use std::future::Future;
use std::sync::Arc;

use tracing::{error, Instrument, Level};

use softphone_infra_common::LogContext;

use crate::client::SoftphoneClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, Operation};
use crate::stack::SipStack;
use crate::transport::TransportKind;

/// Status code for success
pub const STATUS_OK: i32 = 0;

/// [`SoftphoneClient`] behind integer status codes
pub struct StatusFacade<S: SipStack> {
    client: SoftphoneClient<S>,
}

impl<S: SipStack> StatusFacade<S> {
    pub fn new(stack: Arc<S>, config: ClientConfig) -> Self {
        Self {
            client: SoftphoneClient::new(stack, config),
        }
    }

    pub fn from_client(client: SoftphoneClient<S>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &SoftphoneClient<S> {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut SoftphoneClient<S> {
        &mut self.client
    }

    pub fn into_client(self) -> SoftphoneClient<S> {
        self.client
    }

    pub async fn init(&mut self, log_level: i32) -> i32 {
        let level = log_level.clamp(0, 6) as u32;
        let fut = self.client.init(level);
        status(Operation::Init, fut).await
    }

    /// Returns the transport id on success
    pub async fn create_transport(&mut self, kind: i32, bind_address: Option<&str>, port: i32) -> i32 {
        let op = Operation::CreateTransport;
        let Ok(port) = u16::try_from(port) else {
            error!("{}: port {} out of range", op, port);
            return op.failure_code();
        };
        let kind = TransportKind::from_code(kind);
        let bind_address = bind_address.filter(|a| !a.is_empty());

        let fut = self.client.create_transport(kind, bind_address, port);
        match instrumented(op, fut).await {
            Ok(id) => id,
            Err(e) => report(e),
        }
    }

    pub async fn start(&mut self) -> i32 {
        let fut = self.client.start();
        status(Operation::Start, fut).await
    }

    pub async fn add_account(&mut self, id_uri: Option<&str>, registrar_uri: Option<&str>) -> i32 {
        let fut = self.client.add_account(text(id_uri), text(registrar_uri));
        status(Operation::AddAccount, fut).await
    }

    pub async fn set_credentials(&mut self, username: Option<&str>, password: Option<&str>, realm: Option<&str>) -> i32 {
        let fut = self.client.set_credentials(text(username), text(password), realm);
        status(Operation::SetCredentials, fut).await
    }

    pub async fn reregister(&mut self) -> i32 {
        let fut = self.client.reregister();
        status(Operation::Reregister, fut).await
    }

    pub async fn register_with_credentials(
        &mut self,
        id_uri: Option<&str>,
        registrar_uri: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
        realm: Option<&str>,
    ) -> i32 {
        let fut = self.client.register_with_credentials(
            text(id_uri),
            text(registrar_uri),
            text(username),
            text(password),
            realm,
        );
        status(Operation::RegisterWithCredentials, fut).await
    }

    pub async fn login(
        &mut self,
        id_uri: Option<&str>,
        registrar_uri: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
        realm: Option<&str>,
    ) -> i32 {
        let fut = self
            .client
            .login(text(id_uri), text(registrar_uri), text(username), text(password), realm);
        status(Operation::Login, fut).await
    }

    /// Never fails
    pub async fn shutdown(&mut self) {
        let span = LogContext::with_operation("client", "shutdown").span(Level::DEBUG);
        self.client.shutdown().instrument(span).await;
    }
}

fn text(value: Option<&str>) -> &str {
    value.unwrap_or_default()
}

async fn instrumented<T>(op: Operation, fut: impl Future<Output = ClientResult<T>>) -> ClientResult<T> {
    let span = LogContext::with_operation("client", op.as_str()).span(Level::DEBUG);
    fut.instrument(span).await
}

async fn status(op: Operation, fut: impl Future<Output = ClientResult<()>>) -> i32 {
    match instrumented(op, fut).await {
        Ok(()) => STATUS_OK,
        Err(e) => report(e),
    }
}

fn report(err: ClientError) -> i32 {
    let code = err.status_code();
    error!("{} (status {})", err, code);
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    use crate::loopback::{LoopbackStack, StackOp};

    fn facade() -> (Arc<LoopbackStack>, StatusFacade<LoopbackStack>) {
        let stack = Arc::new(LoopbackStack::new());
        let facade = StatusFacade::new(stack.clone(), ClientConfig::new().without_log_subscriber());
        (stack, facade)
    }

    #[tokio::test]
    async fn test_not_ready_codes() {
        let (_stack, mut phone) = facade();
        assert_eq!(phone.create_transport(0, None, 0).await, -2);
        assert_eq!(phone.start().await, -3);
        assert_eq!(phone.add_account(Some("sip:a@b"), Some("b")).await, -1);
        assert_eq!(phone.set_credentials(Some("a"), Some("p"), None).await, -1);
        assert_eq!(phone.reregister().await, -1);
        assert_eq!(
            phone
                .register_with_credentials(Some("a@b"), Some("b"), Some("a"), Some("p"), None)
                .await,
            -10
        );
        assert_eq!(phone.login(Some("a@b"), Some("b"), Some("a"), Some("p"), None).await, -5);
    }

    #[tokio::test]
    async fn test_stack_failure_codes() {
        let (stack, mut phone) = facade();
        stack.fail(StackOp::LibCreate);
        assert_eq!(phone.init(3).await, -1);
        stack.clear_faults();
        assert_eq!(phone.init(3).await, 0);

        stack.fail(StackOp::TransportCreate);
        assert_eq!(phone.create_transport(0, None, 0).await, -2);
        stack.fail(StackOp::LibStart);
        assert_eq!(phone.start().await, -3);
        stack.clear_faults();

        stack.fail(StackOp::AccountCreate);
        assert_eq!(phone.add_account(Some("sip:1001@pbx"), Some("pbx")).await, -2);
        assert_eq!(
            phone
                .register_with_credentials(Some("1001@pbx"), Some("pbx"), Some("1001"), Some("pw"), None)
                .await,
            -11
        );
        assert_eq!(phone.login(Some("1001@pbx"), Some("pbx"), Some("1001"), Some("pw"), None).await, -6);
        stack.clear_faults();

        assert_eq!(phone.add_account(Some("sip:1001@pbx"), Some("pbx")).await, 0);
        stack.fail(StackOp::AccountModify);
        assert_eq!(phone.set_credentials(Some("1001"), Some("pw"), None).await, -2);
        stack.fail(StackOp::SetRegistration);
        assert_eq!(phone.reregister().await, -2);
    }

    #[tokio::test]
    async fn test_login_other_failure() {
        let (_stack, mut phone) = facade();
        assert_eq!(phone.init(3).await, 0);
        assert_eq!(phone.login(None, Some("pbx"), Some("u"), Some("p"), None).await, -7);
    }

    #[tokio::test]
    async fn test_transport_codes() {
        let (stack, mut phone) = facade();
        assert_eq!(phone.init(3).await, 0);

        let tls = phone.create_transport(2, Some(""), 5061).await;
        let fallback = phone.create_transport(9, Some("192.0.2.1"), 5060).await;
        assert!(tls >= 0 && fallback >= 0);
        assert_ne!(tls, fallback);

        let transports = stack.transports();
        assert_eq!(transports[0].kind, TransportKind::Tls);
        assert_eq!(transports[0].local_name, "127.0.0.1:5061");
        assert_eq!(transports[1].kind, TransportKind::Udp);
        assert_eq!(phone.client().udp_transport(), Some(fallback));

        assert_eq!(phone.create_transport(0, None, 70_000).await, -2);
        assert_eq!(phone.create_transport(0, None, -1).await, -2);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_errors_logged_at_boundary() {
        let (_stack, mut phone) = facade();
        assert_eq!(phone.reregister().await, -1);
        assert!(logs_contain("reregister"));
        assert!(logs_contain("(status -1)"));
    }

    #[tokio::test]
    async fn test_full_flow() {
        let (stack, mut phone) = facade();
        assert_eq!(phone.init(4).await, 0);
        assert_eq!(phone.init(4).await, 0);
        assert_eq!(phone.create_transport(0, None, 0).await, 0);
        assert_eq!(phone.start().await, 0);
        assert_eq!(phone.start().await, 0);
        assert_eq!(
            phone
                .register_with_credentials(
                    Some("1001@pbx.example.com"),
                    Some("pbx.example.com"),
                    Some("1001"),
                    Some("secret"),
                    Some("asterisk"),
                )
                .await,
            0
        );
        assert_eq!(stack.live_accounts().len(), 1);

        phone.shutdown().await;
        assert_eq!(stack.destroy_count(), 1);
        assert_eq!(phone.init(3).await, 0);
    }
}
