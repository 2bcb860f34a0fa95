//! Registration state handling
//!
//! [`RegistrationObserver`] is attached to every account the client creates.
//! The stack owns the registration state machine; the observer only reacts
//! to its outcome:
//!
//! - **401/403** - credentials were rejected. Registration is switched off
//!   instead of letting the stack retry with the same credentials forever.
//! - **200 while active** - logged as a successful registration.
//! - **>= 400 while inactive** - presence is withdrawn (`online = false`).
//!
//! The observer keeps only a weak reference to the stack, so an account
//! callback arriving during teardown never keeps the stack alive.

use std::sync::Weak;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::stack::{AccountObserver, RegStateEvent, SipStack};

/// Reacts to registration outcomes of one account
pub struct RegistrationObserver<S: SipStack> {
    stack: Weak<S>,
}

impl<S: SipStack> RegistrationObserver<S> {
    pub fn new(stack: Weak<S>) -> Self {
        Self { stack }
    }
}

#[async_trait]
impl<S: SipStack> AccountObserver for RegistrationObserver<S> {
    async fn on_reg_state(&self, event: RegStateEvent) {
        let Some(stack) = self.stack.upgrade() else {
            debug!(account = event.account, code = event.code, "reg state after stack teardown, ignored");
            return;
        };

        let info = match stack.account_info(event.account).await {
            Ok(info) => info,
            Err(e) => {
                debug!(account = event.account, "reg state for unknown account: {}", e);
                return;
            }
        };

        info!(
            "reg state: code={} reason={} active={} uri={}",
            event.code, event.reason, info.reg_is_active, info.uri
        );

        if event.is_auth_failure() {
            warn!("authentication failed (code={}), stopping registration", event.code);
            match stack.set_registration(event.account, false).await {
                Ok(()) => info!("registration stopped for {}", info.uri),
                Err(e) => error!("failed to stop registration: {}", e),
            }
        }

        if info.reg_is_active && event.code == 200 {
            info!("registered: {}", info.uri);
        }

        if !info.reg_is_active && event.code >= 400 {
            info!("registration inactive, going offline: {}", info.uri);
            if let Err(e) = stack.set_online_status(event.account, false).await {
                debug!("set_online_status ignored: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tracing_test::traced_test;

    use crate::account::AccountConfig;
    use crate::loopback::LoopbackStack;
    use crate::stack::{AccountId, EndpointConfig};

    async fn stack_with_account(codes: &[u16]) -> (Arc<LoopbackStack>, AccountId) {
        let stack = Arc::new(LoopbackStack::new());
        stack.lib_create().await.unwrap();
        stack.lib_init(EndpointConfig::default()).await.unwrap();
        stack.script_responses(codes.iter().copied());

        let observer = Arc::new(RegistrationObserver::new(Arc::downgrade(&stack)));
        let config = AccountConfig::new("sip:1001@pbx.example.com").with_registrar("sip:pbx.example.com");
        let id = stack.account_create(&config, observer).await.unwrap();
        (stack, id)
    }

    #[tokio::test]
    #[traced_test]
    async fn test_auth_failure_unregisters() {
        let (stack, id) = stack_with_account(&[401]).await;

        stack.set_registration(id, true).await.unwrap();
        stack.drain().await;

        // REGISTER, then the un-REGISTER sent by the observer
        let wire = stack.wire();
        assert_eq!(wire.len(), 2);
        assert!(wire[1].to_string().contains("Expires: 0\r\n"));

        let info = stack.account_info(id).await.unwrap();
        assert!(!info.reg_is_active);
        assert!(!info.online_status);
        assert!(logs_contain("authentication failed (code=401)"));
        assert!(logs_contain("registration stopped"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_forbidden_unregisters() {
        let (stack, id) = stack_with_account(&[403]).await;
        stack.set_registration(id, true).await.unwrap();
        stack.drain().await;

        assert_eq!(stack.wire().len(), 2);
        assert!(logs_contain("authentication failed (code=403)"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_success_is_logged() {
        let (stack, id) = stack_with_account(&[200]).await;
        stack.set_registration(id, true).await.unwrap();
        stack.drain().await;

        assert_eq!(stack.wire().len(), 1);
        assert!(stack.account_info(id).await.unwrap().reg_is_active);
        assert!(logs_contain("registered: sip:1001@pbx.example.com"));
        assert!(!logs_contain("authentication failed"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_server_error_goes_offline_without_unregister() {
        let (stack, id) = stack_with_account(&[503]).await;
        stack.set_online_status(id, true).await.unwrap();
        stack.set_registration(id, true).await.unwrap();
        stack.drain().await;

        assert_eq!(stack.wire().len(), 1);
        assert!(!stack.account_info(id).await.unwrap().online_status);
        assert!(logs_contain("going offline"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_dropped_stack_is_ignored() {
        let observer = RegistrationObserver::<LoopbackStack>::new(Weak::new());
        observer
            .on_reg_state(RegStateEvent {
                account: 0,
                code: 401,
                reason: "Unauthorized".into(),
                expiration: 0,
            })
            .await;
        assert!(logs_contain("after stack teardown"));
    }
}
