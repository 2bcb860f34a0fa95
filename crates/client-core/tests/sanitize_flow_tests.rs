//! Outbound identifier repair through a full REGISTER flow
//!
//! The loopback stack can be switched into a mode where its transaction
//! layer stamps empty or garbage Call-IDs and branches. These tests check
//! what actually reaches the wire.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use softphone_client_core::loopback::{IdMode, LoopbackStack};
use softphone_client_core::{ClientConfig, SipStack, SoftphoneClient, TransportKind};
use softphone_sip_core::validation::has_only_printables;
use softphone_sip_core::{IdGenerator, Message};

fn assert_well_formed(msg: &Message) {
    let call_id = msg.call_id().unwrap().value().unwrap();
    assert!(!call_id.is_empty());
    assert!(has_only_printables(Some(call_id)));

    let via = msg.via().unwrap();
    let branch = via.branch().unwrap();
    assert!(has_only_printables(Some(branch)));
    assert!(via.has_magic_cookie());
}

async fn client_for(mode: IdMode) -> (Arc<LoopbackStack>, SoftphoneClient<LoopbackStack>) {
    let stack = Arc::new(LoopbackStack::with_id_mode(mode));
    let mut client = SoftphoneClient::new(stack.clone(), ClientConfig::new().without_log_subscriber());
    client.init(3).await.unwrap();
    client.create_transport(TransportKind::Udp, None, 0).await.unwrap();
    client.start().await.unwrap();
    (stack, client)
}

#[tokio::test]
async fn test_empty_ids_repaired() {
    let (stack, mut client) = client_for(IdMode::Empty).await;
    client.login("1001@pbx", "pbx", "1001", "pw", None).await.unwrap();

    let wire = stack.wire();
    assert_eq!(wire.len(), 1);
    assert_well_formed(&wire[0]);

    let branch = wire[0].via().unwrap().branch_str().unwrap();
    assert_eq!(branch.len(), 39);
    assert!(branch.starts_with("z9hG4bK"));
    assert_eq!(wire[0].call_id().unwrap().value().unwrap().len(), 32);
}

#[tokio::test]
async fn test_garbage_ids_repaired() {
    let (stack, mut client) = client_for(IdMode::Garbage).await;
    client
        .register_with_credentials("1001@pbx", "pbx", "1001", "pw", None)
        .await
        .unwrap();
    client.reregister().await.unwrap();
    stack.drain().await;

    let wire = stack.wire();
    assert_eq!(wire.len(), 2);
    for msg in &wire {
        assert_well_formed(msg);
    }
    // the repaired Call-ID sticks to the account, branches are per request
    assert_eq!(wire[0].call_id(), wire[1].call_id());
    assert_ne!(wire[0].via().unwrap().branch(), wire[1].via().unwrap().branch());

    assert_eq!(client.sanitizer().call_ids_fixed(), 1);
    assert_eq!(client.sanitizer().branches_fixed(), 2);
}

#[tokio::test]
async fn test_well_formed_ids_untouched() {
    let (stack, mut client) = client_for(IdMode::WellFormed).await;
    client.login("1001@pbx", "pbx", "1001", "pw", None).await.unwrap();

    assert_well_formed(&stack.wire()[0]);
    assert_eq!(client.sanitizer().call_ids_fixed(), 0);
    assert_eq!(client.sanitizer().branches_fixed(), 0);
}

#[tokio::test]
async fn test_unsanitized_without_endpoint() {
    let stack = Arc::new(LoopbackStack::with_id_mode(IdMode::Empty));
    stack.hide_endpoint(true);
    let mut client = SoftphoneClient::new(stack.clone(), ClientConfig::new().without_log_subscriber());
    client.init(3).await.unwrap();
    client.login("1001@pbx", "pbx", "1001", "pw", None).await.unwrap();

    let msg = &stack.wire()[0];
    assert_eq!(msg.call_id().unwrap().value(), Some(&b""[..]));
    assert!(!msg.via().unwrap().has_magic_cookie());
}

#[tokio::test]
async fn test_stack_switching_to_garbage_midway() {
    let (stack, mut client) = client_for(IdMode::WellFormed).await;
    client.add_account("sip:1001@pbx", "pbx").await.unwrap();
    client.set_credentials("1001", "pw", None).await.unwrap();

    stack.set_id_mode(IdMode::Garbage);
    client.reregister().await.unwrap();
    stack.drain().await;

    let wire = stack.wire();
    assert_eq!(wire.len(), 2);
    assert_well_formed(&wire[1]);
    // Call-ID was stamped well-formed on the first REGISTER and reused
    assert_eq!(client.sanitizer().call_ids_fixed(), 0);
    assert_eq!(client.sanitizer().branches_fixed(), 1);
}

/// Counts how often the stack asks for identifiers
#[derive(Debug, Default)]
struct CountingGenerator {
    calls: AtomicUsize,
}

impl IdGenerator for CountingGenerator {
    fn unique_string(&self) -> String {
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        format!("{:032x}", n)
    }

    fn random_string(&self, len: usize) -> String {
        let mut s = self.unique_string();
        s.truncate(len);
        s
    }

    fn guid(&self) -> [u8; 16] {
        (self.calls.fetch_add(1, Ordering::Relaxed) as u128).to_be_bytes()
    }
}

#[tokio::test]
async fn test_injected_generator_feeds_the_stack() {
    let generator = Arc::new(CountingGenerator::default());
    let stack = Arc::new(LoopbackStack::new());
    let mut client = SoftphoneClient::new(stack.clone(), ClientConfig::new().without_log_subscriber())
        .with_id_generator(generator.clone());
    client.init(3).await.unwrap();
    client.login("1001@pbx", "pbx", "1001", "pw", None).await.unwrap();
    stack.drain().await;

    assert!(generator.calls.load(Ordering::Relaxed) >= 2);
    let msg = &stack.wire()[0];
    assert_eq!(msg.call_id().unwrap().as_str().unwrap().len(), 32);
    assert!(msg.via().unwrap().branch_str().unwrap().starts_with("z9hG4bK0000"));
    assert_eq!(client.sanitizer().call_ids_fixed(), 0);
}
