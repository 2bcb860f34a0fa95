//! End-to-end behaviour of the sanitizer inside a TX pipeline

use std::sync::{Arc, Mutex};

use softphone_sip_core::prelude::*;
use softphone_sip_core::sanitizer::{BRANCH_LEN, SANITIZER_MODULE_NAME, SANITIZER_PRIORITY};
use softphone_sip_core::unique::HEX_ID_LEN;
use softphone_sip_core::Result;

/// Transaction-layer stand-in that stamps whatever it was given
struct Stamper {
    call_id: Option<&'static [u8]>,
    branch: Option<&'static [u8]>,
}

impl TxModule for Stamper {
    fn name(&self) -> &str {
        "mod-tsx-layer"
    }

    fn priority(&self) -> u32 {
        PRIORITY_TSX_LAYER
    }

    fn on_tx_request(&self, tdata: &mut TxData) -> Result<()> {
        let msg = tdata.msg.as_mut().expect("message");
        if let Some(value) = self.call_id {
            msg.call_id_mut().expect("call-id").set(value.to_vec().into());
        }
        if let Some(value) = self.branch {
            msg.via_mut().expect("via").set_raw_branch(value);
        }
        Ok(())
    }
}

/// Application stage that remembers what it saw
struct Snoop {
    seen: Arc<Mutex<Vec<String>>>,
}

impl TxModule for Snoop {
    fn name(&self) -> &str {
        "snoop"
    }

    fn priority(&self) -> u32 {
        PRIORITY_APPLICATION
    }

    fn on_tx_request(&self, tdata: &mut TxData) -> Result<()> {
        let msg = tdata.msg.as_ref().expect("message");
        self.seen.lock().unwrap().push(msg.to_string());
        Ok(())
    }
}

fn register_request() -> TxData {
    let msg = Message::request(Method::Register, "sip:pbx.example.com")
        .with_header(Header::Via(
            Via::new("UDP", "192.0.2.10:5060", Some("z9hG4bKplaceholder")).with_param("rport", None),
        ))
        .with_header(Header::other(HeaderName::MaxForwards, "70"))
        .with_header(Header::other(HeaderName::From, "<sip:1001@pbx.example.com>;tag=as9f"))
        .with_header(Header::other(HeaderName::To, "<sip:1001@pbx.example.com>"))
        .with_header(Header::CallId(CallId::new("placeholder")))
        .with_header(Header::other(HeaderName::CSeq, "1 REGISTER"));
    TxData::new(msg, "tdata-register")
}

fn pipeline_with(stamper: Stamper, seen: &Arc<Mutex<Vec<String>>>) -> TxPipeline {
    let mut pipeline = TxPipeline::new();
    pipeline.register(Arc::new(Snoop { seen: seen.clone() })).unwrap();
    pipeline.register(Arc::new(TxSanitizer::new())).unwrap();
    pipeline.register(Arc::new(stamper)).unwrap();
    pipeline
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[test]
fn sanitizer_sits_between_transaction_layer_and_application() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let pipeline = pipeline_with(
        Stamper {
            call_id: None,
            branch: None,
        },
        &seen,
    );
    assert_eq!(
        pipeline.stage_names(),
        vec!["mod-tsx-layer", SANITIZER_MODULE_NAME, "snoop"]
    );
    assert_eq!(SANITIZER_PRIORITY, PRIORITY_TSX_LAYER + 1);
}

#[test]
fn broken_ids_from_the_stack_never_reach_the_wire() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let pipeline = pipeline_with(
        Stamper {
            call_id: Some(b""),
            branch: Some(b"\x01\x02garbage"),
        },
        &seen,
    );

    let mut tdata = register_request();
    pipeline.process(&mut tdata).unwrap();

    let msg = tdata.msg.as_ref().unwrap();
    let call_id = msg.call_id().unwrap().as_str().unwrap();
    assert_eq!(call_id.len(), HEX_ID_LEN);
    assert!(is_lower_hex(call_id));

    let branch = msg.via().unwrap().branch_str().unwrap();
    assert_eq!(branch.len(), BRANCH_LEN);
    assert!(branch.starts_with(MAGIC_COOKIE));
    assert!(is_lower_hex(&branch[MAGIC_COOKIE.len()..]));

    // the application stage saw the repaired message
    let wire = seen.lock().unwrap()[0].clone();
    assert!(wire.contains(&format!("Call-ID: {}\r\n", call_id)));
    assert!(wire.contains(&format!(";branch={};rport", branch)));
}

#[test]
fn well_formed_ids_pass_untouched() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let pipeline = pipeline_with(
        Stamper {
            call_id: Some(b"3848276298220188511@192.0.2.10"),
            branch: Some(b"z9hG4bK.cafe1234"),
        },
        &seen,
    );

    let mut tdata = register_request();
    pipeline.process(&mut tdata).unwrap();

    let msg = tdata.msg.as_ref().unwrap();
    assert_eq!(msg.call_id().unwrap().as_str(), Some("3848276298220188511@192.0.2.10"));
    assert_eq!(msg.via().unwrap().branch_str(), Some("z9hG4bK.cafe1234"));
    assert_eq!(tdata.pool.as_ref().unwrap().allocations(), 0);
}

#[test]
fn repaired_ids_differ_between_messages() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let pipeline = pipeline_with(
        Stamper {
            call_id: Some(b" "),
            branch: Some(b""),
        },
        &seen,
    );

    let mut first = register_request();
    let mut second = register_request();
    pipeline.process(&mut first).unwrap();
    pipeline.process(&mut second).unwrap();

    let first = first.msg.unwrap();
    let second = second.msg.unwrap();
    assert_ne!(first.call_id(), second.call_id());
    assert_ne!(first.via().unwrap().branch(), second.via().unwrap().branch());
}

#[test]
fn responses_leave_the_pipeline_unchanged() {
    let mut pipeline = TxPipeline::new();
    pipeline.register(Arc::new(TxSanitizer::new())).unwrap();

    let msg = Message::response(401, "Unauthorized")
        .with_header(Header::Via(Via::new("UDP", "192.0.2.10:5060", Some(""))))
        .with_header(Header::CallId(CallId::null()));
    let mut tdata = TxData::new(msg.clone(), "tdata-401");

    pipeline.process(&mut tdata).unwrap();

    assert_eq!(tdata.msg, Some(msg));
}

#[test]
fn stage_without_pool_lets_the_message_through() {
    let mut pipeline = TxPipeline::new();
    pipeline.register(Arc::new(TxSanitizer::new())).unwrap();

    let mut tdata = register_request();
    tdata.msg.as_mut().unwrap().call_id_mut().unwrap().set(b"".to_vec().into());
    tdata.pool = None;

    assert!(pipeline.process(&mut tdata).is_ok());
    assert_eq!(tdata.msg.unwrap().call_id().unwrap().value(), Some(&b""[..]));
}
