//! register command - run the registration flow against the loopback stack
//!
//! Nothing leaves the machine: the loopback stack records every REGISTER it
//! would have sent and answers with the scripted codes (200 by default).

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};

use softphone_client_core::loopback::{IdMode, LoopbackStack};
use softphone_client_core::{ClientConfig, SipStack, SoftphoneClient, TransportKind};

/// Identifier quality of the loopback stack's transaction layer
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdQuality {
    WellFormed,
    Empty,
    Garbage,
}

impl From<IdQuality> for IdMode {
    fn from(quality: IdQuality) -> Self {
        match quality {
            IdQuality::WellFormed => IdMode::WellFormed,
            IdQuality::Empty => IdMode::Empty,
            IdQuality::Garbage => IdMode::Garbage,
        }
    }
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Identity, `sip:` is added when missing
    pub id_uri: String,
    /// Registrar, `sip:` is added when missing
    pub registrar: String,
    pub username: String,
    pub password: String,

    /// Digest realm, defaults to the configured credential policy
    #[arg(long)]
    pub realm: Option<String>,

    /// Let the stack register on account creation instead of registering explicitly
    #[arg(long)]
    pub login: bool,

    /// Send one more REGISTER after the first
    #[arg(long)]
    pub reregister: bool,

    /// Transport to create (udp, tcp, tls)
    #[arg(long, default_value = "udp")]
    pub transport: TransportKind,

    /// Local bind address
    #[arg(long)]
    pub bind: Option<String>,

    /// Local port, 0 picks one
    #[arg(long, default_value_t = 0)]
    pub port: u16,

    /// Registrar answers, one per REGISTER
    #[arg(long, value_delimiter = ',')]
    pub respond: Vec<u16>,

    /// Identifiers the stack stamps before the sanitizer runs
    #[arg(long, value_enum, default_value_t = IdQuality::WellFormed)]
    pub ids: IdQuality,
}

#[derive(Serialize, Debug)]
pub struct RegisterReport {
    pub account_uri: String,
    pub registered: bool,
    pub last_status: u16,
    pub events: Vec<EventReport>,
    pub call_ids_fixed: u64,
    pub branches_fixed: u64,
    pub wire: Vec<String>,
}

#[derive(Serialize, Debug)]
pub struct EventReport {
    pub code: u16,
    pub reason: String,
}

pub async fn execute(args: &RegisterArgs, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = ClientConfig::load(config_path).context("loading configuration")?;
    let report = run(args, config).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for msg in &report.wire {
        println!("{}", msg);
    }
    for event in &report.events {
        println!("<- {} {}", event.code, event.reason);
    }
    println!(
        "{}: {} (last status {}), sanitizer fixed {} Call-ID(s) and {} branch(es)",
        report.account_uri,
        if report.registered { "registered" } else { "not registered" },
        report.last_status,
        report.call_ids_fixed,
        report.branches_fixed
    );
    Ok(())
}

/// Drive one registration and collect what happened
pub async fn run(args: &RegisterArgs, config: ClientConfig) -> Result<RegisterReport> {
    let stack = Arc::new(LoopbackStack::with_id_mode(args.ids.into()));
    stack.script_responses(args.respond.iter().copied());

    let mut client = SoftphoneClient::new(stack.clone(), config.without_log_subscriber());
    let outcome = register(&mut client, args).await;

    let report = match outcome {
        Ok(()) => collect_report(&stack, &client).await,
        Err(e) => Err(e),
    };
    client.shutdown().await;
    report
}

async fn register(client: &mut SoftphoneClient<LoopbackStack>, args: &RegisterArgs) -> Result<()> {
    client.init(3).await?;
    client
        .create_transport(args.transport, args.bind.as_deref(), args.port)
        .await?;
    client.start().await?;

    let realm = args.realm.as_deref();
    if args.login {
        client
            .login(&args.id_uri, &args.registrar, &args.username, &args.password, realm)
            .await?;
    } else {
        client
            .register_with_credentials(&args.id_uri, &args.registrar, &args.username, &args.password, realm)
            .await?;
    }
    client.stack().drain().await;

    if args.reregister {
        match client.reregister().await {
            Ok(()) => client.stack().drain().await,
            Err(e) => warn!("re-REGISTER skipped: {}", e),
        }
    }
    Ok(())
}

async fn collect_report(stack: &LoopbackStack, client: &SoftphoneClient<LoopbackStack>) -> Result<RegisterReport> {
    let id = client.account_id().context("no account after registration")?;
    let info = stack.account_info(id).await?;
    info!(account = id, active = info.reg_is_active, "registration finished");

    Ok(RegisterReport {
        account_uri: info.uri,
        registered: info.reg_is_active,
        last_status: info.reg_status,
        events: stack
            .delivered_events()
            .into_iter()
            .map(|e| EventReport {
                code: e.code,
                reason: e.reason,
            })
            .collect(),
        call_ids_fixed: client.sanitizer().call_ids_fixed(),
        branches_fixed: client.sanitizer().branches_fixed(),
        wire: stack.wire().iter().map(|m| m.to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(ids: IdQuality, respond: Vec<u16>) -> RegisterArgs {
        RegisterArgs {
            id_uri: "1001@pbx.example.com".into(),
            registrar: "pbx.example.com".into(),
            username: "1001".into(),
            password: "secret".into(),
            realm: None,
            login: false,
            reregister: false,
            transport: TransportKind::Udp,
            bind: None,
            port: 0,
            respond,
            ids,
        }
    }

    #[tokio::test]
    async fn test_successful_dry_run() {
        let report = run(&args(IdQuality::WellFormed, vec![]), ClientConfig::new()).await.unwrap();
        assert_eq!(report.account_uri, "sip:1001@pbx.example.com");
        assert!(report.registered);
        assert_eq!(report.last_status, 200);
        assert_eq!(report.wire.len(), 1);
        assert!(report.wire[0].starts_with("REGISTER sip:pbx.example.com SIP/2.0\r\n"));
        assert_eq!(report.call_ids_fixed, 0);
    }

    #[tokio::test]
    async fn test_garbage_ids_reported_as_fixed() {
        let mut a = args(IdQuality::Garbage, vec![]);
        a.reregister = true;
        let report = run(&a, ClientConfig::new()).await.unwrap();
        assert_eq!(report.wire.len(), 2);
        assert_eq!(report.call_ids_fixed, 1);
        assert_eq!(report.branches_fixed, 2);
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let report = run(&args(IdQuality::WellFormed, vec![401]), ClientConfig::new()).await.unwrap();
        assert!(!report.registered);
        let codes: Vec<u16> = report.events.iter().map(|e| e.code).collect();
        assert_eq!(codes, [401, 200]);
    }

    #[tokio::test]
    async fn test_login_flow() {
        let mut a = args(IdQuality::Empty, vec![]);
        a.login = true;
        let report = run(&a, ClientConfig::new()).await.unwrap();
        assert!(report.registered);
        assert_eq!(report.call_ids_fixed, 1);
        assert_eq!(report.branches_fixed, 1);
    }

    #[test]
    fn test_report_serializes() {
        let report = RegisterReport {
            account_uri: "sip:1001@pbx".into(),
            registered: true,
            last_status: 200,
            events: vec![EventReport {
                code: 200,
                reason: "OK".into(),
            }],
            call_ids_fixed: 0,
            branches_fixed: 0,
            wire: vec![],
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["registered"], true);
        assert_eq!(value["events"][0]["code"], 200);
    }
}
