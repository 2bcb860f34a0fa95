//! gen-id command - print identifiers from the shim's generator

use anyhow::{ensure, Result};
use clap::Args;
use serde::Serialize;

use softphone_sip_core::sanitizer::make_branch;
use softphone_sip_core::unique::{generate_guid, random_hex, HEX_ID_LEN};

#[derive(Args, Debug)]
pub struct GenIdArgs {
    /// How many identifiers to print
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: usize,

    /// Length of each token, clamped to 32
    #[arg(short, long, default_value_t = HEX_ID_LEN)]
    pub len: usize,

    /// Print Via branches (magic cookie + token) instead of bare tokens
    #[arg(long, conflicts_with = "guid")]
    pub branch: bool,

    /// Print 16-byte GUIDs in hex
    #[arg(long)]
    pub guid: bool,
}

#[derive(Serialize, Debug)]
struct GenIdOutput {
    kind: &'static str,
    ids: Vec<String>,
}

pub fn execute(args: &GenIdArgs, json: bool) -> Result<()> {
    let output = generate(args)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for id in &output.ids {
            println!("{}", id);
        }
    }
    Ok(())
}

fn generate(args: &GenIdArgs) -> Result<GenIdOutput> {
    ensure!(args.count > 0, "count must be at least 1");

    let (kind, ids) = if args.guid {
        let ids: Vec<String> = (0..args.count)
            .map(|_| generate_guid(None).iter().map(|b| format!("{:02x}", b)).collect::<String>())
            .collect();
        ("guid", ids)
    } else if args.branch {
        let ids: Vec<String> = (0..args.count)
            .map(|_| String::from_utf8_lossy(&make_branch(None)).into_owned())
            .collect();
        ("branch", ids)
    } else {
        ensure!(args.len > 0, "len must be at least 1");
        ("token", (0..args.count).map(|_| random_hex(args.len)).collect())
    };

    Ok(GenIdOutput { kind, ids })
}
