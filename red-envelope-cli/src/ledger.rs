//! Local JSON ledger of created envelopes.
//!
//! Layout:
//! `{ "chain_id", "contract", "updated_at", "envelopes": [ { id, tx_hash, ... } ] }`

use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy_primitives::{Address, U256};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

#[derive(Debug, Serialize)]
pub struct LedgerEntry {
    pub id: String,
    pub tx_hash: String,
    pub explorer_url: String,
    pub amount_wei: String,
    pub receivers: Vec<String>,
    pub created_at: String,
}

impl LedgerEntry {
    pub fn new(
        id: U256,
        tx_hash: String,
        explorer_url: String,
        amount_wei: U256,
        receivers: &[Address],
    ) -> Self {
        Self {
            id: id.to_string(),
            tx_hash,
            explorer_url,
            amount_wei: amount_wei.to_string(),
            receivers: receivers.iter().map(|a| a.to_checksum(None)).collect(),
            created_at: now_rfc3339(),
        }
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Append `entry` to the ledger at `path`, creating the file if needed.
///
/// An existing ledger that is not a JSON object is left untouched and reported.
pub fn append(path: &Path, chain_id: u64, contract: Address, entry: &LedgerEntry) -> Result<()> {
    let mut root = load(path)?;

    root["chain_id"] = json!(chain_id);
    root["contract"] = json!(contract.to_checksum(None));
    root["updated_at"] = json!(entry.created_at);

    let entry = serde_json::to_value(entry).context("failed serialising ledger entry")?;
    match root.get_mut("envelopes").and_then(Value::as_array_mut) {
        Some(envelopes) => envelopes.push(entry),
        None => root["envelopes"] = json!([entry]),
    }

    persist(path, &root)
}

fn load(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Ok(json!({}));
    }
    let existing = fs::read_to_string(path)
        .with_context(|| format!("failed reading ledger {}", path.display()))?;
    if existing.trim().is_empty() {
        return Ok(json!({}));
    }
    let root: Value = serde_json::from_str(&existing)
        .with_context(|| format!("ledger {} is not valid JSON", path.display()))?;
    anyhow::ensure!(
        root.is_object(),
        "ledger {} is not a JSON object; refusing to overwrite it",
        path.display()
    );
    Ok(root)
}

/// Write through a staging sibling, then rename it over the ledger.
fn persist(path: &Path, root: &Value) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed creating ledger directory {}", dir.display()))?;
    }

    let body = serde_json::to_string_pretty(root).context("failed serialising ledger")?;
    let staging = staging_path(path);
    fs::write(&staging, body)
        .with_context(|| format!("failed staging ledger update in {}", staging.display()))?;
    fs::rename(&staging, path)
        .with_context(|| format!("failed committing ledger {}", path.display()))
}

fn staging_path(ledger: &Path) -> PathBuf {
    let mut name = ledger.file_name().unwrap_or_default().to_os_string();
    name.push(".pending");
    ledger.with_file_name(name)
}

/// Read `deployments.<key>.address` from a deployments JSON file.
pub fn deployed_address(path: &Path, key: &str) -> Result<Address> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed reading {}", path.display()))?;
    let root: Value = serde_json::from_str(&raw)
        .with_context(|| format!("failed parsing JSON in {}", path.display()))?;
    let address = root["deployments"][key]["address"]
        .as_str()
        .with_context(|| format!("no deployments.{key}.address in {}", path.display()))?;
    address
        .parse()
        .with_context(|| format!("invalid address {address:?} for deployment {key}"))
}
