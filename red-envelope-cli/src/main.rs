use std::{fs, path::PathBuf, sync::Arc, time::Duration};

use alloy_primitives::{Address, Bytes, B256, U256};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use red_envelope_client::{
    abbreviate, config::DEFAULT_EXPLORER_HOST, decode_receipt, extract_reason, format_ether,
    is_address, parse_ether, ContractConfig, DecodeOutcome, DecodedEvent, EnvelopeRequest,
    EnvelopeType, ExplorerConfig, RawLog, RecordQuery, Submission, SubmissionStatus,
    TrackerSnapshot, TransactionHandle, TransactionReceipt, TransactionTracker, ValidationError,
    WalletBalance, WalletContext,
};
use tracing_subscriber::{fmt, EnvFilter};

use crate::{gateway::RpcGateway, ledger::LedgerEntry};

mod gateway;
mod ledger;

/// Send red envelopes, grab from them, and inspect their transactions.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate an amount and a recipient list without sending anything.
    Check(CheckArgs),
    /// Decode a receipt log against the contract's events.
    Decode(DecodeArgs),
    /// Extract the human-readable reason from a wallet/RPC error message.
    Reason { message: String },
    /// Send a new envelope.
    Create(CreateArgs),
    /// Claim a share of an envelope.
    Grab(GrabArgs),
    /// List the claims recorded for an envelope.
    Records(RecordsArgs),
}

#[derive(Args, Debug)]
struct RecipientArgs {
    /// Recipient address. Repeat for several recipients.
    #[arg(long = "to")]
    to: Vec<String>,

    /// File with one recipient per line.
    #[arg(long, conflicts_with = "to")]
    recipients_file: Option<PathBuf>,
}

impl RecipientArgs {
    /// Newline-separated recipients, as typed into the recipients box.
    fn raw(&self) -> Result<String> {
        match &self.recipients_file {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed reading {}", path.display()))?;
                // Files end with a newline; the recipients box usually does not.
                let text = text.strip_suffix('\n').unwrap_or(&text);
                Ok(text.strip_suffix('\r').unwrap_or(text).to_string())
            }
            None => Ok(self.to.join("\n")),
        }
    }
}

#[derive(Args, Debug)]
struct ChainArgs {
    /// JSON-RPC endpoint.
    #[arg(long, env = "RPC_URL")]
    rpc_url: String,

    /// Red Envelope contract address.
    #[arg(long, env = "ENVELOPE_CONTRACT")]
    contract: Option<Address>,

    /// Deployments JSON to read the contract address from when `--contract` is not given.
    #[arg(long)]
    deployments: Option<PathBuf>,

    /// Key under `deployments` holding the contract.
    #[arg(long, default_value = "red-envelope")]
    contract_key: String,

    /// Block explorer host used for transaction links.
    #[arg(long, env = "EXPLORER_HOST", default_value = DEFAULT_EXPLORER_HOST)]
    explorer_host: String,

    #[arg(long, default_value_t = 2_000)]
    poll_interval_ms: u64,

    #[arg(long, default_value_t = 120)]
    receipt_timeout_secs: u64,
}

impl ChainArgs {
    fn contract_config(&self) -> Result<ContractConfig> {
        let address = match (self.contract, &self.deployments) {
            (Some(address), _) => address,
            (None, Some(path)) => ledger::deployed_address(path, &self.contract_key)?,
            (None, None) => bail!(
                "missing contract: provide --contract (or ENVELOPE_CONTRACT) or --deployments"
            ),
        };
        Ok(ContractConfig {
            address,
            explorer: ExplorerConfig {
                host: self.explorer_host.clone(),
            },
        })
    }

    fn gateway(&self, from: Option<Address>) -> Result<RpcGateway> {
        RpcGateway::connect(
            &self.rpc_url,
            from,
            Duration::from_millis(self.poll_interval_ms),
            Duration::from_secs(self.receipt_timeout_secs),
        )
    }
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Amount in ether.
    #[arg(long, default_value = "0")]
    amount: String,

    #[command(flatten)]
    recipients: RecipientArgs,

    /// Available balance in ether. Omitted means zero.
    #[arg(long)]
    balance: Option<String>,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Receipt JSON file: `{"logs":[{"topics":["0x.."],"data":"0x.."}]}`.
    #[arg(long, conflicts_with_all = ["topic", "data"])]
    receipt: Option<PathBuf>,

    /// Log topic, signature hash first. Repeat for indexed arguments.
    #[arg(long)]
    topic: Vec<B256>,

    /// Hex-encoded log data.
    #[arg(long)]
    data: Option<String>,
}

#[derive(Args, Debug)]
struct CreateArgs {
    #[command(flatten)]
    chain: ChainArgs,

    /// Node-managed account that pays for the envelope.
    #[arg(long, env = "ENVELOPE_FROM")]
    from: Address,

    /// Amount in ether.
    #[arg(long)]
    amount: String,

    #[command(flatten)]
    recipients: RecipientArgs,

    /// `equal` or `random`.
    #[arg(long, default_value = "equal", value_parser = parse_envelope_type)]
    envelope_type: EnvelopeType,

    /// Append created envelopes to this JSON ledger.
    #[arg(long)]
    ledger: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GrabArgs {
    #[command(flatten)]
    chain: ChainArgs,

    /// Node-managed account that grabs.
    #[arg(long, env = "ENVELOPE_FROM")]
    from: Address,

    /// Envelope id.
    #[arg(long)]
    id: U256,
}

#[derive(Args, Debug)]
struct RecordsArgs {
    #[command(flatten)]
    chain: ChainArgs,

    /// Envelope id.
    #[arg(long)]
    id: U256,
}

fn parse_envelope_type(input: &str) -> Result<EnvelopeType, String> {
    match input {
        "equal" => Ok(EnvelopeType::Equal),
        "random" => Ok(EnvelopeType::Random),
        other => other
            .parse::<u8>()
            .ok()
            .and_then(|v| EnvelopeType::try_from(v).ok())
            .ok_or_else(|| format!("unknown envelope type {other:?} (expected equal or random)")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Check(args) => check(args),
        Command::Decode(args) => decode(args),
        Command::Reason { message } => {
            println!("{}", extract_reason(&message));
            Ok(())
        }
        Command::Create(args) => create(args).await,
        Command::Grab(args) => grab(args).await,
        Command::Records(args) => records(args).await,
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Inline messages shown next to the offending form field.
fn field_message(err: &ValidationError) -> &'static str {
    match err {
        ValidationError::InsufficientBalance { .. } => "Insufficient balance.",
        ValidationError::NoValidRecipient => "Invalid address.",
    }
}

fn check(args: CheckArgs) -> Result<()> {
    let raw = args.recipients.raw()?;
    let request = EnvelopeRequest::from_input(&args.amount, &raw, EnvelopeType::default())?;
    let balance = args.balance.as_deref().map(parse_ether).transpose()?;
    let ctx = WalletContext {
        balance: balance.map(|value_wei| WalletBalance {
            owner: Address::ZERO,
            value_wei,
        }),
        ..WalletContext::default()
    };

    println!(
        "Amount: {} ETH ({} wei)",
        format_ether(request.amount_wei),
        request.amount_wei
    );
    for entry in request.recipients.entries() {
        let mark = if is_address(entry) { "ok" } else { "invalid" };
        println!("  {mark:>7}  {entry:?}");
    }

    request
        .validate(&ctx)
        .map_err(|err| anyhow!("{}", field_message(&err)))?;
    println!("Ready to send to {} recipient(s).", request.recipients.len());
    Ok(())
}

fn decode(args: DecodeArgs) -> Result<()> {
    let receipt: TransactionReceipt = match &args.receipt {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed reading {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed parsing receipt JSON in {}", path.display()))?
        }
        None => {
            let data = args.data.as_deref().unwrap_or_default();
            let data = hex::decode(data.strip_prefix("0x").unwrap_or(data))
                .context("log data is not valid hex")?;
            TransactionReceipt {
                logs: vec![RawLog {
                    topics: args.topic,
                    data: Bytes::from(data),
                }],
            }
        }
    };

    match decode_receipt(&receipt) {
        DecodeOutcome::Matched(event) => print_event(&event),
        DecodeOutcome::NoMatch => println!("No matching event in the first log."),
    }
    Ok(())
}

async fn create(args: CreateArgs) -> Result<()> {
    let contract = args.chain.contract_config()?;
    let gateway = Arc::new(args.chain.gateway(Some(args.from))?);
    let ctx = gateway.wallet_context().await?;

    let raw = args.recipients.raw()?;
    let request = EnvelopeRequest::from_input(&args.amount, &raw, args.envelope_type)?;
    for entry in request.recipients.invalid_entries() {
        tracing::warn!(entry, "recipient is not a valid address");
    }

    let mut tracker = TransactionTracker::new(gateway, contract.clone());
    let handle = match tracker.create(&ctx, &request).await {
        Err(err) => bail!("{}", field_message(&err)),
        Ok(Submission::Rejected(err)) => bail!("{}", err.reason()),
        Ok(Submission::Accepted(handle)) => handle,
    };
    println!("Creating... {}", contract.explorer.tx_url(&handle));

    let snapshot = tracker.settle().await;
    match mined_event(&snapshot)? {
        Some(DecodedEvent::Create {
            id,
            receivers,
            amount,
            ..
        }) => {
            print_result(&contract, &handle);
            println!("Envelope ID: {id}");
            println!("Amount: {} ETH", format_ether(*amount));

            if let Some(path) = &args.ledger {
                let entry = LedgerEntry::new(
                    *id,
                    handle.to_string(),
                    contract.explorer.tx_url(&handle),
                    *amount,
                    receivers,
                );
                ledger::append(path, ctx.chain_id, contract.address, &entry)?;
                println!("Recorded envelope {id} in {}", path.display());
            }
        }
        _ => println!("Mined, but the first log is not a Create event."),
    }
    Ok(())
}

async fn grab(args: GrabArgs) -> Result<()> {
    let contract = args.chain.contract_config()?;
    let gateway = Arc::new(args.chain.gateway(Some(args.from))?);

    let mut tracker = TransactionTracker::new(gateway, contract.clone());
    let handle = match tracker.grab(args.id).await {
        Submission::Rejected(err) => bail!("{}", err.reason()),
        Submission::Accepted(handle) => handle,
    };
    println!("Grabbing... {}", contract.explorer.tx_url(&handle));

    let snapshot = tracker.settle().await;
    match mined_event(&snapshot)? {
        Some(DecodedEvent::Grab { amount }) => {
            print_result(&contract, &handle);
            println!("Amount: {} ETH", format_ether(*amount));
        }
        _ => println!("Mined, but the first log is not a Receive event."),
    }
    Ok(())
}

async fn records(args: RecordsArgs) -> Result<()> {
    let contract = args.chain.contract_config()?;
    let gateway = Arc::new(args.chain.gateway(None)?);

    let mut query = RecordQuery::new(gateway, contract);
    let records = query.load(args.id).await?;
    if records.is_empty() {
        println!("No records for envelope {}.", args.id);
        return Ok(());
    }
    println!("{:<16}{}", "Address", "Amount");
    for record in records {
        println!(
            "{:<16}{} ETH",
            abbreviate(&record.receiver.to_checksum(None)),
            format_ether(record.amount)
        );
    }
    Ok(())
}

/// The decoded event of a mined transaction, or the failure reason.
fn mined_event(snapshot: &TrackerSnapshot) -> Result<Option<&DecodedEvent>> {
    match snapshot.status {
        SubmissionStatus::Mined => Ok(snapshot.event()),
        SubmissionStatus::Failed => Err(anyhow!("{}", snapshot.reason().unwrap_or_default())),
        status => Err(anyhow!("transaction left in {status:?} state")),
    }
}

fn print_result(contract: &ContractConfig, handle: &TransactionHandle) {
    println!(
        "TX Hash: {} ({})",
        abbreviate(&handle.to_string()),
        contract.explorer.tx_url(handle)
    );
}

fn print_event(event: &DecodedEvent) {
    match event {
        DecodedEvent::Create {
            id,
            sender,
            receivers,
            amount,
        } => {
            println!("Create");
            println!("  Envelope ID: {id}");
            println!("  Sender: {}", sender.to_checksum(None));
            for receiver in receivers {
                println!("  Receiver: {}", receiver.to_checksum(None));
            }
            println!("  Amount: {} ETH", format_ether(*amount));
        }
        DecodedEvent::Grab { amount } => {
            println!("Receive");
            println!("  Amount: {} ETH", format_ether(*amount));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn envelope_type_names_and_numbers() {
        assert_eq!(parse_envelope_type("equal"), Ok(EnvelopeType::Equal));
        assert_eq!(parse_envelope_type("1"), Ok(EnvelopeType::Random));
        assert!(parse_envelope_type("lucky").is_err());
    }

    #[test]
    fn parses_create_arguments() {
        let cli = Cli::try_parse_from([
            "red-envelope",
            "create",
            "--rpc-url",
            "http://localhost:8545",
            "--contract",
            "0x4e7271c13a3ede905c72034f6b117f6e57a1a72b",
            "--from",
            "0x00000000000000000000000000000000000a11ce",
            "--amount",
            "1.5",
            "--to",
            "0x0000000000000000000000000000000000000b0b",
            "--to",
            "0x0000000000000000000000000000000000000c0c",
            "--envelope-type",
            "random",
        ])
        .unwrap();

        let Command::Create(args) = cli.command else {
            panic!("expected create");
        };
        assert_eq!(args.envelope_type, EnvelopeType::Random);
        assert_eq!(
            args.recipients.raw().unwrap(),
            "0x0000000000000000000000000000000000000b0b\n0x0000000000000000000000000000000000000c0c"
        );
        assert_eq!(args.chain.contract_config().unwrap().explorer.host, DEFAULT_EXPLORER_HOST);
    }
}
