use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use txdispatch::application::engine::DispatchEngine;
use txdispatch::application::session::RunOutcome;
use txdispatch::domain::config::DispatchConfig;
use txdispatch::domain::ports::{ChannelBox, TransactionStoreBox};
use txdispatch::domain::transaction::TxStatus;
use txdispatch::infrastructure::gateway::{GatewayConfig, JidChannel, PhoneChannel};
use txdispatch::infrastructure::in_memory::InMemoryTransactionStore;
#[cfg(feature = "storage-rocksdb")]
use txdispatch::infrastructure::rocksdb::RocksDbTransactionStore;
use txdispatch::interfaces::csv::transaction_reader::DraftReader;
use txdispatch::interfaces::csv::transaction_writer::TransactionWriter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum ChannelKind {
    /// Phone-number-addressed channel
    Phone,
    /// JID-addressed channel
    Jid,
}

#[derive(Subcommand)]
enum Command {
    /// Import transaction drafts from a CSV file
    Import {
        input: PathBuf,
        /// Clear existing records before importing
        #[arg(long)]
        replace: bool,
    },
    /// Dispatch unsent transactions sequentially over a channel
    Send {
        #[arg(long, value_enum)]
        channel: ChannelKind,
        /// Destination address, pre-normalized for the chosen channel
        #[arg(long)]
        destination: String,
        /// Upper bound on items sent this run
        #[arg(long, default_value_t = 10)]
        count: usize,
        /// Inter-send delay in milliseconds (minimum 500)
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,
        /// Base URL of the messaging gateway
        #[arg(long, default_value = "http://localhost:3000")]
        gateway: String,
        /// Import this CSV before dispatching
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Re-deliver a single transaction by id
    Resend {
        id: u64,
        #[arg(long, value_enum)]
        channel: ChannelKind,
        #[arg(long)]
        destination: String,
        #[arg(long, default_value = "http://localhost:3000")]
        gateway: String,
    },
    /// Requeue every record back to pending
    Reset,
    /// Delete a single record by id
    Delete { id: u64 },
    /// Print the transaction table as CSV
    List,
    /// Delete all records
    Clear,
}

fn open_store(db_path: Option<PathBuf>) -> Result<TransactionStoreBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = RocksDbTransactionStore::open(path).into_diagnostic()?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => Err(miette::miette!(
            "this build has no persistent storage; rebuild with --features storage-rocksdb"
        )),
        None => Ok(Box::new(InMemoryTransactionStore::new())),
    }
}

fn build_channel(kind: ChannelKind, gateway: &str) -> Result<ChannelBox> {
    let config = GatewayConfig::new(gateway);
    let channel: ChannelBox = match kind {
        ChannelKind::Phone => Box::new(PhoneChannel::new(config).into_diagnostic()?),
        ChannelKind::Jid => Box::new(JidChannel::new(config).into_diagnostic()?),
    };
    Ok(channel)
}

async fn import_csv(engine: &DispatchEngine, input: &PathBuf) -> Result<usize> {
    let file = File::open(input).into_diagnostic()?;
    let reader = DraftReader::new(file);
    let mut drafts = Vec::new();
    for draft in reader.drafts() {
        match draft {
            Ok(draft) => drafts.push(draft),
            Err(e) => eprintln!("Error reading draft: {e}"),
        }
    }
    let inserted = engine.store().add_batch(drafts).await.into_diagnostic()?;
    Ok(inserted)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("txdispatch=info")),
        )
        .init();

    let cli = Cli::parse();
    let store = open_store(cli.db_path)?;
    let engine = Arc::new(DispatchEngine::new(store));

    match cli.command {
        Command::Import { input, replace } => {
            if replace {
                engine.store().clear_all().await.into_diagnostic()?;
            }
            let inserted = import_csv(&engine, &input).await?;
            println!("imported {inserted} transactions");
        }
        Command::Send { channel, destination, count, delay_ms, gateway, input } => {
            if let Some(input) = input {
                let inserted = import_csv(&engine, &input).await?;
                println!("imported {inserted} transactions");
            }

            let channel = build_channel(channel, &gateway)?;
            let config = DispatchConfig {
                destination,
                count_requested: count,
                delay_ms,
            };

            // Ctrl-C requests cooperative cancellation; the in-flight
            // send completes before the run stops.
            let canceller = engine.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    canceller.cancel();
                }
            });

            let summary = engine.dispatch(channel.as_ref(), &config).await.into_diagnostic()?;
            let verdict = match summary.outcome {
                RunOutcome::Completed => "completed",
                RunOutcome::Cancelled => "cancelled",
            };
            println!(
                "run {verdict}: {} sent, {} failed, {} unsent",
                summary.success_count, summary.failed_count, summary.remaining_unsent
            );
        }
        Command::Resend { id, channel, destination, gateway } => {
            let channel = build_channel(channel, &gateway)?;
            let tx = engine
                .resend(channel.as_ref(), id, &destination)
                .await
                .into_diagnostic()?;
            match tx.status {
                TxStatus::Failed => println!(
                    "transaction {id}: failed ({})",
                    tx.error_message.as_deref().unwrap_or("unknown error")
                ),
                status => println!("transaction {id}: {status}"),
            }
        }
        Command::Reset => {
            let touched = engine.reset_all().await.into_diagnostic()?;
            println!("reset {touched} transactions to pending");
        }
        Command::Delete { id } => {
            engine.store().delete_one(id).await.into_diagnostic()?;
            println!("deleted transaction {id}");
        }
        Command::List => {
            let transactions = engine.store().list().await.into_diagnostic()?;
            let stdout = io::stdout();
            let mut writer = TransactionWriter::new(stdout.lock());
            writer.write_transactions(&transactions).into_diagnostic()?;
        }
        Command::Clear => {
            engine.store().clear_all().await.into_diagnostic()?;
            println!("cleared all transactions");
        }
    }

    Ok(())
}
