//! badge-ledger: command-line front end for the print ledger
//!
//! Every command prints JSON to stdout; logs go to stderr.
//!
//! ## Configuration
//! - `--config` / BADGE_LEDGER_CONFIG: YAML config file
//! - BADGE_LEDGER__STORAGE__PATH: SQLite database path
//! - BADGE_LEDGER__PRINTER__DEVICE: default printer (`host[:port]`)
//! - BADGE_LEDGER_LOG: tracing filter (default: info)
//!
//! Exit codes: 0 success, 1 storage/device failure, 2 rejected input.

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::error;

use badge_ledger::config::Config;
use badge_ledger::label::LabelRequest;
use badge_ledger::printer::NetworkPrinter;
use badge_ledger::utils::bootstrap::{build_service, init_tracing};
use badge_ledger::{ErrorKind, LedgerError, PrintRequest, PrintType, Reconciliation, RosterEntry};

#[derive(Parser)]
#[command(name = "badge-ledger")]
#[command(about = "Event badge and label printing ledger")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List badge status for every company
    Status,

    /// Search badge status by company name or number
    Search { query: String },

    /// List print history, most recent first
    History,

    /// Record a print that already happened
    Record {
        #[arg(long = "type")]
        kind: PrintType,
        #[arg(long)]
        item_id: i64,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 0)]
        number: i64,
        #[arg(long, default_value_t = 1)]
        quantity: i64,
    },

    /// Zero every badge status and drop badge history
    ResetBadges,

    /// Drop all print history
    ClearHistory,

    /// Reset badges and drop all print history
    ResetAll,

    /// Pre-seed badge status from a roster (JSON array of RosterEntry)
    Seed {
        #[arg(long)]
        roster: String,
    },

    /// Printing progress against a roster (JSON array of RosterEntry)
    Stats {
        #[arg(long)]
        roster: String,
    },

    /// Expand a number selector such as "1-5,7"
    Range { selector: String },

    /// Render label markup without printing
    Render {
        #[command(subcommand)]
        label: LabelCommand,
    },

    /// Render, send to the printer, and record on success
    Print {
        #[command(subcommand)]
        label: LabelCommand,

        /// Printer address; defaults to printer.device from config
        #[arg(long, global = true)]
        device: Option<String>,

        #[arg(long, global = true, default_value_t = 1)]
        quantity: i64,

        /// Item id for wine labels and employee labels
        #[arg(long, global = true)]
        item_id: Option<i64>,
    },
}

#[derive(Subcommand, Clone)]
enum LabelCommand {
    Badge {
        #[arg(long)]
        company: String,
        #[arg(long)]
        number: i64,
    },
    Wine {
        #[arg(long)]
        number: i64,
        #[arg(long)]
        name: String,
    },
    Employee {
        #[arg(long)]
        name: String,
        #[arg(long)]
        function: String,
    },
}

impl LabelCommand {
    fn request(&self) -> LabelRequest {
        match self.clone() {
            LabelCommand::Badge { company, number } => LabelRequest::Badge {
                company_name: company,
                number,
            },
            LabelCommand::Wine { number, name } => LabelRequest::Wine { number, name },
            LabelCommand::Employee { name, function } => LabelRequest::Employee { name, function },
        }
    }

    fn print_request(
        &self,
        item_id: Option<i64>,
        quantity: i64,
        device: Option<String>,
        markup: String,
    ) -> PrintRequest {
        let (kind, item_id, item_name, item_number) = match self {
            LabelCommand::Badge { company, number } => {
                (PrintType::Badge, *number, company.clone(), *number)
            }
            LabelCommand::Wine { number, name } => {
                (PrintType::Wine, item_id.unwrap_or(*number), name.clone(), *number)
            }
            LabelCommand::Employee { name, function } => (
                PrintType::Employee,
                item_id.unwrap_or(0),
                format!("{name} – {function}"),
                0,
            ),
        };

        PrintRequest {
            kind,
            item_id,
            item_name,
            item_number,
            quantity,
            device,
            markup: Some(markup),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            println!("{}", json!({ "success": false, "error": e.to_string() }));
            return ExitCode::FAILURE;
        }
    };

    let service = match build_service(&config).await {
        Ok(s) => s,
        Err(e) => return failure(e),
    };

    match run(&service, &config, cli.command).await {
        Ok(output) => {
            println!("{}", to_pretty(&output));
            ExitCode::SUCCESS
        }
        Err(e) => failure(e),
    }
}

async fn run(
    service: &Reconciliation,
    config: &Config,
    command: Commands,
) -> Result<Value, LedgerError> {
    let output = match command {
        Commands::Status => json!(service.badge_status().await?),
        Commands::Search { query } => json!(service.search_badges(&query).await?),
        Commands::History => json!(service.history().await?),
        Commands::Record {
            kind,
            item_id,
            name,
            number,
            quantity,
        } => json!(
            service
                .record_print(kind, item_id, &name, number, quantity)
                .await?
        ),
        Commands::ResetBadges => {
            service.reset_badges().await?;
            json!({ "success": true })
        }
        Commands::ClearHistory => {
            service.clear_history().await?;
            json!({ "success": true })
        }
        Commands::ResetAll => {
            service.reset_all().await?;
            json!({ "success": true })
        }
        Commands::Seed { roster } => {
            let roster = parse_roster(&roster)?;
            let written = service.seed_roster(&roster).await?;
            json!({ "success": true, "written": written })
        }
        Commands::Stats { roster } => {
            let roster = parse_roster(&roster)?;
            json!(service.stats(&roster).await?)
        }
        Commands::Range { selector } => json!(service.parse_range_input(&selector)),
        Commands::Render { label } => {
            json!({ "markup": service.renderer().render(&label.request()) })
        }
        Commands::Print {
            label,
            device,
            quantity,
            item_id,
        } => {
            let markup = service.renderer().render(&label.request());
            let device = device.or_else(|| config.printer.device.clone());
            let request = label.print_request(item_id, quantity, device, markup);

            let printer = NetworkPrinter::new()
                .with_timeout(Duration::from_millis(config.printer.connect_timeout_ms));
            json!(service.dispatch(&printer, request).await?)
        }
    };
    Ok(output)
}

fn parse_roster(raw: &str) -> Result<Vec<RosterEntry>, LedgerError> {
    serde_json::from_str(raw)
        .map_err(|e| LedgerError::Validation(format!("invalid roster JSON: {e}")))
}

fn failure(e: LedgerError) -> ExitCode {
    error!(error = %e, "Command failed");
    println!("{}", json!({ "success": false, "error": e.to_string() }));
    match e.kind() {
        ErrorKind::Validation => ExitCode::from(2),
        ErrorKind::Storage | ErrorKind::Device => ExitCode::FAILURE,
    }
}

fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
