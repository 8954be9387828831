//! # Splash Counter Library
//!
//! The counter application: configuration, logging, state and the command
//! layer. `main.rs` only parses arguments and calls [`run`].
//!
//! ## Module Organization
//! ```text
//! splash_counter/
//! ├── lib.rs          ◄─── You are here (tracing, startup, dispatch)
//! ├── cli.rs          ◄─── clap command line
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState (database, engines, print spooler)
//! │   └── config.rs   ◄─── AppConfig from SPLASH_* variables
//! ├── commands/
//! │   ├── billing.rs  ◄─── create_unified_billing
//! │   ├── refund.rs   ◄─── refund_unified_billing, last bill by phone
//! │   ├── history.rs  ◄─── history, search, daily summary
//! │   ├── inventory.rs◄─── list_inventory
//! │   └── token.rs    ◄─── issue_token
//! └── error.rs        ◄─── ApiError and CommandResponse
//! ```
//!
//! ## Output
//! Every invocation prints exactly one `CommandResponse` as JSON on stdout.
//! Logs go to stderr so the two never mix.

pub mod cli;
pub mod commands;
pub mod error;
pub mod state;

use std::path::Path;
use std::process::ExitCode;

use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use error::{ApiError, CommandResponse};
use splash_core::CartRequest;
use state::{AppConfig, AppState};

/// Runs one counter command.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Counter Startup                                   │
/// │                                                                         │
/// │  1. Load AppConfig from the environment                                 │
/// │  2. Open the database, apply migrations                                 │
/// │  3. Build engines, spawn the print spooler                              │
/// │  4. Dispatch the command, print the response                            │
/// │  5. Drain queued receipts, close the pool                               │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(cli: Cli) -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => return respond::<()>(Err(e.into()), cli.pretty),
    };

    info!(db_path = %config.db_path.display(), "Starting Splash counter");

    let state = match AppState::init(config).await {
        Ok(state) => state,
        Err(e) => return respond::<()>(Err(e), cli.pretty),
    };

    let code = dispatch(&state, &cli).await;
    state.shutdown().await;
    code
}

/// Runs the parsed command against `state` and prints its response.
pub async fn dispatch(state: &AppState, cli: &Cli) -> ExitCode {
    use commands::{billing, history, inventory, refund, token};

    let auth = cli.token.as_deref().unwrap_or_default();
    let pretty = cli.pretty;

    match &cli.command {
        Command::Bill(args) => {
            let result = match read_cart(&args.cart) {
                Ok(cart) => billing::create_unified_billing(state, auth, &cart).await,
                Err(e) => Err(e),
            };
            respond(result, pretty)
        }
        Command::Refund(args) => respond(
            refund::refund_unified_billing(state, auth, &args.bill_id, args.selection()).await,
            pretty,
        ),
        Command::LastBill(args) => respond(
            refund::get_last_unified_billing_by_customer_phone(state, &args.phone).await,
            pretty,
        ),
        Command::History(args) => respond(
            history::bill_history(state, args.from, args.to).await,
            pretty,
        ),
        Command::Search(args) => respond(
            history::search_bills(state, &args.keyword, args.limit).await,
            pretty,
        ),
        Command::Summary(args) => {
            let date = args.date.unwrap_or_else(|| state.facility_today());
            respond(history::daily_summary(state, date).await, pretty)
        }
        Command::Inventory(args) => respond(
            inventory::list_inventory(state, args.available_only).await,
            pretty,
        ),
        Command::IssueToken(args) => respond(
            token::issue_token(state, &args.user_id, args.role, &args.email, args.hours),
            pretty,
        ),
    }
}

/// Reads a cart from a JSON file, or stdin for `-`.
pub fn read_cart(path: &Path) -> Result<CartRequest, ApiError> {
    let raw = if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin())
    } else {
        std::fs::read_to_string(path)
    }
    .map_err(|e| ApiError::validation(format!("cannot read cart {}: {}", path.display(), e)))?;

    serde_json::from_str(&raw).map_err(|e| ApiError::validation(format!("invalid cart: {}", e)))
}

fn respond<T: Serialize>(result: Result<T, ApiError>, pretty: bool) -> ExitCode {
    let code = if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    };

    let response = CommandResponse::from(result);
    let json = if pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    };

    match json {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!(?e, "Failed to serialize response");
            return ExitCode::FAILURE;
        }
    }
    code
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG` wins when set
/// - otherwise `info`, with `debug` for the splash crates and `warn` for sqlx
///
/// Output goes to stderr.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,splash=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
