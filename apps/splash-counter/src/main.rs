//! # Splash Counter Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Splash Counter                                   │
//! │                                                                         │
//! │  main.rs ────► parse arguments, start logging                           │
//! │  lib.rs ─────► config, state, dispatch, JSON response on stdout         │
//! │  commands/ ──► create_unified_billing, refund_unified_billing, ...      │
//! │  state/ ─────► Database, BillingEngine, RefundEngine, PrintSpooler      │
//! │                                                                         │
//! │                    SQLite (splash.db, WAL mode)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use clap::Parser;
use splash_counter::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    splash_counter::init_tracing();
    splash_counter::run(cli).await
}
