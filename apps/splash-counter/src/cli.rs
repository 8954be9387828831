//! Command line surface of the counter.
//!
//! ```text
//! splash-counter [--token <JWT>] <command>
//!
//!   bill          --cart <file|->                 sell a cart (JSON)
//!   refund        --bill-id <id> [--locker <id>]... [--costume <id>]...
//!   last-bill     --phone <number>
//!   history       --from <date> --to <date>
//!   search        --keyword <text> [--limit <n>]
//!   summary       [--date <date>]
//!   inventory     [--available-only]
//!   issue-token   --user-id <id> [--role cashier] [--email <email>] [--hours 12]
//! ```

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use splash_core::RefundSelection;
use splash_engine::Role;

#[derive(Parser, Debug)]
#[command(name = "splash-counter")]
#[command(about = "Ticket, locker and costume counter for Splash Water Park")]
#[command(version)]
pub struct Cli {
    /// Cashier access token (also read from `SPLASH_TOKEN`).
    #[arg(long, env = "SPLASH_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Pretty-print the JSON response.
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sell tickets, lockers and costumes on one bill.
    Bill(BillArgs),

    /// Hand back lockers and costumes from a bill.
    Refund(RefundArgs),

    /// The customer's most recent bill with refunds priced as of now.
    LastBill(LastBillArgs),

    /// Bills between two facility days, inclusive.
    History(HistoryArgs),

    /// Bills matching a customer name, number or bill number.
    Search(SearchArgs),

    /// Takings for one facility day.
    Summary(SummaryArgs),

    /// Ticket types, lockers and costume stock.
    Inventory(InventoryArgs),

    /// Mint an access token with the counter's secret.
    IssueToken(IssueTokenArgs),
}

#[derive(Args, Debug)]
pub struct BillArgs {
    /// Cart JSON file, or `-` for stdin.
    #[arg(long)]
    pub cart: PathBuf,
}

#[derive(Args, Debug)]
pub struct RefundArgs {
    #[arg(long)]
    pub bill_id: String,

    /// Locker to hand back. Repeatable.
    #[arg(long = "locker")]
    pub lockers: Vec<String>,

    /// Costume to hand back. Repeatable.
    #[arg(long = "costume")]
    pub costumes: Vec<String>,
}

impl RefundArgs {
    /// `None` when nothing was picked, meaning everything still out.
    pub fn selection(&self) -> Option<RefundSelection> {
        if self.lockers.is_empty() && self.costumes.is_empty() {
            return None;
        }
        Some(RefundSelection {
            costume_ids: self.costumes.clone(),
            locker_ids: self.lockers.clone(),
        })
    }
}

#[derive(Args, Debug)]
pub struct LastBillArgs {
    #[arg(long)]
    pub phone: String,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    #[arg(long)]
    pub from: NaiveDate,
    #[arg(long)]
    pub to: NaiveDate,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[arg(long)]
    pub keyword: String,
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Defaults to today at the facility.
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub struct InventoryArgs {
    /// Hide occupied lockers.
    #[arg(long)]
    pub available_only: bool,
}

#[derive(Args, Debug)]
pub struct IssueTokenArgs {
    #[arg(long)]
    pub user_id: String,
    #[arg(long, default_value = "cashier")]
    pub role: Role,
    #[arg(long, default_value = "")]
    pub email: String,
    #[arg(long, default_value_t = 12)]
    pub hours: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_refund_selection() {
        let cli = Cli::parse_from(["splash-counter", "refund", "--bill-id", "b1"]);
        let Command::Refund(args) = cli.command else {
            panic!("expected refund");
        };
        assert_eq!(args.selection(), None);

        let cli = Cli::parse_from([
            "splash-counter",
            "refund",
            "--bill-id",
            "b1",
            "--locker",
            "l1",
            "--costume",
            "c1",
            "--costume",
            "c2",
        ]);
        let Command::Refund(args) = cli.command else {
            panic!("expected refund");
        };
        let selection = args.selection().unwrap();
        assert_eq!(selection.locker_ids, vec!["l1"]);
        assert_eq!(selection.costume_ids, vec!["c1", "c2"]);
    }

    #[test]
    fn test_dates_and_roles_parse() {
        let cli = Cli::parse_from([
            "splash-counter",
            "history",
            "--from",
            "2024-05-01",
            "--to",
            "2024-05-31",
        ]);
        let Command::History(args) = cli.command else {
            panic!("expected history");
        };
        assert_eq!(args.from, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());

        let cli = Cli::parse_from([
            "splash-counter",
            "issue-token",
            "--user-id",
            "u1",
            "--role",
            "admin",
        ]);
        let Command::IssueToken(args) = cli.command else {
            panic!("expected issue-token");
        };
        assert_eq!(args.role, Role::Admin);
        assert_eq!(args.hours, 12);
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let result = Cli::try_parse_from(["splash-counter", "summary", "--date", "yesterday"]);
        assert!(result.is_err());
    }
}
