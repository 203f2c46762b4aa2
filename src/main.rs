//! Caravel test harness CLI
//!
//! Runs registered hardware tests against the cycle-based DUT simulation
//! and reports pass/fail per test.

use caravel_tb::{cli, commands, common::logging};
use clap::Parser;
use commands::Commands;

#[derive(Parser)]
#[command(name = "caravel-tb", about = "Cycle-based Caravel test harness")]
#[command(version, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init_cli(cli.debug);

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
