#![forbid(unsafe_code)]
//! Read blocks from a chain data directory and verify Merkle proofs.
//!
//! Exit status: 0 when the read succeeds or the proof holds, 1 when a proof
//! fails, 2 on any operational error.

use chainproof::block::RawBlock;
use chainproof::cli::{exit_code, init_logging, run, Commands, Outcome, EXIT_OPERATIONAL_ERROR};
use chainproof::config::load_config;
use chainproof::merkle::StateProofResult;
use clap::Parser;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./chainproof.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(mut config) => {
            if let Some(data_dir) = &cli.data_dir {
                config.store.data_dir = data_dir.clone();
            }
            config
        }
        Err(e) => {
            eprintln!("{} {}", "❌ Configuration error:".red().bold(), e);
            return ExitCode::from(EXIT_OPERATIONAL_ERROR);
        }
    };
    init_logging(&config.logging.level);

    let result = run(&cli.command, &config);
    match &result {
        Ok(outcome) => print_outcome(outcome),
        Err(e) => eprintln!("{} {}", "❌ Error:".red().bold(), e),
    }
    ExitCode::from(exit_code(&result))
}

fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Height(height) => {
            println!("{} {}", "⛓️  Chain height:".bright_cyan().bold(), height);
        }
        Outcome::Block(block) => print_block(block),
        Outcome::TransactionProof { leaf, valid: true } => {
            println!("{} {}", "✅ Transaction proof valid:".bright_green().bold(), leaf);
        }
        Outcome::TransactionProof { leaf, valid: false } => {
            println!("{} {}", "❌ Transaction proof failed:".red().bold(), leaf);
        }
        Outcome::StateProof(result) => {
            let label = match result {
                StateProofResult::ValidPositive => "✅ State proof valid, value present".bright_green(),
                StateProofResult::ValidNegative => "✅ State proof valid, value absent".bright_yellow(),
                StateProofResult::Invalid => "❌ State proof invalid".red(),
                StateProofResult::PathMismatch => {
                    "❌ Subcache roots do not match the state hash".red()
                }
            };
            println!("{}", label.bold());
        }
    }
}

fn print_block(block: &RawBlock) {
    let header = &block.header;
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Field").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

    let rows = [
        ("Height", header.height.to_string()),
        ("Size", header.size.to_string()),
        ("Version", header.version.to_string()),
        ("Network", format!("0x{:02X}", header.network)),
        ("Type", format!("0x{:04X}", header.block_type)),
        ("Timestamp", header.timestamp.to_string()),
        ("Difficulty", header.difficulty.to_string()),
        ("Signer", hex::encode_upper(header.signer_public_key)),
        ("Previous Hash", header.previous_block_hash.to_hex()),
        ("Transactions Hash", header.transactions_hash.to_hex()),
        ("Receipts Hash", header.receipts_hash.to_hex()),
        ("State Hash", header.state_hash.to_hex()),
        ("Beneficiary", hex::encode_upper(header.beneficiary_address)),
        ("Fee Multiplier", header.fee_multiplier.to_string()),
        ("Body Bytes", block.body().len().to_string()),
    ];
    for (field, value) in rows {
        table.add_row(vec![Cell::new(field), Cell::new(value)]);
    }

    println!("{}", format!("📦 Block {}", header.height).bright_cyan().bold());
    println!("{table}");
}
