// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use warehouse_tariff_ledger::{
    Clock, CommitRecord, ContractConfig, Invocation, MemoryLedger, WarehouseContract,
};

/// Warehouse Ledger - Replay contract invocations
///
/// Reads one JSON invocation per line, runs each in its own transaction on a
/// fresh in-memory ledger and writes a CSV report to stdout.
#[derive(Parser, Debug)]
#[command(name = "warehouse-ledger")]
#[command(about = "Replays warehouse contract invocations against an in-memory ledger", long_about = None)]
struct Args {
    /// Path to a JSON Lines file of invocations
    ///
    /// Example line: {"operation":"getMeasurement","id":"item-1"}
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// TOML contract configuration
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Do not print applied commits to stderr
    #[arg(long)]
    no_commit_log: bool,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match load_config(args.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    };

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let contract = WarehouseContract::from_config(config);
    let ledger = MemoryLedger::new();

    let rows = match replay(&contract, &ledger, BufReader::new(file)) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("Error reading invocations: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_report(&rows, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }

    if !args.no_commit_log {
        for commit in ledger.drain_commits() {
            eprintln!("{}", format_commit(&commit));
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ContractConfig, warehouse_tariff_ledger::ConfigError> {
    match path {
        Some(path) => ContractConfig::from_file(path)?.with_env_overrides(),
        None => ContractConfig::from_env(),
    }
}

/// One line of the CSV report.
///
/// Columns: `seq, operation, status, payload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    /// Line number of the invocation in the input.
    pub seq: usize,
    pub operation: String,
    /// `ok`, or the error message.
    pub status: String,
    /// JSON payload on success, empty on failure.
    pub payload: String,
}

/// Runs every invocation in `reader` in its own transaction.
///
/// Blank lines are ignored. Lines that do not parse as an [`Invocation`] are
/// skipped with a warning. A failed invocation is rolled back and reported;
/// it does not stop the replay.
///
/// # Errors
///
/// Returns an I/O error if the reader fails.
pub fn replay<C: Clock, R: BufRead>(
    contract: &WarehouseContract<C>,
    ledger: &MemoryLedger,
    reader: R,
) -> Result<Vec<ReportRow>, std::io::Error> {
    let mut rows = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let seq = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let invocation: Invocation = match serde_json::from_str(&line) {
            Ok(invocation) => invocation,
            Err(e) => {
                warn!(line = seq, error = %e, "skipping malformed invocation");
                continue;
            }
        };

        let operation = invocation.name().to_owned();
        let row = match ledger.execute(|tx| contract.invoke(tx, invocation)) {
            Ok(payload) => ReportRow {
                seq,
                operation,
                status: "ok".to_owned(),
                payload: String::from_utf8_lossy(&payload).into_owned(),
            },
            Err(e) => ReportRow {
                seq,
                operation,
                status: e.to_string(),
                payload: String::new(),
            },
        };
        rows.push(row);
    }

    Ok(rows)
}

/// Write the replay report as CSV.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_report<W: Write>(rows: &[ReportRow], writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn format_commit(commit: &CommitRecord) -> String {
    format!("commit {}: {}", commit.height, commit.keys.join(" "))
}
