//! diskpack CLI
//!
//! Reads a dense disk map from a file, compacts it and prints the checksum

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use diskpack::{compact_with, BlockStore, CompactionConfig, CompactionPolicy, CompactionReport};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "diskpack")]
#[command(about = "Compact a block disk map and report its checksum")]
struct Args {
    /// File whose first line is the dense disk map
    input: PathBuf,

    /// Compaction policy [default: from config, else defragment]
    #[arg(short, long, value_enum)]
    policy: Option<PolicyArg>,

    /// TOML config file (policy, trace)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dump the block map after every move
    #[arg(short, long)]
    verbose: bool,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PolicyArg {
    Fragment,
    Defragment,
    /// Run both policies, each on a fresh copy of the disk
    Both,
}

fn read_disk_map(path: &Path) -> Result<String> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read disk map from {:?}", path))?;
    let line = contents.lines().next().unwrap_or_default().trim();
    if line.is_empty() {
        bail!("disk map file {:?} is empty", path);
    }
    Ok(line.to_string())
}

fn print_report(report: &CompactionReport) {
    let checksum = report.checksum.unwrap_or_default();
    match report.policy {
        Some(CompactionPolicy::Fragment) => {
            println!("After compaction, disk checksum is {}", checksum)
        }
        Some(CompactionPolicy::Defragment) | None => {
            println!("After defragmentation, disk checksum is {}", checksum)
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => CompactionConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config {:?}", path))?,
        None => CompactionConfig::default(),
    };
    if args.verbose {
        config.trace = true;
    }

    let default_level = if args.verbose {
        tracing::Level::TRACE
    } else {
        tracing::Level::WARN
    };
    let filter = config.apply_log_filter(
        tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
    )?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let policies = match args.policy {
        Some(PolicyArg::Fragment) => vec![CompactionPolicy::Fragment],
        Some(PolicyArg::Defragment) => vec![CompactionPolicy::Defragment],
        Some(PolicyArg::Both) => vec![CompactionPolicy::Fragment, CompactionPolicy::Defragment],
        None => vec![config.policy],
    };

    let dense_map = read_disk_map(&args.input)?;
    let store = BlockStore::build(&dense_map).context("failed to parse disk map")?;
    info!("Loaded {} blocks from {:?}", store.len(), args.input);

    let mut reports = Vec::with_capacity(policies.len());
    for policy in policies {
        let mut disk = store.clone();
        let run_config = CompactionConfig {
            policy,
            ..config.clone()
        };
        reports.push(compact_with(&mut disk, &run_config)?);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        reports.iter().for_each(print_report);
    }

    Ok(())
}
