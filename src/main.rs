// Module declarations
mod cli;
mod controls;
mod merge;
mod remote;
mod rows;
mod run;
mod summary;
mod types;
mod util;

// Re-export module items at crate root so cross-module references stay short.
#[allow(unused_imports)]
pub(crate) use cli::*;
#[allow(unused_imports)]
pub(crate) use controls::*;
#[allow(unused_imports)]
pub(crate) use merge::*;
#[allow(unused_imports)]
pub(crate) use remote::*;
#[allow(unused_imports)]
pub(crate) use rows::*;
#[allow(unused_imports)]
pub(crate) use run::*;
#[allow(unused_imports)]
pub(crate) use summary::*;
#[allow(unused_imports)]
pub(crate) use types::*;
#[allow(unused_imports)]
pub(crate) use util::*;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use clap::Parser;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Enrich {
            input,
            output,
            log,
            service_url,
            timeout_secs,
        } => {
            let rows_in = read_rows(&input)?;
            eprintln!("Read {} records from {}", rows_in.len(), input.display());

            let log_path = log.unwrap_or_else(|| default_log_path(&output));
            let lookup = HttpLookup::new(
                resolve_service_url(service_url),
                Duration::from_secs(resolve_timeout(timeout_secs)?),
            );

            let mut summary = RunSummary::create(&log_path)?;
            let (out_rows, bad_sites, stats) = enrich_rows(rows_in, &lookup, &mut summary)?;
            write_rows(&output, &out_rows)?;
            summary.finish(&bad_sites)?;

            eprintln!(
                "{} input rows -> {} output rows ({} institutional overlays, {} engineering overlays, {} passthrough, {} unenriched)",
                stats.rows_in,
                stats.rows_out,
                stats.institutional_rows,
                stats.engineering_rows,
                stats.passthrough_rows,
                stats.unenriched_rows
            );
            if stats.failed_keys > 0 {
                eprintln!(
                    "{} EPA IDs were not found; see {}",
                    stats.failed_keys,
                    log_path.display()
                );
            }
            eprintln!(
                "Run completed at {}",
                Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!("Output records successfully created!");
            Ok(())
        }

        Command::Fetch {
            key,
            service_url,
            timeout_secs,
        } => {
            let lookup = HttpLookup::new(
                resolve_service_url(service_url),
                Duration::from_secs(resolve_timeout(timeout_secs)?),
            );
            match lookup.fetch_value(&key) {
                Ok(value) => {
                    println!("{}", serde_json::to_string_pretty(&value)?);
                    Ok(())
                }
                Err(err) => {
                    eprintln!("Lookup for {key} failed: {err}");
                    std::process::exit(2);
                }
            }
        }
    }
}

fn resolve_service_url(flag: Option<String>) -> String {
    flag.or_else(|| env_optional("CIMC_SERVICE_URL"))
        .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string())
}

fn resolve_timeout(flag: Option<u64>) -> Result<u64, Box<dyn std::error::Error>> {
    match flag {
        Some(secs) => Ok(secs),
        None => env_u64("CIMC_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
    }
}

fn default_log_path(output: &Path) -> PathBuf {
    match output.parent() {
        Some(parent) => parent.join("RCRAscriptlog.txt"),
        None => PathBuf::from("RCRAscriptlog.txt"),
    }
}
