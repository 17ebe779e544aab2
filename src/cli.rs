use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rcra-enrich")]
#[command(about = "Enrich facility records with RCRAInfo attributes and control events", long_about = None)]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Enrich a facility record file and expand control event matches.
    Enrich {
        /// Input records, one JSON object per line, sorted or not
        input: PathBuf,
        /// Destination for the enriched records
        output: PathBuf,
        /// Run log path. Default: RCRAscriptlog.txt next to the output
        #[arg(long)]
        log: Option<PathBuf>,
        /// Web service base URL. Falls back to $CIMC_SERVICE_URL, then the
        /// production endpoint
        #[arg(long)]
        service_url: Option<String>,
        /// Per-request timeout in seconds. Falls back to $CIMC_TIMEOUT_SECS
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Fetch one facility key and print the raw service JSON.
    Fetch {
        /// Facility key (Handler ID / EPA ID)
        key: String,
        /// Web service base URL. Falls back to $CIMC_SERVICE_URL, then the
        /// production endpoint
        #[arg(long)]
        service_url: Option<String>,
        /// Per-request timeout in seconds. Falls back to $CIMC_TIMEOUT_SECS
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}
