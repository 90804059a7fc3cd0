use clap::Parser;

#[derive(clap::Parser, Debug)]
#[command(author, version, about = "Probe URLs for 403/401 access-control bypasses", long_about = None)]
pub struct Cli {
    /// Comma separated URLs to check
    #[arg(long, default_value = "")]
    pub url: String,

    /// Read target URLs from stdin, one per line
    #[arg(long, default_value_t = false)]
    pub stdin: bool,

    /// Number of concurrent workers
    #[arg(short = 't', long, default_value_t = 10_usize)]
    pub threads: usize,

    /// Seconds to wait before a probe times out
    #[arg(long, default_value_t = 10_u64)]
    pub timeout: u64,

    /// Pooled client and per-host connection cap
    #[arg(long, default_value_t = 100_usize)]
    pub max_connections: usize,

    /// Output results as JSON lines
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Disable banner and non-200 results
    #[arg(long, default_value_t = false)]
    pub silent: bool,

    /// Enable detailed debug logging (global)
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Enable verbose logging (global)
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
