use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::cli::Cli;
use bypass403::config::Config;
use bypass403::generator::{generate_all, BaseUrl};
use bypass403::http_client::ConnectionPool;
use bypass403::output::{spawn_result_writer, OutputFormat};
use bypass403::probe::HttpProber;
use bypass403::utils::collect_base_urls;
use bypass403::{PayloadCatalog, ProbeDispatcher};

fn print_ascii_logo() {
    eprintln!(r#"
     _                               _  _    ___ _____
    | |__  _   _ _ __   __ _ ___ ___| || |  / _ \___ /
    | '_ \| | | | '_ \ / _` / __/ __| || |_| | | ||_ \
    | |_) | |_| | |_) | (_| \__ \__ \__   _| |_| |__) |
    |_.__/ \__, | .__/ \__,_|___/___/  |_|  \___/____/
           |___/|_|                          v{}
    "#, env!("CARGO_PKG_VERSION"));
}

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    // Results own stdout; logs go to stderr.
    use tracing_subscriber::EnvFilter;
    let crate_level = if cli.debug { "debug" } else if cli.verbose { "info" } else { "warn" };
    let filter_str = format!("bypass403={crate},reqwest=info,hyper=info", crate = crate_level);
    let env_filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(crate_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if !cli.silent {
        print_ascii_logo();
    }

    let bases = read_targets(&cli).await?;
    if bases.is_empty() {
        anyhow::bail!("empty target list (pass --url or --stdin)");
    }

    let config = Config {
        threads: cli.threads,
        timeout_secs: cli.timeout,
        max_connections: cli.max_connections,
        ..Config::default()
    };
    let format = if cli.json { OutputFormat::Json } else { OutputFormat::Plain };

    tracing::info!(targets = bases.len(), workers = config.workers(), timeout = config.timeout_secs, "Starting probe run");
    run_probes(&bases, &config, format, cli.silent).await
}

async fn read_targets(cli: &Cli) -> anyhow::Result<Vec<BaseUrl>> {
    if !cli.stdin {
        return Ok(collect_base_urls(cli.url.split(',')));
    }
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut raw = Vec::new();
    while let Some(line) = lines.next_line().await? {
        raw.push(line);
    }
    Ok(collect_base_urls(raw.iter().map(String::as_str)))
}

async fn run_probes(bases: &[BaseUrl], config: &Config, format: OutputFormat, silent: bool) -> anyhow::Result<()> {
    let catalog = PayloadCatalog::default();
    let pool = Arc::new(ConnectionPool::new(config.max_connections, config.max_connections)?);
    tracing::info!(clients = pool.capacity(), max_connections = config.max_connections, "Connection pool ready");
    let prober = Arc::new(HttpProber::new(pool));

    let (tx, rx) = mpsc::channel(1024);
    let writer = spawn_result_writer(rx, format, silent);

    let mut dispatcher = ProbeDispatcher::new(prober, config.workers(), config.timeout())
        .with_queue_capacity(config.queue_capacity());
    let stats = dispatcher.run(generate_all(bases, &catalog), tx).await;

    let hits = writer.await?;
    tracing::info!(dispatched = stats.dispatched, completed = stats.completed, failed = stats.failed, hits, "Probe run finished");
    Ok(())
}
