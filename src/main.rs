//! CLI entry point for the utilkit tool.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use utilkit::files::{base64_data_uri, file_to_base64};
use utilkit::json::to_json_string;
use utilkit::random::{
    insecure_rand_below, random_alphanumeric, random_hex, random_string, random_string_in_range,
};
use utilkit::uri::{UriParts, build_uri, join_url_paths, url_with_params};
use utilkit::{HttpClient, ParallelFetcher, load_client_tls_from_files};

mod cli;
mod config;

use cli::{Base64Args, Cli, Command, DownloadArgs, RandomArgs, RandomKind, UriArgs};
use config::FileConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();
    let loaded = config::load_config(cli.config.as_deref())?;

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config > info
    let default_level = config::default_log_level(&cli, loaded.config.as_ref());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?cli, "CLI arguments parsed");
    debug!(path = ?loaded.path, loaded = loaded.config.is_some(), "Config resolved");

    match cli.command {
        Command::Download(args) => run_download(args, loaded.config.as_ref()).await,
        Command::Base64(args) => run_base64(&args),
        Command::Random(args) => {
            run_random(&args);
            Ok(())
        }
        Command::Uri(args) => run_uri(&args),
    }
}

#[derive(Debug, Serialize)]
struct DownloadSummary {
    requested: usize,
    succeeded: usize,
    failures: Vec<FailureSummary>,
}

#[derive(Debug, Serialize)]
struct FailureSummary {
    source: String,
    destination: String,
    error: String,
}

async fn run_download(args: DownloadArgs, file: Option<&FileConfig>) -> Result<()> {
    let settings = config::resolve_download_settings(&args, file);
    debug!(?settings, "Download settings resolved");

    let client = match (&args.client_cert, &args.client_key, &args.ca_cert) {
        (Some(cert), Some(key), Some(ca)) => {
            let tls = load_client_tls_from_files(cert, key, ca)
                .context("Failed to load client TLS material")?;
            HttpClient::with_tls(&tls, settings.connect_timeout_secs, settings.read_timeout_secs)
                .context("Failed to build mutual TLS client")?
        }
        _ => HttpClient::new_with_timeouts(settings.connect_timeout_secs, settings.read_timeout_secs),
    };

    let mut requests = HashMap::with_capacity(args.pairs.len());
    for pair in args.pairs {
        if let Some(previous) = requests.insert(pair.source.clone(), pair.destination) {
            warn!(source = %pair.source, dropped = %previous, "Duplicate source, keeping last destination");
        }
    }
    let requested = requests.len();

    let fetcher = ParallelFetcher::new(settings.concurrency)?;
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling downloads");
            interrupt.cancel();
        }
    });

    info!(requested, concurrency = settings.concurrency, "Starting downloads");
    let result = fetcher.run_all(&cancel, requests, Arc::new(client)).await;

    if args.json {
        let failures: Vec<FailureSummary> = result
            .as_ref()
            .err()
            .map(|e| {
                e.failures()
                    .iter()
                    .map(|f| FailureSummary {
                        source: f.origin().to_string(),
                        destination: f.destination().to_string(),
                        error: f.cause().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let summary = DownloadSummary {
            requested,
            succeeded: requested - failures.len(),
            failures,
        };
        println!("{}", to_json_string(&summary));
    }

    result?;
    info!(requested, "Download complete");
    Ok(())
}

fn run_base64(args: &Base64Args) -> Result<()> {
    let encoded = file_to_base64(&args.path)?;
    match &args.data_uri {
        Some(content_type) => println!("{}", base64_data_uri(&encoded, content_type)),
        None => println!("{encoded}"),
    }
    Ok(())
}

fn run_random(args: &RandomArgs) {
    let value = match (args.kind, args.max) {
        (RandomKind::String, Some(max)) => random_string_in_range(args.length, max),
        (kind, max) => {
            let length = match max {
                Some(max) => {
                    let (low, high) = (args.length.min(max), args.length.max(max));
                    low + insecure_rand_below(high - low + 1)
                }
                None => args.length,
            };
            match kind {
                RandomKind::Hex => random_hex(length),
                RandomKind::Alnum => random_alphanumeric(length),
                RandomKind::String => random_string(length),
            }
        }
    };
    println!("{value}");
}

fn run_uri(args: &UriArgs) -> Result<()> {
    let port = args.port.map(|p| p.to_string()).unwrap_or_default();
    let base = build_uri(&UriParts {
        scheme: &args.scheme,
        user: &args.user,
        password: &args.password,
        host: &args.host,
        port: &port,
        path: "",
    });
    let segments: Vec<&str> = args.paths.iter().map(String::as_str).collect();
    let joined = join_url_paths(&base, &segments);
    let uri = url_with_params(&joined, args.params.iter().map(|(k, v)| (k.as_str(), v)))?;
    println!("{uri}");
    Ok(())
}
