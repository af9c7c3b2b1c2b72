//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Parallel downloads and small URI, random and file helpers.
///
/// Utilkit fetches many URLs to many local paths with a bounded number of
/// concurrent transfers and reports every failure at once.
#[derive(Parser, Debug)]
#[command(name = "utilkit")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Read defaults from this config file instead of the XDG location
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download SOURCE=DEST pairs concurrently
    Download(DownloadArgs),
    /// Print a file's contents as base64
    Base64(Base64Args),
    /// Print a random string
    Random(RandomArgs),
    /// Assemble a URI from its parts
    Uri(UriArgs),
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Maximum concurrent downloads (1-100)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: Option<u8>,

    /// Connect timeout in seconds (1-3600)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// Read timeout in seconds (1-3600)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: Option<u64>,

    /// PEM client certificate for mutual TLS
    #[arg(long, value_name = "PATH", requires_all = ["client_key", "ca_cert"])]
    pub client_cert: Option<PathBuf>,

    /// PEM private key matching --client-cert
    #[arg(long, value_name = "PATH", requires_all = ["client_cert", "ca_cert"])]
    pub client_key: Option<PathBuf>,

    /// PEM CA bundle to trust instead of the system roots
    #[arg(long, value_name = "PATH", requires_all = ["client_cert", "client_key"])]
    pub ca_cert: Option<PathBuf>,

    /// Print a JSON summary to stdout when finished
    #[arg(long)]
    pub json: bool,

    /// Transfers as SOURCE=DEST (split at the last '=')
    #[arg(required = true, value_name = "SOURCE=DEST", value_parser = parse_pair)]
    pub pairs: Vec<DownloadPair>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPair {
    pub source: String,
    pub destination: String,
}

fn parse_pair(raw: &str) -> Result<DownloadPair, String> {
    let Some((source, destination)) = raw.rsplit_once('=') else {
        return Err(format!("expected SOURCE=DEST, got '{raw}'"));
    };
    if source.is_empty() || destination.is_empty() {
        return Err(format!("source and destination must be non-empty in '{raw}'"));
    }
    Ok(DownloadPair {
        source: source.to_string(),
        destination: destination.to_string(),
    })
}

#[derive(Args, Debug)]
pub struct Base64Args {
    /// File to encode
    pub path: PathBuf,

    /// Wrap the output in a data URI with this content type
    #[arg(long, value_name = "CONTENT_TYPE")]
    pub data_uri: Option<String>,
}

#[derive(Args, Debug)]
pub struct RandomArgs {
    /// Character set to draw from
    #[arg(value_enum)]
    pub kind: RandomKind,

    /// Length (or minimum length with --max)
    pub length: usize,

    /// Pick the length uniformly between LENGTH and MAX
    #[arg(long)]
    pub max: Option<usize>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomKind {
    /// Lowercase hex digits
    Hex,
    /// A-Z and 0-9
    Alnum,
    /// A-Z, a-z, 0-9 and space
    String,
}

#[derive(Args, Debug)]
pub struct UriArgs {
    #[arg(long)]
    pub scheme: String,

    #[arg(long)]
    pub host: String,

    #[arg(long, default_value = "")]
    pub user: String,

    /// Ignored unless --user is given
    #[arg(long, default_value = "")]
    pub password: String,

    #[arg(long)]
    pub port: Option<u16>,

    /// Path segment; repeat to join several
    #[arg(long = "path", value_name = "SEGMENT")]
    pub paths: Vec<String>,

    /// Query parameter as KEY=VALUE; repeat for several
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
