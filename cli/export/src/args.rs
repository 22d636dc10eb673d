//! CLI argument definitions for px-export.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Export the partitions under an S3 prefix, one listing file per partition.
///
/// Lists the root prefix once with a delimiter to find its partitions, then
/// lists every partition in full with a pool of workers. Partitions whose
/// output file already exists are skipped unless --force is given.
///
/// ## Examples
///
/// Basic usage:
///   px-export -b my-bucket -p exports/ --region eu-west-1
///
/// JSON output with more workers:
///   px-export -b my-bucket -p exports/ --region eu-west-1 \
///       --output-format json --workers 16 --output-dir ./listings
#[derive(Parser, Debug)]
#[command(name = "px-export")]
#[command(version, about, long_about = None)]
pub struct Cli {
    // === S3 Configuration ===
    /// S3 bucket name
    #[arg(short, long, env = "AWS_BUCKET")]
    pub bucket: String,

    /// Root prefix whose immediate children are the partitions
    #[arg(short, long, env = "AWS_PREFIX", default_value = "")]
    pub prefix: String,

    /// AWS region
    #[arg(long, env = "AWS_REGION")]
    pub region: String,

    /// Custom S3 endpoint URL (for LocalStack)
    #[arg(long, env = "AWS_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS access key ID
    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    pub access_key: Option<String>,

    /// AWS secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// AWS profile name
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30", value_parser = parse_positive_u64)]
    pub timeout: u64,

    // === Listing Options ===
    /// Hierarchy delimiter
    #[arg(long, default_value = "/")]
    pub delimiter: String,

    /// Keys per page when discovering partitions
    #[arg(long, env = "ADV_MAX_KEYS", default_value = "5", value_parser = parse_max_keys)]
    pub discovery_max_keys: i32,

    /// Pages when discovering partitions (0 = unlimited)
    #[arg(long, env = "ADV_MAX_PAGES", default_value = "5")]
    pub discovery_max_pages: usize,

    /// Keys per page when listing a partition
    #[arg(long, env = "FILE_MAX_KEYS", default_value = "1000", value_parser = parse_max_keys)]
    pub partition_max_keys: i32,

    /// Pages when listing a partition (0 = unlimited)
    #[arg(long, env = "FILE_MAX_PAGES", default_value = "0")]
    pub partition_max_pages: usize,

    /// Retries per failed page request (0 = no retry)
    #[arg(long, env = "LIST_MAX_RETRIES", default_value = "0")]
    pub max_retries: u32,

    // === Parallelism Options ===
    /// Number of concurrent partition workers (must be >= 1)
    #[arg(short, long, env = "LIST_ALL_WORKERS_COUNT", default_value = "5", value_parser = parse_positive_usize)]
    pub workers: usize,

    /// Pending jobs the queue holds before discovery waits (must be >= 1)
    #[arg(long, env = "QUEUE_CAPACITY", default_value = "5", value_parser = parse_positive_usize)]
    pub queue_capacity: usize,

    // === Output Options ===
    /// Record format of the output files
    #[arg(long, env = "OUTPUT_FORMAT", value_enum, default_value = "csv")]
    pub output_format: OutputFormatArg,

    /// Directory receiving one file per partition
    #[arg(long, env = "OUTPUT_LOCATION", default_value = "./target")]
    pub output_dir: PathBuf,

    /// Output files are named <prefix>_<partition>
    #[arg(long, env = "OUTPUT_FILE_PREFIX", default_value = "partition")]
    pub output_file_prefix: String,

    /// Rewrite partitions whose output file already exists
    #[arg(long, env = "FORCE")]
    pub force: bool,

    /// What to do when a partition's output cannot be written
    #[arg(long, env = "ON_OUTPUT_ERROR", value_enum, default_value = "fail-job")]
    pub on_output_error: OutputErrorArg,

    // === Reporting Options ===
    /// Write the run summary as JSON to stderr
    #[arg(long)]
    pub stats_json: bool,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

/// Output format argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    /// kind,bucket,key,size,last_modified
    Csv,
    /// One JSON object per line
    Json,
}

impl From<OutputFormatArg> for px_export::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Csv => px_export::OutputFormat::Csv,
            OutputFormatArg::Json => px_export::OutputFormat::Json,
        }
    }
}

/// Output error policy argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputErrorArg {
    /// Mark the partition failed and continue with the others
    FailJob,
    /// Stop all workers and exit with an error
    AbortRun,
}

impl From<OutputErrorArg> for px_export::OutputErrorPolicy {
    fn from(arg: OutputErrorArg) -> Self {
        match arg {
            OutputErrorArg::FailJob => px_export::OutputErrorPolicy::FailJob,
            OutputErrorArg::AbortRun => px_export::OutputErrorPolicy::AbortRun,
        }
    }
}

/// Log level argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Trace level (most verbose)
    Trace,
    /// Debug level
    Debug,
    /// Info level (default)
    Info,
    /// Warning level
    Warn,
    /// Error level (least verbose)
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Parse a positive usize (>= 1).
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}

fn parse_positive_u64(s: &str) -> Result<u64, String> {
    let value: u64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}

/// Parse a page size (1-1000).
fn parse_max_keys(s: &str) -> Result<i32, String> {
    let value: i32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if !(1..=px_types::MAX_KEYS_LIMIT).contains(&value) {
        return Err(format!("{} is not in 1..={}", value, px_types::MAX_KEYS_LIMIT));
    }
    Ok(value)
}
