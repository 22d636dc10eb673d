//! Main execution logic for px-export CLI.

use anyhow::{Context, Result};
use px_export::{ExportConfig, ExportSummary, Exporter};
use px_lister::{RetryConfig, S3Config, S3Lister, StaticCredentials, create_s3_client};
use px_types::Pagination;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, info, warn};
use tracing_subscriber::fmt;

use crate::args::{Cli, LogLevel};

/// Initialize logging.
pub fn init_logging(level: LogLevel) -> Result<()> {
    let level: Level = level.into();

    let subscriber = fmt::Subscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr);

    subscriber.init();

    Ok(())
}

/// Build the S3 client configuration from CLI arguments.
pub fn s3_config(args: &Cli) -> S3Config {
    let credentials = match (&args.access_key, &args.secret_key) {
        (Some(access_key), Some(secret_key)) => {
            Some(StaticCredentials::new(access_key, secret_key))
        }
        _ => None,
    };

    S3Config {
        endpoint: args.s3_endpoint.clone(),
        credentials,
        profile: args.profile.clone(),
        operation_timeout: Duration::from_secs(args.timeout),
        ..S3Config::new(&args.region)
    }
}

/// Build the export configuration from CLI arguments.
pub fn export_config(args: &Cli) -> ExportConfig {
    ExportConfig::new(&args.bucket)
        .with_root_prefix(&args.prefix)
        .with_delimiter(&args.delimiter)
        .with_shallow_pagination(Pagination::new(
            args.discovery_max_keys,
            args.discovery_max_pages,
        ))
        .with_deep_pagination(Pagination::new(
            args.partition_max_keys,
            args.partition_max_pages,
        ))
        .with_worker_count(args.workers)
        .with_queue_capacity(args.queue_capacity)
        .with_format(args.output_format.into())
        .with_output_dir(&args.output_dir)
        .with_output_prefix(&args.output_file_prefix)
        .with_force(args.force)
        .with_output_error_policy(args.on_output_error.into())
        .with_retry(RetryConfig::new().with_max_retries(args.max_retries))
}

/// Execute the export with the provided arguments.
pub async fn execute(args: &Cli) -> Result<ExportSummary> {
    let config = export_config(args);
    config.validate()?;

    let client = create_s3_client(&s3_config(args))
        .await
        .context("Failed to create S3 client")?;
    let lister = S3Lister::new(client).with_retry(config.retry.clone());

    let exporter = Exporter::new(config, Arc::new(lister));

    let shutdown = exporter.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight partitions");
            shutdown.cancel();
        }
    });

    info!(bucket = %args.bucket, prefix = %args.prefix, "Exporting partitions");
    let summary = exporter.run().await?;
    Ok(summary)
}
