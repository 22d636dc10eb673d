//! Configuration types for an export run.

use px_error::{ExportError, Result};
use px_lister::RetryConfig;
use px_types::Pagination;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::format::OutputFormat;

/// Largest job queue a bounded channel can hold.
pub const MAX_QUEUE_CAPACITY: usize = tokio::sync::Semaphore::MAX_PERMITS;

/// What a worker does when it cannot create or write a partition's output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputErrorPolicy {
    /// Mark the partition failed and move on to the next job
    #[default]
    FailJob,

    /// Stop every worker and fail the run
    AbortRun,
}

impl FromStr for OutputErrorPolicy {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fail-job" => Ok(Self::FailJob),
            "abort-run" => Ok(Self::AbortRun),
            other => Err(ExportError::Config(format!(
                "unknown output error policy '{other}' (expected fail-job or abort-run)"
            ))),
        }
    }
}

impl fmt::Display for OutputErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailJob => f.write_str("fail-job"),
            Self::AbortRun => f.write_str("abort-run"),
        }
    }
}

/// Configuration for an export run.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Bucket to export
    pub bucket: String,

    /// Root prefix whose immediate children are the partitions
    pub root_prefix: String,

    /// Hierarchy delimiter used by the shallow pass
    pub delimiter: String,

    /// Caps for the partition discovery listing
    pub shallow: Pagination,

    /// Caps for each partition's full listing
    pub deep: Pagination,

    /// Number of concurrent workers
    pub worker_count: usize,

    /// Bounded job queue capacity
    pub queue_capacity: usize,

    /// Record format of the output files
    pub format: OutputFormat,

    /// Directory receiving one file per partition
    pub output_dir: PathBuf,

    /// Output files are named `<output_prefix>_<partition>`
    pub output_prefix: String,

    /// Rewrite partitions whose output already exists
    pub force: bool,

    pub output_error_policy: OutputErrorPolicy,

    /// Per-page retry policy for listing requests
    pub retry: RetryConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            root_prefix: String::new(),
            delimiter: "/".to_string(),
            shallow: Pagination::new(5, 5),
            deep: Pagination::new(1000, 0),
            worker_count: 5,
            queue_capacity: 5,
            format: OutputFormat::Csv,
            output_dir: PathBuf::from("./target"),
            output_prefix: "partition".to_string(),
            force: false,
            output_error_policy: OutputErrorPolicy::FailJob,
            retry: RetryConfig::default(),
        }
    }
}

impl ExportConfig {
    /// Create a configuration for the given bucket with defaults.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    pub fn with_root_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.root_prefix = prefix.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_shallow_pagination(mut self, pagination: Pagination) -> Self {
        self.shallow = pagination;
        self
    }

    pub fn with_deep_pagination(mut self, pagination: Pagination) -> Self {
        self.deep = pagination;
        self
    }

    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output_prefix = prefix.into();
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_output_error_policy(mut self, policy: OutputErrorPolicy) -> Self {
        self.output_error_policy = policy;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(ExportError::Config("bucket must not be empty".to_string()));
        }
        if self.delimiter.is_empty() {
            return Err(ExportError::Config(
                "delimiter must not be empty".to_string(),
            ));
        }
        if self.worker_count == 0 {
            return Err(ExportError::Config(
                "worker_count must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ExportError::Config(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(ExportError::Config(format!(
                "queue_capacity must be at most {MAX_QUEUE_CAPACITY}"
            )));
        }
        if self.output_prefix.is_empty()
            || self.output_prefix.contains('/')
            || self.output_prefix.contains('\\')
        {
            return Err(ExportError::Config(format!(
                "output_prefix '{}' must be a non-empty file name",
                self.output_prefix
            )));
        }
        self.shallow
            .validate()
            .map_err(|e| ExportError::Config(format!("shallow pagination: {e}")))?;
        self.deep
            .validate()
            .map_err(|e| ExportError::Config(format!("deep pagination: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_config_defaults() {
        let config = ExportConfig::new("bucket");

        assert_eq!(config.bucket, "bucket");
        assert_eq!(config.root_prefix, "");
        assert_eq!(config.delimiter, "/");
        assert_eq!(config.shallow, Pagination::new(5, 5));
        assert_eq!(config.deep, Pagination::new(1000, 0));
        assert_eq!(config.worker_count, 5);
        assert_eq!(config.queue_capacity, 5);
        assert_eq!(config.format, OutputFormat::Csv);
        assert_eq!(config.output_prefix, "partition");
        assert!(!config.force);
        assert_eq!(config.output_error_policy, OutputErrorPolicy::FailJob);
        assert_eq!(config.retry.max_retries, 0);
    }

    #[test]
    fn test_export_config_builder() {
        let config = ExportConfig::new("bucket")
            .with_root_prefix("exports/")
            .with_worker_count(8)
            .with_queue_capacity(2)
            .with_format(OutputFormat::Json)
            .with_output_dir("/tmp/out")
            .with_output_prefix("advertiser")
            .with_force(true)
            .with_output_error_policy(OutputErrorPolicy::AbortRun)
            .with_retry(RetryConfig::new().with_max_retries(3));

        assert_eq!(config.root_prefix, "exports/");
        assert_eq!(config.worker_count, 8);
        assert_eq!(config.queue_capacity, 2);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.output_prefix, "advertiser");
        assert!(config.force);
        assert_eq!(config.output_error_policy, OutputErrorPolicy::AbortRun);
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn test_export_config_validation() {
        assert!(ExportConfig::new("bucket").validate().is_ok());

        assert!(ExportConfig::new("").validate().is_err());
        assert!(ExportConfig::new("b").with_worker_count(0).validate().is_err());
        assert!(ExportConfig::new("b").with_queue_capacity(0).validate().is_err());
        assert!(ExportConfig::new("b").with_delimiter("").validate().is_err());
        assert!(ExportConfig::new("b").with_output_prefix("").validate().is_err());
        assert!(ExportConfig::new("b").with_output_prefix("a/b").validate().is_err());
        assert!(
            ExportConfig::new("b")
                .with_deep_pagination(Pagination::new(0, 0))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_queue_capacity_upper_bound() {
        let at_limit = ExportConfig::new("b").with_queue_capacity(MAX_QUEUE_CAPACITY);
        assert!(at_limit.validate().is_ok());

        let err = ExportConfig::new("b")
            .with_queue_capacity(usize::MAX)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ExportError::Config(_)));
    }

    #[test]
    fn test_output_error_policy_parse() {
        assert_eq!(
            "fail-job".parse::<OutputErrorPolicy>().unwrap(),
            OutputErrorPolicy::FailJob
        );
        assert_eq!(
            "ABORT-RUN".parse::<OutputErrorPolicy>().unwrap(),
            OutputErrorPolicy::AbortRun
        );
        assert!("retry".parse::<OutputErrorPolicy>().is_err());
        assert_eq!(OutputErrorPolicy::AbortRun.to_string(), "abort-run");
    }
}
