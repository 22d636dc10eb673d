//! px-export - parallel partition export for prefix-export.
//!
//! An export lists a root prefix once with a delimiter to discover its
//! partitions, then lists every partition in full, each into its own file:
//!
//! - [`Producer`] - shallow discovery and job dispatch
//! - [`job_queue`] - bounded queue between the producer and workers
//! - [`WorkerPool`] / [`Worker`] - concurrent traversal with pre-emptible stop
//! - [`CompletionGroup`] - waits for every worker to finish
//! - [`Exporter`] - wires the above into one run
//!
//! # Example
//!
//! ```ignore
//! use px_export::{ExportConfig, Exporter};
//! use px_lister::{S3Config, S3Lister, create_s3_client};
//! use std::sync::Arc;
//!
//! let client = create_s3_client(&S3Config::new("us-east-1")).await?;
//! let config = ExportConfig::new("my-bucket")
//!     .with_root_prefix("exports/")
//!     .with_output_dir("./target");
//!
//! let summary = Exporter::new(config, Arc::new(S3Lister::new(client))).run().await?;
//! ```

pub mod completion;
pub mod config;
pub mod exporter;
pub mod format;
pub mod job;
pub mod pool;
pub mod producer;
pub mod queue;
pub mod sink;
pub mod stats;
pub mod worker;

pub use completion::{CompletionGroup, CompletionGuard};
pub use config::{ExportConfig, MAX_QUEUE_CAPACITY, OutputErrorPolicy};
pub use exporter::Exporter;
pub use format::{OutputFormat, RecordFormatter};
pub use job::TraversalJob;
pub use pool::WorkerPool;
pub use producer::{Producer, ProducerSummary};
pub use queue::{JobReceiver, JobSender, job_queue};
pub use sink::{FileSink, OpenMode, OutputTarget};
pub use stats::{ExportStats, ExportSummary};
pub use worker::{JobOutcome, Worker, WorkerContext, WorkerExit, WorkerHandle, process_job};
