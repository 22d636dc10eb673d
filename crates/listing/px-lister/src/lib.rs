//! px-lister - object store listing for prefix-export.
//!
//! This crate provides the listing capability used by both the shallow
//! discovery pass and the per-partition deep traversal:
//!
//! - [`ObjectLister`] - paginated enumeration of a bucket/prefix
//! - [`EntryConsumer`] - the sink a listing pushes each entry into
//! - [`S3Lister`] - `ListObjectsV2` implementation with page caps and retry
//! - [`InMemoryLister`] - deterministic provider for local runs and tests
//!
//! # Example
//!
//! ```ignore
//! use px_lister::{EntryCollector, ObjectLister, S3Config, S3Lister, create_s3_client};
//! use px_types::{ListRequest, Pagination};
//!
//! let client = create_s3_client(&S3Config::new("us-east-1")).await?;
//! let lister = S3Lister::new(client);
//!
//! let request = ListRequest::new("my-bucket", "exports/")
//!     .with_delimiter("/")
//!     .with_pagination(Pagination::new(1000, 1));
//!
//! let mut collector = EntryCollector::new();
//! let summary = lister.list(&request, &mut collector).await?;
//! eprintln!("{} entries over {} pages", collector.len(), summary.pages);
//! ```

pub mod consumer;
pub mod lister;
pub mod memory;
pub mod s3;

pub use consumer::{EntryCollector, EntryConsumer};
pub use lister::{ListSummary, ObjectLister};
pub use memory::InMemoryLister;
pub use s3::{
    DEFAULT_OPERATION_TIMEOUT, ErrorClassification, RetryConfig, S3Config, S3Lister,
    StaticCredentials, classify_response, classify_sdk_error, create_s3_client, with_retry,
};
