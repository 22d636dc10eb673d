//! S3 client and listing functionality.
//!
//! This module provides the S3 side of the listing capability:
//! - Client configuration with LocalStack support
//! - Paginated `ListObjectsV2` listing with page caps and delimiter grouping
//! - Retry logic with exponential backoff

mod client;
mod list;
mod retry;

pub use client::{DEFAULT_OPERATION_TIMEOUT, S3Config, StaticCredentials, create_s3_client};
pub use list::S3Lister;
pub use retry::{
    ErrorClassification, RetryConfig, classify_response, classify_sdk_error, with_retry,
};
