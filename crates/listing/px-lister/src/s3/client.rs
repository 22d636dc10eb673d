//! S3 client construction.

use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use px_error::Result;
use std::fmt;
use std::time::Duration;

/// Bound on one `ListObjectsV2` call when none is configured.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the listing client.
///
/// Optional settings are plain fields, set with struct update syntax:
/// `S3Config { profile: Some(name), ..S3Config::new(region) }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub region: String,

    /// Custom endpoint such as LocalStack; switches to path-style addressing
    pub endpoint: Option<String>,

    /// Used instead of the default provider chain when set
    pub credentials: Option<StaticCredentials>,

    pub profile: Option<String>,

    pub operation_timeout: Duration,
}

impl S3Config {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint: None,
            credentials: None,
            profile: None,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }
}

/// Access key pair given on the command line or environment.
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl StaticCredentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .finish()
    }
}

/// Build the S3 client shared by every listing of a run.
pub async fn create_s3_client(config: &S3Config) -> Result<Client> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(config.operation_timeout)
                .build(),
        );

    if let Some(profile) = &config.profile {
        loader = loader.profile_name(profile);
    }

    if let Some(keys) = &config.credentials {
        loader = loader.credentials_provider(Credentials::new(
            &keys.access_key_id,
            &keys.secret_access_key,
            None,
            None,
            "px-export-static",
        ));
    }

    let shared = loader.load().await;
    let mut builder = aws_sdk_s3::config::Builder::from(&shared);
    if let Some(endpoint) = &config.endpoint {
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }

    Ok(Client::from_conf(builder.build()))
}
