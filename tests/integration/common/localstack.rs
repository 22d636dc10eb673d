//! LocalStack test context and utilities.

use aws_sdk_s3::Client as S3Client;
use px_lister::{S3Config, StaticCredentials};

/// LocalStack test context providing an S3 client.
pub struct LocalStackTestContext {
    pub s3: S3Client,
    pub endpoint: String,
    pub region: String,
}

impl LocalStackTestContext {
    /// Create a new LocalStack test context.
    ///
    /// Uses the `LOCALSTACK_ENDPOINT` environment variable if set,
    /// otherwise defaults to `http://localhost:4566`.
    pub async fn new() -> Self {
        let endpoint = std::env::var("LOCALSTACK_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:4566".to_string());
        let region = "us-east-1".to_string();

        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(region.clone()))
            .endpoint_url(&endpoint)
            .load()
            .await;
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(true)
            .build();

        Self {
            s3: S3Client::from_conf(s3_config),
            endpoint,
            region,
        }
    }

    /// Listing configuration pointing at this LocalStack instance.
    pub fn s3_config(&self) -> S3Config {
        S3Config {
            endpoint: Some(self.endpoint.clone()),
            credentials: Some(StaticCredentials::new("test", "test")),
            ..S3Config::new(&self.region)
        }
    }

    /// Check if LocalStack is available and healthy.
    pub async fn is_available(&self) -> bool {
        self.s3.list_buckets().send().await.is_ok()
    }

    /// Create an S3 bucket for testing if it does not exist yet.
    pub async fn create_bucket(&self, name: &str) -> Result<(), aws_sdk_s3::Error> {
        let buckets = self.s3.list_buckets().send().await?;
        let exists = buckets
            .buckets()
            .iter()
            .any(|b| b.name().unwrap_or_default() == name);

        if !exists {
            self.s3.create_bucket().bucket(name).send().await?;
        }
        Ok(())
    }

    /// Upload an object of `size` bytes.
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        size: usize,
    ) -> Result<(), aws_sdk_s3::Error> {
        self.s3
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(vec![b'x'; size].into())
            .send()
            .await?;
        Ok(())
    }

    /// Upload every key with a 16-byte body.
    pub async fn put_objects(&self, bucket: &str, keys: &[String]) -> Result<(), aws_sdk_s3::Error> {
        for key in keys {
            self.put_object(bucket, key, 16).await?;
        }
        Ok(())
    }
}

/// Keys for `partitions` partitions under `root`, `per_partition` objects each,
/// spread over nested folders.
pub fn partitioned_keys(root: &str, partitions: usize, per_partition: usize) -> Vec<String> {
    (0..partitions)
        .flat_map(|p| {
            (0..per_partition)
                .map(move |i| format!("{root}p{p:03}/day={:02}/part-{i:05}.csv", i % 3))
        })
        .collect()
}
