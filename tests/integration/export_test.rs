//! End-to-end export against LocalStack.

use crate::common::{LocalStackTestContext, partitioned_keys};
use px_export::{ExportConfig, Exporter};
use px_lister::{S3Lister, create_s3_client};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_export_bucket_partitions() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let bucket = "px-export-e2e";
    ctx.create_bucket(bucket).await.unwrap();
    ctx.put_objects(bucket, &partitioned_keys("advertisers/", 6, 5))
        .await
        .unwrap();

    let client = create_s3_client(&ctx.s3_config()).await.unwrap();
    let dir = TempDir::new().unwrap();
    let config = ExportConfig::new(bucket)
        .with_root_prefix("advertisers/")
        .with_output_dir(dir.path())
        .with_worker_count(3)
        .with_queue_capacity(2);

    let summary = Exporter::new(config, Arc::new(S3Lister::new(client)))
        .run()
        .await
        .unwrap();

    // Default shallow caps: 5 keys x 5 pages
    assert_eq!(summary.partitions_dispatched, 6);
    assert_eq!(summary.partitions_completed, 6);
    assert_eq!(summary.entries_written, 30);
    for p in 0..6 {
        let path = dir.path().join(format!("partition_p{p:03}"));
        let records = std::fs::read_to_string(path).unwrap();
        assert_eq!(records.lines().filter(|l| !l.is_empty()).count(), 5);
    }
}
