//! S3 lister integration tests using LocalStack.

use crate::common::{LocalStackTestContext, partitioned_keys};
use px_lister::{EntryCollector, ObjectLister, S3Lister, create_s3_client};
use px_types::{EntryKind, ListRequest, Pagination};

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_grouped_listing_returns_partitions() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let bucket = "px-lister-grouped";
    ctx.create_bucket(bucket).await.unwrap();
    ctx.put_objects(bucket, &partitioned_keys("root/", 4, 3))
        .await
        .unwrap();
    ctx.put_object(bucket, "root/_SUCCESS", 0).await.unwrap();

    let client = create_s3_client(&ctx.s3_config()).await.unwrap();
    let lister = S3Lister::new(client);

    let request = ListRequest::new(bucket, "root/").with_delimiter("/");
    let mut collector = EntryCollector::new();
    let summary = lister.list(&request, &mut collector).await.unwrap();

    let prefixes: Vec<_> = collector
        .entries()
        .iter()
        .filter(|e| e.kind() == EntryKind::Prefix)
        .map(|e| e.key().to_string())
        .collect();
    assert_eq!(prefixes, vec!["root/p000/", "root/p001/", "root/p002/", "root/p003/"]);
    assert_eq!(summary.objects, 1);
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_deep_listing_follows_continuations() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let bucket = "px-lister-deep";
    ctx.create_bucket(bucket).await.unwrap();
    ctx.put_objects(bucket, &partitioned_keys("root/", 1, 7))
        .await
        .unwrap();

    let client = create_s3_client(&ctx.s3_config()).await.unwrap();
    let lister = S3Lister::new(client);

    let request =
        ListRequest::new(bucket, "root/p000/").with_pagination(Pagination::new(2, 0));
    let mut collector = EntryCollector::new();
    let summary = lister.list(&request, &mut collector).await.unwrap();

    assert_eq!(collector.len(), 7);
    assert_eq!(summary.pages, 4);
    assert!(collector.entries().iter().all(|e| !e.is_prefix()));

    let capped = ListRequest::new(bucket, "root/p000/").with_pagination(Pagination::new(2, 2));
    let mut collector = EntryCollector::new();
    lister.list(&capped, &mut collector).await.unwrap();
    assert_eq!(collector.len(), 4);
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_missing_bucket_is_listing_error() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let client = create_s3_client(&ctx.s3_config()).await.unwrap();
    let lister = S3Lister::new(client);

    let mut collector = EntryCollector::new();
    let result = lister
        .list(&ListRequest::new("px-no-such-bucket", ""), &mut collector)
        .await;

    assert!(matches!(result, Err(px_error::ExportError::Listing(_))));
}
