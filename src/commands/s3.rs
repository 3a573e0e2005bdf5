use std::io;

use crate::backend::ObjectStore;
use crate::commands::{Outcome, empty, failed};
use crate::report::Reporter;

pub fn s3_target(
    bucket: &str,
    prefix: &str,
) -> String {
    format!("s3://{bucket}/{prefix}")
}

pub async fn query_s3_buckets<S: ObjectStore>(
    store: &S,
    reporter: &mut Reporter,
) -> io::Result<Outcome> {
    reporter.info("Listing S3 buckets...")?;
    reporter.blank()?;

    let buckets = match store.list_buckets().await {
        Ok(buckets) => buckets,
        Err(err) => return failed(reporter, err, "S3 buckets"),
    };

    if buckets.is_empty() {
        return empty(reporter, "No buckets found");
    }

    reporter.banner("S3 Buckets")?;
    for bucket in &buckets {
        reporter.line(format_args!("  {bucket}"))?;
    }
    reporter.blank()?;
    reporter.success(format_args!("Total buckets: {}", buckets.len()))?;

    Ok(Outcome::Listed(buckets.len()))
}

pub async fn query_s3_objects<S: ObjectStore>(
    store: &S,
    bucket: &str,
    prefix: &str,
    reporter: &mut Reporter,
) -> io::Result<Outcome> {
    let target = s3_target(bucket, prefix);
    reporter.info(format_args!("Listing objects in {target}..."))?;
    reporter.blank()?;

    let objects = match store.list_objects(bucket, prefix).await {
        Ok(objects) => objects,
        Err(err) => return failed(reporter, err, &format!("objects in {target}")),
    };

    if objects.is_empty() {
        return empty(reporter, &format!("No objects found in {target}"));
    }

    reporter.banner(format_args!("Objects in {target}"))?;
    for object in &objects {
        reporter.line(format_args!("  {object}"))?;
    }
    reporter.blank()?;
    reporter.success(format_args!("Total objects: {}", objects.len()))?;

    Ok(Outcome::Listed(objects.len()))
}
