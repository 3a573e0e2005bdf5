use aws_config::BehaviorVersion;
use aws_config::timeout::TimeoutConfig;
use aws_credential_types::Credentials;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::Region;
use aws_smithy_types::DateTime;
use aws_smithy_types::date_time::Format;
use aws_smithy_types::error::display::DisplayErrorContext;
use tracing::{debug, instrument};

use crate::backend::ObjectStore;
use crate::error::{QueryError, QueryResult};
use crate::hippius::{REQUEST_TIMEOUT, S3Settings};
use crate::models::{BucketEntry, ObjectEntry};

const CREDENTIALS_PROVIDER: &str = "hippius-query";

fn store_error<E: std::error::Error>(err: &E) -> QueryError {
    QueryError::ObjectStore(DisplayErrorContext(err).to_string())
}

/// `2024-05-01T10:20:30Z` -> `2024-05-01 10:20:30`, the layout `aws s3 ls` prints.
fn display_timestamp(timestamp: &DateTime) -> Option<String> {
    let iso = timestamp.fmt(Format::DateTime).ok()?;
    let trimmed: String = iso.replace('T', " ").chars().take(19).collect();

    Some(trimmed)
}

/// S3-compatible client for the Hippius object store.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: S3Client,
    endpoint: String,
}

impl S3Store {
    /// Builds the client only; nothing goes over the wire until the first listing.
    pub async fn connect(settings: S3Settings) -> Self {
        let S3Settings {
            endpoint,
            region,
            credentials,
        } = settings;

        debug!(%endpoint, %region, access_key = %credentials, "configuring S3 client");

        let provider = Credentials::new(
            credentials.access_key,
            credentials.secret_key,
            None,
            None,
            CREDENTIALS_PROVIDER,
        );

        let timeouts = TimeoutConfig::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .operation_timeout(REQUEST_TIMEOUT)
            .build();

        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region))
            .endpoint_url(&endpoint)
            .credentials_provider(provider)
            .timeout_config(timeouts)
            .load()
            .await;

        let config = aws_sdk_s3::config::Builder::from(&shared_config)
            .force_path_style(true)
            .build();

        Self {
            client: S3Client::from_conf(config),
            endpoint,
        }
    }
}

impl ObjectStore for S3Store {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn list_buckets(&self) -> QueryResult<Vec<BucketEntry>> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|err| store_error(&err))?;

        let buckets: Vec<BucketEntry> = output
            .buckets()
            .iter()
            .map(|bucket| BucketEntry {
                name: bucket.name().unwrap_or_default().to_owned(),
                created: bucket.creation_date().and_then(display_timestamp),
            })
            .collect();

        debug!(count = buckets.len(), "listed buckets");
        Ok(buckets)
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> QueryResult<Vec<ObjectEntry>> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix((!prefix.is_empty()).then(|| prefix.to_owned()))
            .into_paginator()
            .send();

        let mut objects = Vec::new();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|err| store_error(&err))?;

            objects.extend(page.contents().iter().map(|object| ObjectEntry {
                key: object.key().unwrap_or_default().to_owned(),
                size: object
                    .size()
                    .and_then(|size| u64::try_from(size).ok())
                    .unwrap_or_default(),
                last_modified: object.last_modified().and_then(display_timestamp),
            }));
        }

        debug!(count = objects.len(), "listed objects");
        Ok(objects)
    }
}
