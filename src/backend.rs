use crate::error::QueryResult;
use crate::models::{BucketEntry, BucketRecord, FileRecord, ObjectEntry};

/// The S3 side: bucket and object listings.
pub trait ObjectStore {
    async fn list_buckets(&self) -> QueryResult<Vec<BucketEntry>>;

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> QueryResult<Vec<ObjectEntry>>;
}

/// The chain side: per-account metadata served over JSON-RPC.
pub trait ChainRpc {
    async fn list_user_files(
        &self,
        account: &str,
    ) -> QueryResult<Vec<FileRecord>>;

    async fn total_storage(
        &self,
        account: &str,
    ) -> QueryResult<u64>;

    async fn list_user_buckets(
        &self,
        account: &str,
    ) -> QueryResult<Vec<BucketRecord>>;

    async fn account_credits(
        &self,
        account: &str,
    ) -> QueryResult<f64>;
}
