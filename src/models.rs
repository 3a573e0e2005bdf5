use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt::Display;

use crate::helpers::{StringExt, human_size};

/// Non-negative integer, float (truncated) or numeric string.
#[allow(clippy::cast_sign_loss)]
pub fn byte_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.is_finite() && *float >= 0.0)
                .map(|float| float as u64)
        }),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn lenient_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => byte_count(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("{value} is not a byte count"))),
    }
}

/// A content-addressed file as the chain reports it for an account.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct FileRecord {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_size")]
    pub size: Option<u64>,
    /// Pinning nodes that committed to keep a copy.
    #[serde(default)]
    pub miners: Option<Vec<String>>,
}

impl FileRecord {
    pub fn hash(&self) -> String {
        self.hash.clone().unwrap_or_default().or("N/A")
    }

    pub fn name(&self) -> String {
        self.name.clone().unwrap_or_default().or("N/A")
    }

    pub fn size(&self) -> u64 {
        self.size.unwrap_or_default()
    }

    pub fn miners(&self) -> String {
        match &self.miners {
            Some(miners) if !miners.is_empty() => miners.join(", "),
            _ => String::from("None"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketSize {
    Total(u64),
    Objects(Vec<u64>),
}

impl BucketSize {
    pub fn bytes(&self) -> u64 {
        match self {
            Self::Total(total) => *total,
            Self::Objects(sizes) => sizes.iter().fold(0, |sum, size| sum.saturating_add(*size)),
        }
    }
}

#[derive(Deserialize)]
struct RawBucket {
    #[serde(alias = "bucket_name")]
    name: String,
    #[serde(default, alias = "total_size", deserialize_with = "lenient_size")]
    size: Option<u64>,
    #[serde(default, alias = "sizes", alias = "file_sizes")]
    object_sizes: Option<Vec<u64>>,
}

/// A bucket registered on chain, either with a precomputed total or per-object sizes.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "RawBucket")]
pub struct BucketRecord {
    pub name: String,
    pub size: BucketSize,
}

impl From<RawBucket> for BucketRecord {
    fn from(raw: RawBucket) -> Self {
        let size = match (raw.size, raw.object_sizes) {
            (Some(total), _) => BucketSize::Total(total),
            (None, Some(sizes)) => BucketSize::Objects(sizes),
            (None, None) => BucketSize::Total(0),
        };

        Self {
            name: raw.name,
            size,
        }
    }
}

impl BucketRecord {
    pub fn bytes(&self) -> u64 {
        self.size.bytes()
    }
}

/// S3 bucket as returned by `ListBuckets`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketEntry {
    pub name: String,
    pub created: Option<String>,
}

/// S3 object as returned by `ListObjectsV2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<String>,
}

const TIMESTAMP_WIDTH: usize = 19;

fn timestamp_column(timestamp: Option<&String>) -> String {
    format!(
        "{:>width$}",
        timestamp.map_or("", String::as_str),
        width = TIMESTAMP_WIDTH
    )
}

// same column layout as `aws s3 ls`
impl Display for BucketEntry {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{} {}", timestamp_column(self.created.as_ref()), self.name)
    }
}

impl Display for ObjectEntry {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{} {:>10} {}",
            timestamp_column(self.last_modified.as_ref()),
            human_size(self.size),
            self.key
        )
    }
}
