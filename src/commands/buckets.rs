use owo_colors::OwoColorize;
use std::io;
use tabled::Tabled;

use crate::backend::ChainRpc;
use crate::commands::{Outcome, empty, failed};
use crate::helpers::{format_bytes, render_table};
use crate::models::BucketRecord;
use crate::report::Reporter;

#[derive(Tabled, Debug, Clone, PartialEq, Eq)]
pub struct BucketTable {
    bucket_name: String,
    raw_size: u64,
    human_size: String,
}

impl BucketTable {
    pub fn new<S: Into<String>>(
        name: S,
        size: u64,
    ) -> Self {
        Self {
            bucket_name: name.into(),
            raw_size: size,
            human_size: format_bytes(size),
        }
    }

    pub fn bold(mut self) -> Self {
        self.bucket_name = self.bucket_name.bold().to_string();
        self.human_size = self.human_size.bold().to_string();

        self
    }
}

fn calculate_sum(rows: &[BucketTable]) -> u64 {
    rows.iter().fold(0, |sum, row| sum.saturating_add(row.raw_size))
}

/// One row per bucket plus a `total` footer.
pub fn bucket_rows(
    buckets: &[BucketRecord],
    bold_total: bool,
) -> Vec<BucketTable> {
    let mut rows: Vec<BucketTable> = buckets
        .iter()
        .map(|bucket| BucketTable::new(bucket.name.clone(), bucket.bytes()))
        .collect();

    // footer:
    let total = BucketTable::new("total", calculate_sum(&rows));
    rows.push(if bold_total { total.bold() } else { total });

    rows
}

pub async fn query_user_buckets<R: ChainRpc>(
    rpc: &R,
    account: &str,
    reporter: &mut Reporter,
) -> io::Result<Outcome> {
    reporter.info(format_args!("Querying buckets for account: {account}"))?;
    reporter.blank()?;

    let buckets = match rpc.list_user_buckets(account).await {
        Ok(buckets) => buckets,
        Err(err) => return failed(reporter, err, "user buckets"),
    };

    if buckets.is_empty() {
        return empty(reporter, "No buckets found for this account");
    }

    reporter.banner("User Buckets (Blockchain)")?;
    let rows = bucket_rows(&buckets, reporter.colored());
    reporter.line(render_table(&rows))?;
    reporter.blank()?;
    reporter.success(format_args!("Total buckets: {}", buckets.len()))?;

    Ok(Outcome::Listed(buckets.len()))
}
