use std::io;

use crate::backend::ChainRpc;
use crate::commands::{Outcome, failed};
use crate::helpers::{format_bytes, group_thousands};
use crate::report::Reporter;

pub fn storage_summary(total_bytes: u64) -> String {
    format!(
        "Total: {} ({} bytes)",
        format_bytes(total_bytes),
        group_thousands(total_bytes)
    )
}

pub async fn query_total_storage<R: ChainRpc>(
    rpc: &R,
    account: &str,
    reporter: &mut Reporter,
) -> io::Result<Outcome> {
    reporter.info(format_args!("Querying total storage for account: {account}"))?;
    reporter.blank()?;

    let total_bytes = match rpc.total_storage(account).await {
        Ok(total) => total,
        Err(err) => return failed(reporter, err, "total storage"),
    };

    reporter.banner("Total Storage Used (Blockchain)")?;
    reporter.line(format_args!("  {}", storage_summary(total_bytes)))?;
    reporter.blank()?;
    reporter.success("Storage query complete")?;

    Ok(Outcome::Reported)
}
