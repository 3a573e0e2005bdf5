use std::io;

use crate::backend::ChainRpc;
use crate::commands::{Outcome, empty, failed};
use crate::helpers::format_bytes;
use crate::report::Reporter;

pub async fn query_user_files<R: ChainRpc>(
    rpc: &R,
    account: &str,
    reporter: &mut Reporter,
) -> io::Result<Outcome> {
    reporter.info(format_args!("Querying files for account: {account}"))?;
    reporter.blank()?;

    let files = match rpc.list_user_files(account).await {
        Ok(files) => files,
        Err(err) => return failed(reporter, err, "user files"),
    };

    if files.is_empty() {
        return empty(reporter, "No files found for this account");
    }

    reporter.banner("User Files (IPFS/Blockchain)")?;
    for (idx, file) in files.iter().enumerate() {
        reporter.line(format_args!("File #{}", idx + 1))?;
        reporter.line(format_args!("  Hash: {}", file.hash()))?;
        reporter.line(format_args!("  Name: {}", file.name()))?;
        reporter.line(format_args!("  Size: {}", format_bytes(file.size())))?;
        reporter.line(format_args!("  Pinning Miners: {}", file.miners()))?;
        reporter.blank()?;
    }
    reporter.success(format_args!("Total files: {}", files.len()))?;

    Ok(Outcome::Listed(files.len()))
}
