use std::io;

use crate::backend::ChainRpc;
use crate::commands::{Outcome, failed};
use crate::report::Reporter;

/// Below this balance the report nudges the user to top up.
pub const LOW_CREDIT_THRESHOLD: f64 = 1.0;

pub async fn query_account_credits<R: ChainRpc>(
    rpc: &R,
    account: &str,
    reporter: &mut Reporter,
) -> io::Result<Outcome> {
    reporter.info(format_args!("Querying credits for account: {account}"))?;
    reporter.blank()?;

    let credits = match rpc.account_credits(account).await {
        Ok(credits) => credits,
        Err(err) => return failed(reporter, err, "account credits"),
    };

    reporter.banner("Account Credits")?;
    reporter.line(format_args!("  Free Credits: {credits:.4}"))?;
    reporter.blank()?;

    if credits < LOW_CREDIT_THRESHOLD {
        reporter.warning("Low credit balance - consider adding credits")?;
    } else {
        reporter.success("Credit balance is healthy")?;
    }

    Ok(Outcome::Reported)
}
