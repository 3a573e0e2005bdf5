use anyhow::bail;
use clap::{ArgAction, CommandFactory, Parser};
use clap_complete::Shell;
use std::env;
use std::io::IsTerminal;
use url::Url;

use crate::dispatch::{
    ACCOUNT_ORDER, AccountQuery, Dispatcher, QUERY_ACCOUNT_ORDER, Query, Selection,
};
use crate::hippius::{
    ACCESS_KEY_VAR, DEFAULT_API_URL, DEFAULT_S3_ENDPOINT, DEFAULT_S3_REGION, S3Credentials,
    S3Settings, SECRET_KEY_VAR,
};
use crate::report::Reporter;
use crate::rpc::RpcClient;
use crate::s3::S3Store;

pub const fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
        )
        .header(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
        )
        .literal(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .invalid(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .error(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .valid(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .placeholder(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
}

pub trait Process {
    async fn process(self) -> anyhow::Result<i32>;
}

const S3_HEADING: &str = "S3 queries (recommended)";
const RPC_HEADING: &str = "Blockchain/RPC queries";

const QUERY_EXAMPLES: &str = "\
Examples:
  # List S3 buckets (requires HIPPIUS_S3_ACCESS_KEY/SECRET_KEY)
  hippius-query --s3-buckets

  # List objects in an S3 bucket
  hippius-query --s3-objects my-bucket

  # List objects with a prefix
  hippius-query --s3-objects my-bucket --prefix snapshots/

  # Query blockchain files for an account
  hippius-query --account 5GrwvaEF... --files

  # Query credits for an account
  hippius-query --account 5GrwvaEF... --credits

  # Query all blockchain info for an account
  hippius-query --account 5GrwvaEF...";

const ACCOUNT_EXAMPLES: &str = "\
Examples:
  # Everything the chain knows about an account
  hippius-account 5GrwvaEF...

  # Only files and buckets
  hippius-account 5GrwvaEF... --files --buckets";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, clap::Args)]
pub struct OutputOptions {
    /// Log diagnostics to stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl OutputOptions {
    pub fn color(&self) -> bool {
        !self.no_color && env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
    }
}

fn requested_queries(flags: &[(bool, AccountQuery)]) -> Vec<AccountQuery> {
    flags
        .iter()
        .filter_map(|(set, query)| set.then_some(*query))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Parser)]
#[clap(
    name = "hippius-query",
    version,
    about = "Query Hippius storage information",
    after_help = QUERY_EXAMPLES,
    styles = get_styles()
)]
pub struct QueryArgs {
    #[arg(long = "generate", value_enum)]
    pub generator: Option<Shell>,

    #[command(flatten)]
    pub output: OutputOptions,

    /// List S3 buckets
    #[arg(long, help_heading = S3_HEADING)]
    pub s3_buckets: bool,

    /// List objects in an S3 bucket
    #[arg(long, value_name = "BUCKET", help_heading = S3_HEADING)]
    pub s3_objects: Option<String>,

    /// Key prefix filter for --s3-objects
    #[arg(long, default_value = "", help_heading = S3_HEADING)]
    pub prefix: String,

    /// S3-compatible endpoint
    #[arg(long, env = "HIPPIUS_S3_ENDPOINT", default_value = DEFAULT_S3_ENDPOINT, help_heading = S3_HEADING)]
    pub s3_endpoint: String,

    /// S3 region name
    #[arg(long, env = "HIPPIUS_S3_REGION", default_value = DEFAULT_S3_REGION, help_heading = S3_HEADING)]
    pub s3_region: String,

    /// Hippius account address (SS58 format)
    #[arg(long, value_name = "ADDRESS", help_heading = RPC_HEADING)]
    pub account: Option<String>,

    /// Query user files (requires --account)
    #[arg(long, help_heading = RPC_HEADING)]
    pub files: bool,

    /// Query total storage used (requires --account)
    #[arg(long, help_heading = RPC_HEADING)]
    pub storage: bool,

    /// Query account credits (requires --account)
    #[arg(long, help_heading = RPC_HEADING)]
    pub credits: bool,

    /// Hippius RPC API URL
    #[arg(long, env = "HIPPIUS_API_URL", default_value = DEFAULT_API_URL, help_heading = RPC_HEADING)]
    pub api_url: Url,
}

impl QueryArgs {
    pub fn requested(&self) -> Vec<AccountQuery> {
        requested_queries(&[
            (self.files, AccountQuery::Files),
            (self.storage, AccountQuery::Storage),
            (self.credits, AccountQuery::Credits),
        ])
    }

    /// S3 first, then the account sections.
    pub fn selection(&self) -> Selection {
        let mut selection = Selection::new();

        if self.s3_buckets {
            selection = selection.push(Query::S3Buckets);
        }

        if let Some(bucket) = &self.s3_objects {
            selection = selection.push(Query::S3Objects {
                bucket: bucket.clone(),
                prefix: self.prefix.clone(),
            });
        }

        selection.with_account(
            self.account.as_deref(),
            &self.requested(),
            &QUERY_ACCOUNT_ORDER,
        )
    }

    pub fn s3_settings(&self) -> Option<S3Settings> {
        let credentials = S3Credentials::guess().ok()?;

        Some(S3Settings::new(
            self.s3_endpoint.clone(),
            self.s3_region.clone(),
            credentials,
        ))
    }
}

fn print_quick_start(reporter: &mut Reporter) -> anyhow::Result<()> {
    QueryArgs::command().print_help()?;
    reporter.blank()?;
    reporter.info("Quick start:")?;
    reporter.line(format_args!(
        "  Set {ACCESS_KEY_VAR} and {SECRET_KEY_VAR}, then run:"
    ))?;
    reporter.line("  hippius-query --s3-buckets")?;
    reporter.flush()?;

    Ok(())
}

impl Process for QueryArgs {
    async fn process(self) -> anyhow::Result<i32> {
        let mut reporter = Reporter::stdio(self.output.color());
        let settings = self.s3_settings();
        let mut selection = self.selection();

        if selection.is_empty() {
            // nothing asked for: list buckets if we can, explain otherwise
            if settings.is_none() {
                print_quick_start(&mut reporter)?;
                return Ok(0);
            }
            selection = selection.push(Query::S3Buckets);
        }

        let store = match settings {
            Some(settings) if selection.needs_object_store() => {
                Some(S3Store::connect(settings).await)
            }
            _ => None,
        };
        let rpc = RpcClient::try_new(self.api_url)?;

        let summary = Dispatcher::new(store.as_ref(), &rpc)
            .run(&selection, &mut reporter)
            .await?;

        Ok(summary.exit_code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Parser)]
#[clap(
    name = "hippius-account",
    version,
    about = "Query blockchain storage information for a Hippius account",
    after_help = ACCOUNT_EXAMPLES,
    styles = get_styles()
)]
pub struct AccountArgs {
    #[arg(long = "generate", value_enum)]
    pub generator: Option<Shell>,

    #[command(flatten)]
    pub output: OutputOptions,

    /// Hippius account address (SS58 format)
    #[arg(value_name = "ACCOUNT_ID", required_unless_present = "generator")]
    pub account_id: Option<String>,

    /// Query user files
    #[arg(long)]
    pub files: bool,

    /// Query total storage used
    #[arg(long)]
    pub storage: bool,

    /// Query user buckets
    #[arg(long)]
    pub buckets: bool,

    /// Query account credits
    #[arg(long)]
    pub credits: bool,

    /// Hippius RPC API URL
    #[arg(long, env = "HIPPIUS_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: Url,
}

impl AccountArgs {
    pub fn requested(&self) -> Vec<AccountQuery> {
        requested_queries(&[
            (self.files, AccountQuery::Files),
            (self.storage, AccountQuery::Storage),
            (self.buckets, AccountQuery::Buckets),
            (self.credits, AccountQuery::Credits),
        ])
    }

    pub fn selection(&self) -> Selection {
        Selection::new().with_account(
            self.account_id.as_deref(),
            &self.requested(),
            &ACCOUNT_ORDER,
        )
    }
}

impl Process for AccountArgs {
    async fn process(self) -> anyhow::Result<i32> {
        if self.account_id.is_none() {
            bail!("An ACCOUNT_ID is required.");
        }

        let mut reporter = Reporter::stdio(self.output.color());
        let selection = self.selection();
        let rpc = RpcClient::try_new(self.api_url)?;

        let summary = Dispatcher::<S3Store, _>::new(None, &rpc)
            .run(&selection, &mut reporter)
            .await?;

        Ok(summary.exit_code())
    }
}
