use crate::cli::{AccountArgs, Process, QueryArgs};
use crate::logging::init_logging;
use crate::report::Reporter;
use clap::{Command, CommandFactory, Parser};
use clap_complete::{Generator, generate};
use std::future::Future;
use std::io;

pub mod backend;
pub mod cli;
pub mod commands;
pub mod dispatch;
pub mod error;
pub mod helpers;
pub mod hippius;
pub mod logging;
pub mod models;
pub mod report;
pub mod rpc;
pub mod s3;

/// Exit code after Ctrl+C, as a shell would report it.
pub const EXIT_INTERRUPTED: i32 = 130;

pub fn print_completions<G: Generator>(
    generator: G,
    cmd: &mut Command,
) {
    // get_name returns a str, to_owned = to_string (but restriction::str_to_string)
    generate(generator, cmd, cmd.get_name().to_owned(), &mut io::stdout());
}

fn report_top_level(
    color: bool,
    message: std::fmt::Arguments<'_>,
    warning: bool,
) {
    let mut reporter = Reporter::stdio(color);
    let written = if warning {
        reporter.blank().and_then(|()| reporter.warning(message))
    } else {
        reporter.error(message)
    };

    if let Err(err) = written.and_then(|()| reporter.flush()) {
        tracing::error!(%err, "could not write to the terminal");
    }
}

/// Drive `work` to completion unless the user hits Ctrl+C first.
pub async fn run_interruptible<F>(
    work: F,
    color: bool,
) -> i32
where
    F: Future<Output = anyhow::Result<i32>>,
{
    tokio::select! {
        result = work => result.unwrap_or_else(|err| {
            report_top_level(color, format_args!("Unexpected error: {err:#}"), false);
            1
        }),
        Ok(()) = tokio::signal::ctrl_c() => {
            report_top_level(color, format_args!("Operation cancelled by user"), true);
            EXIT_INTERRUPTED
        }
    }
}

/// Entry point of `hippius-query`.
pub async fn main_query() -> i32 {
    let args = QueryArgs::parse();

    if let Some(generator) = args.generator {
        let mut cmd = QueryArgs::command();
        print_completions(generator, &mut cmd);
        return 0;
    }

    init_logging(args.output.verbose);
    let color = args.output.color();

    run_interruptible(args.process(), color).await
}

/// Entry point of `hippius-account`.
pub async fn main_account() -> i32 {
    let args = AccountArgs::parse();

    if let Some(generator) = args.generator {
        let mut cmd = AccountArgs::command();
        print_completions(generator, &mut cmd);
        return 0;
    }

    init_logging(args.output.verbose);
    let color = args.output.color();

    run_interruptible(args.process(), color).await
}
