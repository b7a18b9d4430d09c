//! # Takeoff Estimate CLI
//!
//! Command-line front end for `estimate_core`: loads a CSV takeoff or a BIM
//! element export, prices it, and writes the report to stdout or a file.
//! Logs go to stderr so stdout carries only the report.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use estimate_core::errors::EstimateError;

use crate::cli::Cli;

const DEFAULT_FILTER: &str = "estimate_core=info,takeoff_estimate=info";
const VERBOSE_FILTER: &str = "estimate_core=debug,takeoff_estimate=debug";

fn init_tracing(verbose: bool) {
    let default = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Exit status for a failed run: the library's code when the root cause is
/// an `EstimateError`, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<EstimateError>()
        .map(EstimateError::exit_code)
        .unwrap_or(1)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_codes() {
        let unavailable = anyhow::Error::from(EstimateError::input_unavailable("x.csv", "not found"));
        assert_eq!(exit_code(&unavailable), 2);

        let empty = anyhow::Error::from(EstimateError::empty_batch("nothing"));
        assert_eq!(exit_code(&empty), 3);

        let other = anyhow::anyhow!("disk full");
        assert_eq!(exit_code(&other), 1);
    }

    #[test]
    fn test_exit_code_survives_context() {
        let result: Result<(), EstimateError> = Err(EstimateError::input_unavailable("x.csv", "gone"));
        let err = result.context("loading takeoff").unwrap_err();
        assert_eq!(exit_code(&err), 2);
    }
}
