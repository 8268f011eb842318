mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::analyze::{AnalyzeArgs, ValidateArgs};
use commands::sensitivity::SensitivityArgs;

/// ASC 606 significant financing component analysis
#[derive(Parser)]
#[command(
    name = "sfc",
    version,
    about = "ASC 606 significant financing component analysis",
    long_about = "A CLI for measuring the significant financing component of prepaid \
                  license and support contracts with decimal precision. Values the \
                  contract, tests significance, builds the effective-interest \
                  amortization schedule and generates balanced journal entries."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full financing analysis on a contract
    Analyze(AnalyzeArgs),
    /// Check a contract and configuration, reporting warnings only
    Validate(ValidateArgs),
    /// Sweep discount rate against license allocation
    Sensitivity(SensitivityArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

/// Input the caller can fix exits 2; everything else exits 1.
const EXIT_FAILURE: i32 = 1;
const EXIT_INVALID_INPUT: i32 = 2;

fn is_client_error(err: &(dyn std::error::Error + 'static)) -> bool {
    if let Some(e) = err.downcast_ref::<sfc_core::SfcError>() {
        e.is_client_error()
    } else {
        err.is::<serde_json::Error>()
    }
}

fn exit_code(err: &(dyn std::error::Error + 'static)) -> i32 {
    if is_client_error(err) {
        EXIT_INVALID_INPUT
    } else {
        EXIT_FAILURE
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analyze::run_analyze(args),
        Commands::Validate(args) => commands::analyze::run_validate(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args),
        Commands::Version => {
            println!("sfc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            let code = exit_code(e.as_ref());
            tracing::debug!(error = ?e, code, "command failed");
            let label = if code == EXIT_INVALID_INPUT {
                "invalid input"
            } else {
                "error"
            };
            eprintln!("{}: {}", label.red().bold(), e);
            process::exit(code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfc_core::SfcError;

    fn boxed(e: impl std::error::Error + 'static) -> Box<dyn std::error::Error> {
        Box::new(e)
    }

    #[test]
    fn test_contract_errors_exit_invalid_input() {
        let err = boxed(SfcError::InvalidContract {
            field: "periods".into(),
            reason: "At least one period is required".into(),
        });
        assert_eq!(exit_code(err.as_ref()), EXIT_INVALID_INPUT);

        let err = boxed(SfcError::DegenerateConfiguration {
            field: "cash_received".into(),
            reason: "Cash received must be positive".into(),
        });
        assert_eq!(exit_code(err.as_ref()), EXIT_INVALID_INPUT);

        let err = boxed(SfcError::MissingInput("--input <file.json> or stdin".into()));
        assert_eq!(exit_code(err.as_ref()), EXIT_INVALID_INPUT);
    }

    #[test]
    fn test_malformed_json_exits_invalid_input() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert_eq!(exit_code(boxed(parse).as_ref()), EXIT_INVALID_INPUT);
    }

    #[test]
    fn test_engine_failures_exit_failure() {
        let err = boxed(SfcError::DivisionByZero {
            context: "monthly rate".into(),
        });
        assert_eq!(exit_code(err.as_ref()), EXIT_FAILURE);

        let io = boxed(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"));
        assert_eq!(exit_code(io.as_ref()), EXIT_FAILURE);
    }
}
