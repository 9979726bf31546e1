//! CLambda command line driver
//!
//! Loads an extension module into the reference host and calls its functions.

use clap::{Parser, Subcommand};
use commands::call::SqrtPolicy;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

/// Environment variable holding the log filter
const LOG_ENV: &str = "CLAMBDA_LOG";

#[derive(Parser)]
#[command(name = "clambda")]
#[command(about = "Load and call CLambda extension modules", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the functions a module exports
    Functions {
        /// Path to the shared library
        library: PathBuf,
    },

    /// Call a module function and print the result
    Call {
        /// Path to the shared library
        library: PathBuf,
        /// Function name, without the clambda_ prefix
        function: String,
        /// Arguments: integers, floats, true/false, null, anything else is a string
        #[arg(allow_negative_numbers = true)]
        args: Vec<String>,
        /// Negative sqrt handling for the numeric library
        #[arg(long, value_enum, ignore_case = true)]
        sqrt: Option<SqrtPolicy>,
    },

    /// List the operation names the host publishes
    Symbols,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Functions { library } => commands::functions::execute(&library),
        Commands::Call {
            library,
            function,
            args,
            sqrt,
        } => commands::call::execute(&library, &function, &args, sqrt),
        Commands::Symbols => {
            commands::symbols::execute();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqrt_flag(value: &str) -> Result<Option<SqrtPolicy>, clap::Error> {
        let cli = Cli::try_parse_from(["clambda", "call", "libm.so", "sqrt", "-4", "--sqrt", value])?;
        match cli.command {
            Commands::Call { sqrt, args, .. } => {
                assert_eq!(args, vec!["-4".to_string()]);
                Ok(sqrt)
            }
            _ => panic!("Expected call subcommand"),
        }
    }

    #[test]
    fn test_sqrt_flag_ignores_case() {
        assert_eq!(sqrt_flag("strict").unwrap(), Some(SqrtPolicy::Strict));
        assert_eq!(sqrt_flag("Strict").unwrap(), Some(SqrtPolicy::Strict));
        assert_eq!(sqrt_flag("MAGNITUDE").unwrap(), Some(SqrtPolicy::Magnitude));
    }

    #[test]
    fn test_unknown_sqrt_flag_is_rejected() {
        let err = sqrt_flag("loose").unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
