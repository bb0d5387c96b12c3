//! hivelet - provision a local, throwaway metastore test environment
//!
//! Two variants: `metastore` stands up the catalog service alone, `spark`
//! additionally wires a local Spark install into it through the Iceberg
//! runtime. Both are idempotent; re-runs skip installed distributions and
//! already-applied configuration.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use hivelet_core::paths::METASTORE_PORT;
use hivelet_core::provision::{self, ProvisionOptions, Stack};
use hivelet_core::status::StackStatus;

/// The positional directive that triggers destructive reset
const RESET_DIRECTIVE: &str = "reset";

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "hivelet",
    about = "Provision a local, ephemeral metastore test environment",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Set log level
    #[clap(long, default_value = "info", global = true)]
    log_level: LogLevel,

    /// Override the install root (default: HIVELET_ROOT, then the home directory)
    #[clap(long, global = true)]
    root: Option<PathBuf>,
}

#[derive(Parser, Debug)]
enum Command {
    /// Stand up the metastore service
    Metastore {
        /// Pass 'reset' to wipe persisted state and reinitialize the schema
        directive: Option<String>,

        /// Block until the service accepts connections
        #[clap(long)]
        wait: bool,
    },

    /// Stand up the metastore and wire a local Spark install into it
    Spark {
        /// Pass 'reset' to rebuild the metastore database (the warehouse survives)
        directive: Option<String>,

        /// Block until the service accepts connections
        #[clap(long)]
        wait: bool,
    },

    /// Report what is installed, configured, and listening
    Status {
        /// Output the report as JSON
        #[clap(long)]
        json: bool,
    },
}

/// Initialize tracing from the --log-level flag; logs go to stderr
fn initialize_tracing(log_level: &LogLevel) {
    let filter = EnvFilter::new(log_level.to_filter_directive());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Only the literal reset directive is destructive; anything else preserves state
fn reset_requested(directive: Option<&str>) -> bool {
    match directive {
        Some(RESET_DIRECTIVE) => true,
        Some(other) => {
            warn!("ignoring unrecognized directive {other:?} (state preserved)");
            false
        }
        None => false,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level);

    let stack = Stack::resolve(cli.root)?;

    match cli.command {
        Command::Metastore { directive, wait } => {
            let opts = ProvisionOptions {
                reset: reset_requested(directive.as_deref()),
                wait_ready: wait,
            };
            provision::provision_metastore(&stack, &opts).await?;
            println!(
                "✅ Metastore provisioned on port {METASTORE_PORT} (log: {})",
                stack.paths.metastore_log().display()
            );
        }
        Command::Spark { directive, wait } => {
            let opts = ProvisionOptions {
                reset: reset_requested(directive.as_deref()),
                wait_ready: wait,
            };
            provision::provision_spark(&stack, &opts).await?;
            println!(
                "✅ Metastore provisioned on port {METASTORE_PORT} and wired into Spark ({})",
                provision::metastore_uri()
            );
        }
        Command::Status { json } => {
            let status = StackStatus::collect(&stack).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }
    }

    Ok(())
}

fn print_status(status: &StackStatus) {
    println!("Install root: {}", status.root.display());
    println!();

    let mark = |present: bool| if present { "✅" } else { "❌" };

    println!(
        "{} hive {} ({})",
        mark(status.hive.installed),
        status.hive.version,
        status.hive.install_dir.display()
    );
    println!(
        "{} hadoop {} ({})",
        mark(status.hadoop.installed),
        status.hadoop.version,
        status.hadoop.install_dir.display()
    );
    match &status.spark {
        Some(spark) => println!(
            "{} spark {} ({})",
            mark(spark.installed),
            spark.version,
            spark.install_dir.display()
        ),
        None => println!("   spark (SPARK_VERSION not set)"),
    }

    println!();
    println!("{} metastore site config", mark(status.site_config_present));
    match status.integration_configured {
        Some(configured) => println!("{} spark integration block", mark(configured)),
        None => println!("   spark integration block (SPARK_VERSION not set)"),
    }
    println!("{} persisted state dir", mark(status.data_dir_present));
    println!(
        "{} metastore listening on port {}",
        mark(status.metastore_listening),
        METASTORE_PORT
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metastore_parses_reset_directive() {
        let cli = Cli::try_parse_from(["hivelet", "metastore", "reset"]).unwrap();
        match cli.command {
            Command::Metastore { directive, wait } => {
                assert_eq!(directive.as_deref(), Some("reset"));
                assert!(!wait);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_spark_accepts_wait_flag() {
        let cli = Cli::try_parse_from(["hivelet", "spark", "--wait"]).unwrap();
        match cli.command {
            Command::Spark { directive, wait } => {
                assert!(directive.is_none());
                assert!(wait);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_root_flag() {
        let cli = Cli::try_parse_from(["hivelet", "status", "--root", "/sandbox"]).unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/sandbox")));
    }

    #[test]
    fn test_only_the_literal_reset_value_is_destructive() {
        assert!(reset_requested(Some("reset")));
        assert!(!reset_requested(Some("Reset")));
        assert!(!reset_requested(Some("clean")));
        assert!(!reset_requested(None));
    }
}
