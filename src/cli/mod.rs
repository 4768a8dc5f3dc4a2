//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

/// Self-check and configuration tool for the aio-testing harness
#[derive(Parser, Debug)]
#[command(name = "aio-testing")]
#[command(author = "Ryan Northey")]
#[command(version)]
#[command(about = "Check the async test harness on this machine and manage its configuration")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the harness self-check probes
    Check(CheckArgs),

    /// List available probes
    List(ListArgs),

    /// Manage the runner configuration file
    Config(ConfigArgs),
}

/// Arguments for check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Loop flavor (current-thread, paused, multi-thread); defaults to the configured one
    #[arg(short, long = "loop")]
    pub loop_flavor: Option<String>,

    /// Worker threads for the multi-thread loop
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Timeout used by the timing probes, in milliseconds
    #[arg(short, long, default_value = "10")]
    pub timeout_ms: u64,

    /// Grace period for cancellation and shutdown, in milliseconds
    #[arg(short, long)]
    pub grace_ms: Option<u64>,

    /// Specific probe number to run (1-6)
    #[arg(short, long)]
    pub probe: Option<u8>,

    /// Number of rounds
    #[arg(short, long, default_value = "1")]
    pub repeat: u32,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long, default_value = "table")]
    pub format: String,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show probe descriptions
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "./aio-testing.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Show environment variables instead
        #[arg(long)]
        env: bool,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate a configuration file
    Validate {
        /// File to validate (defaults to the discovered one)
        file: Option<String>,
    },

    /// Describe the supported environment variables
    Env,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_args() {
        let args = Args::parse_from(["aio-testing", "list", "--detailed"]);
        match args.command {
            Command::List(list_args) => assert!(list_args.detailed),
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_check_args() {
        let args = Args::parse_from([
            "aio-testing",
            "check",
            "--loop",
            "multi-thread",
            "--repeat",
            "5",
            "--probe",
            "3",
            "-v",
        ]);
        assert!(args.verbose);
        match args.command {
            Command::Check(check_args) => {
                assert_eq!(check_args.loop_flavor.as_deref(), Some("multi-thread"));
                assert_eq!(check_args.repeat, 5);
                assert_eq!(check_args.probe, Some(3));
                assert_eq!(check_args.timeout_ms, 10);
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_config_init_args() {
        let args = Args::parse_from(["aio-testing", "config", "init", "--force"]);
        match args.command {
            Command::Config(ConfigArgs {
                action: ConfigAction::Init { output, force },
            }) => {
                assert_eq!(output, "./aio-testing.yaml");
                assert!(force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }
}
