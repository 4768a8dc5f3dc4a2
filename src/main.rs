//! aio-testing - self-check tool for the async test harness
//!
//! Runs the harness's built-in probes on this machine and manages the runner
//! configuration shared with test suites that use the library.
//!
//! ## Usage
//!
//! ```bash
//! # Run every probe on the configured loop
//! aio-testing check
//!
//! # Run probes on a multi-thread loop, 20 rounds, as JSON
//! aio-testing check --loop multi-thread --repeat 20 --format json
//!
//! # List probes
//! aio-testing list --detailed
//!
//! # Write and validate a config file
//! aio-testing config init
//! aio-testing config validate
//! ```
//!
//! `main` stays synchronous: every probe builds its own execution
//! loop, and the runner refuses to start one inside another.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

use aio_testing::cli::{self, Args};
use aio_testing::config::{print_env_help, ConfigFile, EnvConfig, LoopFlavor, RunnerConfig};
use aio_testing::models::ProbeCase;
use aio_testing::output::{OutputFormat, ResultFormatter};
use aio_testing::probes::{ProbeAggregate, ProbeRunner};
use aio_testing::utils::{init_logger, LogLevel};
use aio_testing::AsyncTestRunner;

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        let configured = ConfigFile::load_default()
            .map(|c| c.log_level)
            .unwrap_or_else(|_| "info".to_string());
        let name = EnvConfig::load().log_level_or(&configured);
        LogLevel::from_str(&name).unwrap_or(LogLevel::Info)
    };
    init_logger(level);

    match args.command {
        cli::Command::Check(check_args) => run_check(check_args),
        cli::Command::List(list_args) => {
            list_probes(list_args);
            Ok(ExitCode::SUCCESS)
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_check(args: cli::CheckArgs) -> Result<ExitCode> {
    let mut config = RunnerConfig::resolve()?;
    if let Some(flavor) = &args.loop_flavor {
        config.loop_flavor = LoopFlavor::from_str(flavor)
            .ok_or_else(|| anyhow::anyhow!("Unknown loop flavor: {flavor}"))?;
    }
    if let Some(workers) = args.workers {
        config.worker_threads = workers;
    }
    if let Some(grace) = args.grace_ms {
        config.grace_period_ms = grace;
    }
    config.validate()?;

    let probes = match args.probe {
        Some(n) => vec![ProbeCase::from_number(n)
            .ok_or_else(|| anyhow::anyhow!("Invalid probe number: {n}"))?],
        None => ProbeCase::all(),
    };

    let runner = ProbeRunner::new(AsyncTestRunner::new(config))
        .with_timeout(Duration::from_millis(args.timeout_ms));

    let format = OutputFormat::from_str(&args.format)
        .ok_or_else(|| anyhow::anyhow!("Unknown output format: {}", args.format))?;
    let mut formatter = ResultFormatter::new(format);
    if args.no_color {
        formatter = formatter.no_color();
    }

    info!(
        "Checking harness on {} loop ({} probe(s), {} round(s))",
        runner.loop_description(),
        probes.len(),
        args.repeat
    );

    let summaries = runner.run_rounds(args.repeat.max(1), &probes);
    for summary in &summaries {
        println!("{}", formatter.format_summary(summary));
    }

    let aggregate = ProbeAggregate::from_summaries(&summaries);
    if summaries.len() > 1 {
        println!(
            "{}",
            formatter.format_aggregate(&aggregate, &runner.loop_description())
        );
    }

    Ok(if aggregate.is_all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn list_probes(args: cli::ListArgs) {
    let probes = ProbeCase::all();
    println!("\nHarness Probes ({} total)\n", probes.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for probe in probes {
        let note = if probe.needs_worker_threads() {
            " (multi-thread loop only)"
        } else {
            ""
        };

        println!("  {:2}. {}{}", probe.number(), probe.name(), note);
        if args.detailed {
            println!("      {}", probe.description());
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
}

fn manage_config(args: cli::ConfigArgs) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {output}. Use --force to overwrite."
                );
            }

            ConfigFile::example().save(path)?;
            println!("✓ Configuration file created: {output}");
        }

        cli::ConfigAction::Show { env, format } => {
            if env {
                EnvConfig::load().print_summary();
            } else {
                let mut config = ConfigFile::load_default()?;
                config.runner = RunnerConfig::resolve()?;
                let output = if format == "json" {
                    serde_json::to_string_pretty(&config)?
                } else {
                    serde_yaml::to_string(&config)?
                };
                println!("{output}");
            }
        }

        cli::ConfigAction::Validate { file } => {
            let path = file.unwrap_or_else(|| {
                ConfigFile::find()
                    .map(|p| p.to_string_lossy().to_string())
                    .unwrap_or_else(|| "./aio-testing.yaml".to_string())
            });

            match ConfigFile::load(&path) {
                Ok(_) => println!("✓ Configuration file is valid: {path}"),
                Err(e) => {
                    println!("✗ Configuration file is invalid: {path}");
                    println!("  Error: {e:#}");
                    return Err(e);
                }
            }
        }

        cli::ConfigAction::Env => print_env_help(),
    }

    Ok(())
}
