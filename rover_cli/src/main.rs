mod cli;
mod drive;
mod error_fmt;
mod rt;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use rover_config::Config;
use rover_core::RoverError;

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE, RtOpts};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    if let Err(e) = color_eyre::install() {
        eprintln!("warning: color-eyre not installed: {e}");
    }
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = run(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn load_config(path: Option<&Path>) -> eyre::Result<Config> {
    match path {
        Some(p) => rover_config::load_file(p)
            .map_err(|e| eyre::Report::new(RoverError::Config(format!("{e}")))),
        None => Ok(Config::default()),
    }
}

fn init_tracing(json: bool, level: &str, logging: &rover_config::Logging) -> eyre::Result<()> {
    use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if json {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    }

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file}"))?;
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let file_level = logging.level.as_deref().unwrap_or("info");
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new(file_level))
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| eyre::eyre!("failed to initialise logging: {e}"))
}

fn run(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    init_tracing(cli.json, &cli.log_level, &cfg.logging)?;

    match cli.cmd {
        Commands::Drive {
            ticks,
            tick_hz,
            stats,
            sim_connect,
            rt,
            rt_prio,
            rt_lock,
            rt_cpu,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            {
                let flag = Arc::clone(&shutdown);
                ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                    .wrap_err("install Ctrl-C handler")?;
            }
            let mut stack = drive::assemble(&cfg, tick_hz)?;
            if sim_connect {
                stack.sim_connect();
            }
            let opts = RtOpts {
                enabled: rt,
                prio: rt_prio,
                lock: rt_lock,
                cpu: rt_cpu,
            };
            let loop_stats = drive::run_drive(&mut stack, ticks, stats, opts, shutdown)?;
            let state = stack.rover.state();
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "ticks": loop_stats.ticks,
                        "missed_deadlines": loop_stats.missed_deadlines,
                        "actuator_faults": loop_stats.actuator_faults,
                        "state": state.as_str(),
                    })
                );
            } else {
                println!("drive stopped after {} ticks ({state})", loop_stats.ticks);
            }
        }
        Commands::SelfCheck => {
            let mut stack = drive::assemble(&cfg, None)?;
            let state = drive::one_cycle(&mut stack)?;
            println!("OK ({} backend, {state})", stack.backend);
        }
        Commands::Health => {
            let mut stack = drive::assemble(&cfg, None)?;
            let state = drive::one_cycle(&mut stack)?;
            println!("{}", drive::health_json(&stack, state));
        }
    }
    Ok(())
}
