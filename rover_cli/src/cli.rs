//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "rover", version, about = "Rover control loop")]
pub struct Cli {
    /// Path to config TOML; built-in defaults are used when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Memory locking mode for real-time operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RtLock {
    /// Do not lock memory
    None,
    /// Lock currently resident pages
    Current,
    /// Lock current and future pages
    All,
}

/// Real-time knobs for `drive --rt`.
#[derive(Copy, Clone, Debug)]
pub struct RtOpts {
    pub enabled: bool,
    pub prio: Option<i32>,
    pub lock: RtLock,
    pub cpu: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop until Ctrl-C or the tick budget is spent
    Drive {
        /// Stop after this many control cycles
        #[arg(long, value_name = "N")]
        ticks: Option<u64>,
        /// Override runner.tick_hz from the config
        #[arg(long, value_name = "HZ")]
        tick_hz: Option<u32>,
        /// Print control loop latency stats on exit
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
        /// Simulation only: pair controller 0 before the first cycle
        #[arg(long, action = ArgAction::SetTrue)]
        sim_connect: bool,
        /// Enable real-time mode (SCHED_FIFO, affinity, mlockall)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on Linux.\n\nAttempts SCHED_FIFO priority, pins the process to one CPU and locks memory with mlockall. Usually needs CAP_SYS_NICE and CAP_IPC_LOCK (or root). Ignored with a warning on other platforms."
        )]
        rt: bool,
        /// SCHED_FIFO priority for --rt (defaults to the system maximum)
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
        /// Memory locking mode for --rt
        #[arg(long, value_enum, value_name = "MODE", default_value = "current")]
        rt_lock: RtLock,
        /// CPU index to pin to for --rt (defaults to 0)
        #[arg(long, value_name = "CPU")]
        rt_cpu: Option<usize>,
    },
    /// Build the device stack and run one control cycle
    SelfCheck,
    /// Print a JSON status line for operational monitoring
    Health,
}
