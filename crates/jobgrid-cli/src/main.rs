use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jobgrid_core::BackendKind;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "jobgrid",
    about = "jobgrid — pluggable global job scheduler",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit synthetic jobs to a backend and report how they ran.
    ///
    /// Jobs cycle through every priority level. The cooperative backend is
    /// drained by donating the CLI thread; the concurrent backend runs them
    /// on its own threads while the CLI waits for completion.
    Run {
        /// Path to a jobgrid.toml (defaults are used when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the configured backend (cooperative, concurrent)
        #[arg(short, long)]
        backend: Option<BackendKind>,
        /// Immediate jobs to submit
        #[arg(long, default_value = "12")]
        jobs: usize,
        /// Delayed jobs to submit
        #[arg(long, default_value = "3")]
        delayed: usize,
        /// Base delay in milliseconds; the n-th delayed job waits n times this
        #[arg(long, default_value = "10")]
        delay_ms: u64,
        /// Jobs for the designated serial context
        #[arg(long, default_value = "2")]
        main: usize,
    },
    /// Manage jobgrid.toml
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a scaffolded jobgrid.toml
    Init {
        #[arg(short, long, default_value = "jobgrid.toml")]
        path: PathBuf,
        #[arg(short, long, default_value = "concurrent")]
        backend: BackendKind,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration as JSON
    Show {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,jobgrid=debug"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Commands::Run {
            config,
            backend,
            jobs,
            delayed,
            delay_ms,
            main,
        } => {
            let plan = commands::run::Plan {
                jobs,
                delayed,
                delay_ms,
                main,
            };
            commands::run::run(config.as_deref(), backend, &plan)
        }
        Commands::Config { action } => match action {
            ConfigAction::Init {
                path,
                backend,
                force,
            } => commands::config::init(&path, backend, force),
            ConfigAction::Show { config } => commands::config::show(config.as_deref()),
        },
    }
}
