use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use gtb_runtime::ExitStatus;

mod commands;

use commands::check::{check_cmd, CheckArgs};
use commands::run::{run_cmd, RunArgs};

#[derive(Parser)]
#[command(name = "gotobi")]
#[command(about = "Gotobi fixing-day notifier", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Commands>,

    /// Without a subcommand, behaves like `run`.
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate now; notify once when a fixing day's window is open
    Run(RunArgs),

    /// Show the fixing determination and base-day candidates for a date
    Check {
        /// Date to check (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        #[arg(long, env = "GOTOBI_HOLIDAY_JP")]
        jp: Option<PathBuf>,

        #[arg(long, env = "GOTOBI_HOLIDAY_US")]
        us: Option<PathBuf>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> local overrides ...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn dispatch(cmd: Commands) -> Result<ExitStatus> {
    match cmd {
        Commands::Run(args) => run_cmd(&args),
        Commands::Check {
            date,
            config_paths,
            jp,
            us,
        } => {
            check_cmd(&CheckArgs {
                date,
                config_paths,
                jp,
                us,
            })?;
            Ok(ExitStatus::Success)
        }
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = gtb_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
            Ok(ExitStatus::Success)
        }
    }
}

fn main() -> ExitCode {
    // dev-time secrets and overrides; must precede parsing so `env = ...`
    // defaults see them.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();
    let cmd = cli.cmd.unwrap_or(Commands::Run(cli.run));

    let status = match dispatch(cmd) {
        Ok(status) => status,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "input error");
            ExitStatus::InputError
        }
    };
    ExitCode::from(status.code() as u8)
}
