//! zapret-ctl
//!
//! Command-line controller for the zapret traffic-shaping executable.

mod args;
mod commands;
mod logging;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use args::Args;
use commands::Command;

fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = logging::init(&args)?;

    let result = run(&args);

    if let Err(ref e) = result {
        error!("Fatal error: {:#}", e);
    }

    result
}

fn run(args: &Args) -> Result<()> {
    match &args.command {
        Command::Run(run_args) => commands::run::execute(args, run_args),
        Command::Plan(plan_args) => commands::plan::execute(args, plan_args),
        Command::Stop => commands::stop::execute(args),
        Command::Status => commands::status::execute(args),
        Command::Service(service_args) => commands::service::execute(args, service_args),
        Command::Profiles(profile_args) => commands::profiles::execute(profile_args),
        Command::Config(config_args) => commands::config::execute(args, config_args),
        Command::Completions(comp_args) => commands::completions::execute(comp_args),
    }
}
