//! Service command - delegate to the service-control script

use anyhow::Result;
use clap::{Args, ValueEnum};
use zapret_platform::{ServiceAction, ServiceScript};

use crate::args::Args as GlobalArgs;

/// Service command arguments
#[derive(Args, Debug)]
pub struct ServiceArgs {
    /// Action passed to the script
    #[arg(value_enum)]
    pub action: ServiceCommand,
}

/// Service script actions
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ServiceCommand {
    /// Install and start the service
    Start,
    /// Stop and remove the service
    Stop,
    /// Show service state
    Status,
}

impl From<ServiceCommand> for ServiceAction {
    fn from(command: ServiceCommand) -> Self {
        match command {
            ServiceCommand::Start => ServiceAction::Start,
            ServiceCommand::Stop => ServiceAction::Stop,
            ServiceCommand::Status => ServiceAction::Status,
        }
    }
}

/// Execute service command
///
/// A missing script is reported as text, not as a failure.
pub fn execute(global: &GlobalArgs, args: &ServiceArgs) -> Result<()> {
    let config = super::config::load(global)?;
    let script = match config.service.script {
        Some(ref path) => ServiceScript::new(path),
        None => ServiceScript::in_dir(config.layout().base_dir()),
    };

    let output = script.run(args.action.into());
    println!("{}", output.trim_end());
    Ok(())
}
