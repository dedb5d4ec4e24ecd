//! CLI commands

pub mod completions;
pub mod config;
pub mod plan;
pub mod profiles;
pub mod run;
pub mod service;
pub mod status;
pub mod stop;

use clap::{Args, Subcommand};
use zapret_core::{Config, Mode};

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the bypass and supervise it until Ctrl-C
    Run(run::RunArgs),

    /// Print the command line for a provider and mode
    Plan(plan::PlanArgs),

    /// Terminate every running instance of the executable
    Stop,

    /// Query the system service and the process list
    Status,

    /// Control the system service through the service script
    Service(service::ServiceArgs),

    /// List provider profiles
    Profiles(profiles::ProfilesArgs),

    /// Configuration management
    Config(config::ConfigArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Provider and mode selection shared by `run` and `plan`
#[derive(Args, Debug, Clone, Default)]
pub struct Selection {
    /// Provider name or alias (default: from config)
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Mode: optimized, standard, aggressive, extreme or 1-4 (default: from config)
    #[arg(short, long)]
    pub mode: Option<Mode>,
}

impl Selection {
    /// Provider, falling back to the configured one
    pub fn provider<'a>(&'a self, config: &'a Config) -> &'a str {
        self.provider.as_deref().unwrap_or(&config.general.provider)
    }

    /// Mode, falling back to the configured one
    pub fn mode(&self, config: &Config) -> Mode {
        self.mode.unwrap_or(config.general.mode)
    }
}
