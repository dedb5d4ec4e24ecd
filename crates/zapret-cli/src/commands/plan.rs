//! Plan command - print the command line without launching anything

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::warn;
use zapret_core::resources::FsProbe;
use zapret_core::Planner;

use super::Selection;
use crate::args::Args as GlobalArgs;

/// Plan command arguments
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub selection: Selection,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: PlanFormat,

    /// List blocks one per line instead of a single command line
    #[arg(long)]
    pub blocks: bool,
}

/// Plan output format
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PlanFormat {
    /// Command line
    Text,
    /// JSON document
    Json,
}

/// Execute plan command
pub fn execute(global: &GlobalArgs, args: &PlanArgs) -> Result<()> {
    let config = super::config::load(global)?;
    let layout = config.layout();

    if let Err(e) = layout.preflight(&FsProbe) {
        warn!("{}", e);
    }

    let plan = Planner::new(&layout, &FsProbe).plan(
        args.selection.provider(&config),
        args.selection.mode(&config),
    );

    match args.format {
        PlanFormat::Json => {
            let json = serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?;
            println!("{json}");
        }
        PlanFormat::Text if args.blocks => {
            println!("# {}", plan.label());
            for block in &plan.blocks {
                let tokens: Vec<String> = block.tokens().into_iter().filter(|t| !t.is_empty()).collect();
                println!("{:<14} {}", format!("{:?}", block.category), tokens.join(" "));
            }
        }
        PlanFormat::Text => println!("{}", plan.command_line()),
    }

    Ok(())
}
