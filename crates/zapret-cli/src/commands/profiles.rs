//! Profiles command - list compiled-in provider presets

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use zapret_core::{mode, provider, Mode};

/// Profiles command arguments
#[derive(Args, Debug)]
pub struct ProfilesArgs {
    /// Show the effective settings under this mode
    #[arg(short, long)]
    pub mode: Option<Mode>,

    /// Show a single provider
    pub provider: Option<String>,
}

/// Execute profiles command
pub fn execute(args: &ProfilesArgs) -> Result<()> {
    let profiles: Vec<_> = match args.provider {
        Some(ref name) => vec![provider::lookup(name)],
        None => provider::all().iter().collect(),
    };

    for profile in profiles {
        let mut heading = profile.name.bold().to_string();
        if !profile.aliases.is_empty() {
            heading.push_str(&format!(" ({})", profile.aliases.join(", ")));
        }
        println!("{heading}");

        let body = match args.mode {
            Some(mode) => mode::apply(profile, mode).describe(),
            None => profile.describe(),
        };
        for line in body.lines().skip(1) {
            println!("  {line}");
        }
        println!();
    }

    if args.mode.is_none() {
        println!("Modes:");
        for mode in Mode::ALL {
            println!("  {:<11} {}", mode.name(), mode.description());
        }
    }

    Ok(())
}
