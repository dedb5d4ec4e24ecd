//! Stop command - terminate the executable by image name

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::{info, warn};
use zapret_platform::status::parse_process_list;
use zapret_platform::{ProcessControl, ProcessState, SystemProcessControl};

use crate::args::Args as GlobalArgs;

/// Execute stop command
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let config = super::config::load(global)?;
    let image = config.process.executable.as_str();
    let control = SystemProcessControl;

    info!("Terminating {}", image);
    control
        .terminate_by_name(image)
        .with_context(|| format!("Failed to terminate {image}"))?;

    thread::sleep(Duration::from_millis(config.process.settle_delay_ms));

    match control.list_processes() {
        Ok(listing) if parse_process_list(&listing, image) == ProcessState::Running => {
            warn!("{} is still running", image);
            println!("{} {} is still running", "●".yellow(), image);
        }
        Ok(_) => println!("{} {}", "■".red(), "Bypass stopped".bold()),
        Err(e) => {
            warn!("Process listing failed: {}", e);
            println!("{} {}", "■".red(), "Stop requested".bold());
        }
    }

    Ok(())
}
