//! Status command - service and process probes

use anyhow::Result;
use colored::{ColoredString, Colorize};
use zapret_platform::{ProcessState, ServiceState, StatusReporter};

use crate::args::Args as GlobalArgs;

/// Execute status command
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let config = super::config::load(global)?;
    let reporter = StatusReporter::system(&config.service.name, &config.process.executable);
    let report = reporter.report();

    println!("Service {:<12} {}", config.service.name, service_label(report.service));
    println!("Process {:<12} {}", config.process.executable, process_label(report.process));
    Ok(())
}

fn service_label(state: ServiceState) -> ColoredString {
    let text = state.to_string();
    match state {
        ServiceState::Running => text.green().bold(),
        ServiceState::Stopped => text.yellow(),
        ServiceState::NotInstalled => text.dimmed(),
        ServiceState::Unknown => text.red(),
    }
}

fn process_label(state: ProcessState) -> ColoredString {
    let text = state.to_string();
    match state {
        ProcessState::Running => text.green().bold(),
        ProcessState::NotRunning => text.yellow(),
        ProcessState::Unknown => text.red(),
    }
}
