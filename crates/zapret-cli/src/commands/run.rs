//! Run command - start the bypass and supervise it

use std::io::{IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use crossbeam_channel::Receiver;
use tracing::info;
use zapret_core::resources::FsProbe;
use zapret_core::Planner;
use zapret_platform::{
    ChannelNotifier, Indicator, IndicatorFrame, LogNotifier, Notifier, Request, Supervisor,
    SupervisorHandle, SupervisorSettings, SupervisorState, SystemProcessControl,
};

use super::Selection;
use crate::args::Args as GlobalArgs;

/// Run command arguments
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub selection: Selection,

    /// Keep running after the process exits instead of returning an error
    #[arg(long)]
    pub stay: bool,
}

/// Execute the run command
pub fn execute(global: &GlobalArgs, args: &RunArgs) -> Result<()> {
    let config = super::config::load(global)?;
    let layout = config.layout();
    let provider = args.selection.provider(&config);
    let mode = args.selection.mode(&config);
    info!(provider, mode = %mode, base_dir = %layout.base_dir().display(), "Starting zapret");

    let plan = Planner::new(&layout, &FsProbe).plan(provider, mode);

    let (channel, notifications) = ChannelNotifier::new();
    let notifier: Arc<dyn Notifier> = if config.notifications.enabled {
        Arc::new(channel)
    } else {
        Arc::new(LogNotifier)
    };

    let supervisor = Supervisor::new(
        Box::new(SystemProcessControl),
        layout,
        notifier,
        SupervisorSettings::from(&config.process),
    );
    let handle = SupervisorHandle::new(supervisor);

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        info!("Received interrupt signal, shutting down...");
        flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    handle.submit(Request::Start(plan));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to build runtime")?;

    let outcome = runtime.block_on(supervise(&handle, &notifications, &shutdown, args.stay));

    handle.stop_blocking();
    print_notifications(&notifications);
    info!("zapret stopped");
    outcome
}

/// Indicator loop: redraw, drain notifications, detect exits
async fn supervise(
    handle: &SupervisorHandle,
    notifications: &Receiver<String>,
    shutdown: &AtomicBool,
    stay: bool,
) -> Result<()> {
    let mut indicator = Indicator::new(handle.run_flag());
    let mut was_running = false;
    let interactive = std::io::stderr().is_terminal();

    while !shutdown.load(Ordering::SeqCst) {
        print_notifications(notifications);

        let state = handle.poll();
        let running = handle.run_flag().is_running();
        if interactive {
            draw(indicator.tick(), handle);
        }

        if !stay && !handle.is_busy() && state == Some(SupervisorState::Idle) {
            if interactive {
                eprintln!();
            }
            anyhow::bail!(if was_running {
                "Bypass process exited"
            } else {
                "Bypass failed to start"
            });
        }
        was_running |= running;

        tokio::time::sleep(indicator.cadence()).await;
    }

    if interactive {
        eprintln!();
    }
    Ok(())
}

fn draw(frame: IndicatorFrame, handle: &SupervisorHandle) {
    let snapshot = handle.snapshot();
    let label = match (&snapshot.provider, snapshot.mode) {
        (Some(provider), Some(mode)) => format!("{provider} ({mode})"),
        _ => String::new(),
    };
    let symbol = match frame {
        IndicatorFrame::ActiveOn => frame.symbol().green().bold(),
        IndicatorFrame::ActiveOff => frame.symbol().green(),
        IndicatorFrame::Stopped => frame.symbol().red(),
    };

    let mut stderr = std::io::stderr().lock();
    // Redraw is cosmetic; a failed write is not worth reporting
    let _ = write!(stderr, "\r{} {:<12} {:<32}", symbol, snapshot.state.as_str(), label);
    let _ = stderr.flush();
}

fn print_notifications(notifications: &Receiver<String>) {
    for message in notifications.try_iter() {
        eprintln!("\r{} {:<48}", "»".cyan(), message);
    }
}
