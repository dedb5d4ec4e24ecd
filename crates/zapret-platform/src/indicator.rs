//! Running indicator
//!
//! Alternates between two frames while the process runs and shows a static
//! frame otherwise. The UI loop sleeps for [`Indicator::cadence`] between
//! ticks.

use std::time::Duration;

use crate::supervisor::RunFlag;

/// One frame of the indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorFrame {
    /// Running, first phase
    ActiveOn,
    /// Running, second phase
    ActiveOff,
    /// Not running
    Stopped,
}

impl IndicatorFrame {
    /// Terminal glyph
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::ActiveOn => "●",
            Self::ActiveOff => "○",
            Self::Stopped => "■",
        }
    }
}

/// Frame generator reading the shared run flag
#[derive(Debug, Clone)]
pub struct Indicator {
    flag: RunFlag,
    phase: bool,
}

impl Indicator {
    /// Frame period while running
    pub const ACTIVE_TICK: Duration = Duration::from_millis(500);

    /// Frame period while stopped
    pub const STOPPED_TICK: Duration = Duration::from_secs(1);

    /// Indicator following `flag`
    pub fn new(flag: RunFlag) -> Self {
        Self { flag, phase: false }
    }

    /// Delay before the next tick
    pub fn cadence(&self) -> Duration {
        if self.flag.is_running() {
            Self::ACTIVE_TICK
        } else {
            Self::STOPPED_TICK
        }
    }

    /// Advance one tick
    pub fn tick(&mut self) -> IndicatorFrame {
        if !self.flag.is_running() {
            self.phase = false;
            return IndicatorFrame::Stopped;
        }

        self.phase = !self.phase;
        if self.phase {
            IndicatorFrame::ActiveOn
        } else {
            IndicatorFrame::ActiveOff
        }
    }
}
