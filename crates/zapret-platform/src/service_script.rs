//! Service-control script wrapper
//!
//! Installing and controlling the system service is delegated to a script
//! shipped next to the executable (`service.bat` on Windows, `service.sh`
//! elsewhere). Its output is returned verbatim.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{info, warn};

use crate::error::{Result, SupervisorError};
use crate::status::{CommandRunner, SystemCommandRunner};

/// Default script file name for this platform
#[cfg(windows)]
pub const SCRIPT_NAME: &str = "service.bat";

/// Default script file name for this platform
#[cfg(not(windows))]
pub const SCRIPT_NAME: &str = "service.sh";

/// Action passed to the script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    /// Install and start
    Start,
    /// Stop and remove
    Stop,
    /// Report state
    Status,
}

impl ServiceAction {
    /// Argument passed to the script
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" | "install" => Ok(Self::Start),
            "stop" | "remove" | "uninstall" => Ok(Self::Stop),
            "status" => Ok(Self::Status),
            other => Err(format!("unknown service action '{other}'")),
        }
    }
}

/// Runs the service-control script
pub struct ServiceScript<R = SystemCommandRunner> {
    path: PathBuf,
    runner: R,
}

impl ServiceScript<SystemCommandRunner> {
    /// Script at `path`, run with real OS commands
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_runner(path, SystemCommandRunner)
    }

    /// Default script inside `base_dir`
    pub fn in_dir(base_dir: &Path) -> Self {
        Self::new(base_dir.join(SCRIPT_NAME))
    }
}

impl<R: CommandRunner> ServiceScript<R> {
    /// Script at `path`, run through `runner`
    pub fn with_runner(path: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            path: path.into(),
            runner,
        }
    }

    /// Script path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the action and return the script output
    pub fn try_run(&self, action: ServiceAction) -> Result<String> {
        if !self.path.is_file() {
            return Err(SupervisorError::CollaboratorUnavailable(self.path.clone()));
        }

        let path = self.path.to_string_lossy().into_owned();
        info!("Running {} {}", path, action);
        let output = if cfg!(windows) {
            self.runner.run("cmd", &["/C", path.as_str(), action.as_str()])?
        } else {
            self.runner.run("sh", &[path.as_str(), action.as_str()])?
        };
        Ok(output)
    }

    /// Run the action; failures become a readable message instead of an error
    pub fn run(&self, action: ServiceAction) -> String {
        match self.try_run(action) {
            Ok(output) => output,
            Err(e) => {
                warn!("Service script failed: {}", e);
                e.user_message()
            }
        }
    }
}
