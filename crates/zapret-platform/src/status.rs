//! OS-level status queries
//!
//! Answers two questions without touching the supervisor: is the system
//! service installed and running, and is a process with the executable's
//! image name alive. Command output is parsed by pure functions so the
//! parsing is testable on any host.

use std::fmt;
use std::io;

use tracing::{debug, warn};

use crate::process::hidden_command;

/// Runs an external command and returns its combined output
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`; a non-zero exit is not an error
    fn run(&self, program: &str, args: &[&str]) -> io::Result<String>;
}

impl<F> CommandRunner for F
where
    F: Fn(&str, &[&str]) -> io::Result<String> + Send + Sync,
{
    fn run(&self, program: &str, args: &[&str]) -> io::Result<String> {
        self(program, args)
    }
}

/// [`CommandRunner`] spawning real processes without a console window
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<String> {
        let output = hidden_command(program).args(args).output()?;
        debug!(status = ?output.status, "{} {}", program, args.join(" "));
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text)
    }
}

/// State of the system service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Installed and running
    Running,
    /// Installed, not running
    Stopped,
    /// Not installed
    NotInstalled,
    /// Query failed
    Unknown,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::NotInstalled => "not installed",
            Self::Unknown => "unknown",
        };
        f.write_str(text)
    }
}

/// Whether a process with the image name is alive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// At least one process found
    Running,
    /// None found
    NotRunning,
    /// Query failed
    Unknown,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Running => "running",
            Self::NotRunning => "not running",
            Self::Unknown => "unknown",
        };
        f.write_str(text)
    }
}

/// Parse `sc query <name>` output
pub fn parse_sc_query(output: &str) -> ServiceState {
    if output.contains("RUNNING") {
        ServiceState::Running
    } else if output.contains("STOPPED") {
        ServiceState::Stopped
    } else {
        ServiceState::NotInstalled
    }
}

/// Parse `systemctl is-active <name>` output
pub fn parse_systemctl(output: &str) -> ServiceState {
    match output.lines().next().map(str::trim) {
        Some("active" | "activating" | "reloading") => ServiceState::Running,
        Some("inactive" | "failed" | "deactivating") => ServiceState::Stopped,
        _ => ServiceState::NotInstalled,
    }
}

/// Check a process listing for an image name, ignoring case
pub fn parse_process_list(output: &str, image_name: &str) -> ProcessState {
    let needle = image_name.to_ascii_lowercase();
    if output
        .lines()
        .any(|line| line.to_ascii_lowercase().contains(&needle))
    {
        ProcessState::Running
    } else {
        ProcessState::NotRunning
    }
}

/// Combined answer of both queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    /// System service
    pub service: ServiceState,
    /// Bypass process
    pub process: ProcessState,
}

/// Queries service and process state through a [`CommandRunner`]
pub struct StatusReporter<R = SystemCommandRunner> {
    runner: R,
    service_name: String,
    image_name: String,
}

impl StatusReporter<SystemCommandRunner> {
    /// Reporter using real OS commands
    pub fn system(service_name: impl Into<String>, image_name: impl Into<String>) -> Self {
        Self::new(SystemCommandRunner, service_name, image_name)
    }
}

impl<R: CommandRunner> StatusReporter<R> {
    /// Reporter using the given runner
    pub fn new(runner: R, service_name: impl Into<String>, image_name: impl Into<String>) -> Self {
        Self {
            runner,
            service_name: service_name.into(),
            image_name: image_name.into(),
        }
    }

    /// State of the system service
    pub fn service_state(&self) -> ServiceState {
        let (program, args): (&str, Vec<&str>) = if cfg!(windows) {
            ("sc", vec!["query", self.service_name.as_str()])
        } else {
            ("systemctl", vec!["is-active", self.service_name.as_str()])
        };

        match self.runner.run(program, &args) {
            Ok(output) if cfg!(windows) => parse_sc_query(&output),
            Ok(output) => parse_systemctl(&output),
            Err(e) => {
                warn!("Service query failed: {}", e);
                ServiceState::Unknown
            }
        }
    }

    /// Whether a process with the image name is alive
    pub fn process_state(&self) -> ProcessState {
        let result = if cfg!(windows) {
            self.runner.run("tasklist", &[])
        } else {
            self.runner.run("ps", &["-A", "-o", "args="])
        };

        match result {
            Ok(output) => parse_process_list(&output, &self.image_name),
            Err(e) => {
                warn!("Process query failed: {}", e);
                ProcessState::Unknown
            }
        }
    }

    /// Both queries
    pub fn report(&self) -> StatusReport {
        StatusReport {
            service: self.service_state(),
            process: self.process_state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SC_RUNNING: &str = "SERVICE_NAME: zapret\r\n        TYPE               : 10  WIN32_OWN_PROCESS\r\n        STATE              : 4  RUNNING\r\n";
    const SC_STOPPED: &str = "SERVICE_NAME: zapret\r\n        STATE              : 1  STOPPED\r\n";
    const SC_MISSING: &str = "[SC] EnumQueryServicesStatus:OpenService FAILED 1060:\r\n\r\nThe specified service does not exist as an installed service.\r\n";

    #[test]
    fn test_parse_sc_query() {
        assert_eq!(parse_sc_query(SC_RUNNING), ServiceState::Running);
        assert_eq!(parse_sc_query(SC_STOPPED), ServiceState::Stopped);
        assert_eq!(parse_sc_query(SC_MISSING), ServiceState::NotInstalled);
        assert_eq!(parse_sc_query(""), ServiceState::NotInstalled);
    }

    #[test]
    fn test_parse_systemctl() {
        assert_eq!(parse_systemctl("active\n"), ServiceState::Running);
        assert_eq!(parse_systemctl("inactive\n"), ServiceState::Stopped);
        assert_eq!(
            parse_systemctl("Unit zapret.service could not be found.\n"),
            ServiceState::NotInstalled
        );
        assert_eq!(parse_systemctl(""), ServiceState::NotInstalled);
    }

    #[test]
    fn test_parse_process_list() {
        let tasklist = "Image Name                     PID Session Name\r\n\
                        ========================= ======== ================\r\n\
                        WINWS_ZAPRET.EXE              4312 Services\r\n";
        assert_eq!(parse_process_list(tasklist, "winws_zapret.exe"), ProcessState::Running);
        assert_eq!(parse_process_list("explorer.exe 100\n", "winws_zapret.exe"), ProcessState::NotRunning);
    }

    #[test]
    fn test_reporter_uses_runner() {
        let runner = |program: &str, _args: &[&str]| -> io::Result<String> {
            match program {
                "sc" => Ok(SC_RUNNING.to_string()),
                "systemctl" => Ok("active\n".to_string()),
                _ => Ok("/opt/zapret/bin/winws_zapret.exe --wf-tcp=80\n".to_string()),
            }
        };
        let reporter = StatusReporter::new(runner, "zapret", "winws_zapret.exe");
        assert_eq!(
            reporter.report(),
            StatusReport {
                service: ServiceState::Running,
                process: ProcessState::Running,
            }
        );
    }

    #[test]
    fn test_runner_failure_is_unknown() {
        let runner = |_: &str, _: &[&str]| -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::NotFound, "missing tool"))
        };
        let reporter = StatusReporter::new(runner, "zapret", "winws_zapret.exe");
        assert_eq!(reporter.service_state(), ServiceState::Unknown);
        assert_eq!(reporter.process_state(), ProcessState::Unknown);
    }
}
