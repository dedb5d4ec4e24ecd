//! OS process control
//!
//! [`ProcessControl`] is the seam between the supervisor and the operating
//! system. [`SystemProcessControl`] is the real implementation; tests
//! substitute their own.

use std::fmt;
use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};

use tracing::{debug, warn};
use zapret_core::CommandPlan;

/// Exit information of a finished process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitInfo {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
}

impl fmt::Display for ExitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "code {code}"),
            None => write!(f, "signal"),
        }
    }
}

/// Handle to a spawned process
pub trait ManagedChild: Send {
    /// OS process id
    fn id(&self) -> u32;

    /// Non-blocking exit check
    fn try_wait(&mut self) -> io::Result<Option<ExitInfo>>;

    /// Kill the process and reap it
    fn kill(&mut self) -> io::Result<()>;

    /// Read everything the process wrote to its error stream
    ///
    /// Only meaningful after the process has exited.
    fn drain_stderr(&mut self) -> String;

    /// Keep consuming the output streams in the background
    ///
    /// Called once the process is confirmed alive so a chatty process never
    /// blocks on a full pipe.
    fn forward_output(&mut self);
}

/// Spawning and terminating processes
#[cfg_attr(test, mockall::automock)]
pub trait ProcessControl: Send + Sync {
    /// Spawn the planned command, hidden, with captured output
    fn spawn(&self, plan: &CommandPlan) -> io::Result<Box<dyn ManagedChild>>;

    /// Forcibly terminate every process with this image name, children included
    ///
    /// Finding nothing to terminate is not an error.
    fn terminate_by_name(&self, image_name: &str) -> io::Result<()>;

    /// Raw process listing
    fn list_processes(&self) -> io::Result<String>;
}

#[cfg(windows)]
fn hide_window(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn hide_window(_cmd: &mut Command) {}

/// Build a command that never opens a console window
pub(crate) fn hidden_command(program: &str) -> Command {
    let mut cmd = Command::new(program);
    hide_window(&mut cmd);
    cmd
}

/// Process control backed by the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessControl;

impl ProcessControl for SystemProcessControl {
    fn spawn(&self, plan: &CommandPlan) -> io::Result<Box<dyn ManagedChild>> {
        let mut cmd = Command::new(&plan.executable);
        cmd.args(&plan.args)
            .current_dir(&plan.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        hide_window(&mut cmd);

        let child = cmd.spawn()?;
        debug!(pid = child.id(), "Spawned {}", plan.executable.display());
        Ok(Box::new(SystemChild { child }))
    }

    #[cfg(windows)]
    fn terminate_by_name(&self, image_name: &str) -> io::Result<()> {
        let output = hidden_command("taskkill")
            .args(["/F", "/IM", image_name, "/T"])
            .output()?;
        debug!(status = ?output.status, "taskkill {}", image_name);
        Ok(())
    }

    #[cfg(not(windows))]
    fn terminate_by_name(&self, image_name: &str) -> io::Result<()> {
        let output = hidden_command("pkill").args(["-KILL", "-f", image_name]).output()?;
        debug!(status = ?output.status, "pkill {}", image_name);
        Ok(())
    }

    #[cfg(windows)]
    fn list_processes(&self) -> io::Result<String> {
        let output = hidden_command("tasklist").output()?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    #[cfg(not(windows))]
    fn list_processes(&self) -> io::Result<String> {
        let output = hidden_command("ps").args(["-A", "-o", "args="]).output()?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// [`ManagedChild`] over [`std::process::Child`]
#[derive(Debug)]
pub struct SystemChild {
    child: Child,
}

impl ManagedChild for SystemChild {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitInfo>> {
        Ok(self.child.try_wait()?.map(|status| ExitInfo { code: status.code() }))
    }

    fn kill(&mut self) -> io::Result<()> {
        match self.child.kill() {
            Ok(()) => {}
            // Already exited
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => {}
            Err(e) => return Err(e),
        }
        self.child.wait()?;
        Ok(())
    }

    fn drain_stderr(&mut self) -> String {
        let mut buf = String::new();
        if let Some(mut stderr) = self.child.stderr.take() {
            if let Err(e) = stderr.read_to_string(&mut buf) {
                warn!("Failed to read process stderr: {}", e);
            }
        }
        buf.trim().to_string()
    }

    fn forward_output(&mut self) {
        let pid = self.child.id();
        if let Some(stdout) = self.child.stdout.take() {
            spawn_forwarder(pid, "stdout", stdout);
        }
        if let Some(stderr) = self.child.stderr.take() {
            spawn_forwarder(pid, "stderr", stderr);
        }
    }
}

fn spawn_forwarder<R: Read + Send + 'static>(pid: u32, stream: &'static str, reader: R) {
    let spawned = std::thread::Builder::new()
        .name(format!("zapret-{stream}"))
        .spawn(move || {
            for line in BufReader::new(reader).lines() {
                match line {
                    Ok(line) => debug!(pid, stream, "{}", line),
                    Err(_) => break,
                }
            }
        });
    if let Err(e) = spawned {
        warn!("Failed to start {} reader: {}", stream, e);
    }
}
