//! Lifecycle of the single external bypass process
//!
//! The supervisor owns at most one child process. It publishes every state
//! change on a [`tokio::sync::watch`] channel and mirrors "is running" into a
//! [`RunFlag`] readable from any thread without locking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use zapret_core::config::ProcessConfig;
use zapret_core::resources::{FileProbe, FsProbe};
use zapret_core::{CommandPlan, Mode, ResourceLayout};

use crate::error::{Result, SupervisorError};
use crate::notify::{notify_quietly, Notifier};
use crate::process::{ManagedChild, ProcessControl};

/// Supervisor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupervisorState {
    /// No process
    #[default]
    Idle,
    /// Spawning and probing
    Starting,
    /// Process alive
    Running,
    /// Terminating
    Stopping,
}

impl SupervisorState {
    /// Display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "Stopped",
            Self::Starting => "Starting...",
            Self::Running => "Running",
            Self::Stopping => "Stopping...",
        }
    }

    /// Whether a process is, or is about to be, alive
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }
}

/// Published view of the supervisor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusSnapshot {
    /// Current state
    pub state: SupervisorState,
    /// Provider of the running plan
    pub provider: Option<String>,
    /// Mode of the running plan
    pub mode: Option<Mode>,
    /// Process id while running
    pub pid: Option<u32>,
    /// When the running process was confirmed alive
    pub started_at: Option<SystemTime>,
}

impl StatusSnapshot {
    fn with_state(state: SupervisorState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }
}

/// Shared "is running" flag
#[derive(Debug, Clone, Default)]
pub struct RunFlag(Arc<AtomicBool>);

impl RunFlag {
    /// Whether the supervised process is running
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn set(&self, running: bool) {
        self.0.store(running, Ordering::SeqCst);
    }
}

/// Timing knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorSettings {
    /// Pause after terminating stale instances
    pub settle_delay: Duration,
    /// Pause between spawn and the liveness check
    pub probe_delay: Duration,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self::from(&ProcessConfig::default())
    }
}

impl From<&ProcessConfig> for SupervisorSettings {
    fn from(config: &ProcessConfig) -> Self {
        Self {
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            probe_delay: Duration::from_millis(config.probe_delay_ms),
        }
    }
}

struct SupervisedProcess {
    child: Box<dyn ManagedChild>,
    label: String,
}

/// Starts, stops and watches the bypass process
pub struct Supervisor {
    control: Box<dyn ProcessControl>,
    probe: Box<dyn FileProbe + Send + Sync>,
    layout: ResourceLayout,
    notifier: Arc<dyn Notifier>,
    settings: SupervisorSettings,
    process: Option<SupervisedProcess>,
    status_tx: watch::Sender<StatusSnapshot>,
    status_rx: watch::Receiver<StatusSnapshot>,
    running: RunFlag,
}

impl Supervisor {
    /// Create an idle supervisor
    pub fn new(
        control: Box<dyn ProcessControl>,
        layout: ResourceLayout,
        notifier: Arc<dyn Notifier>,
        settings: SupervisorSettings,
    ) -> Self {
        let (status_tx, status_rx) = watch::channel(StatusSnapshot::default());
        Self {
            control,
            probe: Box::new(FsProbe),
            layout,
            notifier,
            settings,
            process: None,
            status_tx,
            status_rx,
            running: RunFlag::default(),
        }
    }

    /// Replace the filesystem probe used by preflight
    #[must_use]
    pub fn with_probe(mut self, probe: Box<dyn FileProbe + Send + Sync>) -> Self {
        self.probe = probe;
        self
    }

    /// Status receiver for UI updates
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.status_rx.clone()
    }

    /// Current status
    pub fn snapshot(&self) -> StatusSnapshot {
        self.status_rx.borrow().clone()
    }

    /// Current state
    pub fn state(&self) -> SupervisorState {
        self.status_rx.borrow().state
    }

    /// Shared running flag
    pub fn run_flag(&self) -> RunFlag {
        self.running.clone()
    }

    /// Resource layout checked before every start
    pub fn layout(&self) -> &ResourceLayout {
        &self.layout
    }

    /// Launch the plan, replacing any running instance
    ///
    /// Blocks for the settle and probe delays. Preflight and path checks run
    /// before anything is terminated, so a rejected plan leaves a running
    /// instance alone. Later failures return the supervisor to idle. Every
    /// failure sends a notification.
    pub fn start(&mut self, plan: &CommandPlan) -> Result<()> {
        info!("Starting bypass: {}", plan.label());

        if let Err(e) = self.layout.preflight(self.probe.as_ref()) {
            return self.fail(e.into());
        }
        if !plan.executable.is_absolute() {
            return self.fail(SupervisorError::spawn(format!(
                "executable path is not absolute: {}",
                plan.executable.display()
            )));
        }

        self.publish(StatusSnapshot {
            provider: Some(plan.provider.clone()),
            mode: Some(plan.mode),
            ..StatusSnapshot::with_state(SupervisorState::Starting)
        });

        self.terminate_existing();
        thread::sleep(self.settings.settle_delay);

        debug!("Command line: {}", plan.command_line());
        let mut child = match self.control.spawn(plan) {
            Ok(child) => child,
            Err(e) => return self.fail(SupervisorError::spawn(e.to_string())),
        };

        thread::sleep(self.settings.probe_delay);

        match child.try_wait() {
            Ok(None) => {}
            Ok(Some(exit)) => {
                let stderr = child.drain_stderr();
                return self.fail(SupervisorError::SpawnFailure {
                    reason: format!("process exited during startup with {exit}"),
                    stderr,
                });
            }
            Err(e) => {
                if let Err(kill_err) = child.kill() {
                    warn!("Failed to kill unprobed process: {}", kill_err);
                }
                return self.fail(SupervisorError::spawn(format!("liveness check failed: {e}")));
            }
        }

        child.forward_output();
        let pid = child.id();
        let label = plan.label();
        self.process = Some(SupervisedProcess {
            child,
            label: label.clone(),
        });
        self.running.set(true);
        self.publish(StatusSnapshot {
            state: SupervisorState::Running,
            provider: Some(plan.provider.clone()),
            mode: Some(plan.mode),
            pid: Some(pid),
            started_at: Some(SystemTime::now()),
        });

        info!(pid, "Bypass running: {}", label);
        notify_quietly(self.notifier.as_ref(), &format!("Bypass active: {label}"));
        Ok(())
    }

    /// Terminate the process, by handle and by image name
    ///
    /// Safe to call when nothing is running.
    pub fn stop(&mut self) {
        info!("Stopping bypass");
        self.publish(StatusSnapshot {
            state: SupervisorState::Stopping,
            ..self.snapshot()
        });

        self.terminate_existing();

        self.running.set(false);
        self.publish(StatusSnapshot::with_state(SupervisorState::Idle));
        notify_quietly(self.notifier.as_ref(), "Bypass stopped");
    }

    /// Stop, then start with the new plan
    pub fn restart(&mut self, plan: &CommandPlan) -> Result<()> {
        self.stop();
        self.start(plan)
    }

    /// Detect an unexpected exit of the running process
    pub fn poll(&mut self) -> SupervisorState {
        let Some(process) = self.process.as_mut() else {
            return self.state();
        };

        match process.child.try_wait() {
            Ok(None) => {}
            Ok(Some(exit)) => {
                warn!("Bypass process ({}) exited unexpectedly with {}", process.label, exit);
                self.process = None;
                self.running.set(false);
                self.publish(StatusSnapshot::with_state(SupervisorState::Idle));
                notify_quietly(
                    self.notifier.as_ref(),
                    &format!("Bypass process exited unexpectedly ({exit})"),
                );
            }
            Err(e) => error!("Failed to check process status: {}", e),
        }

        self.state()
    }

    fn terminate_existing(&mut self) {
        if let Some(mut process) = self.process.take() {
            debug!(pid = process.child.id(), "Killing supervised process");
            if let Err(e) = process.child.kill() {
                warn!("Failed to kill process: {}", e);
            }
        }

        let image = self.layout.image_name();
        if let Err(e) = self.control.terminate_by_name(image) {
            warn!("Failed to terminate {}: {}", image, e);
        }
    }

    fn fail(&mut self, err: SupervisorError) -> Result<()> {
        match &err {
            SupervisorError::SpawnFailure { reason, stderr } if !stderr.is_empty() => {
                error!("Failed to start bypass: {}\n{}", reason, stderr);
            }
            _ => error!("Failed to start bypass: {}", err),
        }

        // Rejected before termination; the current instance is untouched
        if self.process.is_some() {
            notify_quietly(self.notifier.as_ref(), &err.user_message());
            return Err(err);
        }

        self.running.set(false);
        self.publish(StatusSnapshot::with_state(SupervisorState::Idle));
        notify_quietly(self.notifier.as_ref(), &err.user_message());
        Err(err)
    }

    fn publish(&self, snapshot: StatusSnapshot) {
        debug!(state = snapshot.state.as_str(), "Status change");
        self.status_tx.send_replace(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::{Path, PathBuf};

    use mockall::{mock, Sequence};
    use parking_lot::Mutex;
    use zapret_core::resources::lists;
    use zapret_core::Planner;

    use super::*;
    use crate::error::NotifyError;
    use crate::process::{ExitInfo, MockProcessControl};

    mock! {
        Child {}
        impl ManagedChild for Child {
            fn id(&self) -> u32;
            fn try_wait(&mut self) -> io::Result<Option<ExitInfo>>;
            fn kill(&mut self) -> io::Result<()>;
            fn drain_stderr(&mut self) -> String;
            fn forward_output(&mut self);
        }
    }

    /// Probe where everything exists except the named list
    struct Probe {
        missing: Option<&'static str>,
    }

    impl FileProbe for Probe {
        fn exists(&self, path: &Path) -> bool {
            path.file_name().and_then(|n| n.to_str()) != self.missing
        }

        fn is_non_empty(&self, path: &Path) -> bool {
            self.exists(path)
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Notifier for Recorder {
        fn notify(&self, message: &str) -> std::result::Result<(), NotifyError> {
            self.0.lock().push(message.to_string());
            Ok(())
        }
    }

    fn layout() -> ResourceLayout {
        let base = std::env::temp_dir().join("zapret-supervisor-test");
        ResourceLayout::new(base, "winws_zapret.exe")
    }

    fn plan(layout: &ResourceLayout) -> CommandPlan {
        Planner::new(layout, &Probe { missing: None }).plan("Auto", Mode::Optimized)
    }

    fn supervisor(
        control: MockProcessControl,
        missing: Option<&'static str>,
    ) -> (Supervisor, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let settings = SupervisorSettings {
            settle_delay: Duration::ZERO,
            probe_delay: Duration::ZERO,
        };
        let sup = Supervisor::new(Box::new(control), layout(), recorder.clone(), settings)
            .with_probe(Box::new(Probe { missing }));
        (sup, recorder)
    }

    fn alive_child(pid: u32) -> MockChild {
        let mut child = MockChild::new();
        child.expect_id().return_const(pid);
        child.expect_try_wait().returning(|| Ok(None));
        child.expect_forward_output().return_const(());
        child
    }

    #[test]
    fn test_start_terminates_before_spawn() {
        let mut seq = Sequence::new();
        let mut control = MockProcessControl::new();
        control
            .expect_terminate_by_name()
            .withf(|name| name.to_string() == "winws_zapret.exe")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        control
            .expect_spawn()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|_| Ok(Box::new(alive_child(42)) as Box<dyn ManagedChild>));

        let (mut sup, recorder) = supervisor(control, None);
        let layout = layout();
        sup.start(&plan(&layout)).unwrap();

        let snapshot = sup.snapshot();
        assert_eq!(snapshot.state, SupervisorState::Running);
        assert_eq!(snapshot.pid, Some(42));
        assert_eq!(snapshot.provider.as_deref(), Some("Auto"));
        assert!(sup.run_flag().is_running());
        assert_eq!(recorder.0.lock().as_slice(), ["Bypass active: Auto (optimized)"]);
    }

    #[test]
    fn test_missing_list_never_spawns() {
        let mut control = MockProcessControl::new();
        control.expect_spawn().never();
        control.expect_terminate_by_name().never();

        let (mut sup, recorder) = supervisor(control, Some(lists::GOOGLE));
        let layout = layout();
        let err = sup.start(&plan(&layout)).unwrap_err();

        match err {
            SupervisorError::MissingResource { missing } => {
                assert_eq!(missing, vec![lists::GOOGLE.to_string()]);
            }
            other => panic!("Wrong error type: {other:?}"),
        }
        assert_eq!(sup.state(), SupervisorState::Idle);
        assert!(recorder.0.lock()[0].contains(lists::GOOGLE));
    }

    #[test]
    fn test_relative_executable_keeps_running_instance() {
        let mut control = MockProcessControl::new();
        control.expect_terminate_by_name().times(1).returning(|_| Ok(()));
        control
            .expect_spawn()
            .times(1)
            .return_once(|_| Ok(Box::new(alive_child(7)) as Box<dyn ManagedChild>));

        let (mut sup, recorder) = supervisor(control, None);
        let layout = layout();
        sup.start(&plan(&layout)).unwrap();

        let mut relative = plan(&layout);
        relative.executable = PathBuf::from("bin/winws_zapret.exe");
        let err = sup.start(&relative).unwrap_err();

        assert!(matches!(err, SupervisorError::SpawnFailure { .. }));
        assert_eq!(sup.state(), SupervisorState::Running);
        assert_eq!(sup.snapshot().pid, Some(7));
        assert!(sup.run_flag().is_running());
        assert_eq!(recorder.0.lock().len(), 2);
    }

    #[test]
    fn test_relative_executable_fails_from_idle() {
        let mut control = MockProcessControl::new();
        control.expect_terminate_by_name().never();
        control.expect_spawn().never();

        let (mut sup, _) = supervisor(control, None);
        let layout = layout();
        let mut relative = plan(&layout);
        relative.executable = PathBuf::from("winws_zapret.exe");

        assert!(sup.start(&relative).is_err());
        assert_eq!(sup.state(), SupervisorState::Idle);
    }

    #[test]
    fn test_immediate_exit_reports_stderr() {
        let mut child = MockChild::new();
        child.expect_try_wait().returning(|| Ok(Some(ExitInfo { code: Some(1) })));
        child
            .expect_drain_stderr()
            .times(1)
            .returning(|| "invalid filter".to_string());

        let mut control = MockProcessControl::new();
        control.expect_terminate_by_name().returning(|_| Ok(()));
        control
            .expect_spawn()
            .return_once(move |_| Ok(Box::new(child) as Box<dyn ManagedChild>));

        let (mut sup, _) = supervisor(control, None);
        let layout = layout();
        let err = sup.start(&plan(&layout)).unwrap_err();

        match err {
            SupervisorError::SpawnFailure { stderr, .. } => assert_eq!(stderr, "invalid filter"),
            other => panic!("Wrong error type: {other:?}"),
        }
        assert_eq!(sup.state(), SupervisorState::Idle);
        assert!(!sup.run_flag().is_running());
    }

    #[test]
    fn test_spawn_error_is_spawn_failure() {
        let mut control = MockProcessControl::new();
        control.expect_terminate_by_name().returning(|_| Ok(()));
        control
            .expect_spawn()
            .returning(|_| Err(io::Error::new(io::ErrorKind::NotFound, "no such file")));

        let (mut sup, _) = supervisor(control, None);
        let layout = layout();
        let err = sup.start(&plan(&layout)).unwrap_err();
        assert!(matches!(err, SupervisorError::SpawnFailure { .. }));
        assert_eq!(sup.state(), SupervisorState::Idle);
    }

    #[test]
    fn test_start_while_running_replaces_process() {
        let mut first = alive_child(1);
        first.expect_kill().times(1).returning(|| Ok(()));
        let second = alive_child(2);

        let mut control = MockProcessControl::new();
        control.expect_terminate_by_name().times(2).returning(|_| Ok(()));
        let mut children = vec![second, first];
        control
            .expect_spawn()
            .times(2)
            .returning(move |_| Ok(Box::new(children.pop().unwrap()) as Box<dyn ManagedChild>));

        let (mut sup, _) = supervisor(control, None);
        let layout = layout();
        sup.start(&plan(&layout)).unwrap();
        sup.start(&plan(&layout)).unwrap();
        assert_eq!(sup.snapshot().pid, Some(2));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut control = MockProcessControl::new();
        control.expect_terminate_by_name().times(2).returning(|_| Ok(()));

        let (mut sup, recorder) = supervisor(control, None);
        sup.stop();
        sup.stop();

        assert_eq!(sup.state(), SupervisorState::Idle);
        assert!(!sup.run_flag().is_running());
        assert_eq!(recorder.0.lock().len(), 2);
    }

    #[test]
    fn test_stop_kills_running_process() {
        let mut child = alive_child(7);
        child.expect_kill().times(1).returning(|| Ok(()));

        let mut control = MockProcessControl::new();
        control.expect_terminate_by_name().times(2).returning(|_| Ok(()));
        control
            .expect_spawn()
            .return_once(move |_| Ok(Box::new(child) as Box<dyn ManagedChild>));

        let (mut sup, _) = supervisor(control, None);
        let layout = layout();
        sup.start(&plan(&layout)).unwrap();
        sup.stop();

        assert_eq!(sup.snapshot(), StatusSnapshot::default());
        assert!(!sup.run_flag().is_running());
    }

    #[test]
    fn test_poll_detects_crash() {
        let mut child = MockChild::new();
        child.expect_id().return_const(9u32);
        child.expect_forward_output().return_const(());
        let mut calls = 0;
        child.expect_try_wait().returning(move || {
            calls += 1;
            if calls == 1 {
                Ok(None)
            } else {
                Ok(Some(ExitInfo { code: Some(2) }))
            }
        });

        let mut control = MockProcessControl::new();
        control.expect_terminate_by_name().returning(|_| Ok(()));
        control
            .expect_spawn()
            .return_once(move |_| Ok(Box::new(child) as Box<dyn ManagedChild>));

        let (mut sup, recorder) = supervisor(control, None);
        let layout = layout();
        sup.start(&plan(&layout)).unwrap();
        assert_eq!(sup.poll(), SupervisorState::Idle);
        assert!(!sup.run_flag().is_running());
        assert!(recorder.0.lock().last().unwrap().contains("code 2"));
    }

    #[test]
    fn test_subscribers_see_transitions() {
        let mut control = MockProcessControl::new();
        control.expect_terminate_by_name().returning(|_| Ok(()));
        control
            .expect_spawn()
            .return_once(|_| Ok(Box::new(alive_child(5)) as Box<dyn ManagedChild>));

        let (mut sup, _) = supervisor(control, None);
        let rx = sup.subscribe();
        let layout = layout();
        sup.start(&plan(&layout)).unwrap();
        assert_eq!(rx.borrow().state, SupervisorState::Running);
    }
}
