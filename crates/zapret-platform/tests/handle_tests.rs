//! Integration tests for the supervisor handle

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use zapret_core::resources::FileProbe;
use zapret_core::{CommandPlan, Mode, Planner, ResourceLayout};
use zapret_platform::{
    ChannelNotifier, ExitInfo, ManagedChild, ProcessControl, Request, StatusSnapshot, Supervisor,
    SupervisorHandle, SupervisorSettings, SupervisorState,
};

struct AllPresent;

impl FileProbe for AllPresent {
    fn exists(&self, _path: &Path) -> bool {
        true
    }

    fn is_non_empty(&self, _path: &Path) -> bool {
        true
    }
}

/// Child that stays alive until killed, or until `crash` is set
struct FakeChild {
    pid: u32,
    alive: bool,
    crash: Arc<Mutex<bool>>,
}

impl ManagedChild for FakeChild {
    fn id(&self) -> u32 {
        self.pid
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitInfo>> {
        if *self.crash.lock() {
            self.alive = false;
        }
        Ok((!self.alive).then_some(ExitInfo { code: Some(1) }))
    }

    fn kill(&mut self) -> io::Result<()> {
        self.alive = false;
        Ok(())
    }

    fn drain_stderr(&mut self) -> String {
        String::new()
    }

    fn forward_output(&mut self) {}
}

#[derive(Default)]
struct FakeControl {
    next_pid: AtomicU32,
    spawned: Arc<Mutex<Vec<u32>>>,
    kills_by_name: Arc<AtomicU32>,
    crash: Arc<Mutex<bool>>,
}

impl ProcessControl for FakeControl {
    fn spawn(&self, _plan: &CommandPlan) -> io::Result<Box<dyn ManagedChild>> {
        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst) + 100;
        self.spawned.lock().push(pid);
        Ok(Box::new(FakeChild {
            pid,
            alive: true,
            crash: Arc::clone(&self.crash),
        }))
    }

    fn terminate_by_name(&self, _image_name: &str) -> io::Result<()> {
        self.kills_by_name.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn list_processes(&self) -> io::Result<String> {
        Ok(String::new())
    }
}

struct Fixture {
    handle: SupervisorHandle,
    plan: CommandPlan,
    spawned: Arc<Mutex<Vec<u32>>>,
    crash: Arc<Mutex<bool>>,
    notifications: crossbeam_channel::Receiver<String>,
    _dir: tempfile::TempDir,
}

fn fixture(probe_delay: Duration) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let layout = ResourceLayout::new(dir.path(), "winws_zapret.exe");
    let plan = Planner::new(&layout, &AllPresent).plan("Beeline", Mode::Standard);

    let control = FakeControl::default();
    let spawned = Arc::clone(&control.spawned);
    let crash = Arc::clone(&control.crash);
    let (notifier, notifications) = ChannelNotifier::new();
    let settings = SupervisorSettings {
        settle_delay: Duration::ZERO,
        probe_delay,
    };

    let supervisor = Supervisor::new(Box::new(control), layout, Arc::new(notifier), settings)
        .with_probe(Box::new(AllPresent));

    Fixture {
        handle: SupervisorHandle::new(supervisor),
        plan,
        spawned,
        crash,
        notifications,
        _dir: dir,
    }
}

#[test]
fn test_start_then_stop() {
    let fx = fixture(Duration::ZERO);

    fx.handle.submit(Request::Start(fx.plan.clone())).wait();
    let snapshot = fx.handle.snapshot();
    assert_eq!(snapshot.state, SupervisorState::Running);
    assert_eq!(snapshot.provider.as_deref(), Some("Beeline"));
    assert_eq!(snapshot.mode, Some(Mode::Standard));
    assert!(fx.handle.run_flag().is_running());

    fx.handle.submit(Request::Stop).wait();
    assert_eq!(fx.handle.snapshot(), StatusSnapshot::default());
    assert!(!fx.handle.run_flag().is_running());

    let messages: Vec<String> = fx.notifications.try_iter().collect();
    assert_eq!(messages, ["Bypass active: Beeline (standard)", "Bypass stopped"]);
}

#[test]
fn test_overlapping_request_is_busy() {
    let fx = fixture(Duration::from_millis(300));

    let first = fx.handle.submit(Request::Start(fx.plan.clone()));
    assert!(first.is_accepted());
    assert!(fx.handle.is_busy());

    let second = fx.handle.submit(Request::Stop);
    assert!(!second.is_accepted());

    first.wait();
    assert!(!fx.handle.is_busy());
    assert_eq!(fx.handle.snapshot().state, SupervisorState::Running);
    assert_eq!(fx.spawned.lock().len(), 1);
}

#[test]
fn test_restart_leaves_one_process() {
    let fx = fixture(Duration::ZERO);

    fx.handle.submit(Request::Start(fx.plan.clone())).wait();
    fx.handle.submit(Request::Restart(fx.plan.clone())).wait();

    assert_eq!(fx.spawned.lock().as_slice(), [100, 101]);
    assert_eq!(fx.handle.snapshot().pid, Some(101));
    assert_eq!(fx.handle.snapshot().state, SupervisorState::Running);
}

#[test]
fn test_poll_observes_crash() {
    let fx = fixture(Duration::ZERO);

    fx.handle.submit(Request::Start(fx.plan.clone())).wait();
    assert_eq!(fx.handle.poll(), Some(SupervisorState::Running));

    *fx.crash.lock() = true;
    assert_eq!(fx.handle.poll(), Some(SupervisorState::Idle));
    assert!(!fx.handle.run_flag().is_running());

    let rx = fx.handle.subscribe();
    assert_eq!(rx.borrow().state, SupervisorState::Idle);
}

#[test]
fn test_stop_blocking_when_idle() {
    let fx = fixture(Duration::ZERO);
    fx.handle.stop_blocking();
    assert_eq!(fx.handle.snapshot().state, SupervisorState::Idle);
}
