//! # Zapret Platform
//!
//! Operating-system side of the zapret controller.
//!
//! ## Architecture
//!
//! - **Process control** - Spawning the executable hidden, terminating by image name
//! - **Supervisor** - Single-process lifecycle with published status
//! - **Handle** - Worker-thread front end refusing overlapping requests
//! - **Status** - Service and process queries with pure output parsers
//! - **Service script** - Delegation to `service.bat` / `service.sh`
//! - **Notifications** - Short user-facing messages
//! - **Indicator** - Running/stopped frames for the UI loop

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod handle;
pub mod indicator;
pub mod notify;
pub mod process;
pub mod service_script;
pub mod status;
pub mod supervisor;

pub use error::{NotifyError, Result, SupervisorError};
pub use handle::{Request, RequestOutcome, SupervisorHandle};
pub use indicator::{Indicator, IndicatorFrame};
pub use notify::{notify_quietly, ChannelNotifier, LogNotifier, Notifier};
pub use process::{ExitInfo, ManagedChild, ProcessControl, SystemProcessControl};
pub use service_script::{ServiceAction, ServiceScript};
pub use status::{CommandRunner, ProcessState, ServiceState, StatusReport, StatusReporter};
pub use supervisor::{RunFlag, StatusSnapshot, Supervisor, SupervisorSettings, SupervisorState};
