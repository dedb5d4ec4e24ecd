//! Command plan: rule blocks materialized into an argument vector
//!
//! [`Planner`] runs the whole chain in one call:
//! registry lookup, mode transform, rule compilation and assembly.

mod assembler;
mod block;
mod compiler;

pub use assembler::{assemble, intercept_filters, BLOCK_SEPARATOR};
pub use block::{join_ports, Category, HostSource, PortFilter, PortRange, Protocol, RuleBlock};
pub use compiler::{RuleCompiler, ALT_HTTPS_PORTS, HTTP, HTTPS, VOICE_PORTS};

use serde::Serialize;
use std::path::PathBuf;

use crate::mode::{self, EffectiveProfile, Mode};
use crate::provider;
use crate::resources::{FileProbe, ResourceLayout};

/// Everything needed to launch the external executable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandPlan {
    /// Executable path
    pub executable: PathBuf,
    /// Working directory for the process
    pub working_dir: PathBuf,
    /// Provider the plan was built for
    pub provider: String,
    /// Mode the plan was built for
    pub mode: Mode,
    /// Compiled blocks, kept for diagnostics
    pub blocks: Vec<RuleBlock>,
    /// Assembled arguments, executable excluded
    pub args: Vec<String>,
}

impl CommandPlan {
    /// Assemble `blocks` for `executable`
    ///
    /// The working directory is the executable's parent.
    pub fn new(executable: PathBuf, profile: &EffectiveProfile, blocks: Vec<RuleBlock>) -> Self {
        let working_dir = executable
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let args = assemble(&blocks);

        Self {
            executable,
            working_dir,
            provider: profile.provider.clone(),
            mode: profile.mode,
            blocks,
            args,
        }
    }

    /// Full argument vector, executable first
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.executable.display().to_string());
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// `Provider (mode)`
    pub fn label(&self) -> String {
        format!("{} ({})", self.provider, self.mode)
    }

    /// Space-joined command line for logs
    pub fn command_line(&self) -> String {
        self.argv().join(" ")
    }
}

/// Registry → transform → compile → assemble
pub struct Planner<'a> {
    layout: &'a ResourceLayout,
    probe: &'a dyn FileProbe,
}

impl<'a> Planner<'a> {
    /// Create a planner over `layout`
    pub fn new(layout: &'a ResourceLayout, probe: &'a dyn FileProbe) -> Self {
        Self { layout, probe }
    }

    /// Plan for a provider name and mode; unknown providers use `Auto`
    pub fn plan(&self, provider_name: &str, mode: Mode) -> CommandPlan {
        let profile = mode::apply(provider::lookup(provider_name), mode);
        self.plan_effective(&profile)
    }

    /// Plan for an already transformed profile
    pub fn plan_effective(&self, profile: &EffectiveProfile) -> CommandPlan {
        let blocks = RuleCompiler::new(self.layout, self.probe).compile(profile);
        let plan = CommandPlan::new(self.layout.executable_path(), profile, blocks);

        tracing::info!(
            provider = %plan.provider,
            mode = %plan.mode,
            blocks = plan.blocks.len(),
            args = plan.args.len(),
            "Built command plan"
        );
        plan
    }
}
