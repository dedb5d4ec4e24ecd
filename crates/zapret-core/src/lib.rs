//! # Zapret Core
//!
//! Platform-independent planner for the zapret traffic-shaping executable.
//!
//! ## Architecture
//!
//! This crate provides:
//! - **Provider registry** - Compiled-in tuning presets per network operator
//! - **Mode transform** - Aggressiveness levels applied to a copy of a preset
//! - **Rule compiler** - Ordered filter blocks, one per traffic category
//! - **Assembler** - Flat argument vector with block separators
//! - **Resources** - On-disk layout and preflight checks
//! - **Configuration** - TOML configuration file
//!
//! Everything here is pure: no process is spawned and no global state is
//! mutated, so planning is safe from any thread.
//!
//! ## Example
//!
//! ```rust,no_run
//! use zapret_core::{Mode, Planner, ResourceLayout};
//! use zapret_core::resources::FsProbe;
//!
//! let layout = ResourceLayout::new("C:\\zapret", "winws_zapret.exe");
//! let plan = Planner::new(&layout, &FsProbe).plan("Beeline", Mode::Standard);
//! println!("{}", plan.command_line());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod mode;
pub mod plan;
pub mod provider;
pub mod resources;

// Re-exports for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use mode::{EffectiveProfile, Mode};
pub use plan::{CommandPlan, Planner, RuleBlock};
pub use provider::ProviderProfile;
pub use resources::ResourceLayout;
