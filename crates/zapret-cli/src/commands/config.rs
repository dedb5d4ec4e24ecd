//! Config command - configuration management

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::{debug, info};
use zapret_core::Config;

use crate::args::Args as GlobalArgs;

/// Config file name searched in the working directory and the user config dir
pub const CONFIG_FILE_NAME: &str = "zapret.toml";

/// Config command arguments
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Generate a configuration file with default values
    Generate {
        /// Output file path
        #[arg(short, long, default_value = CONFIG_FILE_NAME)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Config file to validate
        file: PathBuf,
    },

    /// Show config file locations
    Paths,
}

/// Execute config command
pub fn execute(global: &GlobalArgs, args: &ConfigArgs) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(global),
        ConfigAction::Generate { output, force } => generate_config(output, *force),
        ConfigAction::Validate { file } => validate_config(file),
        ConfigAction::Paths => show_paths(),
    }
}

/// Load the configuration and apply command-line overrides
///
/// Search order: `--config`, `./zapret.toml`, the user config directory.
/// Without a file the defaults are used. A relative base directory is
/// resolved against the working directory.
pub fn load(global: &GlobalArgs) -> Result<Config> {
    let mut config = match global.config {
        Some(ref path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => match find_config_file() {
            Some(path) => {
                debug!("Using config file {}", path.display());
                Config::load(&path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?
            }
            None => Config::default(),
        },
    };

    if let Some(ref dir) = global.base_dir {
        config.general.base_dir = Some(dir.clone());
    }

    if let Some(dir) = config.general.base_dir.take() {
        let dir = if dir.is_absolute() {
            dir
        } else {
            std::env::current_dir()
                .context("Failed to read working directory")?
                .join(dir)
        };
        config.general.base_dir = Some(dir);
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn user_config_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "zapret")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }

    user_config_file().filter(|path| path.exists())
}

fn show_config(global: &GlobalArgs) -> Result<()> {
    let config = load(global)?;
    let toml_str = config.to_toml().context("Failed to serialize config")?;
    println!("{toml_str}");
    Ok(())
}

fn generate_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", output.display());
    }

    let toml_str = Config::default()
        .to_toml()
        .context("Failed to serialize config")?;

    let content = format!(
        "# zapret-ctl configuration\n\
         # provider: one of `zapret-ctl profiles`; mode: optimized, standard, aggressive, extreme\n\n\
         {toml_str}"
    );

    std::fs::write(output, content)
        .with_context(|| format!("Failed to write config to {}", output.display()))?;

    info!("Generated config file: {}", output.display());
    println!("Configuration file generated: {}", output.display());
    Ok(())
}

fn validate_config(file: &Path) -> Result<()> {
    let config = Config::load(file)
        .with_context(|| format!("Failed to load config from {}", file.display()))?;

    config.validate().context("Configuration validation failed")?;

    println!("✓ Configuration is valid");
    println!("  Provider: {}", config.general.provider);
    println!("  Mode: {}", config.general.mode);
    println!("  Executable: {}", config.process.executable);
    println!("  Service: {}", config.service.name);
    Ok(())
}

fn show_paths() -> Result<()> {
    println!("Configuration file search paths:");
    println!();
    println!("  1. --config <FILE> or $ZAPRET_CONFIG");
    println!("  2. ./{CONFIG_FILE_NAME}");
    if let Some(path) = user_config_file() {
        println!("  3. {}", path.display());
    }
    Ok(())
}
