//! Config command - View and validate docmirror configuration
//!
//! Provides the `docmirror config` CLI command which:
//! 1. Shows the effective configuration with the token masked
//! 2. Validates it and reports every problem at once
//! 3. Prints the path the configuration is read from

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use tracing::info;

use docmirror_core::config::Config;

use crate::output::{get_formatter, plural, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration
    Validate,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(
        &self,
        mut config: Config,
        config_path: &Path,
        format: OutputFormat,
    ) -> Result<()> {
        config.apply_env();
        match self {
            ConfigCommand::Show => show(&config, config_path, format),
            ConfigCommand::Validate => validate(&config, config_path, format),
            ConfigCommand::Path => path(config_path, format),
        }
    }
}

fn show(config: &Config, config_path: &Path, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let config = config.redacted();

    info!(config_path = %config_path.display(), "Showing configuration");

    if matches!(format, OutputFormat::Json) {
        let json =
            serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
    } else {
        formatter.success(&format!("Configuration ({})", config_path.display()));
        formatter.info("");

        let yaml =
            serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
        for line in yaml.lines() {
            formatter.info(line);
        }
    }

    Ok(())
}

fn validate(config: &Config, config_path: &Path, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let errors = config.validate();

    if matches!(format, OutputFormat::Json) {
        let error_msgs: Vec<String> = errors.iter().map(ToString::to_string).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": config_path.display().to_string(),
            "errors": error_msgs,
        }));
    } else if errors.is_empty() {
        formatter.success(&format!("Configuration is valid ({})", config_path.display()));
    } else {
        for e in &errors {
            formatter.error(&e.to_string());
        }
    }

    if !errors.is_empty() {
        bail!("Invalid configuration ({})", plural(errors.len(), "error"));
    }
    Ok(())
}

fn path(config_path: &Path, format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        get_formatter(format).print_json(&serde_json::json!({
            "config_path": config_path.display().to_string(),
            "exists": config_path.exists(),
        }));
    } else {
        println!("{}", config_path.display());
    }
    Ok(())
}
