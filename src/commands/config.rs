//! Configuration commands.
//!
//! - `config show`: Display current configuration
//! - `config path`: Print where the config file is looked up
//! - `config init`: Write a config file with default values

use std::path::Path;

use owo_colors::OwoColorize;
use serde_json::json;

use crate::config::Config;
use crate::error::{HelpQueueError, Result};

/// Load from an explicit path if given, otherwise from the default location
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Show current configuration
pub fn cmd_config_show(path: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(path)?;
    let config_file = path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::config_path);

    if json {
        let output = json!({
            "collection": config.collection,
            "order_by": config.order_by,
            "refresh_interval_secs": config.refresh_interval_secs,
            "error_recovery": config.error_recovery,
            "write_failure": config.write_failure,
            "config_file": config_file.to_string_lossy(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}\n", "Configuration:".cyan().bold());
    print!("{}", serde_yaml_ng::to_string(&config)?);
    println!(
        "\n{}",
        format!("Config file: {}", config_file.display()).dimmed()
    );
    Ok(())
}

/// Print the config file location
pub fn cmd_config_path() -> Result<()> {
    println!("{}", Config::config_path().display());
    Ok(())
}

/// Write the default configuration to the config file location
pub fn cmd_config_init(force: bool) -> Result<()> {
    let path = Config::config_path();
    if path.exists() && !force {
        return Err(HelpQueueError::Config(format!(
            "config file already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }
    Config::default().save_to(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
