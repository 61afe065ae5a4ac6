//! `afetch config` command implementation
//!
//! Reads and writes the TOML config file. `AFETCH_*` environment variables
//! still take precedence over the file when commands run.

use crate::config::{env_var_name, Config, CONFIG_KEYS};
use crate::error::Result;
use colored::Colorize;
use std::path::Path;

/// Get configuration value
pub async fn get(key: String) -> Result<()> {
    let config = Config::load()?;
    println!("{}", config.get(&key)?);
    Ok(())
}

/// Set configuration value in the config file
pub async fn set(key: String, value: String) -> Result<()> {
    let path = Config::config_path()?;
    set_in(&path, &key, &value)?;
    println!("{} {} = {}", "✓".green(), key, value);
    println!("  Saved to {}", path.display());
    Ok(())
}

fn set_in(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut config = Config::load_file(path)?;
    config.set(key, value)?;
    config.save_to(path)
}

/// Show all configuration
pub async fn show() -> Result<()> {
    let config = Config::load()?;

    println!("{}", "afetch configuration:".cyan().bold());
    println!();
    for key in CONFIG_KEYS {
        println!("{:<16} {}", format!("{}:", key), config.get(key)?);
    }
    println!();
    println!("{}", "Environment Variables:".cyan());
    for key in CONFIG_KEYS {
        println!("  {}", env_var_name(key));
    }

    Ok(())
}

/// Print the config file location
pub async fn path() -> Result<()> {
    println!("{}", Config::config_path()?.display());
    Ok(())
}
