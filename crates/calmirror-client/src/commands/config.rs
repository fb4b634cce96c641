//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dumps the effective configuration to stdout.
pub fn dump(config: &ClientConfig, config_path: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", config_path.display());
    println!("{}", toml_str);

    Ok(())
}

/// Checks the sync settings and that the time zone and credentials resolve.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    config.sync.check().map_err(ClientError::Config)?;
    let tz = config.display.timezone().map_err(ClientError::Config)?;
    println!("Time zone: {}", tz);

    if config.google.has_credentials() {
        config
            .google
            .to_provider_config()
            .map_err(|e| ClientError::Config(format!("invalid Google credentials: {}", e)))?;
        println!("Google credentials are valid.");
    } else {
        println!("Google credentials are not configured; run `calmirror auth login`.");
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Shows the configuration and data file paths.
pub fn path(config: &ClientConfig, config_path: &Path) -> ClientResult<()> {
    println!("config: {}", config_path.display());
    println!("storage: {}", config.storage_path().display());
    println!("state: {}", config.state_path().display());
    Ok(())
}
