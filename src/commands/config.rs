use crate::core::config::{get_config_path, Config};
use crate::error::Result;

pub fn show_config(config: &Config) -> Result<()> {
    println!("Configuration file: {}", get_config_path()?.display());
    println!("{}", serde_json::to_string_pretty(config)?);

    Ok(())
}
