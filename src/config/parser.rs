use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Parses and validates the text of a configuration file
///
/// Sections and keys left out keep their defaults, so an empty document is a
/// valid configuration.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Hex SHA-256 of the configuration text, recorded in the consolidated artifact
pub fn config_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Loads the configuration file at `path`
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    parse_config(&std::fs::read_to_string(path)?)
}

/// Loads the configuration file at `path` together with the hash of the
/// exact text that was parsed
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, config_hash(&content)))
}
