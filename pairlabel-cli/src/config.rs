/// Config file loading and creation for the pairlabel CLI.
///
/// Config lives at ~/.config/pairlabel/config.toml.
/// All fields are optional; CLI args override config values.
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::bail;

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PairlabelConfig {
    pub pairs_path: Option<PathBuf>,
    pub dataset_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub seed: Option<u64>,
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# pairlabel configuration
# All values here can be overridden by CLI flags.

# Pairs file (hash1,hash2,winner)
# pairs_path = \"out/pairs.csv\"

# Dataset file (hash,param_path,output_path,video_path), used by `export`
# dataset_path = \"out/dataset.csv\"

# Log filter when RUST_LOG is unset: error, warn, info, debug or trace
# log_level = \"warn\"

# Fixed seed for tie-breaking when pending pairs are reordered.
# Leave unset for a fresh random order on every run.
# seed = 42
";

/// Returns the default config path: ~/.config/pairlabel/config.toml
pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| bail("HOME environment variable not set"));
    PathBuf::from(home).join(".config").join("pairlabel").join("config.toml")
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
pub fn load_config(path: &Path) -> PairlabelConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content)
            .unwrap_or_else(|e| bail(format!("Failed to parse config at {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => PairlabelConfig::default(),
        Err(e) => bail(format!("Failed to read config at {}: {e}", path.display())),
    }
}

fn parse_config(content: &str) -> Result<PairlabelConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Create the default config file at `path`. Errors if it already exists.
pub fn create_default_config(path: &Path) {
    if path.exists() {
        bail(format!("Config file already exists at {}", path.display()));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| bail(format!("Failed to create directory {}: {e}", parent.display())));
    }

    std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .unwrap_or_else(|e| bail(format!("Failed to write config to {}: {e}", path.display())));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses_to_defaults() {
        let cfg = parse_config(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert!(cfg.pairs_path.is_none());
        assert!(cfg.dataset_path.is_none());
        assert!(cfg.log_level.is_none());
        assert!(cfg.seed.is_none());
    }

    #[test]
    fn test_parse_all_fields() {
        let cfg = parse_config(
            "pairs_path = \"data/pairs.csv\"\n\
             dataset_path = \"data/dataset.csv\"\n\
             log_level = \"debug\"\n\
             seed = 7\n",
        )
        .unwrap();
        assert_eq!(cfg.pairs_path, Some(PathBuf::from("data/pairs.csv")));
        assert_eq!(cfg.dataset_path, Some(PathBuf::from("data/dataset.csv")));
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert_eq!(cfg.seed, Some(7));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(parse_config("endpoint = \"http://localhost\"\n").is_err());
    }
}
