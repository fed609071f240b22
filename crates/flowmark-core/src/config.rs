//! Configuration system for flowmark.
//!
//! Resolution order: environment variables → config file → defaults.
//! Command-line flags in flowmark-ctl override all three.
//!
//! Config file location:
//!   1. $FLOWMARK_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/flowmark/config.toml
//!   3. ~/.config/flowmark/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::BYTES_PER_PACKET;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowmarkConfig {
    pub embed: EmbedSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedSettings {
    /// Read every payload back right after embedding it.
    pub validate: bool,
    /// Reassignment attempts allowed across one run.
    pub max_retries: u32,
    /// Fixed RNG seed. None = seed from OS entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Must equal the carrier width (2). Kept explicit so a config written
    /// for another carrier fails loudly instead of corrupting a table.
    pub bytes_per_packet: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Output table name prefix. `{n}` expands to the number of flows.
    pub prefix_template: String,
    /// Write `<output>.manifest.json` next to the output table.
    pub write_manifest: bool,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for EmbedSettings {
    fn default() -> Self {
        Self {
            validate: true,
            max_retries: 10,
            seed: None,
            bytes_per_packet: BYTES_PER_PACKET,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            prefix_template: "i{n}_".to_string(),
            write_manifest: true,
        }
    }
}

impl OutputSettings {
    /// Output path for a run embedding `flows` payloads into `input`:
    /// same directory, prefixed file name.
    pub fn output_path(&self, input: &Path, flows: usize) -> PathBuf {
        let prefix = self.prefix_template.replace("{n}", &flows.to_string());
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "table.csv".to_string());
        input.with_file_name(format!("{prefix}{name}"))
    }
}

/// Manifest path belonging to an output table.
pub fn manifest_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".manifest.json");
    output.with_file_name(name)
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("flowmark")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
    #[error("bytes_per_packet = {0}, the carrier field holds exactly 2")]
    UnsupportedCarrierWidth(usize),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl FlowmarkConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::file_path())
    }

    /// Load from an explicit path. A missing file means defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(FlowmarkConfig::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("FLOWMARK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config to `path` if none exists. Returns the path.
    pub fn write_default_if_missing(path: &Path) -> Result<PathBuf, ConfigError> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.to_path_buf(), e))?;
            }
            let text = toml::to_string_pretty(&FlowmarkConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(path, text)
                .map_err(|e| ConfigError::WriteFailed(path.to_path_buf(), e))?;
        }
        Ok(path.to_path_buf())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.embed.bytes_per_packet != BYTES_PER_PACKET {
            return Err(ConfigError::UnsupportedCarrierWidth(
                self.embed.bytes_per_packet,
            ));
        }
        Ok(())
    }

    /// Apply FLOWMARK_* env var overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`, keyed by FLOWMARK_* variable name.
    /// Unparseable numbers are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("FLOWMARK_EMBED__VALIDATE") {
            self.embed.validate = v == "true" || v == "1";
        }
        if let Some(n) = lookup("FLOWMARK_EMBED__MAX_RETRIES").and_then(|v| v.parse().ok()) {
            self.embed.max_retries = n;
        }
        if let Some(seed) = lookup("FLOWMARK_EMBED__SEED").and_then(|v| v.parse().ok()) {
            self.embed.seed = Some(seed);
        }
        if let Some(v) = lookup("FLOWMARK_OUTPUT__WRITE_MANIFEST") {
            self.output.write_manifest = v == "true" || v == "1";
        }
    }
}
