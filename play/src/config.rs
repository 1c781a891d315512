//! Driver configuration stored in `play.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Driver configuration (TOML).
///
/// Missing fields default to sensible values; a missing file is the default config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct PlayConfig {
    pub completer: CompleterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CompleterConfig {
    /// Command that reads a prompt on stdin and writes the completion to stdout
    /// (e.g. `["llm", "-m", "small"]`). Empty means no completer is configured.
    pub command: Vec<String>,

    /// Wall-clock budget per completion, in seconds.
    pub timeout_secs: u64,

    /// Discard completion output beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for CompleterConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            timeout_secs: 60,
            output_limit_bytes: 100_000,
        }
    }
}

impl CompleterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PlayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.completer.timeout_secs == 0 {
            return Err(anyhow!("completer.timeout_secs must be > 0"));
        }
        if self.completer.output_limit_bytes == 0 {
            return Err(anyhow!("completer.output_limit_bytes must be > 0"));
        }
        if let Some(program) = self.completer.command.first()
            && program.trim().is_empty()
        {
            return Err(anyhow!("completer.command[0] must be non-empty"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `PlayConfig::default()`.
pub fn load_config(path: &Path) -> Result<PlayConfig> {
    if !path.exists() {
        let cfg = PlayConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: PlayConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, PlayConfig::default());
        assert!(cfg.completer.command.is_empty());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("play.toml");
        fs::write(&path, "[completer]\ncommand = [\"cat\"]\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.completer.command, vec!["cat"]);
        assert_eq!(cfg.completer.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn rejects_zero_timeout() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("play.toml");
        fs::write(&path, "[completer]\ntimeout_secs = 0\n").expect("write");
        let err = load_config(&path).expect_err("zero timeout");
        assert!(format!("{err:#}").contains("timeout_secs"));
    }

    #[test]
    fn rejects_blank_program() {
        let cfg = PlayConfig {
            completer: CompleterConfig {
                command: vec!["  ".to_string()],
                ..CompleterConfig::default()
            },
        };
        assert!(cfg.validate().is_err());
    }
}
