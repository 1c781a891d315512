//! Text-completion backends for the `complete` call.
//!
//! The [`Completer`] trait decouples pipelines from the completion service.
//! Tests use scripted completers that return fixed text without spawning
//! processes.

use std::process::Command;
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use tracing::{info, instrument};

use crate::config::CompleterConfig;
use crate::process::run_command_with_timeout;

/// Abstraction over text-completion backends.
pub trait Completer {
    /// Complete `prompt`. Errors are reported to the pipeline as `Down`.
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Completer that pipes the prompt through an external command.
#[derive(Debug, Clone)]
pub struct CommandCompleter {
    command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl CommandCompleter {
    /// Build a completer from config, or `None` when no command is configured.
    pub fn from_config(config: &CompleterConfig) -> Option<Self> {
        if config.command.is_empty() {
            return None;
        }
        Some(Self {
            command: config.command.clone(),
            timeout: config.timeout(),
            output_limit_bytes: config.output_limit_bytes,
        })
    }
}

impl Completer for CommandCompleter {
    #[instrument(skip_all, fields(program = %self.command[0], timeout_secs = self.timeout.as_secs()))]
    fn complete(&self, prompt: &str) -> Result<String> {
        info!(prompt_bytes = prompt.len(), "requesting completion");
        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..]);
        let output =
            run_command_with_timeout(cmd, prompt.as_bytes(), self.timeout, self.output_limit_bytes)?;
        if output.timed_out {
            bail!("completion timed out after {}s", self.timeout.as_secs());
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "completion command failed ({}): {}",
                output.status,
                stderr.trim()
            ));
        }
        let text = String::from_utf8(output.stdout)
            .map_err(|err| anyhow!("completion output is not utf-8: {err}"))?;
        Ok(text.trim_end().to_string())
    }
}

/// Completer used when `play.toml` configures none; every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

impl Completer for Unconfigured {
    fn complete(&self, _prompt: &str) -> Result<String> {
        bail!("no completer configured (set completer.command in play.toml)")
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn config(command: &[&str]) -> CompleterConfig {
        CompleterConfig {
            command: command.iter().map(|part| part.to_string()).collect(),
            ..CompleterConfig::default()
        }
    }

    #[test]
    fn empty_command_builds_no_completer() {
        assert!(CommandCompleter::from_config(&config(&[])).is_none());
    }

    #[test]
    fn command_completer_returns_trimmed_stdout() {
        let completer = CommandCompleter::from_config(&config(&["cat"])).expect("completer");
        let text = completer.complete("once upon a time\n").expect("complete");
        assert_eq!(text, "once upon a time");
    }

    #[test]
    fn failing_command_is_an_error() {
        let completer = CommandCompleter::from_config(&config(&[
            "sh",
            "-c",
            "cat >/dev/null; echo boom >&2; exit 3",
        ]))
        .expect("completer");
        let err = completer.complete("prompt").expect_err("exit 3");
        let message = err.to_string();
        assert!(message.contains("completion command failed"), "{message}");
        assert!(message.contains("boom"), "{message}");
    }

    #[test]
    fn unconfigured_always_fails() {
        assert!(Unconfigured.complete("x").is_err());
    }
}
