//! Sample driver for `flow` pipelines.
//!
//! Pipelines are TOML documents: a starting lattice value and a list of stages.
//! Every stage maps onto one `flow` operation, so a pipeline file reads like the
//! chain of calls it runs:
//!
//! - **[`pipeline`]**: parsing, validation and execution of pipeline files.
//! - **[`completer`]**: the text-completion backend used by the `complete` call.
//! - **[`config`]**: `play.toml`, the driver configuration.

pub mod completer;
pub mod config;
pub mod exit_codes;
pub mod pipeline;
pub mod process;
