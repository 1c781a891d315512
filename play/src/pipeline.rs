//! Pipeline file parsing, validation and execution.
//!
//! A pipeline is a TOML document with a starting value and a list of stages:
//!
//! ```toml
//! start = { state = "down", value = 0 }
//!
//! [[stages]]
//! op = "always"
//! call = "inc"
//!
//! [[stages]]
//! op = "repeat"
//! count = 3
//! body = [{ op = "bind", call = "double" }]
//! ```
//!
//! Loop stages (`repeat`, `until`, `while`, `succeed`, `fail`) run their body as
//! one workflow per iteration. `bind_chain`/`always_chain` run a body through the
//! matching combinator, so `Down(0) << repeat(...)` is an `always_chain` stage
//! wrapping a `repeat` stage.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use flow::{
    Failure, Flow, Variant, do_while, fail, lift, lift_in, looping, on, repeat, succeed, until,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument};

use crate::completer::Completer;

/// A parsed pipeline file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Pipeline {
    /// Value the chain starts from, e.g. `{ state = "up", value = 0 }`.
    pub start: Flow<Value>,
    #[serde(default)]
    pub stages: Vec<Stage>,
}

/// One operation in a pipeline.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Stage {
    /// Run `call` on `Up` only.
    Bind { call: Call },
    /// Run `call` on `Up` and `Down`, keeping `Down` diverted.
    Always { call: Call },
    BindChain { body: Vec<Stage> },
    AlwaysChain { body: Vec<Stage> },
    Flip,
    Normalize,
    Escalate,
    NormalizeFlip,
    EscalateFlip,
    /// Run `body` only when the current value has variant `state`.
    On { state: Variant, body: Vec<Stage> },
    Repeat { count: usize, body: Vec<Stage> },
    Until { stop: Condition, body: Vec<Stage> },
    While {
        cond: Condition,
        #[serde(default)]
        at_least_once: bool,
        body: Vec<Stage>,
    },
    /// Retry `body` while the result is negative.
    Succeed { body: Vec<Stage> },
    /// Retry `body` while the result is positive.
    Fail { body: Vec<Stage> },
}

/// Built-in step functions.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Call {
    Inc,
    Double,
    /// `1 / x`; fails on zero.
    Reciprocal,
    /// Increment, escaping to `Top` when the input equals the given value.
    EscapeAt(Value),
    /// Send the carried string to the configured completer.
    Complete,
}

/// Loop predicate over the current value and the iteration count.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    ValueEq(Value),
    ValueNe(Value),
    State(Variant),
    IterationsBelow(usize),
}

impl Pipeline {
    /// Load and validate a pipeline file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read pipeline {}", path.display()))?;
        Self::parse_str(&contents).with_context(|| format!("load pipeline {}", path.display()))
    }

    pub fn parse_str(contents: &str) -> Result<Self> {
        let pipeline: Pipeline = toml::from_str(contents).context("parse pipeline")?;
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Check structural rules; reports every violation at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        validate_stages(&self.stages, "stages", &mut errors);
        if !errors.is_empty() {
            bail!("pipeline violations:\n- {}", errors.join("\n- "));
        }
        Ok(())
    }

    #[instrument(skip_all, fields(stages = self.stages.len(), start = %self.start.variant()))]
    pub fn run(&self, completer: &dyn Completer) -> Flow<Value> {
        let result = run_stages(&self.stages, self.start.clone(), completer);
        info!(variant = %result.variant(), "pipeline finished");
        result
    }
}

fn validate_stages(stages: &[Stage], path: &str, errors: &mut Vec<String>) {
    for (index, stage) in stages.iter().enumerate() {
        let here = format!("{path}[{index}]");
        if let Some(body) = stage.body() {
            if body.is_empty() {
                errors.push(format!("{here}: {} body must be non-empty", stage.name()));
            }
            validate_stages(body, &format!("{here}.body"), errors);
        }
        if let Stage::Bind {
            call: Call::EscapeAt(target),
        }
        | Stage::Always {
            call: Call::EscapeAt(target),
        } = stage
            && !target.is_number()
        {
            errors.push(format!("{here}: escape_at target must be a number"));
        }
    }
}

fn run_stages(stages: &[Stage], start: Flow<Value>, completer: &dyn Completer) -> Flow<Value> {
    stages
        .iter()
        .fold(start, |current, stage| stage.apply(current, completer))
}

/// A stage list as a single step, for combinators and loops.
fn workflow<'a>(
    body: &'a [Stage],
    completer: &'a dyn Completer,
) -> impl FnMut(Flow<Value>) -> Flow<Value> + 'a {
    move |fm| run_stages(body, fm, completer)
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Bind { .. } => "bind",
            Stage::Always { .. } => "always",
            Stage::BindChain { .. } => "bind_chain",
            Stage::AlwaysChain { .. } => "always_chain",
            Stage::Flip => "flip",
            Stage::Normalize => "normalize",
            Stage::Escalate => "escalate",
            Stage::NormalizeFlip => "normalize_flip",
            Stage::EscalateFlip => "escalate_flip",
            Stage::On { .. } => "on",
            Stage::Repeat { .. } => "repeat",
            Stage::Until { .. } => "until",
            Stage::While { .. } => "while",
            Stage::Succeed { .. } => "succeed",
            Stage::Fail { .. } => "fail",
        }
    }

    fn body(&self) -> Option<&[Stage]> {
        match self {
            Stage::BindChain { body }
            | Stage::AlwaysChain { body }
            | Stage::On { body, .. }
            | Stage::Repeat { body, .. }
            | Stage::Until { body, .. }
            | Stage::While { body, .. }
            | Stage::Succeed { body }
            | Stage::Fail { body } => Some(body),
            _ => None,
        }
    }

    /// Apply this stage to `current`.
    pub fn apply(&self, current: Flow<Value>, completer: &dyn Completer) -> Flow<Value> {
        let from = current.variant();
        let next = match self {
            Stage::Bind { call } => current.bind_chain(|fm| call.invoke(fm, completer)),
            Stage::Always { call } => current.always_chain(|fm| call.invoke(fm, completer)),
            Stage::BindChain { body } => current.bind_chain(workflow(body, completer)),
            Stage::AlwaysChain { body } => current.always_chain(workflow(body, completer)),
            Stage::Flip => current.flip(),
            Stage::Normalize => current.normalize(),
            Stage::Escalate => current.escalate(),
            Stage::NormalizeFlip => current.normalize_flip(),
            Stage::EscalateFlip => current.escalate_flip(),
            Stage::On { state, body } => {
                let mut guarded = on(*state, workflow(body, completer));
                guarded(current)
            }
            Stage::Repeat { count, body } => {
                repeat(workflow(body, completer), *count).run(current)
            }
            Stage::Until { stop, body } => {
                let stop_at = |fm: &Flow<Value>, n| stop.holds(fm, n);
                until(workflow(body, completer), stop_at).run(current)
            }
            Stage::While {
                cond,
                at_least_once,
                body,
            } => {
                let keep_going = |fm: &Flow<Value>, n| cond.holds(fm, n);
                if *at_least_once {
                    do_while(workflow(body, completer), keep_going).run(current)
                } else {
                    looping(workflow(body, completer), keep_going).run(current)
                }
            }
            Stage::Succeed { body } => succeed(workflow(body, completer)).run(current),
            Stage::Fail { body } => fail(workflow(body, completer)).run(current),
        };
        debug!(op = self.name(), %from, to = %next.variant(), "stage applied");
        next
    }
}

impl Call {
    /// Run this call as a lattice step.
    ///
    /// Plain calls are lifted, so errors come back as `Down` with a diagnostic.
    pub fn invoke(&self, current: Flow<Value>, completer: &dyn Completer) -> Flow<Value> {
        match self {
            Call::Inc => lift(|v: Value| increment(&v))(current),
            Call::Double => {
                lift(|v: Value| arithmetic(&v, |i| i.checked_mul(2), |f| f * 2.0))(current)
            }
            Call::Reciprocal => lift(reciprocal)(current),
            Call::Complete => lift(|v: Value| complete(completer, &v))(current),
            Call::EscapeAt(target) => lift_in(|v: Value| {
                match increment(&v) {
                    Ok(next) if same_value(&v, target) => Flow::Top(next),
                    Ok(next) => Flow::Up(next),
                    Err(err) => Flow::Down(Failure::from_error(&err).into()),
                }
            })(current),
        }
    }
}

impl Condition {
    pub fn holds(&self, current: &Flow<Value>, iteration: usize) -> bool {
        match self {
            Condition::ValueEq(expected) => same_value(current.value(), expected),
            Condition::ValueNe(expected) => !same_value(current.value(), expected),
            Condition::State(variant) => current.variant() == *variant,
            Condition::IterationsBelow(limit) => iteration < *limit,
        }
    }
}

/// Equality that treats `2` and `2.0` as the same number.
fn same_value(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) => l == r,
        _ => left == right,
    }
}

fn arithmetic(v: &Value, int_op: fn(i64) -> Option<i64>, float_op: fn(f64) -> f64) -> Result<Value> {
    if let Some(i) = v.as_i64() {
        return int_op(i)
            .map(Value::from)
            .ok_or_else(|| anyhow!("integer overflow at {v}"));
    }
    if let Some(f) = v.as_f64() {
        return Ok(json!(float_op(f)));
    }
    bail!("expected a number, got {v}")
}

fn increment(v: &Value) -> Result<Value> {
    arithmetic(v, |i| i.checked_add(1), |f| f + 1.0)
}

fn reciprocal(v: Value) -> Result<Value> {
    let x = v
        .as_f64()
        .ok_or_else(|| anyhow!("expected a number, got {v}"))?;
    if x == 0.0 {
        bail!("division by zero");
    }
    Ok(json!(1.0 / x))
}

fn complete(completer: &dyn Completer, v: &Value) -> Result<Value> {
    let prompt = v
        .as_str()
        .ok_or_else(|| anyhow!("complete expects a string prompt, got {v}"))?;
    let text = completer.complete(prompt).context("complete")?;
    Ok(Value::String(text))
}
