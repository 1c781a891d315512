//! Adapters that turn plain functions into lattice steps.
//!
//! Lifted functions are fallible (`Fn(A) -> anyhow::Result<B>`). Errors and
//! panics raised inside them are captured at the adapter and come back as a
//! `Down` carrying the rendered [`Failure`]; they never propagate further.
//! Successful results are classified by a truthiness predicate: truthy results
//! become `Up`, falsy ones become `Down`.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use anyhow::Result;
use serde_json::Value;
use tracing::debug;

use crate::core::lattice::Flow;
use crate::truthy::Truthy;

/// Diagnostic captured from a lifted function that returned an error or panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    message: String,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Render an error with its full cause chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        Self::new(format!("{err:?}"))
    }

    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = if let Some(msg) = payload.downcast_ref::<&str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::new(format!("panicked: {detail}"))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<Failure> for String {
    fn from(failure: Failure) -> Self {
        failure.message
    }
}

impl From<Failure> for Value {
    fn from(failure: Failure) -> Self {
        Value::String(failure.message)
    }
}

/// Call `f`, turning both `Err` and panics into a [`Failure`].
fn capture<A, B, F>(f: &F, input: A) -> Result<B, Failure>
where
    F: Fn(A) -> Result<B>,
{
    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| f(input))) {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(err)) => Failure::from_error(&err),
        Err(payload) => Failure::from_panic(payload),
    };
    debug!(failure = %outcome, "lifted function failed");
    Err(outcome)
}

/// How lifted results are classified and how failures are carried.
///
/// `Lifting::default()` uses [`Truthy`] for success detection and `From<Failure>`
/// to carry diagnostics. A falsy sentinel, when set, replaces the carried value of
/// a `Down` produced by a falsy result.
#[derive(Clone)]
pub struct Lifting<B> {
    is_truthy: fn(&B) -> bool,
    render: fn(Failure) -> B,
    falsy: Option<B>,
}

impl<B: Truthy + From<Failure>> Default for Lifting<B> {
    fn default() -> Self {
        Self::new(<B as Truthy>::is_truthy, <B as From<Failure>>::from)
    }
}

impl<B> fmt::Debug for Lifting<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifting")
            .field("falsy_sentinel", &self.falsy.is_some())
            .finish_non_exhaustive()
    }
}

impl<B> Lifting<B> {
    pub fn new(is_truthy: fn(&B) -> bool, render: fn(Failure) -> B) -> Self {
        Self {
            is_truthy,
            render,
            falsy: None,
        }
    }

    /// Carry `sentinel` instead of the falsy result itself.
    pub fn with_falsy(mut self, sentinel: B) -> Self {
        self.falsy = Some(sentinel);
        self
    }
}

impl<B: Clone> Lifting<B> {
    /// Classify a captured outcome into `Up` or `Down`.
    pub fn classify(&self, outcome: Result<B, Failure>) -> Flow<B> {
        match outcome {
            Ok(value) if (self.is_truthy)(&value) => Flow::Up(value),
            Ok(value) => Flow::Down(self.falsy.clone().unwrap_or(value)),
            Err(failure) => Flow::Down((self.render)(failure)),
        }
    }

    /// Lift `f` so that its result is classified into the lattice.
    pub fn lift_out<A, F>(self, f: F) -> impl Fn(A) -> Flow<B>
    where
        F: Fn(A) -> Result<B>,
    {
        move |input| self.classify(capture(&f, input))
    }

    /// Lift `f` for its effect: on success the original input is carried on.
    ///
    /// Success is judged by the truthiness of `f`'s result; a falsy result
    /// carries the input (or the sentinel) in a `Down`.
    pub fn lift_out_effect<R, F>(self, f: F) -> impl Fn(B) -> Flow<B>
    where
        F: Fn(B) -> Result<R>,
        R: Truthy,
    {
        move |input: B| match capture(&f, input.clone()) {
            Ok(result) if result.is_truthy() => Flow::Up(input),
            Ok(_) => Flow::Down(self.falsy.clone().unwrap_or(input)),
            Err(failure) => Flow::Down((self.render)(failure)),
        }
    }

    /// Unwrap a lattice value, call `f`, and classify the result.
    pub fn lift<A, F>(self, f: F) -> impl Fn(Flow<A>) -> Flow<B>
    where
        F: Fn(A) -> Result<B>,
    {
        self.lift_out(lift_in(f))
    }

    /// Unwrap a lattice value and call `f` for its effect, carrying the input on.
    pub fn lift_effect<R, F>(self, f: F) -> impl Fn(Flow<B>) -> Flow<B>
    where
        F: Fn(B) -> Result<R>,
        R: Truthy,
    {
        lift_in(self.lift_out_effect(f))
    }
}

/// Unwrap the carried value and apply `f` to it.
///
/// `f` usually already returns a [`Flow`]; nothing is captured or classified.
pub fn lift_in<A, R, F>(f: F) -> impl Fn(Flow<A>) -> R
where
    F: Fn(A) -> R,
{
    move |fm| f(fm.into_value())
}

/// [`Lifting::lift_out`] with default classification.
pub fn lift_out<A, B, F>(f: F) -> impl Fn(A) -> Flow<B>
where
    F: Fn(A) -> Result<B>,
    B: Truthy + From<Failure> + Clone,
{
    Lifting::default().lift_out(f)
}

/// [`Lifting::lift_out_effect`] with default classification.
pub fn lift_out_effect<A, R, F>(f: F) -> impl Fn(A) -> Flow<A>
where
    F: Fn(A) -> Result<R>,
    A: Truthy + From<Failure> + Clone,
    R: Truthy,
{
    Lifting::default().lift_out_effect(f)
}

/// [`Lifting::lift`] with default classification.
pub fn lift<A, B, F>(f: F) -> impl Fn(Flow<A>) -> Flow<B>
where
    F: Fn(A) -> Result<B>,
    B: Truthy + From<Failure> + Clone,
{
    Lifting::default().lift(f)
}

/// [`Lifting::lift_effect`] with default classification.
pub fn lift_effect<A, R, F>(f: F) -> impl Fn(Flow<A>) -> Flow<A>
where
    F: Fn(A) -> Result<R>,
    A: Truthy + From<Failure> + Clone,
    R: Truthy,
{
    Lifting::default().lift_effect(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use serde_json::json;

    fn reciprocal(x: f64) -> Result<f64> {
        if x == 0.0 {
            bail!("division by zero");
        }
        Ok(1.0 / x)
    }

    fn reciprocal_json(x: Value) -> Result<Value> {
        let x = x.as_f64().unwrap_or_default();
        Ok(json!(reciprocal(x)?))
    }

    #[test]
    fn lift_in_unwraps_before_calling() {
        let div = lift_in(reciprocal);
        assert_eq!(div(Flow::Up(1.0)).expect("finite"), 1.0);
        assert_eq!(div(Flow::Bottom(4.0)).expect("finite"), 0.25);
    }

    #[test]
    fn lift_out_classifies_success_as_up() {
        let div = lift_out(reciprocal_json);
        assert_eq!(div(json!(1)), Flow::Up(json!(1.0)));
    }

    #[test]
    fn lift_out_captures_error_as_down_with_diagnostic() {
        let div = lift_out(reciprocal_json);
        let result = div(json!(0));
        assert!(result.is_negative());
        assert!(!result.is_escaped());
        let message = result.value().as_str().expect("diagnostic text");
        assert!(message.contains("division by zero"), "{message}");
    }

    #[test]
    fn lift_out_captures_panics() {
        let boom = lift_out(|x: String| -> Result<String> { panic!("bad input {x}") });
        let result = boom("q".to_string());
        assert_eq!(result, Flow::Down("panicked: bad input q".to_string()));
    }

    #[test]
    fn falsy_result_is_down() {
        let halve = lift_out(|x: Value| Ok(json!(x.as_i64().unwrap_or_default() / 2)));
        assert_eq!(halve(json!(1)), Flow::Down(json!(0)));
        assert_eq!(halve(json!(4)), Flow::Up(json!(2)));
    }

    #[test]
    fn falsy_sentinel_replaces_carried_value() {
        let lifting = Lifting::default().with_falsy("<empty>".to_string());
        let trim = lifting.lift_out(|s: String| Ok(s.trim().to_string()));
        assert_eq!(trim("  ".to_string()), Flow::Down("<empty>".to_string()));
        assert_eq!(trim(" a ".to_string()), Flow::Up("a".to_string()));
    }

    #[test]
    fn custom_predicate_and_renderer() {
        let lifting = Lifting::<f64>::new(|v: &f64| v.is_finite(), |_: Failure| f64::NAN);
        let div = lifting.lift(reciprocal);
        assert_eq!(div(Flow::Up(2.0)), Flow::Up(0.5));
        let failed = div(Flow::Down(0.0));
        assert!(failed.is_negative());
        assert!(failed.value().is_nan());
    }

    #[test]
    fn lift_effect_carries_input_through() {
        let seen = std::cell::RefCell::new(Vec::new());
        let record = lift_effect(|s: String| {
            seen.borrow_mut().push(s.clone());
            Ok(s.len())
        });
        assert_eq!(record(Flow::Up("abc".to_string())), Flow::Up("abc".to_string()));
        assert_eq!(record(Flow::Up(String::new())), Flow::Down(String::new()));
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn lift_out_effect_renders_failures() {
        let check = lift_out_effect(|s: String| -> Result<bool> {
            if s.is_empty() {
                bail!("empty input");
            }
            Ok(true)
        });
        assert_eq!(check("x".to_string()), Flow::Up("x".to_string()));
        let failed = check(String::new());
        assert!(failed.is_negative());
        assert!(failed.value().contains("empty input"));
    }

    #[test]
    fn lifted_steps_chain_through_always() {
        let inc = lift(|v: Value| Ok(json!(v.as_i64().unwrap_or_default() + 1)));
        let result = Flow::Down(json!(0))
            .always_chain(&inc)
            .always_chain(&inc)
            .bind_chain(&inc);
        assert_eq!(result, Flow::Down(json!(2)));
    }
}
