//! The four-state value and its transitions.
//!
//! Combinator behavior by variant (`f` is only called where noted):
//!
//! | variant  | `bind` / `bind_chain` | `always` / `always_chain`          |
//! |----------|-----------------------|------------------------------------|
//! | `Up`     | `f(..)`               | `f(..)`                            |
//! | `Down`   | unchanged             | `Down` carrying `f(..)`'s value    |
//! | `Top`    | unchanged             | unchanged                          |
//! | `Bottom` | unchanged             | unchanged                          |

use serde::{Deserialize, Serialize};

use crate::core::variant::{Escalation, Polarity, Variant};

/// A carried value tagged with one of the four lattice states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum Flow<A> {
    /// Continuing, not escaped.
    Up(A),
    /// Diverted, not escaped.
    Down(A),
    /// Continuing, escaped from the enclosing control flow.
    Top(A),
    /// Diverted, escaped from the enclosing control flow.
    Bottom(A),
}

impl<A> Flow<A> {
    pub fn variant(&self) -> Variant {
        match self {
            Flow::Up(_) => Variant::Up,
            Flow::Down(_) => Variant::Down,
            Flow::Top(_) => Variant::Top,
            Flow::Bottom(_) => Variant::Bottom,
        }
    }

    pub fn polarity(&self) -> Polarity {
        self.variant().polarity()
    }

    pub fn escalation(&self) -> Escalation {
        self.variant().escalation()
    }

    /// `Up` or `Top`.
    pub fn is_positive(&self) -> bool {
        self.polarity() == Polarity::Positive
    }

    /// `Down` or `Bottom`.
    pub fn is_negative(&self) -> bool {
        self.polarity() == Polarity::Negative
    }

    /// `Top` or `Bottom`.
    pub fn is_escaped(&self) -> bool {
        self.escalation() == Escalation::Escaped
    }

    pub fn is_same_variant<B>(&self, other: &Flow<B>) -> bool {
        self.variant() == other.variant()
    }

    pub fn value(&self) -> &A {
        match self {
            Flow::Up(value) | Flow::Down(value) | Flow::Top(value) | Flow::Bottom(value) => value,
        }
    }

    /// Drop the tag and return the carried value.
    pub fn into_value(self) -> A {
        match self {
            Flow::Up(value) | Flow::Down(value) | Flow::Top(value) | Flow::Bottom(value) => value,
        }
    }

    pub fn into_parts(self) -> (Variant, A) {
        (self.variant(), self.into_value())
    }

    /// Transform the carried value, keeping the variant.
    pub fn map<B, F>(self, f: F) -> Flow<B>
    where
        F: FnOnce(A) -> B,
    {
        let (variant, value) = self.into_parts();
        variant.wrap(f(value))
    }

    /// Re-wrap `other`'s carried value into this value's variant.
    pub fn rewrap<B>(&self, other: Flow<B>) -> Flow<B> {
        self.variant().wrap(other.into_value())
    }

    /// Apply `f` to the carried value of an `Up`; every other variant passes through.
    pub fn bind<F>(self, f: F) -> Flow<A>
    where
        F: FnOnce(A) -> Flow<A>,
    {
        match self {
            Flow::Up(value) => f(value),
            other => other,
        }
    }

    /// Like [`Flow::bind`], but `f` receives the whole value.
    pub fn bind_chain<F>(self, f: F) -> Flow<A>
    where
        F: FnOnce(Flow<A>) -> Flow<A>,
    {
        match self {
            Flow::Up(_) => f(self),
            other => other,
        }
    }

    /// Apply `f` to the carried value of any normal variant.
    ///
    /// On `Down` the result keeps the `Down` tag and only `f`'s carried value is
    /// taken, so a recovery chain stays diverted until something flips it.
    pub fn always<F>(self, f: F) -> Flow<A>
    where
        F: FnOnce(A) -> Flow<A>,
    {
        match self {
            Flow::Up(value) => f(value),
            Flow::Down(value) => Flow::Down(f(value).into_value()),
            escaped => escaped,
        }
    }

    /// Like [`Flow::always`], but `f` receives the whole value.
    pub fn always_chain<F>(self, f: F) -> Flow<A>
    where
        F: FnOnce(Flow<A>) -> Flow<A>,
    {
        match self {
            Flow::Up(_) => f(self),
            Flow::Down(_) => Flow::Down(f(self).into_value()),
            escaped => escaped,
        }
    }

    /// Drop escalation: `Top` becomes `Up`, `Bottom` becomes `Down`.
    pub fn normalize(self) -> Flow<A> {
        let (variant, value) = self.into_parts();
        variant.normalize().wrap(value)
    }

    /// Add escalation: `Up` becomes `Top`, `Down` becomes `Bottom`.
    pub fn escalate(self) -> Flow<A> {
        let (variant, value) = self.into_parts();
        variant.escalate().wrap(value)
    }

    /// Swap polarity, keeping escalation.
    pub fn flip(self) -> Flow<A> {
        let (variant, value) = self.into_parts();
        variant.flip().wrap(value)
    }

    pub fn normalize_flip(self) -> Flow<A> {
        self.normalize().flip()
    }

    pub fn escalate_flip(self) -> Flow<A> {
        self.escalate().flip()
    }
}

/// Run `workflow` (through [`Flow::always_chain`]) only on values of `variant`.
///
/// Values of any other variant pass through untouched.
pub fn on<A, F>(variant: Variant, mut workflow: F) -> impl FnMut(Flow<A>) -> Flow<A>
where
    F: FnMut(Flow<A>) -> Flow<A>,
{
    move |current| {
        if current.variant() == variant {
            current.always_chain(&mut workflow)
        } else {
            current
        }
    }
}
