//! Bare lattice tags, without a carried value.
//!
//! A [`Variant`] is the product of two independent axes: [`Polarity`]
//! (continuing vs diverted) and [`Escalation`] (normal vs escaped).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::lattice::Flow;

/// Whether a value is continuing (positive) or diverted (negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn opposite(self) -> Self {
        match self {
            Polarity::Positive => Polarity::Negative,
            Polarity::Negative => Polarity::Positive,
        }
    }
}

/// Whether a value has escaped from its enclosing control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Escalation {
    Normal,
    Escaped,
}

/// One of the four lattice states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Positive, normal.
    Up,
    /// Negative, normal.
    Down,
    /// Positive, escaped.
    Top,
    /// Negative, escaped.
    Bottom,
}

impl Variant {
    pub const ALL: [Variant; 4] = [Variant::Up, Variant::Down, Variant::Top, Variant::Bottom];

    /// Assemble a variant from its two axes.
    pub fn from_parts(polarity: Polarity, escalation: Escalation) -> Self {
        match (polarity, escalation) {
            (Polarity::Positive, Escalation::Normal) => Variant::Up,
            (Polarity::Negative, Escalation::Normal) => Variant::Down,
            (Polarity::Positive, Escalation::Escaped) => Variant::Top,
            (Polarity::Negative, Escalation::Escaped) => Variant::Bottom,
        }
    }

    pub fn polarity(self) -> Polarity {
        match self {
            Variant::Up | Variant::Top => Polarity::Positive,
            Variant::Down | Variant::Bottom => Polarity::Negative,
        }
    }

    pub fn escalation(self) -> Escalation {
        match self {
            Variant::Up | Variant::Down => Escalation::Normal,
            Variant::Top | Variant::Bottom => Escalation::Escaped,
        }
    }

    pub fn normalize(self) -> Self {
        Self::from_parts(self.polarity(), Escalation::Normal)
    }

    pub fn escalate(self) -> Self {
        Self::from_parts(self.polarity(), Escalation::Escaped)
    }

    pub fn flip(self) -> Self {
        Self::from_parts(self.polarity().opposite(), self.escalation())
    }

    /// Put `value` into a [`Flow`] tagged with this variant.
    pub fn wrap<A>(self, value: A) -> Flow<A> {
        match self {
            Variant::Up => Flow::Up(value),
            Variant::Down => Flow::Down(value),
            Variant::Top => Flow::Top(value),
            Variant::Bottom => Flow::Bottom(value),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Up => "up",
            Variant::Down => "down",
            Variant::Top => "top",
            Variant::Bottom => "bottom",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
