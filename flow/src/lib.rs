//! A four-state lattice for composing fallible, escapable computations.
//!
//! Every step produces a [`Flow`]: a carried value tagged `Up` (continuing),
//! `Down` (diverted), `Top` (escaped while continuing) or `Bottom` (escaped while
//! diverted). Which combinators run, and when loops stop, is decided purely by
//! that tag:
//!
//! - **[`core`]**: the lattice value, its variants and its transitions. Pure, no
//!   logging, no I/O.
//! - **[`lift`]** and **[`truthy`]**: adapters that turn plain fallible
//!   functions into lattice steps.
//! - **[`looping`]**: the trampolined loop driver and its specializations.

pub mod core;
pub mod lift;
pub mod logging;
pub mod looping;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod truthy;

pub use crate::core::lattice::{Flow, on};
pub use crate::core::variant::{Escalation, Polarity, Variant};
pub use crate::lift::{
    Failure, Lifting, lift, lift_effect, lift_in, lift_out, lift_out_effect,
};
pub use crate::looping::{
    Loop, do_while, fail, looping, repeat, succeed, until, value_do_while, value_loop,
    value_repeat, value_until,
};
pub use crate::truthy::Truthy;
