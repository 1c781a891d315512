//! The lattice value and its transitions.
//!
//! Core modules are pure: every operation consumes a value and returns a new
//! one, and nothing here performs I/O or keeps state between calls.

pub mod lattice;
pub mod variant;
