//! Test-only step helpers over `i32` payloads.

use crate::core::lattice::Flow;

/// `Up(v + 1)`, whatever the input variant.
pub fn inc(fm: Flow<i32>) -> Flow<i32> {
    Flow::Up(fm.into_value() + 1)
}

/// `Down(v + 1)`, whatever the input variant.
pub fn inc_down(fm: Flow<i32>) -> Flow<i32> {
    Flow::Down(fm.into_value() + 1)
}

/// `Up(v * 2)`, whatever the input variant.
pub fn double(fm: Flow<i32>) -> Flow<i32> {
    Flow::Up(fm.into_value() * 2)
}

/// `Up(v + 1)` over a carried value.
pub fn inc_value(v: i32) -> Flow<i32> {
    Flow::Up(v + 1)
}

/// Increment, escaping to `Top` once the input reaches `at`.
pub fn escape_at(at: i32) -> impl Fn(Flow<i32>) -> Flow<i32> + Copy {
    move |fm| {
        let v = fm.into_value();
        if v == at {
            Flow::Top(v + 1)
        } else {
            Flow::Up(v + 1)
        }
    }
}

/// One sample of every variant carrying `value`.
pub fn all_variants(value: i32) -> [Flow<i32>; 4] {
    [
        Flow::Up(value),
        Flow::Down(value),
        Flow::Top(value),
        Flow::Bottom(value),
    ]
}
