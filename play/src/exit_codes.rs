//! Stable exit codes for `play` commands.

use flow::Variant;

/// `play check` succeeded, or `play run` finished on `Up`.
pub const OK: i32 = 0;
/// Invalid config/pipeline or any other driver error.
pub const INVALID: i32 = 1;
/// `play run` finished on `Down`.
pub const DOWN: i32 = 2;
/// `play run` finished on `Top`.
pub const TOP: i32 = 3;
/// `play run` finished on `Bottom`.
pub const BOTTOM: i32 = 4;

/// Exit code reported for a pipeline that finished on `variant`.
pub fn for_variant(variant: Variant) -> i32 {
    match variant {
        Variant::Up => OK,
        Variant::Down => DOWN,
        Variant::Top => TOP,
        Variant::Bottom => BOTTOM,
    }
}
