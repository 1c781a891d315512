//! Loop combinator over lattice values.
//!
//! A [`Loop`] repeatedly feeds the current value through a step function. Each
//! round it checks, in order:
//!
//! 1. an escaped value (`Top`/`Bottom`) stops the loop, regardless of anything else;
//! 2. `keep_going(&current, iteration)` or `iteration < min_iterations` runs one more step;
//! 3. otherwise the current value is returned.
//!
//! The driver is a plain `loop` over mutable locals, so stack depth stays
//! constant for any number of iterations and no earlier state is retained.

use std::fmt;

use tracing::{debug, trace};

use crate::core::lattice::Flow;

/// Extraction that hands the whole lattice value to the step.
pub type Identity<A> = fn(Flow<A>) -> Flow<A>;

/// Extraction that hands only the carried value to the step.
pub type Unwrap<A> = fn(Flow<A>) -> A;

/// A configured loop; see the module docs for the stopping rules.
pub struct Loop<S, P, X> {
    step: S,
    keep_going: P,
    min_iterations: usize,
    extract: X,
}

impl<S, P, X> fmt::Debug for Loop<S, P, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loop")
            .field("min_iterations", &self.min_iterations)
            .finish_non_exhaustive()
    }
}

impl<S, P, X> Loop<S, P, X> {
    /// General form: `extract` decides what the step receives each round.
    pub fn new<A, T>(step: S, keep_going: P, min_iterations: usize, extract: X) -> Self
    where
        S: FnMut(T) -> Flow<A>,
        P: FnMut(&Flow<A>, usize) -> bool,
        X: FnMut(Flow<A>) -> T,
    {
        Self {
            step,
            keep_going,
            min_iterations,
            extract,
        }
    }

    /// Run at least `min_iterations` steps unless the value escapes first.
    pub fn min_iterations(mut self, min_iterations: usize) -> Self {
        self.min_iterations = min_iterations;
        self
    }

    pub fn run<A, T>(&mut self, initial: Flow<A>) -> Flow<A>
    where
        S: FnMut(T) -> Flow<A>,
        P: FnMut(&Flow<A>, usize) -> bool,
        X: FnMut(Flow<A>) -> T,
    {
        self.run_from(initial, 0)
    }

    /// Run as if `iteration` steps had already been performed.
    pub fn run_from<A, T>(&mut self, initial: Flow<A>, mut iteration: usize) -> Flow<A>
    where
        S: FnMut(T) -> Flow<A>,
        P: FnMut(&Flow<A>, usize) -> bool,
        X: FnMut(Flow<A>) -> T,
    {
        let mut current = initial;
        loop {
            if current.is_escaped() {
                debug!(iteration, variant = %current.variant(), "loop escaped");
                return current;
            }
            if !((self.keep_going)(&current, iteration) || iteration < self.min_iterations) {
                debug!(iteration, variant = %current.variant(), "loop finished");
                return current;
            }
            trace!(iteration, variant = %current.variant(), "loop step");
            current = (self.step)((self.extract)(current));
            iteration += 1;
        }
    }

    /// Turn the loop into a step usable with `bind_chain`/`always_chain`.
    pub fn into_step<A, T>(mut self) -> impl FnMut(Flow<A>) -> Flow<A>
    where
        S: FnMut(T) -> Flow<A>,
        P: FnMut(&Flow<A>, usize) -> bool,
        X: FnMut(Flow<A>) -> T,
    {
        move |initial| self.run(initial)
    }
}

/// Loop whose step receives the whole lattice value.
pub fn looping<A, S, P>(step: S, keep_going: P) -> Loop<S, P, Identity<A>>
where
    S: FnMut(Flow<A>) -> Flow<A>,
    P: FnMut(&Flow<A>, usize) -> bool,
{
    Loop::new(step, keep_going, 0, std::convert::identity as Identity<A>)
}

/// Run `step` once, then keep going while `cond` holds.
pub fn do_while<A, S, P>(step: S, cond: P) -> Loop<S, P, Identity<A>>
where
    S: FnMut(Flow<A>) -> Flow<A>,
    P: FnMut(&Flow<A>, usize) -> bool,
{
    looping(step, cond).min_iterations(1)
}

/// Keep going while `cond` does not hold.
pub fn until<A, S, P>(
    step: S,
    mut cond: P,
) -> Loop<S, impl FnMut(&Flow<A>, usize) -> bool, Identity<A>>
where
    S: FnMut(Flow<A>) -> Flow<A>,
    P: FnMut(&Flow<A>, usize) -> bool,
{
    looping(step, move |current: &Flow<A>, n: usize| !cond(current, n))
}

/// Run `step` exactly `count` times, unless the value escapes first.
pub fn repeat<A, S>(
    step: S,
    count: usize,
) -> Loop<S, impl FnMut(&Flow<A>, usize) -> bool, Identity<A>>
where
    S: FnMut(Flow<A>) -> Flow<A>,
{
    until(step, move |_: &Flow<A>, n: usize| n >= count)
}

/// Retry `step` while its result is negative (`Down` or `Bottom`).
pub fn succeed<A, S>(step: S) -> Loop<S, impl FnMut(&Flow<A>, usize) -> bool, Identity<A>>
where
    S: FnMut(Flow<A>) -> Flow<A>,
{
    do_while(step, |current: &Flow<A>, _: usize| current.is_negative())
}

/// Retry `step` while its result is positive (`Up` or `Top`).
pub fn fail<A, S>(step: S) -> Loop<S, impl FnMut(&Flow<A>, usize) -> bool, Identity<A>>
where
    S: FnMut(Flow<A>) -> Flow<A>,
{
    do_while(step, |current: &Flow<A>, _: usize| current.is_positive())
}

/// Loop whose step receives only the carried value.
pub fn value_loop<A, S, P>(step: S, keep_going: P) -> Loop<S, P, Unwrap<A>>
where
    S: FnMut(A) -> Flow<A>,
    P: FnMut(&Flow<A>, usize) -> bool,
{
    Loop::new(step, keep_going, 0, Flow::into_value as Unwrap<A>)
}

/// [`do_while`] for steps over carried values.
pub fn value_do_while<A, S, P>(step: S, cond: P) -> Loop<S, P, Unwrap<A>>
where
    S: FnMut(A) -> Flow<A>,
    P: FnMut(&Flow<A>, usize) -> bool,
{
    value_loop(step, cond).min_iterations(1)
}

/// [`until`] for steps over carried values.
pub fn value_until<A, S, P>(
    step: S,
    mut cond: P,
) -> Loop<S, impl FnMut(&Flow<A>, usize) -> bool, Unwrap<A>>
where
    S: FnMut(A) -> Flow<A>,
    P: FnMut(&Flow<A>, usize) -> bool,
{
    value_loop(step, move |current: &Flow<A>, n: usize| !cond(current, n))
}

/// [`repeat`] for steps over carried values.
pub fn value_repeat<A, S>(
    step: S,
    count: usize,
) -> Loop<S, impl FnMut(&Flow<A>, usize) -> bool, Unwrap<A>>
where
    S: FnMut(A) -> Flow<A>,
{
    value_until(step, move |_: &Flow<A>, n: usize| n >= count)
}
