//! Algebraic laws of the lattice and its combinators.
//!
//! Exercises the public surface only: transitions, both combinator families,
//! lifting at the adapter boundary, and loop termination rules.

use std::cell::Cell;

use anyhow::{Result, bail};
use flow::test_support::{all_variants, double, escape_at, inc, inc_down, inc_value};
use flow::{Flow, Variant, lift, lift_out, looping, repeat, until, value_repeat};
use serde_json::{Value, json};

#[test]
fn flip_is_an_involution() {
    for fm in all_variants(7) {
        assert_eq!(fm.flip().flip(), fm);
        assert_eq!(fm.flip().escalation(), fm.escalation());
        assert_ne!(fm.flip().polarity(), fm.polarity());
    }
}

#[test]
fn normalize_drops_escalation_only() {
    assert_eq!(Flow::Top(1).normalize(), Flow::Up(1));
    assert_eq!(Flow::Bottom(1).normalize(), Flow::Down(1));
    assert_eq!(Flow::Up(1).normalize(), Flow::Up(1));
    assert_eq!(Flow::Down(1).normalize(), Flow::Down(1));
    for fm in all_variants(1) {
        assert_eq!(fm.normalize().normalize(), fm.normalize());
    }
}

#[test]
fn escalate_is_idempotent() {
    assert_eq!(Flow::Up(1).escalate(), Flow::Top(1));
    assert_eq!(Flow::Down(1).escalate(), Flow::Bottom(1));
    for fm in all_variants(1) {
        assert_eq!(fm.escalate().escalate(), fm.escalate());
        assert!(fm.escalate().is_escaped());
    }
}

#[test]
fn skip_family_returns_non_up_receivers_unchanged() {
    for fm in all_variants(3) {
        if fm.variant() == Variant::Up {
            continue;
        }
        assert_eq!(fm.bind(|v| Flow::Top(v * 100)), fm);
        assert_eq!(fm.bind_chain(|_| Flow::Up(-1)), fm);
    }
}

#[test]
fn always_family_invokes_f_only_on_normal_variants() {
    for fm in all_variants(3) {
        let calls = Cell::new(0);
        let result = fm.always(|v| {
            calls.set(calls.get() + 1);
            Flow::Up(v + 1)
        });
        let chained = fm.always_chain(|inner| {
            calls.set(calls.get() + 1);
            inner.flip()
        });
        match fm.variant() {
            Variant::Up => {
                assert_eq!(result, Flow::Up(4));
                assert_eq!(chained, Flow::Down(3));
                assert_eq!(calls.get(), 2);
            }
            Variant::Down => {
                assert_eq!(result, Flow::Down(4));
                assert_eq!(chained, Flow::Down(3));
                assert_eq!(calls.get(), 2);
            }
            Variant::Top | Variant::Bottom => {
                assert_eq!(result, fm);
                assert_eq!(chained, fm);
                assert_eq!(calls.get(), 0);
            }
        }
    }
}

#[test]
fn down_always_coerces_escaped_results_back_to_down() {
    let result = Flow::Down(0).always(|v| Flow::Bottom(v + 5));
    assert_eq!(result, Flow::Down(5));
    let result = Flow::Down(0).always_chain(|fm| fm.escalate_flip());
    assert_eq!(result, Flow::Down(0));
}

#[test]
fn loop_reaches_five_thousand() {
    let result = Flow::Up(0).bind_chain(looping(inc, |fm, _| *fm.value() != 5000).into_step());
    assert_eq!(result, Flow::Up(5000));
}

#[test]
fn until_stops_at_ten() {
    let result = Flow::Up(0).bind_chain(until(inc, |fm, _| *fm.value() == 10).into_step());
    assert_eq!(result, Flow::Up(10));
}

#[test]
fn repeat_over_down_chain_yields_ten() {
    let result = Flow::Down(0).always_chain(repeat(inc_down, 10).into_step());
    assert_eq!(result.into_value(), 10);
}

#[test]
fn escape_stops_an_endless_loop() {
    let result = looping(escape_at(2), |_, _| true).run(Flow::Up(0));
    assert_eq!(result, Flow::Top(3));
}

#[test]
fn escaped_step_inside_repeat_breaks_out() {
    let result = repeat(escape_at(4), 100).run(Flow::Up(0));
    assert_eq!(result, Flow::Top(5));
    assert_eq!(result.normalize().bind_chain(double), Flow::Up(10));
}

#[test]
fn value_repeat_matches_repeat() {
    let by_value = value_repeat(inc_value, 25).run(Flow::Up(0));
    let by_state = repeat(inc, 25).run(Flow::Up(0));
    assert_eq!(by_value, by_state);
}

fn reciprocal(x: Value) -> Result<Value> {
    let x = x.as_i64().unwrap_or_default();
    if x == 0 {
        bail!("attempt to divide by zero");
    }
    Ok(json!(1 / x))
}

#[test]
fn lift_out_reciprocal() {
    let div = lift_out(reciprocal);
    assert_eq!(div(json!(1)), Flow::Up(json!(1)));

    let failed = div(json!(0));
    assert_eq!(failed.variant(), Variant::Down);
    let text = failed.value().as_str().expect("diagnostic text");
    assert!(text.contains("divide by zero"), "{text}");
}

#[test]
fn lifted_pipeline_recovers_with_always() {
    let inc = lift(|v: Value| Ok(json!(v.as_i64().unwrap_or_default() + 1)));
    let div = lift(reciprocal);

    let result = Flow::Up(json!(0)).bind_chain(&div);
    assert!(result.is_negative());

    let recovered = Flow::Down(json!(0))
        .always_chain(&inc)
        .always_chain(&div)
        .flip()
        .bind_chain(&inc);
    assert_eq!(recovered, Flow::Up(json!(2)));
}
