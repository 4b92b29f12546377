//! Property tests: the lexer/parser must never panic, parsing must be
//! deterministic, and the stack/arithmetic laws must hold for generated
//! inputs, not just the handful of hand-picked ones.

use proptest::prelude::*;

use curio::{parse, CommandRegistry, Interpreter, ScriptError, Value};

proptest! {
    /// The parser returns Ok or Err on arbitrary input; it never panics.
    #[test]
    fn parser_does_not_panic(src in "\\PC*") {
        let _ = parse(&src);
    }

    /// Parsing the same source twice yields structurally identical trees.
    #[test]
    fn parsing_is_deterministic(src in "\\PC*") {
        match (parse(&src), parse(&src)) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(_), Err(_)) => {}
            (a, b) => prop_assert!(false, "parse disagreed with itself: {a:?} vs {b:?}"),
        }
    }

    /// Number literals survive the lex/parse/eval pipeline unchanged.
    #[test]
    fn number_literals_round_trip(int in 0u32..1_000_000, frac in 0u32..1000) {
        let src = format!("x = {int}.{frac:03}");
        let expected = format!("{int}.{frac:03}").parse::<f64>().unwrap();
        let mut interp = Interpreter::default();
        interp.run_script(&src).unwrap();
        prop_assert_eq!(interp.get_var("x"), Some(&Value::Num(expected)));
    }

    /// `push x; pop` is the identity on the context stack for literal `x`.
    #[test]
    fn push_pop_is_identity(seed in proptest::collection::vec(-1000i64..1000, 0..8), probe in -1000i64..1000) {
        let mut interp = Interpreter::default();
        for n in &seed {
            interp.run_script(&format!("push {}", fmt_int(*n))).unwrap();
        }
        let before = interp.stack().to_vec();
        interp.run_script(&format!("push {}; pop", fmt_int(probe))).unwrap();
        prop_assert_eq!(interp.stack(), before.as_slice());
    }

    /// `pop` on an empty stack underflows no matter what ran before it.
    #[test]
    fn pop_after_balanced_pairs_underflows(pairs in 0usize..6) {
        let mut src = String::new();
        for i in 0..pairs {
            src.push_str(&format!("push {i}; pop; "));
        }
        src.push_str("pop");
        let mut interp = Interpreter::default();
        let err = interp.run_script(&src).expect_err("stack must be empty");
        prop_assert!(matches!(err, ScriptError::StackUnderflow { .. }));
    }

    /// The parsed precedence agrees with a reference computation.
    #[test]
    fn precedence_matches_reference(a in 1i64..100, b in 1i64..100, c in 1i64..100) {
        let mut interp = Interpreter::default();
        let src = format!("x = {a} + {b} * {c} - {a} / {c}");
        interp.run_script(&src).unwrap();
        let expected = a as f64 + (b as f64 * c as f64) - (a as f64 / c as f64);
        prop_assert_eq!(interp.get_var("x"), Some(&Value::Num(expected)));
    }

    /// Every list pushed by a foreach arrives in order.
    #[test]
    fn foreach_preserves_order(items in proptest::collection::vec(-50i64..50, 0..10)) {
        let rendered: Vec<String> = items.iter().map(|n| fmt_int(*n)).collect();
        let src = format!("foreach (v in [{}]) push v", rendered.join(", "));
        let mut interp = Interpreter::default();
        interp.run_script(&src).unwrap();
        let expected: Vec<Value> = items.iter().map(|n| Value::Num(*n as f64)).collect();
        prop_assert_eq!(interp.stack(), expected.as_slice());
    }

    /// Comparing values of mismatched variants is `false`, never an error.
    #[test]
    fn cross_variant_equality_is_false(n in -1000i64..1000, s in "[a-z]{0,8}") {
        let mut interp = Interpreter::default();
        let src = format!("x = {} == \"{s}\"", fmt_int(n));
        interp.run_script(&src).unwrap();
        prop_assert_eq!(interp.get_var("x"), Some(&Value::Bool(false)));
    }
}

/// Negative numbers have no literal form; render them through unary minus.
fn fmt_int(n: i64) -> String {
    if n < 0 {
        format!("(0 - {})", -n)
    } else {
        n.to_string()
    }
}

/// Deterministic spot check that generated registries behave: a handler that
/// fails always surfaces as `CommandError`, whatever arguments it gets.
#[test]
fn failing_handler_always_surfaces() {
    let mut registry = CommandRegistry::new();
    registry.register("flaky", |_args| Err("nope".into()));
    let mut interp = Interpreter::new(registry);
    for argc in 0..4 {
        let args: Vec<String> = (0..argc).map(|i| i.to_string()).collect();
        let src = format!("flaky({})", args.join(", "));
        let err = interp.run_script(&src).expect_err("flaky always fails");
        assert!(matches!(err, ScriptError::Command { ref name, .. } if name == "flaky"));
    }
}
