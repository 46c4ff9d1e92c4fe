//! Behavioral checks of conditions and pipelines against direct arithmetic
//! over fixed data sets, plus randomized properties of the basic operations.

use dicedist_core::{parse_condition, parse_pipeline, Condition, DiceTuple, ParseOptions, Registry};
use dicedist_eval::predicate::floor_mod;
use dicedist_eval::{eval_condition, DicePool, Distribution, Enumerate, Evaluator};
use proptest::prelude::*;

// ──────────────────────────────────────────────
// Data sets
// ──────────────────────────────────────────────

/// Sets whose expected results do not depend on element position.
fn independent_sets() -> Vec<DiceTuple> {
    vec![
        (0..10).collect(),
        (-10..1).collect(),
        (-10_000..10_000).collect(),
    ]
}

/// Every `k`-element combination of `pool`, in lexicographic order.
fn combinations(pool: &[i64], k: usize) -> Vec<DiceTuple> {
    let n = pool.len();
    if k > n {
        return Vec::new();
    }
    let mut picks: Vec<usize> = (0..k).collect();
    let mut out = Vec::new();
    loop {
        out.push(picks.iter().map(|&i| pool[i]).collect());
        let Some(i) = (0..k).rev().find(|&i| picks[i] != i + n - k) else {
            return out;
        };
        picks[i] += 1;
        for j in i + 1..k {
            picks[j] = picks[j - 1] + 1;
        }
    }
}

fn stepped(start: i64, stop: i64, step: usize) -> DiceTuple {
    (start..stop).step_by(step).collect()
}

/// Six-element sets for per-position parameter checks.
fn dependent_sets() -> Vec<DiceTuple> {
    let pool: Vec<i64> = (-10..10).collect();
    let mut sets = combinations(&pool, 6);
    sets.extend([
        stepped(-12, 0, 2),
        stepped(-6, 12, 3),
        stepped(-5, 13, 3),
        stepped(-7, 11, 3),
        stepped(0, 12, 2),
        stepped(1, 13, 2),
        stepped(0, 18, 3),
        stepped(1, 19, 3),
    ]);
    for offset in 0..5 {
        sets.push(stepped(offset, 30 + offset, 5));
    }
    for offset in 0..7 {
        sets.push(stepped(offset, 42 + offset, 7));
    }
    for offset in 0..11 {
        sets.push(stepped(offset, 66 + offset, 11));
    }
    for offset in [0, 1, 3, 5, 7, 11, 13, 17, 19] {
        sets.push(stepped(offset, 128 + offset, 23));
    }
    sets
}

fn words(values: &[i64]) -> String {
    values
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn modulo(value: i64, divisor: i64) -> i64 {
    floor_mod(value, divisor).unwrap()
}

fn cond(text: &str) -> Condition {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    parse_condition(&tokens).unwrap()
}

fn apply(pipeline: &str, dice: &[i64]) -> DiceTuple {
    let op = parse_pipeline(&[pipeline], &Registry::new(), ParseOptions::default()).unwrap();
    Evaluator::new(&op).apply(dice).unwrap()
}

// ──────────────────────────────────────────────
// Conditions
// ──────────────────────────────────────────────

#[test]
fn dependent_sets_have_six_elements() {
    let sets = dependent_sets();
    assert_eq!(sets.len(), 38_760 + 40);
    assert!(sets.iter().all(|s| s.len() == 6));
}

#[test]
fn logic_precedence_matches_arithmetic() {
    let condition = cond("eq 1 or not [ ge 2 and le 3 ] and [ gt 5 and lt 8 ]");
    for set in independent_sets() {
        for (index, &value) in set.iter().enumerate() {
            let expected = value == 1 || (!(2..=3).contains(&value) && 5 < value && value < 8);
            assert_eq!(
                eval_condition(&condition, value, index).unwrap(),
                expected,
                "value {value}"
            );
        }
    }
}

#[test]
fn modulo_conditions_match_arithmetic() {
    let condition = cond("mod 5 lt 2 or mod 7 gt 3 and mod 3 eq 1");
    for set in independent_sets() {
        for (index, &value) in set.iter().enumerate() {
            let expected =
                modulo(value, 5) < 2 || (modulo(value, 7) > 3 && modulo(value, 3) == 1);
            assert_eq!(
                eval_condition(&condition, value, index).unwrap(),
                expected,
                "value {value}"
            );
        }
    }
}

#[test]
fn positional_conditions_match_arithmetic() {
    let (m1, c1) = ([2, 3, 4, 5, 6, 7], [1, 2, 3, 4, 3, 2]);
    let (m2, c2) = ([3, 5, 7, 9, 11, 13], [2, 3, 4, 5, 6, 7]);
    let (m3, c3) = ([9, 11, 13, 17, 23, 29], [0, 1, 2, 3, 4, 5]);
    let text = format!(
        "mod {} lt {} or mod {} gt {} and mod {} eq {}",
        words(&m1),
        words(&c1),
        words(&m2),
        words(&c2),
        words(&m3),
        words(&c3)
    );
    let condition = cond(&text);
    for set in dependent_sets() {
        for (k, &value) in set.iter().enumerate() {
            let expected = modulo(value, m1[k]) < c1[k]
                || (modulo(value, m2[k]) > c2[k] && modulo(value, m3[k]) == c3[k]);
            assert_eq!(
                eval_condition(&condition, value, k).unwrap(),
                expected,
                "value {value} at {k}"
            );
        }
    }
}

#[test]
fn malformed_conditions_are_rejected() {
    for text in [
        "eq",
        "mod eq 1",
        "mod 0 eq 1",
        "eq 1 and",
        "or eq 1",
        "not not eq 1",
        "[ eq 1",
        "eq 1 ]",
        "[ ]",
        "eq 1 eq 2",
        "near 3",
        "eq one",
    ] {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        assert!(parse_condition(&tokens).is_err(), "{text:?} should not parse");
    }
}

// ──────────────────────────────────────────────
// Pipelines
// ──────────────────────────────────────────────

#[test]
fn chained_conditionals_match_arithmetic() {
    let pipeline = "add 100 if mod 5 eq 2 else add 10 if mod 2 eq 1 else scale 0";
    for set in independent_sets() {
        let expected: DiceTuple = set
            .iter()
            .map(|&v| {
                if modulo(v, 5) == 2 {
                    v + 100
                } else if modulo(v, 2) == 1 {
                    v + 10
                } else {
                    0
                }
            })
            .collect();
        assert_eq!(apply(pipeline, &set), expected);
    }
}

#[test]
fn bracketed_branches_match_arithmetic() {
    let pipeline =
        "[ add 2 scale 2 ] if mod 3 eq 1 else [ scale -1 add -1 ] if mod 3 eq 2 else exp 3";
    for set in independent_sets() {
        let expected: DiceTuple = set
            .iter()
            .map(|&v| match modulo(v, 3) {
                1 => (v + 2) * 2,
                2 => -v - 1,
                _ => v.pow(3),
            })
            .collect();
        assert_eq!(apply(pipeline, &set), expected);
    }
}

#[test]
fn positional_parameters_match_arithmetic() {
    let add1 = [9, 11, 13, 17, 23, 29];
    let mod1 = [2, 3, 4, 5, 6, 7];
    let eq1 = [1, 2, 3, 4, 3, 2];
    let add2 = [-4, -1, -3, -2, -12, -15];
    let mod2 = [3, 5, 7, 9, 11, 13];
    let eq2 = [2, 3, 4, 5, 6, 7];
    let scale3 = [0, 1, 2, 3, 4, 5];
    let pipeline = format!(
        "add {} if mod {} eq {} else add {} if mod {} eq {} else scale {}",
        words(&add1),
        words(&mod1),
        words(&eq1),
        words(&add2),
        words(&mod2),
        words(&eq2),
        words(&scale3)
    );
    let op = parse_pipeline(&[pipeline.as_str()], &Registry::new(), ParseOptions::default()).unwrap();
    let mut evaluator = Evaluator::new(&op);
    for set in dependent_sets() {
        let expected: DiceTuple = set
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                if modulo(v, mod1[i]) == eq1[i] {
                    v + add1[i]
                } else if modulo(v, mod2[i]) == eq2[i] {
                    v + add2[i]
                } else {
                    v * scale3[i]
                }
            })
            .collect();
        assert_eq!(evaluator.apply(&set).unwrap(), expected, "input {set:?}");
    }
}

#[test]
fn slice_apply_drops_trailing_partial_chunk() {
    assert_eq!(apply("slice-apply 2 sum", &[1, 2, 3, 4, 5]), vec![3, 7]);
    assert_eq!(apply("sum 2", &[1, 2, 3, 4, 5]), vec![3, 7]);
}

#[test]
fn memoized_pipeline_agrees_with_plain_one() {
    let text = "[ add 2 scale 2 ] if mod 3 eq 1 else [ scale -1 add -1 ] then sort select -1 0";
    let registry = Registry::new();
    let plain = parse_pipeline(&[text], &registry, ParseOptions::default()).unwrap();
    let memoized = parse_pipeline(
        &[text],
        &registry,
        ParseOptions {
            memoize: true,
            ..ParseOptions::default()
        },
    )
    .unwrap();
    let pool = DicePool::arithmetic(&[6, 6, 6], None, None, None).unwrap();
    let expected = Distribution::tally(&mut Evaluator::new(&plain), Enumerate::new(&pool)).unwrap();
    let mut evaluator = Evaluator::new(&memoized);
    let actual = Distribution::tally(&mut evaluator, Enumerate::new(&pool)).unwrap();
    assert_eq!(actual, expected);
    assert!(evaluator.memo_stats().hits > 0);
}

// ──────────────────────────────────────────────
// Randomized properties
// ──────────────────────────────────────────────

proptest! {
    #[test]
    fn identity_returns_input(dice in prop::collection::vec(-1000i64..1000, 1..12)) {
        prop_assert_eq!(apply("id", &dice), dice);
    }

    #[test]
    fn select_extremes_of_sorted_input(dice in prop::collection::vec(-1000i64..1000, 1..12)) {
        let min = *dice.iter().min().unwrap();
        let max = *dice.iter().max().unwrap();
        prop_assert_eq!(apply("sort select 0", &dice), vec![min]);
        prop_assert_eq!(apply("sort select -1", &dice), vec![max]);
        prop_assert_eq!(apply("min", &dice), vec![min]);
        prop_assert_eq!(apply("max", &dice), vec![max]);
    }

    #[test]
    fn sort_is_idempotent(dice in prop::collection::vec(-1000i64..1000, 1..12)) {
        let once = apply("sort", &dice);
        prop_assert_eq!(apply("sort sort", &dice), once);
    }

    #[test]
    fn enumeration_total_is_outcome_count(sides in prop::collection::vec(1usize..7, 1..4)) {
        let pool = DicePool::arithmetic(&sides, None, None, None).unwrap();
        let op = parse_pipeline(&["sum"], &Registry::new(), ParseOptions::default()).unwrap();
        let dist = Distribution::tally(&mut Evaluator::new(&op), Enumerate::new(&pool)).unwrap();
        let expected: usize = sides.iter().product();
        prop_assert_eq!(dist.total(), rust_decimal::Decimal::from(expected as u64));
    }
}
