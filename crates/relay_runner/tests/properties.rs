//! Property-based tests for runner composition.
//!
//! Runners are generated as short lists of recording callables. Each
//! property compares the calls an invocation actually makes with the calls
//! predicted from how the runners were put together.


use std::sync::Arc;

use proptest::prelude::*;
use relay_runner::prelude::*;
use test_utils::{CallLog, isolated_runner, logged};

const NAMES: [&str; 6] = ["alpha", "bravo", "charlie", "delta", "echo", "foxtrot"];

/// Builds a runner calling the given names in order.
fn recorder(names: &[usize]) -> Runner {
    let mut runner = isolated_runner();
    for &index in names {
        let name = NAMES[index];
        runner.add(dynamic(name, move |args: Args| {
            args.get::<CallLog>(0)?.record(name);
            Ok(())
        })
        .with_requires(Requires::new().arg(Requirement::of::<CallLog>())));
    }
    runner
}

fn calls(runner: &Runner) -> Vec<&'static str> {
    let log = CallLog::default();
    runner.run_with(logged(&log)).unwrap();
    log.calls()
}

fn predicted(parts: &[&[usize]]) -> Vec<&'static str> {
    parts.iter().flat_map(|part| part.iter().map(|&i| NAMES[i])).collect()
}

fn names() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0..NAMES.len(), 0..5)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn concatenation_is_associative(a in names(), b in names(), c in names()) {
        let (r1, r2, r3) = (recorder(&a), recorder(&b), recorder(&c));

        let left = ((&r1 + &r2).unwrap() + &r3).unwrap();
        let right = (&r1 + &(&r2 + &r3).unwrap()).unwrap();

        let expected = predicted(&[&a, &b, &c]);
        prop_assert_eq!(calls(&left), expected.clone());
        prop_assert_eq!(calls(&right), expected);
    }

    #[test]
    fn clones_are_unaffected_by_later_changes(a in names(), extra in names()) {
        let original = recorder(&a);
        let mut copy = original.clone();
        copy.extend([Step::from(&recorder(&extra))]).unwrap();

        prop_assert_eq!(calls(&original), predicted(&[&a]));
        prop_assert_eq!(calls(&copy), predicted(&[&a, &extra]));
    }

    #[test]
    fn range_copies_split_the_pipeline(a in names(), b in names()) {
        prop_assume!(!b.is_empty());

        let mut tail = recorder(&b);
        tail.at_index(0).unwrap().add_label("split");
        let mut runner = recorder(&a);
        runner.extend([&tail]).unwrap();

        let head = runner.clone_range(None, Some("split")).unwrap();
        let rest = runner.clone_range(Some("split"), None).unwrap();

        prop_assert_eq!(calls(&head), predicted(&[&a]));
        prop_assert_eq!(calls(&rest), predicted(&[&b]));
        prop_assert!(Arc::ptr_eq(runner.declarations(), head.declarations()));
    }
}
