//! Integration Tests for Graph Execution
//!
//! These tests verify that node setup, resolution, dispatch and tracing work
//! together correctly.

use strgraph_core::{Dag, DagError, DispatchError, Handle, OpError};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn snapshot(dag: &Dag) -> Vec<(usize, Option<String>)> {
    dag.values().into_iter().collect()
}

fn expected(pairs: &[(usize, Option<&str>)]) -> Vec<(usize, Option<String>)> {
    pairs
        .iter()
        .map(|&(index, value)| (index, value.map(str::to_owned)))
        .collect()
}

/// The replace/concat example evaluates to the expected result and
/// exposes intermediate values.
#[test]
fn basic_graph() {
    init_tracing();
    let mut dag = Dag::new();
    assert!(dag.values().is_empty());

    dag.set_const(0, "aaaa");
    dag.set_const(1, "aaa");
    dag.set_const(2, "bbb");
    dag.set_calc(3, "replace", &[0, 1, 2], false).unwrap();
    dag.set_const(4, "123");
    dag.set_calc(5, "concat", &[3, 4], true).unwrap();

    assert_eq!(
        snapshot(&dag),
        expected(&[
            (0, Some("aaaa")),
            (1, Some("aaa")),
            (2, Some("bbb")),
            (3, None),
            (4, Some("123")),
            (5, None),
        ])
    );

    let result = dag.execute(false).unwrap();
    assert_eq!(result.as_deref(), Some("bbba123"));
    assert_eq!(
        snapshot(&dag),
        expected(&[
            (0, Some("aaaa")),
            (1, Some("aaa")),
            (2, Some("bbb")),
            (3, Some("bbba")),
            (4, Some("123")),
            (5, Some("bbba123")),
        ])
    );
}

#[test]
fn empty_graph() {
    let mut dag = Dag::new();
    assert_eq!(dag.execute(false).unwrap(), None);
    assert!(dag.values().is_empty());
}

#[test]
fn only_constants() {
    let mut dag = Dag::new();
    dag.set_const(1, "aaa");
    dag.set_const(2, "bbb");
    let before = dag.values();

    assert_eq!(dag.execute(false).unwrap(), None);
    assert_eq!(dag.values(), before);
    assert_eq!(snapshot(&dag), expected(&[(1, Some("aaa")), (2, Some("bbb"))]));
}

#[test]
fn result_designation() {
    let mut dag = Dag::new();
    dag.set_const(1, "aaa");
    dag.set_const(2, "bbb");
    dag.set_calc(3, "concat", &[1, 2], false).unwrap();
    assert_eq!(dag.execute(false).unwrap(), None);

    dag.set_calc(3, "concat", &[1, 2], true).unwrap();
    assert_eq!(dag.execute(false).unwrap().as_deref(), Some("aaabbb"));
}

#[test]
fn native_and_fallback_operations() {
    let mut dag = Dag::new();
    dag.set_const(0, "aBc");
    dag.set_calc(1, "capitalize", &[0], false).unwrap();
    dag.set_calc(2, "lower", &[0], false).unwrap();
    dag.set_calc(3, "upper", &[0], false).unwrap();

    assert_eq!(dag.execute(false).unwrap(), None);
    assert_eq!(
        snapshot(&dag),
        expected(&[
            (0, Some("aBc")),
            (1, Some("Abc")),
            (2, Some("abc")),
            (3, Some("ABC")),
        ])
    );

    dag.set_const(5, "ababab");
    dag.set_const(6, "a");
    dag.set_const(7, "cc");
    dag.set_calc(8, "replace", &[5, 6, 7], false).unwrap();
    assert_eq!(dag.execute(false).unwrap(), None);
    assert_eq!(dag.values()[&8].as_deref(), Some("ccbccbccb"));
}

#[test]
fn fallback_members_with_string_arguments() {
    let mut dag = Dag::new();
    dag.set_const(0, "Straße");
    dag.set_const(1, "{1}: {0}");
    dag.set_const(2, "street");
    dag.set_calc(3, "casefold", &[0], false).unwrap();
    dag.set_calc(4, "format", &[1, 3, 2], true).unwrap();

    assert_eq!(dag.execute(false).unwrap().as_deref(), Some("street: strasse"));
}

#[test]
fn forcing_fallback_gives_the_same_values() {
    let mut dag = Dag::new();
    dag.set_const(0, "hello ");
    dag.set_const(1, "world ");
    dag.set_calc(3, "concat", &[0, 1], false).unwrap();
    dag.set_const(4, "o");
    dag.set_const(5, "ooo");
    dag.set_calc(6, "replace", &[3, 4, 5], false).unwrap();
    dag.set_calc(7, "upper", &[6], false).unwrap();
    dag.set_calc(8, "concat", &[7, 3], false).unwrap();
    dag.set_calc(9, "capitalize", &[8], true).unwrap();

    let native = dag.execute(false).unwrap();
    let native_values = dag.values();
    let fallback = dag.execute(true).unwrap();

    assert_eq!(native.as_deref(), Some("Hellooo wooorld hello world "));
    assert_eq!(native, fallback);
    assert_eq!(native_values, dag.values());
}

#[test]
fn re_execution_recomputes_downstream_nodes() {
    let mut dag = Dag::new();
    dag.set_const(0, "abc");
    dag.set_calc(1, "upper", &[0], false).unwrap();
    dag.set_const(2, "!");
    dag.set_calc(3, "concat", &[1, 2], true).unwrap();
    assert_eq!(dag.execute(false).unwrap().as_deref(), Some("ABC!"));

    dag.set_const(0, "xyz");
    assert_eq!(dag.execute(false).unwrap().as_deref(), Some("XYZ!"));
    assert_eq!(dag.values()[&1].as_deref(), Some("XYZ"));
}

#[test]
fn trace_function_with_loop() {
    let mut dag = Dag::new();

    dag.trace(&["a", "b"], |mut s1: Handle, s2: Handle| {
        for _ in 0..5 {
            s1 += &s2;
        }
        s1.replace("b", "c")
    })
    .unwrap();

    assert_eq!(
        snapshot(&dag),
        expected(&[
            (0, Some("a")),
            (1, Some("b")),
            (2, None),
            (3, None),
            (4, None),
            (5, None),
            (6, None),
            (7, None),
            (8, Some("b")),
            (9, Some("c")),
        ])
    );

    let result = dag.execute(false).unwrap();
    assert_eq!(
        snapshot(&dag),
        expected(&[
            (0, Some("a")),
            (1, Some("b")),
            (2, Some("ab")),
            (3, Some("abb")),
            (4, Some("abbb")),
            (5, Some("abbbb")),
            (6, Some("abbbbb")),
            (7, Some("accccc")),
            (8, Some("b")),
            (9, Some("c")),
        ])
    );
    assert_eq!(result.as_deref(), Some("accccc"));
}

#[test]
fn trace_unrolls_into_a_straight_line_graph() {
    let mut dag = Dag::new();

    dag.trace(&["hello ", "world "], |mut s1: Handle, s2: Handle| {
        for _ in 0..10 {
            s1 += &s2;
        }
        s1.replace("o", "ooo")
    })
    .unwrap();

    let calc_ops: Vec<_> = dag
        .nodes()
        .filter_map(|(_, node)| node.operation().map(str::to_owned))
        .collect();
    assert_eq!(calc_ops.len(), 11);
    assert!(calc_ops[..10].iter().all(|op| op == "concat"));
    assert_eq!(calc_ops[10], "replace");
    // Two inputs plus the two literal operands of `replace`.
    assert_eq!(dag.len() - calc_ops.len(), 4);

    let expected = format!("hellooo {}", "wooorld ".repeat(10));
    let first = dag.execute(false).unwrap();
    let second = dag.execute(false).unwrap();
    assert_eq!(first.as_deref(), Some(expected.as_str()));
    assert_eq!(first, second);
}

#[test]
fn trace_swap() {
    let mut dag = Dag::new();
    dag.trace(&["a", "b"], |s1: Handle, s2: Handle| {
        let (s1, s2) = (s2, s1);
        s1 + s2
    })
    .unwrap();

    assert_eq!(dag.execute(false).unwrap().as_deref(), Some("ba"));
}

#[test]
fn trace_follows_the_branch_taken() {
    let mut dag = Dag::new();
    let input = "short";
    dag.trace(&[input], |s: Handle| {
        if input.len() > 10 {
            s.upper()
        } else {
            s.apply("capitalize")
        }
    })
    .unwrap();

    assert_eq!(dag.len(), 2);
    assert_eq!(dag.node(1).and_then(|node| node.operation()), Some("capitalize"));
    assert_eq!(dag.execute(false).unwrap().as_deref(), Some("Short"));
}

#[test]
fn trace_wrong_return_type_fails() {
    let mut dag = Dag::new();

    let err = dag
        .trace(&["a", "b"], |s1: Handle, s2: Handle| {
            let _s = s1 + s2;
            123
        })
        .unwrap_err();
    assert!(matches!(err, DagError::TraceReturnType { .. }));

    let err = dag
        .trace(&["a", "b"], |s1: Handle, s2: Handle| {
            let _s = s1 + s2;
        })
        .unwrap_err();
    assert!(matches!(err, DagError::TraceReturnType { found: "()" }));
}

#[test]
fn trace_wrong_input_count_fails() {
    let mut dag = Dag::new();
    let err = dag
        .trace(&["a", "b", "c"], |mut s1: Handle, s2: Handle| {
            for _ in 0..5 {
                s1 += &s2;
            }
            s1.replace("b", "c")
        })
        .unwrap_err();

    assert!(matches!(err, DagError::InvalidArgument(_)));
}

#[test]
fn transitive_cycle_fails_without_mutation() {
    let mut dag = Dag::new();
    dag.set_const(0, "aaa");
    dag.set_const(1, "b");
    dag.set_calc(4, "upper", &[1], false).unwrap();
    dag.set_calc(2, "concat", &[0, 1], false).unwrap();
    dag.set_calc(3, "concat", &[0, 2], true).unwrap();
    assert_eq!(dag.execute(false).unwrap().as_deref(), Some("aaaaaab"));

    // A new constant that would change node 4, then a 2 <-> 3 cycle.
    dag.set_const(1, "c");
    dag.set_calc(2, "concat", &[0, 3], false).unwrap();
    let before = dag.values();
    assert_eq!(before[&4].as_deref(), Some("B"));
    assert_eq!(before[&3].as_deref(), Some("aaaaaab"));

    let err = dag.execute(false).unwrap_err();
    match err {
        DagError::GraphHasCycle { mut cycle } => {
            cycle.sort_unstable();
            assert_eq!(cycle, vec![2, 3]);
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
    assert_eq!(dag.values(), before);
}

#[test]
fn self_reference_fails() {
    let mut dag = Dag::new();
    dag.set_const(0, "aaaa");
    dag.set_calc(1, "concat", &[0, 1], false).unwrap();

    assert!(matches!(
        dag.execute(false),
        Err(DagError::GraphHasCycle { ref cycle }) if cycle == &[1]
    ));
}

#[test]
fn undefined_child_fails_before_any_evaluation() {
    let mut dag = Dag::new();
    dag.set_const(0, "aaaa");
    dag.set_calc(3, "upper", &[0], false).unwrap();
    dag.set_calc(1, "concat", &[0, 2], false).unwrap();

    assert!(matches!(dag.execute(false), Err(DagError::UndefinedNode(2))));
    assert_eq!(dag.values()[&3], None);
}

#[test]
fn deleted_child_becomes_undefined() {
    let mut dag = Dag::new();
    dag.set_const(0, "a");
    dag.set_const(1, "b");
    dag.set_calc(2, "concat", &[0, 1], true).unwrap();
    assert_eq!(dag.execute(false).unwrap().as_deref(), Some("ab"));

    dag.delete(1).unwrap();
    assert!(matches!(dag.execute(false), Err(DagError::UndefinedNode(1))));
}

#[test]
fn wrong_arity_fails_the_node() {
    let mut dag = Dag::new();
    dag.set_const(0, "aaaa");
    dag.set_const(1, "aaaa");
    dag.set_calc(2, "replace", &[0, 1], false).unwrap();

    for force_fallback in [false, true] {
        let err = dag.execute(force_fallback).unwrap_err();
        assert!(matches!(
            err,
            DagError::NodeEvaluationFailed {
                index: 2,
                source: DispatchError::OperationFailed {
                    source: OpError::ArityMismatch { found: 2, .. },
                    ..
                }
            }
        ));
    }
}

#[test]
fn supported_native_operations_are_listed() {
    let dag = Dag::new();
    assert_eq!(
        dag.supported_native_operations(),
        vec!["concat", "lower", "upper", "replace"]
    );
    assert_eq!(
        strgraph_core::supported_native_operations(),
        dag.supported_native_operations()
    );
}
