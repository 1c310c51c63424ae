//! Property-based tests for graph evaluation invariants.
//!
//! These exercise the evaluator over random graph shapes and node
//! parameters, checking properties that must hold for every patch.

use gatesynth_core::nodes::{Beat, ChainStart, Filter, LinearDecay};
use gatesynth_core::{EvalEnv, GraphError, InputVector, NodeId, NodeKind, Parameter, SignalGraph};
use proptest::prelude::*;

const SR: f64 = 19200.0;

fn gain(g: f64) -> NodeKind {
    NodeKind::Filter(Filter::new(Parameter::constant(g)))
}

fn run(graph: &mut SignalGraph, root: NodeId, steps: usize) {
    let inputs = InputVector::new();
    let env = EvalEnv::new(&[], &inputs);
    for _ in 0..steps {
        graph.evaluate(root, &env);
    }
}

/// Random DAG: node 0 is the root, every later node gets at least one edge
/// from an earlier node, plus the extra forward edges in `extra`.
fn random_dag(n: usize, parents: &[usize], extra: &[(usize, usize)]) -> (SignalGraph, Vec<NodeId>) {
    let mut graph = SignalGraph::new(SR);
    let mut ids = vec![graph.add_node(NodeKind::ChainStart(ChainStart::new(Parameter::constant(0.0))))];
    for _ in 1..n {
        ids.push(graph.add_node(gain(1.0)));
    }
    for j in 1..n {
        let parent = parents[j - 1] % j;
        graph.connect(ids[parent], ids[j]).unwrap();
    }
    for &(a, b) in extra {
        let (a, b) = (a % n, b % n);
        if a < b && !graph.has_edge(ids[a], ids[b]) {
            graph.connect(ids[a], ids[b]).unwrap();
        }
    }
    (graph, ids)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// A shaper with N upstream nodes outputs their arithmetic mean.
    #[test]
    fn shaper_input_is_upstream_mean(
        offsets in prop::collection::vec(-10.0f64..10.0, 1..12),
    ) {
        let mut graph = SignalGraph::new(SR);
        let root = graph.add_node(NodeKind::ChainStart(ChainStart::new(Parameter::constant(0.0))));
        let term = graph.add_node(NodeKind::termination());
        for &offset in &offsets {
            // Gain 0 makes the filter output its offset regardless of input.
            let node = graph.add_node(NodeKind::Filter(
                Filter::new(Parameter::constant(0.0)).with_offset(offset),
            ));
            graph.connect(root, node).unwrap();
            graph.connect(node, term).unwrap();
        }
        run(&mut graph, root, 1);

        let expected = offsets.iter().sum::<f64>() / offsets.len() as f64;
        prop_assert!((graph.value(term) - expected).abs() < 1e-9);
    }

    /// Every reachable node steps exactly once per evaluation, however
    /// many paths lead to it.
    #[test]
    fn every_node_steps_once_per_sample(
        n in 2usize..24,
        parents in prop::collection::vec(any::<usize>(), 23),
        extra in prop::collection::vec((any::<usize>(), any::<usize>()), 0..40),
        steps in 1usize..20,
    ) {
        let (mut graph, ids) = random_dag(n, &parents, &extra);
        run(&mut graph, ids[0], steps);
        for &id in &ids {
            prop_assert_eq!(graph.age(id), steps as u64);
        }
        // Unit gains on an age ramp: every node carries the root's value.
        for &id in &ids {
            prop_assert!((graph.value(id) - steps as f64).abs() < 1e-9);
        }
    }

    /// A back edge into a random DAG is always rejected and leaves the
    /// graph unchanged.
    #[test]
    fn back_edges_are_rejected(
        n in 2usize..16,
        parents in prop::collection::vec(any::<usize>(), 15),
        pick in any::<usize>(),
    ) {
        let (mut graph, ids) = random_dag(n, &parents, &[]);
        // Every node is reachable from the root, so an edge into the root
        // closes a cycle.
        let from = ids[1 + pick % (n - 1)];
        let err = graph.connect(from, ids[0]).unwrap_err();
        let is_cycle = matches!(err, GraphError::CycleDetected { .. });
        prop_assert!(is_cycle);
        prop_assert!(!graph.has_edge(from, ids[0]));
        prop_assert!(graph.upstream(ids[0]).is_empty());
    }

    /// A beat clock is high exactly when `age % period <= beat_length`.
    #[test]
    fn beat_follows_period(
        beat_length in 1u32..200,
        gap_length in 1u32..200,
        steps in 1usize..1200,
    ) {
        let mut graph = SignalGraph::new(SR);
        let beat = graph.add_node(NodeKind::Beat(
            Beat::new(f64::from(beat_length), f64::from(gap_length)).with_translate(-1.0),
        ));
        let period = u64::from(beat_length + gap_length);
        let inputs = InputVector::new();
        let env = EvalEnv::new(&[], &inputs);
        for age in 1..=steps as u64 {
            graph.evaluate(beat, &env);
            let high = age % period <= u64::from(beat_length);
            prop_assert_eq!(graph.value(beat), if high { 1.0 } else { -1.0 });
        }
    }

    /// The linear decay factor starts at one, never rises and reaches zero
    /// at its duration.
    #[test]
    fn decay_factor_is_monotone(
        duration in 1.0f64..50_000.0,
        a in 0u64..60_000,
        b in 0u64..60_000,
    ) {
        let decay = LinearDecay::new(duration);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert_eq!(decay.factor(0), 1.0);
        prop_assert!(decay.factor(hi) <= decay.factor(lo));
        prop_assert!((0.0..=1.0).contains(&decay.factor(lo)));
        prop_assert_eq!(decay.factor(duration.ceil() as u64), 0.0);
    }
}
