//! Property-based tests for the flow graph.
//!
//! Uses proptest to generate random mutation sequences, then verify that
//! cardinality, direction, membership, and cascading-removal invariants
//! hold after every step.

use flow_core::connector::Direction;
use flow_core::factory::NodeFactory;
use flow_core::graph::FlowGraph;
use flow_core::id::*;
use flow_core::node::{NodeType, Position};
use flow_core::recipe::Recipe;
use flow_core::test_utils::*;
use proptest::prelude::*;
use std::collections::BTreeSet;

// ===========================================================================
// Generators
// ===========================================================================

#[derive(Debug, Clone)]
enum MutOp {
    AddGeneric,
    AddJunction,
    AddRecipe(usize),
    /// Wire an output of one node to an input of another and add the
    /// connection to the graph.
    Link(usize, usize, usize, usize),
    /// Wire without adding; leaves an arena-only connection behind.
    Connect(usize, usize, usize, usize),
    RemoveNode(usize),
    RemoveConnection(usize),
    Clear,
}

fn arb_mutation_sequence(max_ops: usize) -> impl Strategy<Value = Vec<MutOp>> {
    proptest::collection::vec(
        prop_oneof![
            3 => Just(MutOp::AddGeneric),
            2 => Just(MutOp::AddJunction),
            3 => (0..4usize).prop_map(MutOp::AddRecipe),
            6 => (0..50usize, 0..4usize, 0..50usize, 0..4usize)
                .prop_map(|(a, o, b, i)| MutOp::Link(a, o, b, i)),
            2 => (0..50usize, 0..4usize, 0..50usize, 0..4usize)
                .prop_map(|(a, o, b, i)| MutOp::Connect(a, o, b, i)),
            2 => (0..50usize).prop_map(MutOp::RemoveNode),
            2 => (0..50usize).prop_map(MutOp::RemoveConnection),
            1 => Just(MutOp::Clear),
        ],
        1..=max_ops,
    )
}

fn recipe(k: usize) -> Recipe {
    match k {
        0 => smelt_iron(),
        1 => smelt_copper(),
        2 => make_wire(),
        _ => make_circuit(),
    }
}

// ===========================================================================
// Invariant checks
// ===========================================================================

fn member_connections(graph: &FlowGraph) -> BTreeSet<ConnectionId> {
    graph.connections().map(|(id, _)| id).collect()
}

fn check_invariants(graph: &FlowGraph) -> Result<(), TestCaseError> {
    for (node_id, node) in graph.nodes() {
        for connector_id in node.connectors() {
            let connector = graph.connector(connector_id).unwrap();
            prop_assert_eq!(connector.owner(), node_id);
            if !connector.allows_multiple_connections() {
                prop_assert!(
                    connector.connections().len() <= 1,
                    "single-connection connector {} has {} connections",
                    connector.identifier(),
                    connector.connections().len()
                );
            }
            for &c in connector.connections() {
                let connection = graph.connection(c).unwrap();
                prop_assert!(connection.is_enabled());
                let source = graph.connector(connection.source()).unwrap();
                let target = graph.connector(connection.target()).unwrap();
                prop_assert_eq!(source.direction(), Direction::Output);
                prop_assert_eq!(target.direction(), Direction::Input);
            }
        }
    }

    for (id, connection) in graph.connections() {
        for endpoint in [connection.source(), connection.target()] {
            let owner = graph.owner_of(endpoint).unwrap();
            prop_assert!(
                graph.contains_node(owner),
                "member connection {:?} references non-member node {:?}",
                id,
                owner
            );
        }
    }

    prop_assert!(graph.validate());
    Ok(())
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any sequence of mutations keeps the graph structurally valid.
    #[test]
    fn invariants_hold_under_mutation(ops in arb_mutation_sequence(80)) {
        let registry = fixture_registry();
        let mut factory = NodeFactory::new(&registry);
        let mut graph = FlowGraph::new();
        let mut nodes: Vec<NodeId> = Vec::new();

        for op in ops {
            match op {
                MutOp::AddGeneric => {
                    nodes.push(factory.place_node(&mut graph, NodeType::Generic, Position::default()).unwrap());
                }
                MutOp::AddJunction => {
                    nodes.push(factory.place_node(&mut graph, NodeType::Junction, Position::default()).unwrap());
                }
                MutOp::AddRecipe(k) => {
                    nodes.push(placed_recipe_node(&mut graph, recipe(k)));
                }
                MutOp::Link(a, o, b, i) | MutOp::Connect(a, o, b, i) => {
                    if nodes.is_empty() {
                        continue;
                    }
                    let from = graph.node(nodes[a % nodes.len()]).unwrap();
                    let to = graph.node(nodes[b % nodes.len()]).unwrap();
                    if from.outputs().is_empty() || to.inputs().is_empty() {
                        continue;
                    }
                    let source = from.outputs()[o % from.outputs().len()];
                    let target = to.inputs()[i % to.inputs().len()];
                    let allowed = graph.can_connect(source, target);
                    let before_source = graph.connector(source).unwrap().connections().to_vec();
                    let before_target = graph.connector(target).unwrap().connections().to_vec();

                    let result = match op {
                        MutOp::Link(..) => graph.link(source, target, fixed(1.0)),
                        _ => graph.connect(source, target, fixed(1.0)),
                    };
                    prop_assert_eq!(result.is_ok(), allowed);
                    if result.is_err() {
                        // Failed construction leaves both endpoints untouched.
                        prop_assert_eq!(graph.connector(source).unwrap().connections(), &before_source[..]);
                        prop_assert_eq!(graph.connector(target).unwrap().connections(), &before_target[..]);
                    }
                }
                MutOp::RemoveNode(idx) => {
                    if nodes.is_empty() {
                        continue;
                    }
                    let node = nodes.remove(idx % nodes.len());
                    let before = member_connections(&graph);
                    let touching: BTreeSet<ConnectionId> = before
                        .iter()
                        .copied()
                        .filter(|&c| {
                            let conn = graph.connection(c).unwrap();
                            graph.owner_of(conn.source()) == Some(node)
                                || graph.owner_of(conn.target()) == Some(node)
                        })
                        .collect();

                    graph.remove_node(node).unwrap();

                    let after = member_connections(&graph);
                    let expected: BTreeSet<ConnectionId> =
                        before.difference(&touching).copied().collect();
                    prop_assert_eq!(after, expected);
                    prop_assert!(!graph.contains_node(node));
                }
                MutOp::RemoveConnection(idx) => {
                    let members: Vec<ConnectionId> = member_connections(&graph).into_iter().collect();
                    if members.is_empty() {
                        continue;
                    }
                    let id = members[idx % members.len()];
                    let removed = graph.remove_connection(id).unwrap();
                    prop_assert!(removed.is_removed());
                    prop_assert!(graph.remove_connection(id).is_none());
                }
                MutOp::Clear => {
                    graph.clear();
                    nodes.clear();
                    prop_assert_eq!(graph.node_count(), 0);
                    prop_assert_eq!(graph.connection_count(), 0);
                }
            }
            check_invariants(&graph)?;
        }
    }

    /// Recipe throughput is stable across repeated calls and scales
    /// linearly with the multiplier.
    #[test]
    fn throughput_scales_with_multiplier(k in 0..4usize, m in 1u32..20) {
        let mut graph = FlowGraph::new();
        let node = placed_recipe_node(&mut graph, recipe(k));
        let base = graph.throughput(node).unwrap();
        graph.set_multiplier(node, fixed(m as f64)).unwrap();
        let scaled = graph.throughput(node).unwrap();
        let again = graph.throughput(node).unwrap();
        prop_assert_eq!(&scaled, &again);
        prop_assert_eq!(scaled.power(), base.power() * fixed(m as f64));
        for (item, rate) in scaled.outputs_per_minute() {
            let single = base.output_rate(item).unwrap();
            let diff = (rate.to_num::<f64>() - single.to_num::<f64>() * m as f64).abs();
            prop_assert!(diff < 1e-3, "{} rate off by {}", item.identifier(), diff);
        }
    }
}
