//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::connector::{Connector, Direction};
use crate::fixed::Fixed64;
use crate::graph::FlowGraph;
use crate::id::*;
use crate::item::{Item, ItemStack};
use crate::node::NodeType;
use crate::recipe::{Machine, Recipe};
use crate::registry::{CatalogProvider, CatalogRegistry, CatalogVersion};
use std::time::Duration;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Items
// ===========================================================================

fn item(identifier: &str, display_name: &str) -> Item {
    Item::new(identifier, display_name).unwrap()
}

pub fn iron_ore() -> Item {
    item("iron-ore", "Iron Ore")
}
pub fn iron_plate() -> Item {
    item("iron-plate", "Iron Plate")
}
pub fn copper_ore() -> Item {
    item("copper-ore", "Copper Ore")
}
pub fn copper_plate() -> Item {
    item("copper-plate", "Copper Plate")
}
pub fn copper_wire() -> Item {
    item("copper-wire", "Copper Wire")
}
pub fn circuit() -> Item {
    item("electronic-circuit", "Electronic Circuit")
}

pub fn all_items() -> Vec<Item> {
    vec![
        iron_ore(),
        iron_plate(),
        copper_ore(),
        copper_plate(),
        copper_wire(),
        circuit(),
    ]
}

// ===========================================================================
// Machines
// ===========================================================================

pub fn furnace() -> Machine {
    Machine::new("stone-furnace", "Stone Furnace", fixed(5.0)).unwrap()
}

pub fn assembler() -> Machine {
    Machine::new("assembler", "Assembling Machine", fixed(20.0)).unwrap()
}

// ===========================================================================
// Recipes
// ===========================================================================

/// Build a recipe from `(item, amount)` pairs.
pub fn make_recipe(
    identifier: &str,
    display_name: &str,
    inputs: &[(Item, f64)],
    outputs: &[(Item, f64)],
    machine: Machine,
    secs: f64,
) -> Recipe {
    let stacks = |side: &[(Item, f64)]| -> Vec<ItemStack> {
        side.iter()
            .map(|(item, amount)| ItemStack::new(item.clone(), fixed(*amount)).unwrap())
            .collect()
    };
    Recipe::new(
        identifier,
        display_name,
        stacks(inputs),
        stacks(outputs),
        machine,
        Duration::from_secs_f64(secs),
    )
    .unwrap()
}

/// 1 iron ore -> 1 iron plate in 3.5s.
pub fn smelt_iron() -> Recipe {
    make_recipe(
        "iron-smelting",
        "Iron Smelting",
        &[(iron_ore(), 1.0)],
        &[(iron_plate(), 1.0)],
        furnace(),
        3.5,
    )
}

/// 1 copper ore -> 1 copper plate in 3.5s.
pub fn smelt_copper() -> Recipe {
    make_recipe(
        "copper-smelting",
        "Copper Smelting",
        &[(copper_ore(), 1.0)],
        &[(copper_plate(), 1.0)],
        furnace(),
        3.5,
    )
}

/// 1 copper plate -> 2 copper wire in 0.5s.
pub fn make_wire() -> Recipe {
    make_recipe(
        "copper-wire",
        "Copper Wire",
        &[(copper_plate(), 1.0)],
        &[(copper_wire(), 2.0)],
        assembler(),
        0.5,
    )
}

/// 1 iron plate + 3 copper wire -> 1 circuit in 1s.
pub fn make_circuit() -> Recipe {
    make_recipe(
        "electronic-circuit",
        "Electronic Circuit",
        &[(iron_plate(), 1.0), (copper_wire(), 3.0)],
        &[(circuit(), 1.0)],
        assembler(),
        1.0,
    )
}

// ===========================================================================
// Catalog provider
// ===========================================================================

/// In-memory catalog holding every fixture above.
#[derive(Debug, Clone)]
pub struct FixtureProvider {
    name: String,
    items: Vec<Item>,
    machines: Vec<Machine>,
    recipes: Vec<Recipe>,
}

impl FixtureProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            items: all_items(),
            machines: vec![furnace(), assembler()],
            recipes: vec![smelt_iron(), smelt_copper(), make_wire(), make_circuit()],
        }
    }
}

impl CatalogProvider for FixtureProvider {
    fn game_name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> CatalogVersion {
        CatalogVersion::new(1, 0, 0)
    }

    fn items(&self) -> &[Item] {
        &self.items
    }

    fn machines(&self) -> &[Machine] {
        &self.machines
    }

    fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }
}

/// A registry with one active fixture catalog.
pub fn fixture_registry() -> CatalogRegistry {
    let mut registry = CatalogRegistry::new();
    registry.register(FixtureProvider::new("Fixture Factory")).unwrap();
    registry
}

// ===========================================================================
// Graph helpers
// ===========================================================================

/// A generic node with single-connection, unrestricted `in` and `out`
/// connectors. Not added to the graph.
pub fn generic_node(graph: &mut FlowGraph, identifier: &str) -> NodeId {
    let node = graph
        .insert_node(identifier, identifier, NodeType::Generic)
        .unwrap();
    let inp = Connector::new("in", "In", node, Direction::Input, false, []).unwrap();
    let out = Connector::new("out", "Out", node, Direction::Output, false, []).unwrap();
    graph.add_input(node, inp).unwrap();
    graph.add_output(node, out).unwrap();
    node
}

pub fn two_generic_nodes(graph: &mut FlowGraph) -> (NodeId, NodeId) {
    (generic_node(graph, "a"), generic_node(graph, "b"))
}

/// A recipe node that is already a member of the graph.
pub fn placed_recipe_node(graph: &mut FlowGraph, recipe: Recipe) -> NodeId {
    let node = graph.insert_recipe_node(recipe).unwrap();
    graph.add_node(node).unwrap();
    node
}

pub fn input_of(graph: &FlowGraph, node: NodeId, identifier: &str) -> ConnectorId {
    let id = graph
        .find_connector(node, identifier)
        .unwrap_or_else(|| panic!("node has no connector {identifier}"));
    assert!(graph.connector(id).unwrap().is_input(), "{identifier} is not an input");
    id
}

pub fn output_of(graph: &FlowGraph, node: NodeId, identifier: &str) -> ConnectorId {
    let id = graph
        .find_connector(node, identifier)
        .unwrap_or_else(|| panic!("node has no connector {identifier}"));
    assert!(!graph.connector(id).unwrap().is_input(), "{identifier} is not an output");
    id
}
