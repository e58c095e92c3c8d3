use crate::connector::{Connector, Direction};
use crate::graph::{FlowGraph, GraphError};
use crate::id::NodeId;
use crate::node::{NodeType, Position};
use crate::recipe::Recipe;
use crate::registry::CatalogRegistry;

/// Builds fully wired nodes. Recipes looked up by identifier come from the
/// registry's active catalog.
///
/// `create_*` leaves the node outside the graph; `place_*` also adds it.
#[derive(Debug)]
pub struct NodeFactory<'a> {
    registry: &'a CatalogRegistry,
    next_serial: u64,
}

impl<'a> NodeFactory<'a> {
    pub fn new(registry: &'a CatalogRegistry) -> Self {
        Self {
            registry,
            next_serial: 1,
        }
    }

    pub fn registry(&self) -> &'a CatalogRegistry {
        self.registry
    }

    /// Create a generic or junction node with one input `in` and one
    /// output `out`, both accepting any item.
    ///
    /// Generic connectors take a single connection each; junction
    /// connectors take any number.
    pub fn create_node(
        &mut self,
        graph: &mut FlowGraph,
        node_type: NodeType,
        position: Position,
    ) -> Result<NodeId, GraphError> {
        let (label, allows_multiple) = match node_type {
            NodeType::Generic => ("Generic", false),
            NodeType::Junction => ("Junction", true),
            NodeType::Recipe => {
                return Err(GraphError::InvalidArgument(
                    "recipe nodes are created from a recipe".to_string(),
                ));
            }
        };
        let serial = self.next_serial;
        self.next_serial += 1;

        let node = graph.insert_node(
            format!("node-{serial}"),
            format!("New {label} Node"),
            node_type,
        )?;
        let wired = Connector::new("in", "In", node, Direction::Input, allows_multiple, [])
            .and_then(|c| graph.add_input(node, c))
            .and_then(|_| {
                Connector::new("out", "Out", node, Direction::Output, allows_multiple, [])
            })
            .and_then(|c| graph.add_output(node, c))
            .and_then(|_| graph.set_position(node, position));
        if let Err(err) = wired {
            graph.remove_node(node)?;
            return Err(err);
        }
        Ok(node)
    }

    pub fn create_recipe_node(
        &mut self,
        graph: &mut FlowGraph,
        recipe: &Recipe,
        position: Position,
    ) -> Result<NodeId, GraphError> {
        let node = graph.insert_recipe_node(recipe.clone())?;
        graph.set_position(node, position)?;
        Ok(node)
    }

    /// Create a recipe node for the active catalog's recipe `identifier`.
    pub fn create_recipe_node_by_id(
        &mut self,
        graph: &mut FlowGraph,
        identifier: &str,
        position: Position,
    ) -> Result<NodeId, GraphError> {
        let registry = self.registry;
        let recipe = registry.require_recipe(identifier)?;
        self.create_recipe_node(graph, recipe, position)
    }

    pub fn place_node(
        &mut self,
        graph: &mut FlowGraph,
        node_type: NodeType,
        position: Position,
    ) -> Result<NodeId, GraphError> {
        let node = self.create_node(graph, node_type, position)?;
        graph.add_node(node)?;
        Ok(node)
    }

    pub fn place_recipe_node(
        &mut self,
        graph: &mut FlowGraph,
        recipe: &Recipe,
        position: Position,
    ) -> Result<NodeId, GraphError> {
        let node = self.create_recipe_node(graph, recipe, position)?;
        graph.add_node(node)?;
        Ok(node)
    }

    pub fn place_recipe_node_by_id(
        &mut self,
        graph: &mut FlowGraph,
        identifier: &str,
        position: Position,
    ) -> Result<NodeId, GraphError> {
        let node = self.create_recipe_node_by_id(graph, identifier, position)?;
        graph.add_node(node)?;
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryError;
    use crate::test_utils::*;

    #[test]
    fn generic_node_has_single_connection_ports() {
        let registry = fixture_registry();
        let mut factory = NodeFactory::new(&registry);
        let mut graph = FlowGraph::new();

        let node = factory
            .create_node(&mut graph, NodeType::Generic, Position::new(10.0, 20.0))
            .unwrap();
        let n = graph.node(node).unwrap();
        assert_eq!(n.node_type(), NodeType::Generic);
        assert_eq!(n.position(), Position::new(10.0, 20.0));
        assert!(!graph.contains_node(node));

        let inp = graph.connector(n.inputs()[0]).unwrap();
        assert_eq!(inp.identifier(), "in");
        assert!(!inp.allows_multiple_connections());
        assert!(inp.accepted_items().is_empty());
        let out = graph.connector(n.outputs()[0]).unwrap();
        assert_eq!(out.identifier(), "out");
    }

    #[test]
    fn junction_ports_allow_multiple_connections() {
        let registry = fixture_registry();
        let mut factory = NodeFactory::new(&registry);
        let mut graph = FlowGraph::new();
        let node = factory
            .place_node(&mut graph, NodeType::Junction, Position::default())
            .unwrap();
        assert!(graph.contains_node(node));
        let n = graph.node(node).unwrap();
        assert!(graph.connector(n.inputs()[0]).unwrap().allows_multiple_connections());
        assert!(graph.connector(n.outputs()[0]).unwrap().allows_multiple_connections());
    }

    #[test]
    fn serial_identifiers_are_unique() {
        let registry = fixture_registry();
        let mut factory = NodeFactory::new(&registry);
        let mut graph = FlowGraph::new();
        let a = factory
            .create_node(&mut graph, NodeType::Generic, Position::default())
            .unwrap();
        let b = factory
            .create_node(&mut graph, NodeType::Generic, Position::default())
            .unwrap();
        assert_ne!(
            graph.node(a).unwrap().identifier(),
            graph.node(b).unwrap().identifier()
        );
    }

    #[test]
    fn recipe_type_needs_a_recipe() {
        let registry = fixture_registry();
        let mut factory = NodeFactory::new(&registry);
        let mut graph = FlowGraph::new();
        assert!(matches!(
            factory.create_node(&mut graph, NodeType::Recipe, Position::default()),
            Err(GraphError::InvalidArgument(_))
        ));
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn recipe_node_by_id_uses_active_catalog() {
        let registry = fixture_registry();
        let mut factory = NodeFactory::new(&registry);
        let mut graph = FlowGraph::new();

        let node = factory
            .place_recipe_node_by_id(&mut graph, "iron-smelting", Position::new(1.0, 2.0))
            .unwrap();
        let n = graph.node(node).unwrap();
        assert_eq!(n.node_type(), NodeType::Recipe);
        assert_eq!(n.identifier(), "recipe-iron-smelting");
        assert!(graph.find_connector(node, "input-iron-ore").is_some());

        assert!(matches!(
            factory.create_recipe_node_by_id(&mut graph, "missing", Position::default()),
            Err(GraphError::Registry(RegistryError::NotFound(_)))
        ));
    }
}
