use crate::connection::Connection;
use crate::connector::{Connector, Direction, Incompatibility};
use crate::fixed::Fixed64;
use crate::id::*;
use crate::item::CatalogError;
use crate::node::{Node, NodeKind, NodeType, Position, RecipeNode};
use crate::recipe::Recipe;
use crate::registry::RegistryError;
use crate::throughput::Throughput;
use slotmap::{SecondaryMap, SlotMap};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during graph operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("incompatible endpoints: {reason}")]
    IncompatibleEndpoints { reason: String },
    #[error("connector {connector} must be used as the {} end of a connection", role(.expected))]
    DirectionMismatch {
        connector: String,
        expected: Direction,
    },
    #[error("connector {connector} already has a connection")]
    CapacityExceeded { connector: String },
    #[error("node already in graph: {0:?}")]
    DuplicateNode(NodeId),
    #[error("connection already in graph: {0:?}")]
    DuplicateConnection(ConnectionId),
    #[error("connection {connection:?} references node {node:?} which is not in the graph")]
    DanglingReference {
        connection: ConnectionId,
        node: NodeId,
    },
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),
    #[error("connector not found: {0:?}")]
    ConnectorNotFound(ConnectorId),
    #[error("connection not found: {0:?}")]
    ConnectionNotFound(ConnectionId),
    #[error("node {0:?} is not a recipe node")]
    NotARecipeNode(NodeId),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

fn role(direction: &Direction) -> &'static str {
    match direction {
        Direction::Output => "source",
        Direction::Input => "target",
    }
}

// ---------------------------------------------------------------------------
// FlowGraph
// ---------------------------------------------------------------------------

/// Arena of nodes, connectors, and connections plus the set of nodes and
/// connections that are currently members of the graph.
///
/// Nodes and connections are created in the arena first (`insert_*`,
/// [`connect`](Self::connect)) and join the graph with
/// [`add_node`](Self::add_node) / [`add_connection`](Self::add_connection).
/// A member connection always has both endpoint nodes as members.
#[derive(Debug, Default)]
pub struct FlowGraph {
    nodes: SlotMap<NodeId, Node>,
    connectors: SlotMap<ConnectorId, Connector>,
    connections: SlotMap<ConnectionId, Connection>,
    node_members: SecondaryMap<NodeId, ()>,
    connection_members: SecondaryMap<ConnectionId, ()>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Node construction
    // -----------------------------------------------------------------------

    /// Create a generic or junction node with no connectors. The node is
    /// not yet a member of the graph.
    ///
    /// Recipe nodes carry a recipe; use
    /// [`insert_recipe_node`](Self::insert_recipe_node) for those.
    pub fn insert_node(
        &mut self,
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        node_type: NodeType,
    ) -> Result<NodeId, GraphError> {
        let kind = match node_type {
            NodeType::Generic => NodeKind::Generic,
            NodeType::Junction => NodeKind::Junction,
            NodeType::Recipe => {
                return Err(GraphError::InvalidArgument(
                    "recipe nodes must be created from a recipe".to_string(),
                ));
            }
        };
        let mut node = Node::new(identifier, display_name, kind)?;
        let id = self.nodes.insert_with_key(|key| {
            node.id = key;
            node
        });
        debug!(node = ?id, "node created");
        Ok(id)
    }

    /// Create a recipe node with one connector per recipe input and output.
    ///
    /// Each connector accepts exactly its item and allows multiple
    /// connections. Connector identifiers are `input-<item>` and
    /// `output-<item>`; the node identifier is `recipe-<recipe>`.
    pub fn insert_recipe_node(&mut self, recipe: Recipe) -> Result<NodeId, GraphError> {
        let identifier = RecipeNode::node_identifier(&recipe);
        let display_name = recipe.display_name().to_string();
        let inputs: Vec<_> = recipe.inputs().iter().map(|s| s.item().clone()).collect();
        let outputs: Vec<_> = recipe.outputs().iter().map(|s| s.item().clone()).collect();

        let mut node = Node::new(
            identifier,
            display_name,
            NodeKind::Recipe(RecipeNode::new(recipe)),
        )?;
        let id = self.nodes.insert_with_key(|key| {
            node.id = key;
            node
        });

        let wire = |graph: &mut Self| -> Result<(), GraphError> {
            for item in inputs {
                let connector = Connector::new(
                    RecipeNode::input_identifier(&item),
                    item.display_name().to_string(),
                    id,
                    Direction::Input,
                    true,
                    [item],
                )?;
                graph.add_input(id, connector)?;
            }
            for item in outputs {
                let connector = Connector::new(
                    RecipeNode::output_identifier(&item),
                    item.display_name().to_string(),
                    id,
                    Direction::Output,
                    true,
                    [item],
                )?;
                graph.add_output(id, connector)?;
            }
            Ok(())
        };
        if let Err(err) = wire(self) {
            self.discard_node(id);
            return Err(err);
        }

        debug!(node = ?id, "recipe node created");
        Ok(id)
    }

    /// Attach an input connector to `node`.
    pub fn add_input(
        &mut self,
        node: NodeId,
        connector: Connector,
    ) -> Result<ConnectorId, GraphError> {
        self.attach(node, connector, Direction::Input)
    }

    /// Attach an output connector to `node`.
    pub fn add_output(
        &mut self,
        node: NodeId,
        connector: Connector,
    ) -> Result<ConnectorId, GraphError> {
        self.attach(node, connector, Direction::Output)
    }

    fn attach(
        &mut self,
        node: NodeId,
        mut connector: Connector,
        direction: Direction,
    ) -> Result<ConnectorId, GraphError> {
        let owner = self.nodes.get(node).ok_or(GraphError::NodeNotFound(node))?;
        if connector.direction() != direction {
            return Err(GraphError::DirectionMismatch {
                connector: connector.identifier().to_string(),
                expected: direction,
            });
        }
        if connector.owner() != node {
            return Err(GraphError::InvalidArgument(format!(
                "connector {} belongs to another node",
                connector.identifier()
            )));
        }
        if owner
            .connectors()
            .any(|c| self.connectors[c].identifier() == connector.identifier())
        {
            return Err(GraphError::InvalidArgument(format!(
                "node {} already has a connector named {}",
                owner.identifier(),
                connector.identifier()
            )));
        }

        connector.connections.clear();
        let id = self.connectors.insert_with_key(|key| {
            connector.id = key;
            connector
        });
        let owner = &mut self.nodes[node];
        match direction {
            Direction::Input => owner.inputs.push(id),
            Direction::Output => owner.outputs.push(id),
        }
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Node state
    // -----------------------------------------------------------------------

    pub fn set_position(&mut self, node: NodeId, position: Position) -> Result<(), GraphError> {
        self.nodes
            .get_mut(node)
            .ok_or(GraphError::NodeNotFound(node))?
            .set_position(position);
        Ok(())
    }

    /// Set the machine count of a recipe node. Must be positive.
    pub fn set_multiplier(&mut self, node: NodeId, multiplier: Fixed64) -> Result<(), GraphError> {
        self.nodes
            .get_mut(node)
            .ok_or(GraphError::NodeNotFound(node))?
            .kind_mut()
            .as_recipe_mut()
            .ok_or(GraphError::NotARecipeNode(node))?
            .set_multiplier(multiplier)
    }

    /// Throughput of a recipe node at its current multiplier.
    pub fn throughput(&self, node: NodeId) -> Result<Throughput, GraphError> {
        self.nodes
            .get(node)
            .ok_or(GraphError::NodeNotFound(node))?
            .kind()
            .as_recipe()
            .ok_or(GraphError::NotARecipeNode(node))?
            .throughput()
    }

    // -----------------------------------------------------------------------
    // Connections
    // -----------------------------------------------------------------------

    /// Returns true if both connectors exist and may be joined.
    pub fn can_connect(&self, a: ConnectorId, b: ConnectorId) -> bool {
        match (self.connectors.get(a), self.connectors.get(b)) {
            (Some(a), Some(b)) => a.can_connect_to(b),
            _ => false,
        }
    }

    /// Create a connection from the output connector `source` to the input
    /// connector `target` and register it on both.
    ///
    /// Nothing is registered unless every check passes. If registration on
    /// either endpoint fails, both endpoints are restored and the connection
    /// is discarded. The new connection is not yet a member of the graph.
    pub fn connect(
        &mut self,
        source: ConnectorId,
        target: ConnectorId,
        flow_rate: Fixed64,
    ) -> Result<ConnectionId, GraphError> {
        if flow_rate <= Fixed64::ZERO {
            return Err(GraphError::InvalidArgument(format!(
                "flow rate must be positive, got {flow_rate}"
            )));
        }
        let src = self
            .connectors
            .get(source)
            .ok_or(GraphError::ConnectorNotFound(source))?;
        let dst = self
            .connectors
            .get(target)
            .ok_or(GraphError::ConnectorNotFound(target))?;
        if src.direction() != Direction::Output {
            return Err(GraphError::IncompatibleEndpoints {
                reason: format!("source {} is not an output connector", src.identifier()),
            });
        }
        if dst.direction() != Direction::Input {
            return Err(GraphError::IncompatibleEndpoints {
                reason: format!("target {} is not an input connector", dst.identifier()),
            });
        }
        match src.compatibility(dst) {
            Ok(()) => {}
            Err(Incompatibility::AtCapacity) => {
                let full = if src.is_at_capacity() { src } else { dst };
                return Err(GraphError::CapacityExceeded {
                    connector: full.identifier().to_string(),
                });
            }
            Err(reason) => {
                return Err(GraphError::IncompatibleEndpoints {
                    reason: reason.to_string(),
                });
            }
        }
        self.insert_registered(source, target, flow_rate)
    }

    /// Insert a connection and register it on both endpoints, undoing any
    /// partial registration on failure. Endpoint checks are the caller's job.
    pub(crate) fn insert_registered(
        &mut self,
        source: ConnectorId,
        target: ConnectorId,
        flow_rate: Fixed64,
    ) -> Result<ConnectionId, GraphError> {
        let id = self
            .connections
            .insert_with_key(|key| Connection::new(key, source, target, flow_rate));
        if let Err(err) = self.register(id) {
            warn!(connection = ?id, error = %err, "connection registration rolled back");
            self.unregister(id);
            self.connections.remove(id);
            return Err(err);
        }
        if let Some(connection) = self.connections.get_mut(id) {
            connection.activate();
        }
        debug!(connection = ?id, ?source, ?target, "connection created");
        Ok(id)
    }

    fn register(&mut self, id: ConnectionId) -> Result<(), GraphError> {
        let connection = self
            .connections
            .get(id)
            .ok_or(GraphError::ConnectionNotFound(id))?;
        for endpoint in [connection.source(), connection.target()] {
            self.connectors
                .get_mut(endpoint)
                .ok_or(GraphError::ConnectorNotFound(endpoint))?
                .add_connection(id, connection)?;
        }
        Ok(())
    }

    fn unregister(&mut self, id: ConnectionId) {
        let Some(connection) = self.connections.get(id) else {
            return;
        };
        for endpoint in [connection.source(), connection.target()] {
            if let Some(connector) = self.connectors.get_mut(endpoint) {
                connector.remove_connection(id);
            }
        }
    }

    /// Detach a connection from both connectors and disable it. The
    /// connection stays in the arena in the `Removed` state. Repeated calls
    /// are no-ops.
    pub fn detach_connection(&mut self, id: ConnectionId) -> Result<(), GraphError> {
        if !self.connections.contains_key(id) {
            return Err(GraphError::ConnectionNotFound(id));
        }
        self.unregister(id);
        self.connections[id].mark_removed();
        Ok(())
    }

    /// Create a connection and add it to the graph in one step. If adding
    /// fails, the connection is removed again.
    pub fn link(
        &mut self,
        source: ConnectorId,
        target: ConnectorId,
        flow_rate: Fixed64,
    ) -> Result<ConnectionId, GraphError> {
        let id = self.connect(source, target, flow_rate)?;
        if let Err(err) = self.add_connection(id) {
            self.remove_connection(id);
            return Err(err);
        }
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// A connection is valid when its flow rate is positive, its source is
    /// an output, its target is an input, and the endpoints are compatible.
    /// The connection's own occupancy of its endpoints does not count
    /// against their capacity.
    pub fn validate_connection(&self, id: ConnectionId) -> bool {
        let Some(connection) = self.connections.get(id) else {
            return false;
        };
        let (Some(src), Some(dst)) = (
            self.connectors.get(connection.source()),
            self.connectors.get(connection.target()),
        ) else {
            return false;
        };
        connection.flow_rate() > Fixed64::ZERO
            && src.direction() == Direction::Output
            && dst.direction() == Direction::Input
            && src.compatibility_ignoring(dst, Some(id)).is_ok()
    }

    /// Re-check a connector's cardinality and every attached connection.
    pub fn validate_connector(&self, id: ConnectorId) -> bool {
        let Some(connector) = self.connectors.get(id) else {
            return false;
        };
        if !connector.allows_multiple_connections() && connector.connections().len() > 1 {
            return false;
        }
        connector.connections().iter().all(|&c| {
            let Some(connection) = self.connections.get(c) else {
                return false;
            };
            let endpoint = match connector.direction() {
                Direction::Output => connection.source(),
                Direction::Input => connection.target(),
            };
            endpoint == id && self.validate_connection(c)
        })
    }

    /// True when every connector of `node` validates.
    pub fn validate_node(&self, node: NodeId) -> bool {
        self.nodes
            .get(node)
            .is_some_and(|n| n.connectors().all(|c| self.validate_connector(c)))
    }

    /// True when every member node validates and every member connection
    /// has both endpoint nodes as members.
    pub fn validate(&self) -> bool {
        self.node_members.keys().all(|n| self.validate_node(n))
            && self.connection_members.keys().all(|c| {
                self.connections.get(c).is_some_and(|conn| {
                    self.endpoint_nodes(conn)
                        .into_iter()
                        .all(|n| n.is_some_and(|n| self.node_members.contains_key(n)))
                })
            })
    }

    fn endpoint_nodes(&self, connection: &Connection) -> [Option<NodeId>; 2] {
        [connection.source(), connection.target()].map(|c| self.connectors.get(c).map(Connector::owner))
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Add a created node to the graph.
    pub fn add_node(&mut self, node: NodeId) -> Result<(), GraphError> {
        if !self.nodes.contains_key(node) {
            return Err(GraphError::NodeNotFound(node));
        }
        if self.node_members.contains_key(node) {
            return Err(GraphError::DuplicateNode(node));
        }
        self.node_members.insert(node, ());
        debug!(?node, "node added");
        Ok(())
    }

    /// Remove a node and everything attached to it.
    ///
    /// Every connection touching one of the node's connectors is removed
    /// first, then the connectors, then the node. Returns the removed
    /// connections.
    pub fn remove_node(&mut self, node: NodeId) -> Result<Vec<ConnectionId>, GraphError> {
        let connectors: Vec<ConnectorId> = self
            .nodes
            .get(node)
            .ok_or(GraphError::NodeNotFound(node))?
            .connectors()
            .collect();

        let touching: Vec<ConnectionId> = self
            .connections
            .iter()
            .filter(|(_, c)| connectors.iter().any(|&k| c.touches(k)))
            .map(|(id, _)| id)
            .collect();
        for &connection in &touching {
            self.remove_connection(connection);
        }

        self.discard_node(node);
        debug!(?node, removed_connections = touching.len(), "node removed");
        Ok(touching)
    }

    fn discard_node(&mut self, node: NodeId) {
        if let Some(removed) = self.nodes.remove(node) {
            for connector in removed.connectors() {
                self.connectors.remove(connector);
            }
        }
        self.node_members.remove(node);
    }

    /// Add a created connection to the graph. Both endpoint nodes must
    /// already be members.
    pub fn add_connection(&mut self, connection: ConnectionId) -> Result<(), GraphError> {
        let conn = self
            .connections
            .get(connection)
            .ok_or(GraphError::ConnectionNotFound(connection))?;
        if conn.is_removed() {
            return Err(GraphError::InvalidArgument(format!(
                "connection {connection:?} has been removed"
            )));
        }
        if self.connection_members.contains_key(connection) {
            return Err(GraphError::DuplicateConnection(connection));
        }
        for endpoint in [conn.source(), conn.target()] {
            let node = self
                .connectors
                .get(endpoint)
                .ok_or(GraphError::ConnectorNotFound(endpoint))?
                .owner();
            if !self.node_members.contains_key(node) {
                return Err(GraphError::DanglingReference { connection, node });
            }
        }
        self.connection_members.insert(connection, ());
        debug!(?connection, "connection added");
        Ok(())
    }

    /// Detach a connection, drop it from the graph, and discard it.
    /// Returns `None` if it was already gone.
    pub fn remove_connection(&mut self, connection: ConnectionId) -> Option<Connection> {
        if self.detach_connection(connection).is_err() {
            return None;
        }
        self.connection_members.remove(connection);
        let removed = self.connections.remove(connection);
        debug!(?connection, "connection removed");
        removed
    }

    /// Remove every connection, then every node.
    pub fn clear(&mut self) {
        let connections: Vec<ConnectionId> = self.connections.keys().collect();
        for connection in connections {
            self.remove_connection(connection);
        }
        self.connection_members.clear();
        self.node_members.clear();
        self.connectors.clear();
        self.nodes.clear();
        debug!("graph cleared");
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Look up a node in the arena, member or not.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn connector(&self, id: ConnectorId) -> Option<&Connector> {
        self.connectors.get(id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    /// Member nodes.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.node_members
            .keys()
            .filter_map(|id| self.nodes.get(id).map(|n| (id, n)))
    }

    /// Member connections.
    pub fn connections(&self) -> impl Iterator<Item = (ConnectionId, &Connection)> + '_ {
        self.connection_members
            .keys()
            .filter_map(|id| self.connections.get(id).map(|c| (id, c)))
    }

    pub fn node_count(&self) -> usize {
        self.node_members.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connection_members.len()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node_members.contains_key(id)
    }

    pub fn contains_connection(&self, id: ConnectionId) -> bool {
        self.connection_members.contains_key(id)
    }

    /// The node owning `connector`.
    pub fn owner_of(&self, connector: ConnectorId) -> Option<NodeId> {
        self.connectors.get(connector).map(Connector::owner)
    }

    /// Connections attached to any connector of `node`, each listed once.
    pub fn connections_of(&self, node: NodeId) -> Vec<ConnectionId> {
        let Some(node) = self.nodes.get(node) else {
            return Vec::new();
        };
        let mut result: Vec<ConnectionId> = Vec::new();
        for connector in node.connectors() {
            for &c in self.connectors[connector].connections() {
                if !result.contains(&c) {
                    result.push(c);
                }
            }
        }
        result
    }

    /// Find a connector of `node` by identifier.
    pub fn find_connector(&self, node: NodeId, identifier: &str) -> Option<ConnectorId> {
        self.nodes
            .get(node)?
            .connectors()
            .find(|&c| self.connectors[c].identifier() == identifier)
    }

    /// Sum of the throughput of every member recipe node.
    pub fn total_throughput(&self) -> Result<Throughput, GraphError> {
        let mut total = Throughput::default();
        for (_, node) in self.nodes() {
            if let Some(recipe) = node.kind().as_recipe() {
                total = total.combine(&recipe.throughput()?)?;
            }
        }
        Ok(total)
    }
}
