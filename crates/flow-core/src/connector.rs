use crate::connection::Connection;
use crate::graph::GraphError;
use crate::id::{ConnectionId, ConnectorId, NodeId};
use crate::item::{Item, require_text};
use serde::{Deserialize, Serialize};
use slotmap::Key;
use std::fmt;

// ---------------------------------------------------------------------------
// Direction and compatibility
// ---------------------------------------------------------------------------

/// Whether material enters (`Input`) or leaves (`Output`) a node through a
/// connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Input => Direction::Output,
            Direction::Output => Direction::Input,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

/// Why two connectors cannot be joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incompatibility {
    /// A connector cannot connect to itself.
    SameConnector,
    /// Both connectors are inputs, or both are outputs.
    SameDirection,
    /// One side disallows multiple connections and already has one.
    AtCapacity,
    /// Both sides restrict items and share none.
    NoCommonItems,
}

impl fmt::Display for Incompatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Incompatibility::SameConnector => "a connector cannot connect to itself",
            Incompatibility::SameDirection => "connectors have the same direction",
            Incompatibility::AtCapacity => "a connector is already at capacity",
            Incompatibility::NoCommonItems => "connectors accept no common item",
        };
        f.write_str(msg)
    }
}

// ---------------------------------------------------------------------------
// Connector
// ---------------------------------------------------------------------------

/// A named, directional attachment point on a node.
///
/// The connector's `id` is assigned when it is attached to a node in a
/// [`FlowGraph`](crate::graph::FlowGraph); until then it is the null key.
#[derive(Debug, Clone)]
pub struct Connector {
    pub(crate) id: ConnectorId,
    identifier: String,
    display_name: String,
    owner: NodeId,
    direction: Direction,
    allows_multiple: bool,
    /// Empty means any item is accepted.
    accepted_items: Vec<Item>,
    pub(crate) connections: Vec<ConnectionId>,
}

impl Connector {
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        owner: NodeId,
        direction: Direction,
        allows_multiple: bool,
        accepted_items: impl IntoIterator<Item = Item>,
    ) -> Result<Self, GraphError> {
        let identifier = identifier.into();
        let display_name = display_name.into();
        require_text(&identifier, "connector identifier")?;
        require_text(&display_name, "connector display name")?;
        if owner.is_null() {
            return Err(GraphError::InvalidArgument(format!(
                "connector {identifier} needs an owning node"
            )));
        }

        let mut accepted: Vec<Item> = Vec::new();
        for item in accepted_items {
            if !accepted.contains(&item) {
                accepted.push(item);
            }
        }

        Ok(Self {
            id: ConnectorId::default(),
            identifier,
            display_name,
            owner,
            direction,
            allows_multiple,
            accepted_items: accepted,
            connections: Vec::new(),
        })
    }

    pub fn id(&self) -> ConnectorId {
        self.id
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The node that owns this connector.
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_input(&self) -> bool {
        self.direction == Direction::Input
    }

    pub fn allows_multiple_connections(&self) -> bool {
        self.allows_multiple
    }

    pub fn accepted_items(&self) -> &[Item] {
        &self.accepted_items
    }

    pub fn connections(&self) -> &[ConnectionId] {
        &self.connections
    }

    pub fn has_connection(&self) -> bool {
        !self.connections.is_empty()
    }

    /// Returns true if no further connection may attach.
    pub fn is_at_capacity(&self) -> bool {
        !self.allows_multiple && self.has_connection()
    }

    /// Returns true if `item` may flow through this connector.
    pub fn accepts(&self, item: &Item) -> bool {
        self.accepted_items.is_empty() || self.accepted_items.contains(item)
    }

    /// Check whether this connector may be joined to `other`, reporting the
    /// first rule that fails.
    ///
    /// Checks run in order: identity, direction, capacity (either side), and
    /// item overlap. Connectors with no item restriction are compatible with
    /// any item set.
    pub fn compatibility(&self, other: &Connector) -> Result<(), Incompatibility> {
        self.compatibility_ignoring(other, None)
    }

    pub fn can_connect_to(&self, other: &Connector) -> bool {
        self.compatibility(other).is_ok()
    }

    /// Same as [`compatibility`](Self::compatibility), but `ignoring` does not
    /// count toward either side's capacity. Used to re-validate a connection
    /// that already occupies both connectors.
    pub(crate) fn compatibility_ignoring(
        &self,
        other: &Connector,
        ignoring: Option<ConnectionId>,
    ) -> Result<(), Incompatibility> {
        if self.is_same_connector(other) {
            return Err(Incompatibility::SameConnector);
        }
        if self.direction == other.direction {
            return Err(Incompatibility::SameDirection);
        }
        if self.occupied_ignoring(ignoring) || other.occupied_ignoring(ignoring) {
            return Err(Incompatibility::AtCapacity);
        }
        if self.accepted_items.is_empty() || other.accepted_items.is_empty() {
            return Ok(());
        }
        if self
            .accepted_items
            .iter()
            .any(|item| other.accepted_items.contains(item))
        {
            Ok(())
        } else {
            Err(Incompatibility::NoCommonItems)
        }
    }

    fn is_same_connector(&self, other: &Connector) -> bool {
        std::ptr::eq(self, other) || (!self.id.is_null() && self.id == other.id)
    }

    fn occupied_ignoring(&self, ignoring: Option<ConnectionId>) -> bool {
        !self.allows_multiple && self.connections.iter().any(|c| Some(*c) != ignoring)
    }

    /// Register `connection` on this connector.
    ///
    /// Fails with `CapacityExceeded` if the connector disallows multiple
    /// connections and already has one, and with `DirectionMismatch` if the
    /// connection does not use this connector in the role matching its
    /// direction (outputs must be the source, inputs the target).
    /// Registering the same connection twice is a no-op.
    pub fn add_connection(
        &mut self,
        id: ConnectionId,
        connection: &Connection,
    ) -> Result<(), GraphError> {
        if self.connections.contains(&id) {
            return Ok(());
        }
        if self.is_at_capacity() {
            return Err(GraphError::CapacityExceeded {
                connector: self.identifier.clone(),
            });
        }
        let endpoint = match self.direction {
            Direction::Output => connection.source(),
            Direction::Input => connection.target(),
        };
        if self.id.is_null() || endpoint != self.id {
            return Err(GraphError::DirectionMismatch {
                connector: self.identifier.clone(),
                expected: self.direction,
            });
        }
        self.connections.push(id);
        Ok(())
    }

    /// Remove `id` from this connector. Absent ids are ignored.
    pub fn remove_connection(&mut self, id: ConnectionId) {
        self.connections.retain(|c| *c != id);
    }
}
