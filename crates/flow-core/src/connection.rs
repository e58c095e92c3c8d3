use crate::fixed::Fixed64;
use crate::id::{ConnectionId, ConnectorId};

/// Flow rate used when the caller does not choose one.
pub const DEFAULT_FLOW_RATE: Fixed64 = Fixed64::ONE;

/// Lifecycle of a connection.
///
/// `Unvalidated` only exists while the graph is registering the connection
/// on its endpoints; callers observe `Active` or `Removed`. `Removed` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unvalidated,
    Active,
    Removed,
}

/// A directed link from an output connector (`source`) to an input
/// connector (`target`).
///
/// Connections are created through
/// [`FlowGraph::connect`](crate::graph::FlowGraph::connect), which checks
/// the endpoints and registers the connection on both of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    id: ConnectionId,
    source: ConnectorId,
    target: ConnectorId,
    flow_rate: Fixed64,
    enabled: bool,
    state: ConnectionState,
}

impl Connection {
    pub(crate) fn new(
        id: ConnectionId,
        source: ConnectorId,
        target: ConnectorId,
        flow_rate: Fixed64,
    ) -> Self {
        Self {
            id,
            source,
            target,
            flow_rate,
            enabled: false,
            state: ConnectionState::Unvalidated,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn source(&self) -> ConnectorId {
        self.source
    }

    pub fn target(&self) -> ConnectorId {
        self.target
    }

    pub fn flow_rate(&self) -> Fixed64 {
        self.flow_rate
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_removed(&self) -> bool {
        self.state == ConnectionState::Removed
    }

    /// Returns true if `connector` is either endpoint.
    pub fn touches(&self, connector: ConnectorId) -> bool {
        self.source == connector || self.target == connector
    }

    pub(crate) fn activate(&mut self) {
        if self.state == ConnectionState::Unvalidated {
            self.state = ConnectionState::Active;
            self.enabled = true;
        }
    }

    pub(crate) fn mark_removed(&mut self) {
        self.state = ConnectionState::Removed;
        self.enabled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn endpoints() -> (ConnectionId, ConnectorId, ConnectorId) {
        let mut connectors: SlotMap<ConnectorId, ()> = SlotMap::with_key();
        let mut connections: SlotMap<ConnectionId, ()> = SlotMap::with_key();
        (
            connections.insert(()),
            connectors.insert(()),
            connectors.insert(()),
        )
    }

    #[test]
    fn lifecycle_moves_forward_only() {
        let (id, s, t) = endpoints();
        let mut c = Connection::new(id, s, t, DEFAULT_FLOW_RATE);
        assert_eq!(c.state(), ConnectionState::Unvalidated);
        assert!(!c.is_enabled());

        c.activate();
        assert_eq!(c.state(), ConnectionState::Active);
        assert!(c.is_enabled());

        c.mark_removed();
        assert!(c.is_removed());
        assert!(!c.is_enabled());

        // No resurrection.
        c.activate();
        assert!(c.is_removed());
        assert!(!c.is_enabled());
    }

    #[test]
    fn touches_both_endpoints() {
        let (id, s, t) = endpoints();
        let c = Connection::new(id, s, t, DEFAULT_FLOW_RATE);
        assert!(c.touches(s));
        assert!(c.touches(t));
        assert!(!c.touches(ConnectorId::default()));
        assert_eq!(c.flow_rate(), Fixed64::ONE);
    }
}
