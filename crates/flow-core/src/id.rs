use slotmap::new_key_type;

new_key_type! {
    /// Identifies a node in the flow graph arena.
    pub struct NodeId;

    /// Identifies a connector (input or output attachment point) on a node.
    pub struct ConnectorId;

    /// Identifies a connection between an output and an input connector.
    pub struct ConnectionId;
}
