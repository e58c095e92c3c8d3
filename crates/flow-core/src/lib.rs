//! Flow Core -- the production-flow graph model.
//!
//! This crate provides the catalog value types (items, machines, recipes),
//! the connector/connection rules that keep a production graph structurally
//! valid, and the recipe-driven throughput calculation.
//!
//! # Ownership Model
//!
//! A [`graph::FlowGraph`] is an arena. It owns every node, connector, and
//! connection in `SlotMap`s; cross references are plain keys:
//!
//! - a connector records the [`id::NodeId`] of the node that owns it,
//! - a connection records the [`id::ConnectorId`]s of its two endpoints,
//! - a connector records the [`id::ConnectionId`]s attached to it.
//!
//! Arena existence and graph membership are tracked separately. Nodes and
//! connections are built (and wired) first, then added to the graph:
//!
//! ```rust,ignore
//! let smelter = graph.insert_recipe_node(smelt_iron)?;
//! let miner = graph.insert_recipe_node(mine_ore)?;
//! graph.add_node(smelter)?;
//! graph.add_node(miner)?;
//! let link = graph.connect(ore_out, ore_in, Fixed64::ONE)?;
//! graph.add_connection(link)?;
//! ```
//!
//! # Key Types
//!
//! - [`graph::FlowGraph`] -- Arena and membership container enforcing
//!   referential integrity and cascading removal.
//! - [`connector::Connector`] -- Typed, directional attachment point with
//!   cardinality and item-compatibility rules.
//! - [`connection::Connection`] -- Directed edge from an output connector to
//!   an input connector carrying a flow rate.
//! - [`node::NodeKind`] -- Generic, junction, and recipe node variants.
//! - [`throughput::Throughput`] -- Per-minute rates and power draw.
//! - [`registry::CatalogRegistry`] -- Registered catalog providers and the
//!   active catalog.
//! - [`factory::NodeFactory`] -- Builds fully wired nodes from a node type or
//!   a recipe.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for amounts and rates.

pub mod connection;
pub mod connector;
pub mod factory;
pub mod fixed;
pub mod graph;
pub mod id;
pub mod item;
pub mod node;
pub mod recipe;
pub mod registry;
pub mod throughput;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
