use crate::fixed::{Fixed64, checked_div_64, checked_mul_64};
use crate::graph::GraphError;
use crate::id::{ConnectorId, NodeId};
use crate::item::{Item, require_text};
use crate::recipe::Recipe;
use crate::throughput::Throughput;
use serde::{Deserialize, Serialize};

const SECONDS_PER_MINUTE: i32 = 60;

// ---------------------------------------------------------------------------
// Node type selector and position
// ---------------------------------------------------------------------------

/// Selector used by the node factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// One unrestricted input and one unrestricted output, single connection each.
    Generic,
    /// Splitter/merger: one input and one output, each taking any number of connections.
    Junction,
    /// Connectors derived from a recipe.
    Recipe,
}

/// Canvas position of a node. The core stores it for the presentation
/// layer and attaches no meaning to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// Recipe nodes
// ---------------------------------------------------------------------------

/// Recipe-specific state of a node: the recipe it runs and how many
/// machines run it in parallel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeNode {
    recipe: Recipe,
    multiplier: Fixed64,
}

impl RecipeNode {
    pub fn new(recipe: Recipe) -> Self {
        Self {
            recipe,
            multiplier: Fixed64::ONE,
        }
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn multiplier(&self) -> Fixed64 {
        self.multiplier
    }

    /// Set the machine count. Must be positive.
    pub fn set_multiplier(&mut self, multiplier: Fixed64) -> Result<(), GraphError> {
        if multiplier <= Fixed64::ZERO {
            return Err(GraphError::InvalidArgument(format!(
                "multiplier must be positive, got {multiplier}"
            )));
        }
        self.multiplier = multiplier;
        Ok(())
    }

    /// Recipe cycles completed per minute across all machines.
    pub fn cycles_per_minute(&self) -> Result<Fixed64, GraphError> {
        checked_div_64(
            Fixed64::from_num(SECONDS_PER_MINUTE),
            self.recipe.processing_secs(),
        )
        .and_then(|per_machine| checked_mul_64(per_machine, self.multiplier))
        .ok_or_else(|| overflow("cycles per minute"))
    }

    /// Per-minute consumption and production plus power draw.
    ///
    /// Each stack contributes `amount * cycles_per_minute`; power is the
    /// machine's consumption times the multiplier.
    ///
    /// Rates are computed in Q32.32. A stack amount so small that its rate
    /// rounds to zero, or a rate past `Fixed64::MAX`, fails with
    /// `InvalidArgument`. Catalog loaders reject such recipes up front.
    pub fn throughput(&self) -> Result<Throughput, GraphError> {
        let cycles = self.cycles_per_minute()?;
        let rate = |stack: &crate::item::ItemStack| -> Result<(Item, Fixed64), GraphError> {
            let per_minute =
                checked_mul_64(stack.amount(), cycles).ok_or_else(|| overflow("item rate"))?;
            Ok((stack.item().clone(), per_minute))
        };
        let inputs = self
            .recipe
            .inputs()
            .iter()
            .map(rate)
            .collect::<Result<Vec<_>, _>>()?;
        let outputs = self
            .recipe
            .outputs()
            .iter()
            .map(rate)
            .collect::<Result<Vec<_>, _>>()?;
        let power = checked_mul_64(self.recipe.machine().power_consumption(), self.multiplier)
            .ok_or_else(|| overflow("power"))?;
        Throughput::new(inputs, outputs, power)
    }

    /// Identifier of the node built for `recipe`.
    pub fn node_identifier(recipe: &Recipe) -> String {
        format!("recipe-{}", recipe.identifier())
    }

    /// Identifier of the input connector for `item`.
    pub fn input_identifier(item: &Item) -> String {
        format!("input-{}", item.identifier())
    }

    /// Identifier of the output connector for `item`.
    pub fn output_identifier(item: &Item) -> String {
        format!("output-{}", item.identifier())
    }
}

fn overflow(what: &str) -> GraphError {
    GraphError::InvalidArgument(format!("{what} overflowed"))
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// What a node does. Throughput is only defined for recipe nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Generic,
    Junction,
    Recipe(RecipeNode),
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Generic => NodeType::Generic,
            NodeKind::Junction => NodeType::Junction,
            NodeKind::Recipe(_) => NodeType::Recipe,
        }
    }

    pub fn as_recipe(&self) -> Option<&RecipeNode> {
        match self {
            NodeKind::Recipe(recipe) => Some(recipe),
            _ => None,
        }
    }

    pub(crate) fn as_recipe_mut(&mut self) -> Option<&mut RecipeNode> {
        match self {
            NodeKind::Recipe(recipe) => Some(recipe),
            _ => None,
        }
    }
}

/// A vertex in the flow graph. Owns its connectors; they live in the
/// graph's connector arena and are listed here by key.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    identifier: String,
    display_name: String,
    kind: NodeKind,
    position: Position,
    pub(crate) inputs: Vec<ConnectorId>,
    pub(crate) outputs: Vec<ConnectorId>,
}

impl Node {
    pub(crate) fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        kind: NodeKind,
    ) -> Result<Self, GraphError> {
        let identifier = identifier.into();
        let display_name = display_name.into();
        require_text(&identifier, "node identifier")?;
        require_text(&display_name, "node display name")?;
        Ok(Self {
            id: NodeId::default(),
            identifier,
            display_name,
            kind,
            position: Position::default(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn inputs(&self) -> &[ConnectorId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[ConnectorId] {
        &self.outputs
    }

    /// All connectors, inputs first.
    pub fn connectors(&self) -> impl Iterator<Item = ConnectorId> + '_ {
        self.inputs.iter().chain(self.outputs.iter()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::{f64_to_fixed64 as fixed, fixed64_to_f64};
    use crate::test_utils::*;

    #[test]
    fn multiplier_defaults_to_one_and_rejects_non_positive() {
        let mut node = RecipeNode::new(smelt_iron());
        assert_eq!(node.multiplier(), Fixed64::ONE);
        assert!(node.set_multiplier(Fixed64::ZERO).is_err());
        assert!(node.set_multiplier(fixed(-2.0)).is_err());
        assert_eq!(node.multiplier(), Fixed64::ONE);
        node.set_multiplier(fixed(2.0)).unwrap();
        assert_eq!(node.multiplier(), fixed(2.0));
    }

    #[test]
    fn throughput_scales_with_multiplier() {
        // 1 ore -> 1 plate every 3.5s, two machines.
        let mut node = RecipeNode::new(smelt_iron());
        node.set_multiplier(fixed(2.0)).unwrap();
        let t = node.throughput().unwrap();

        let ore_rate = fixed64_to_f64(t.input_rate(&iron_ore()).unwrap());
        let plate_rate = fixed64_to_f64(t.output_rate(&iron_plate()).unwrap());
        assert!((ore_rate - 34.2857).abs() < 0.001, "got {ore_rate}");
        assert!((plate_rate - 34.2857).abs() < 0.001, "got {plate_rate}");
        assert_eq!(t.power(), furnace().power_consumption() * fixed(2.0));
    }

    #[test]
    fn throughput_uses_stack_amounts() {
        // 1 plate + 3 wire -> 1 circuit every second.
        let node = RecipeNode::new(make_circuit());
        let t = node.throughput().unwrap();
        assert_eq!(t.input_rate(&iron_plate()), Some(fixed(60.0)));
        assert_eq!(t.input_rate(&copper_wire()), Some(fixed(180.0)));
        assert_eq!(t.output_rate(&circuit()), Some(fixed(60.0)));
    }

    #[test]
    fn throughput_is_idempotent() {
        let node = RecipeNode::new(make_circuit());
        assert_eq!(node.throughput().unwrap(), node.throughput().unwrap());
    }

    #[test]
    fn throughput_fails_when_rate_rounds_to_zero() {
        // Half a cycle per minute of the smallest representable amount.
        let tiny = fixed64_to_f64(Fixed64::DELTA);
        let recipe = make_recipe(
            "trickle",
            "Trickle",
            &[(iron_ore(), tiny)],
            &[(iron_plate(), 1.0)],
            furnace(),
            120.0,
        );
        let node = RecipeNode::new(recipe);
        assert!(matches!(
            node.throughput(),
            Err(GraphError::InvalidArgument(_))
        ));
    }

    #[test]
    fn connector_identifiers_are_stable() {
        let recipe = smelt_iron();
        assert_eq!(RecipeNode::node_identifier(&recipe), "recipe-iron-smelting");
        assert_eq!(RecipeNode::input_identifier(&iron_ore()), "input-iron-ore");
        assert_eq!(RecipeNode::output_identifier(&iron_plate()), "output-iron-plate");
    }

    #[test]
    fn node_kind_helpers() {
        let kind = NodeKind::Recipe(RecipeNode::new(smelt_iron()));
        assert_eq!(kind.node_type(), NodeType::Recipe);
        assert!(kind.as_recipe().is_some());
        assert!(NodeKind::Junction.as_recipe().is_none());
        assert_eq!(NodeKind::Generic.node_type(), NodeType::Generic);
    }

    #[test]
    fn node_rejects_blank_names() {
        assert!(Node::new("", "x", NodeKind::Generic).is_err());
        assert!(Node::new("x", "", NodeKind::Generic).is_err());
        let node = Node::new("splitter-1", "Splitter", NodeKind::Junction).unwrap();
        assert_eq!(node.position(), Position::default());
        assert_eq!(node.connectors().count(), 0);
    }
}
