use crate::fixed::{Fixed64, duration_secs};
use crate::item::{CatalogError, Item, ItemStack, require_text};
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Duration;

/// A processing station that runs recipes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Machine {
    identifier: String,
    display_name: String,
    power_consumption: Fixed64,
}

impl Machine {
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        power_consumption: Fixed64,
    ) -> Result<Self, CatalogError> {
        let identifier = identifier.into();
        let display_name = display_name.into();
        require_text(&identifier, "machine identifier")?;
        require_text(&display_name, "machine display name")?;
        if power_consumption < Fixed64::ZERO {
            return Err(CatalogError::InvalidArgument(format!(
                "machine power consumption cannot be negative, got {power_consumption}"
            )));
        }
        Ok(Self {
            identifier,
            display_name,
            power_consumption,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Power drawn by one machine running continuously.
    pub fn power_consumption(&self) -> Fixed64 {
        self.power_consumption
    }
}

/// A conversion rule: consumes `inputs` and produces `outputs` once per
/// `processing_time` on one `machine`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipe {
    identifier: String,
    display_name: String,
    inputs: Vec<ItemStack>,
    outputs: Vec<ItemStack>,
    machine: Machine,
    processing_time: Duration,
    #[serde(skip)]
    processing_secs: Fixed64,
}

impl Recipe {
    /// Build a recipe.
    ///
    /// Amounts and rates are Q32.32 fixed point. The processing time must be
    /// a positive number of seconds that fits in `Fixed64`; times beyond
    /// roughly 2^31 seconds are rejected.
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        inputs: Vec<ItemStack>,
        outputs: Vec<ItemStack>,
        machine: Machine,
        processing_time: Duration,
    ) -> Result<Self, CatalogError> {
        let identifier = identifier.into();
        let display_name = display_name.into();
        require_text(&identifier, "recipe identifier")?;
        require_text(&display_name, "recipe display name")?;

        if inputs.is_empty() {
            return Err(CatalogError::InvalidArgument(format!(
                "recipe {identifier} must have at least one input"
            )));
        }
        if outputs.is_empty() {
            return Err(CatalogError::InvalidArgument(format!(
                "recipe {identifier} must have at least one output"
            )));
        }
        // Connector identifiers derive from item identifiers.
        reject_duplicate_items(&identifier, "inputs", &inputs)?;
        reject_duplicate_items(&identifier, "outputs", &outputs)?;

        let processing_secs = duration_secs(processing_time)
            .filter(|secs| *secs > Fixed64::ZERO)
            .ok_or_else(|| {
                CatalogError::InvalidArgument(format!(
                    "recipe {identifier} processing time must be positive and representable, got {processing_time:?}"
                ))
            })?;

        Ok(Self {
            identifier,
            display_name,
            inputs,
            outputs,
            machine,
            processing_time,
            processing_secs,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn inputs(&self) -> &[ItemStack] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[ItemStack] {
        &self.outputs
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn processing_time(&self) -> Duration {
        self.processing_time
    }

    /// Processing time in seconds, always positive.
    pub fn processing_secs(&self) -> Fixed64 {
        self.processing_secs
    }

    /// One input, one output.
    pub fn is_basic(&self) -> bool {
        self.inputs.len() == 1 && self.outputs.len() == 1
    }

    /// More than one input or more than one output.
    pub fn is_advanced(&self) -> bool {
        self.inputs.len() > 1 || self.outputs.len() > 1
    }

    /// Returns true if the recipe consumes `item`.
    pub fn consumes(&self, item: &Item) -> bool {
        self.inputs.iter().any(|s| s.item() == item)
    }

    /// Returns true if the recipe produces `item`.
    pub fn produces(&self, item: &Item) -> bool {
        self.outputs.iter().any(|s| s.item() == item)
    }
}

fn reject_duplicate_items(
    recipe: &str,
    side: &str,
    stacks: &[ItemStack],
) -> Result<(), CatalogError> {
    let mut seen = BTreeSet::new();
    for stack in stacks {
        if !seen.insert(stack.item().identifier()) {
            return Err(CatalogError::InvalidArgument(format!(
                "recipe {recipe} lists {} more than once in its {side}",
                stack.item().identifier()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::f64_to_fixed64 as fixed;

    fn item(id: &str) -> Item {
        Item::new(id, id).unwrap()
    }

    fn stack(id: &str, amount: f64) -> ItemStack {
        ItemStack::new(item(id), fixed(amount)).unwrap()
    }

    fn furnace() -> Machine {
        Machine::new("stone-furnace", "Stone Furnace", fixed(5.0)).unwrap()
    }

    #[test]
    fn machine_validation() {
        assert!(Machine::new("", "Furnace", Fixed64::ZERO).is_err());
        assert!(Machine::new("furnace", "", Fixed64::ZERO).is_err());
        assert!(Machine::new("furnace", "Furnace", fixed(-0.5)).is_err());
        let idle = Machine::new("chest", "Chest", Fixed64::ZERO).unwrap();
        assert_eq!(idle.power_consumption(), Fixed64::ZERO);
    }

    #[test]
    fn recipe_construction() {
        let recipe = Recipe::new(
            "iron-smelting",
            "Iron Smelting",
            vec![stack("iron-ore", 1.0)],
            vec![stack("iron-plate", 1.0)],
            furnace(),
            Duration::from_secs(3),
        )
        .unwrap();
        assert_eq!(recipe.identifier(), "iron-smelting");
        assert_eq!(recipe.processing_secs(), fixed(3.0));
        assert!(recipe.is_basic());
        assert!(!recipe.is_advanced());
        assert!(recipe.consumes(&item("iron-ore")));
        assert!(recipe.produces(&item("iron-plate")));
        assert!(!recipe.produces(&item("iron-ore")));
    }

    #[test]
    fn recipe_requires_inputs_and_outputs() {
        let no_inputs = Recipe::new(
            "r",
            "R",
            vec![],
            vec![stack("b", 1.0)],
            furnace(),
            Duration::from_secs(1),
        );
        assert!(no_inputs.is_err());

        let no_outputs = Recipe::new(
            "r",
            "R",
            vec![stack("a", 1.0)],
            vec![],
            furnace(),
            Duration::from_secs(1),
        );
        assert!(no_outputs.is_err());
    }

    #[test]
    fn recipe_requires_positive_time() {
        let result = Recipe::new(
            "r",
            "R",
            vec![stack("a", 1.0)],
            vec![stack("b", 1.0)],
            furnace(),
            Duration::ZERO,
        );
        match result {
            Err(CatalogError::InvalidArgument(msg)) => {
                assert!(msg.contains("processing time"), "got: {msg}");
            }
            other => panic!("expected InvalidArgument, got: {other:?}"),
        }
    }

    #[test]
    fn recipe_rejects_duplicate_items_per_side() {
        let dup = Recipe::new(
            "r",
            "R",
            vec![stack("a", 1.0), stack("a", 2.0)],
            vec![stack("b", 1.0)],
            furnace(),
            Duration::from_secs(1),
        );
        assert!(dup.is_err());

        // The same item on both sides is a catalyst loop, which is allowed.
        let loop_recipe = Recipe::new(
            "r",
            "R",
            vec![stack("a", 1.0)],
            vec![stack("a", 2.0)],
            furnace(),
            Duration::from_secs(1),
        );
        assert!(loop_recipe.is_ok());
    }

    #[test]
    fn advanced_recipe_classification() {
        let recipe = Recipe::new(
            "electronic-circuit",
            "Electronic Circuit",
            vec![stack("iron-plate", 1.0), stack("copper-wire", 3.0)],
            vec![stack("electronic-circuit", 1.0)],
            furnace(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(recipe.is_advanced());
        assert!(!recipe.is_basic());
    }
}
