//! Serde data file structs for catalog content.
//!
//! These structs define the on-disk format for game metadata, items,
//! machines, and recipes. They are deserialized from RON, JSON, or TOML data
//! files and then validated into core catalog types by the loader.

use serde::Deserialize;

// ===========================================================================
// Game metadata
// ===========================================================================

/// Catalog name and version, e.g. `(name: "Test Factory Game", version: "1.0")`.
#[derive(Debug, Clone, Deserialize)]
pub struct GameData {
    pub name: String,
    pub version: String,
}

// ===========================================================================
// Items and machines
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MachineData {
    pub id: String,
    pub name: String,
    /// Power drawn while running. Defaults to zero.
    #[serde(default)]
    pub power: f64,
}

// ===========================================================================
// Recipes
// ===========================================================================

/// A recipe input or output entry, in short tuple form or full form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StackData {
    /// Short form: `("item-id", amount)`.
    Short(String, f64),
    /// Full form with named fields.
    Full { item: String, amount: f64 },
}

impl StackData {
    pub fn item(&self) -> &str {
        match self {
            StackData::Short(item, _) | StackData::Full { item, .. } => item,
        }
    }

    pub fn amount(&self) -> f64 {
        match self {
            StackData::Short(_, amount) | StackData::Full { amount, .. } => *amount,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub id: String,
    pub name: String,
    pub inputs: Vec<StackData>,
    pub outputs: Vec<StackData>,
    /// Machine identifier.
    pub machine: String,
    /// Processing time in seconds.
    pub time: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_short_and_full_forms() {
        let short: Vec<StackData> = ron::from_str(r#"[("iron-ore", 2.0)]"#).unwrap();
        let full: Vec<StackData> =
            serde_json::from_str(r#"[{"item": "coal", "amount": 0.5}]"#).unwrap();
        let stacks: Vec<StackData> = short.into_iter().chain(full).collect();
        assert_eq!(stacks[0].item(), "iron-ore");
        assert_eq!(stacks[0].amount(), 2.0);
        assert_eq!(stacks[1].item(), "coal");
        assert_eq!(stacks[1].amount(), 0.5);
    }

    #[test]
    fn machine_power_defaults_to_zero() {
        let machine: MachineData =
            serde_json::from_str(r#"{"id": "chest", "name": "Chest"}"#).unwrap();
        assert_eq!(machine.power, 0.0);
    }

    #[test]
    fn recipe_from_json() {
        let json = r#"{
            "id": "iron-gear",
            "name": "Iron Gear",
            "inputs": [["iron-plate", 2.0]],
            "outputs": [{"item": "iron-gear", "amount": 1.0}],
            "machine": "assembling-machine-1",
            "time": 1.0
        }"#;
        let recipe: RecipeData = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.inputs[0].item(), "iron-plate");
        assert_eq!(recipe.outputs[0].amount(), 1.0);
        assert_eq!(recipe.machine, "assembling-machine-1");
    }
}
