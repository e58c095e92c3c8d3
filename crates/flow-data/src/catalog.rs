//! Loading a catalog directory into a [`DataCatalog`] provider.
//!
//! A catalog directory holds four files, each in RON, TOML, or JSON:
//! `game`, `items`, `machines`, and `recipes`. Items and machines are loaded
//! first so recipes can reference them by identifier.

use crate::loader::{DataFile, DataLoadError, NameIndex, read_entries, read_game};
use crate::schema::{ItemData, MachineData, RecipeData, StackData};
use flow_core::fixed::{Fixed64, checked_f64_to_fixed64};
use flow_core::item::{CatalogError, Item, ItemStack};
use flow_core::node::RecipeNode;
use flow_core::recipe::{Machine, Recipe};
use flow_core::registry::{CatalogProvider, CatalogVersion};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// A catalog loaded from data files.
#[derive(Debug, Clone)]
pub struct DataCatalog {
    name: String,
    version: CatalogVersion,
    items: Vec<Item>,
    machines: Vec<Machine>,
    recipes: Vec<Recipe>,
}

impl CatalogProvider for DataCatalog {
    fn game_name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> CatalogVersion {
        self.version
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

/// Directory of the sample catalog shipped with this crate.
pub fn test_factory_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data/test-factory")
}

/// Load and validate every file of a catalog directory.
///
/// Recipes whose per-minute rates cannot be represented at a multiplier of
/// one are rejected here, so throughput never fails on loaded data.
pub fn load_catalog(dir: &Path) -> Result<DataCatalog, DataLoadError> {
    let (game_path, game) = read_game(dir)?;
    if game.name.trim().is_empty() {
        return Err(DataLoadError::InvalidValue {
            file: game_path,
            detail: "game name cannot be empty".to_string(),
        });
    }
    let version: CatalogVersion = game
        .version
        .parse()
        .map_err(|e| DataLoadError::InvalidValue {
            file: game_path.clone(),
            detail: format!("{e}"),
        })?;

    // -- Items --
    let (items_path, item_data) = read_entries::<ItemData>(dir, DataFile::Items)?;
    let mut items = NameIndex::new(&items_path, "item");
    let mut item_list = Vec::with_capacity(item_data.len());
    for data in item_data {
        let item = Item::new(data.id, data.name).map_err(catalog_error(&items_path))?;
        items.insert(item.identifier(), item.clone())?;
        item_list.push(item);
    }

    // -- Machines --
    let (machines_path, machine_data) = read_entries::<MachineData>(dir, DataFile::Machines)?;
    let mut machines = NameIndex::new(&machines_path, "machine");
    let mut machine_list = Vec::with_capacity(machine_data.len());
    for data in machine_data {
        let power = to_fixed(data.power, &machines_path, || {
            format!("power of machine {}", data.id)
        })?;
        let machine =
            Machine::new(data.id, data.name, power).map_err(catalog_error(&machines_path))?;
        machines.insert(machine.identifier(), machine.clone())?;
        machine_list.push(machine);
    }

    // -- Recipes --
    let (recipes_path, recipe_data) = read_entries::<RecipeData>(dir, DataFile::Recipes)?;
    let mut seen: HashSet<String> = HashSet::with_capacity(recipe_data.len());
    let mut recipes = Vec::with_capacity(recipe_data.len());
    for data in recipe_data {
        if !seen.insert(data.id.clone()) {
            return Err(DataLoadError::DuplicateName {
                file: recipes_path,
                name: data.id,
            });
        }
        let recipe = build_recipe(data, &items, &machines, &recipes_path)?;
        if let Err(e) = RecipeNode::new(recipe.clone()).throughput() {
            return Err(DataLoadError::InvalidValue {
                file: recipes_path,
                detail: format!("recipe {}: {e}", recipe.identifier()),
            });
        }
        debug!(recipe = recipe.identifier(), "loaded recipe");
        recipes.push(recipe);
    }

    info!(
        game = %game.name,
        %version,
        items = item_list.len(),
        machines = machine_list.len(),
        recipes = recipes.len(),
        dir = %dir.display(),
        "loaded data catalog"
    );

    Ok(DataCatalog {
        name: game.name,
        version,
        items: item_list,
        machines: machine_list,
        recipes,
    })
}

fn build_recipe(
    data: RecipeData,
    items: &NameIndex<'_, Item>,
    machines: &NameIndex<'_, Machine>,
    file: &Path,
) -> Result<Recipe, DataLoadError> {
    let inputs = build_stacks(&data.inputs, items, file)?;
    let outputs = build_stacks(&data.outputs, items, file)?;
    let machine = machines.resolve(&data.machine, file)?.clone();

    if !data.time.is_finite() || data.time <= 0.0 {
        return Err(DataLoadError::InvalidValue {
            file: file.to_path_buf(),
            detail: format!(
                "processing time of recipe {} must be positive, got {}",
                data.id, data.time
            ),
        });
    }
    let time = Duration::try_from_secs_f64(data.time).map_err(|e| DataLoadError::InvalidValue {
        file: file.to_path_buf(),
        detail: format!("processing time of recipe {}: {e}", data.id),
    })?;

    Recipe::new(data.id, data.name, inputs, outputs, machine, time).map_err(catalog_error(file))
}

fn build_stacks(
    stacks: &[StackData],
    items: &NameIndex<'_, Item>,
    file: &Path,
) -> Result<Vec<ItemStack>, DataLoadError> {
    stacks
        .iter()
        .map(|stack| {
            let item = items.resolve(stack.item(), file)?.clone();
            let amount = to_fixed(stack.amount(), file, || {
                format!("amount of {}", stack.item())
            })?;
            ItemStack::new(item, amount).map_err(catalog_error(file))
        })
        .collect()
}

fn to_fixed(
    value: f64,
    file: &Path,
    what: impl FnOnce() -> String,
) -> Result<Fixed64, DataLoadError> {
    checked_f64_to_fixed64(value).ok_or_else(|| DataLoadError::InvalidValue {
        file: file.to_path_buf(),
        detail: format!("{} is not representable: {value}", what()),
    })
}

fn catalog_error(file: &Path) -> impl Fn(CatalogError) -> DataLoadError + '_ {
    move |source| DataLoadError::Catalog {
        file: file.to_path_buf(),
        source,
    }
}
