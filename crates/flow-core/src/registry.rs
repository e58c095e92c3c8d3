use crate::item::Item;
use crate::recipe::{Machine, Recipe};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::info;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("a catalog named {0} is already registered")]
    DuplicateName(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid catalog version: {0}")]
    InvalidVersion(String),
}

// ---------------------------------------------------------------------------
// Catalog metadata
// ---------------------------------------------------------------------------

/// `major.minor.patch` version of a catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CatalogVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl CatalogVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for CatalogVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Parses `1`, `1.0`, or `1.2.3`; missing components are zero.
impl FromStr for CatalogVersion {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RegistryError::InvalidVersion(s.to_string());
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(invalid());
        }
        let mut numbers = [0u32; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| invalid())?;
        }
        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

/// Name and version of a catalog, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameInfo {
    pub name: String,
    pub version: CatalogVersion,
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// A source of items, machines, and recipes. Providers are read-only once
/// registered.
pub trait CatalogProvider: Send + Sync {
    fn game_name(&self) -> &str;
    fn version(&self) -> CatalogVersion;
    fn items(&self) -> &[Item];
    fn machines(&self) -> &[Machine];
    fn recipes(&self) -> &[Recipe];

    fn info(&self) -> GameInfo {
        GameInfo {
            name: self.game_name().to_string(),
            version: self.version(),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Registered catalog providers, keyed by game name, and the one that is
/// currently active. Lookups go through the active provider.
#[derive(Default)]
pub struct CatalogRegistry {
    providers: BTreeMap<String, Box<dyn CatalogProvider>>,
    active: Option<String>,
}

impl fmt::Debug for CatalogRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .field("active", &self.active)
            .finish()
    }
}

impl CatalogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its game name. The first provider
    /// registered becomes active.
    pub fn register<P>(&mut self, provider: P) -> Result<(), RegistryError>
    where
        P: CatalogProvider + 'static,
    {
        let name = provider.game_name().to_string();
        if self.providers.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        info!(
            game = %name,
            version = %provider.version(),
            items = provider.items().len(),
            machines = provider.machines().len(),
            recipes = provider.recipes().len(),
            "catalog registered"
        );
        self.providers.insert(name.clone(), Box::new(provider));
        if self.active.is_none() {
            self.active = Some(name);
        }
        Ok(())
    }

    /// Make `name` the active catalog. Returns false if it is unknown.
    pub fn activate(&mut self, name: &str) -> bool {
        if !self.providers.contains_key(name) {
            return false;
        }
        info!(game = %name, "catalog activated");
        self.active = Some(name.to_string());
        true
    }

    /// Remove a provider. If it was active, nothing is active afterwards.
    pub fn unregister(&mut self, name: &str) -> Result<(), RegistryError> {
        if self.providers.remove(name).is_none() {
            return Err(RegistryError::NotFound(name.to_string()));
        }
        if self.active.as_deref() == Some(name) {
            self.active = None;
        }
        Ok(())
    }

    pub fn provider(&self, name: &str) -> Result<&dyn CatalogProvider, RegistryError> {
        self.providers
            .get(name)
            .map(|p| &**p)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn active(&self) -> Option<&dyn CatalogProvider> {
        self.active
            .as_deref()
            .and_then(|name| self.providers.get(name))
            .map(|p| &**p)
    }

    pub fn active_game(&self) -> Option<GameInfo> {
        self.active().map(|p| p.info())
    }

    /// Every registered catalog, ordered by name.
    pub fn available_games(&self) -> Vec<GameInfo> {
        self.providers.values().map(|p| p.info()).collect()
    }

    pub fn items(&self) -> &[Item] {
        self.active().map(|p| p.items()).unwrap_or_default()
    }

    pub fn machines(&self) -> &[Machine] {
        self.active().map(|p| p.machines()).unwrap_or_default()
    }

    pub fn recipes(&self) -> &[Recipe] {
        self.active().map(|p| p.recipes()).unwrap_or_default()
    }

    pub fn item(&self, identifier: &str) -> Option<&Item> {
        self.items().iter().find(|i| i.identifier() == identifier)
    }

    pub fn machine(&self, identifier: &str) -> Option<&Machine> {
        self.machines().iter().find(|m| m.identifier() == identifier)
    }

    pub fn recipe(&self, identifier: &str) -> Option<&Recipe> {
        self.recipes().iter().find(|r| r.identifier() == identifier)
    }

    /// Like [`recipe`](Self::recipe), but a miss is an error.
    pub fn require_recipe(&self, identifier: &str) -> Result<&Recipe, RegistryError> {
        self.recipe(identifier)
            .ok_or_else(|| RegistryError::NotFound(format!("recipe {identifier}")))
    }
}
