//! Immutable content tables keyed by string id.
//!
//! Registries are built once (usually by the content crate) and shared by
//! every session through an `Arc`. Nothing in the engine mutates them.

use std::collections::BTreeMap;

use crate::action::Skill;
use crate::status::StatusDefinition;

use super::templates::{ModuleDefinition, UnitTemplate};

/// Content that can be stored in a [`Registry`].
pub trait RegistryEntry {
    fn id(&self) -> &str;
}

impl RegistryEntry for Skill {
    fn id(&self) -> &str {
        &self.id
    }
}

impl RegistryEntry for StatusDefinition {
    fn id(&self) -> &str {
        &self.id
    }
}

impl RegistryEntry for ModuleDefinition {
    fn id(&self) -> &str {
        &self.id
    }
}

impl RegistryEntry for UnitTemplate {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Ordered id → definition table.
#[derive(Clone, Debug, PartialEq)]
pub struct Registry<T> {
    entries: BTreeMap<String, T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T: RegistryEntry> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entry`, returning the definition it replaced.
    pub fn insert(&mut self, entry: T) -> Option<T> {
        let id = entry.id().to_owned();
        let previous = self.entries.insert(id, entry);
        if let Some(prev) = &previous {
            tracing::warn!(target: "combat::registry", id = prev.id(), "duplicate registry id replaced");
        }
        previous
    }

    pub fn with(mut self, entry: T) -> Self {
        self.insert(entry);
        self
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.entries.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: RegistryEntry> FromIterator<T> for Registry<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut registry = Self::new();
        for entry in iter {
            registry.insert(entry);
        }
        registry
    }
}

pub type SkillRegistry = Registry<Skill>;
pub type StatusRegistry = Registry<StatusDefinition>;
pub type ModuleRegistry = Registry<ModuleDefinition>;
pub type TemplateRegistry = Registry<UnitTemplate>;

/// Every content table a session reads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Registries {
    pub skills: SkillRegistry,
    pub statuses: StatusRegistry,
    pub modules: ModuleRegistry,
    pub templates: TemplateRegistry,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }
}
