//! Project registry.
//!
//! A project bundles the node behaviors and the model implementations a
//! simulation may use, each behind a factory with a parameter schema. The
//! registry is only consulted at configuration time: the simulation keeps a
//! copy of its project to build node batches and swap models later on.

pub mod builtin;
pub mod params;

use std::collections::BTreeMap;

use crate::error::{SimError, SimResult};
use crate::simulation::config::{ModelSelection, ModelSelections};
use crate::simulation::models::{
    ConnectivityModel, DistributionModel, InterferenceModel, MobilityModel, ModelSet, ReliabilityModel,
    TransmissionModel,
};
use crate::simulation::node::NodeBehavior;

pub use params::{ParamField, ParamKind, ParamSchema, Params};

/// Builds one object of type `T` from resolved parameters.
pub type Factory<T> = fn(&Params) -> SimResult<Box<T>>;

pub struct CatalogEntry<T: ?Sized> {
    pub schema: ParamSchema,
    pub factory: Factory<T>,
}

impl<T: ?Sized> Clone for CatalogEntry<T> {
    fn clone(&self) -> Self {
        CatalogEntry {
            schema: self.schema.clone(),
            factory: self.factory,
        }
    }
}

/// Named factories for one slot, plus the slot's default entry.
pub struct Catalog<T: ?Sized> {
    slot: &'static str,
    entries: BTreeMap<String, CatalogEntry<T>>,
    default: Option<String>,
}

impl<T: ?Sized> Clone for Catalog<T> {
    fn clone(&self) -> Self {
        Catalog {
            slot: self.slot,
            entries: self.entries.clone(),
            default: self.default.clone(),
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for Catalog<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("slot", &self.slot)
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .field("default", &self.default)
            .finish()
    }
}

impl<T: ?Sized> Catalog<T> {
    pub fn new(slot: &'static str) -> Self {
        Catalog {
            slot,
            entries: BTreeMap::new(),
            default: None,
        }
    }

    /// Add (or replace) an entry. The first entry becomes the default.
    pub fn register(&mut self, name: &str, schema: ParamSchema, factory: Factory<T>) -> &mut Self {
        if self.default.is_none() {
            self.default = Some(name.to_string());
        }
        self.entries.insert(name.to_string(), CatalogEntry { schema, factory });
        self
    }

    pub fn set_default(&mut self, name: &str) -> SimResult<()> {
        if !self.entries.contains_key(name) {
            return Err(self.unknown(name));
        }
        self.default = Some(name.to_string());
        Ok(())
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn schema(&self, name: &str) -> Option<&ParamSchema> {
        self.entries.get(name).map(|entry| &entry.schema)
    }

    /// Resolve the selection's parameters and run the factory.
    pub fn build(&self, selection: &ModelSelection, seed: u64) -> SimResult<Box<T>> {
        let entry = self.entries.get(&selection.name).ok_or_else(|| self.unknown(&selection.name))?;
        let owner = format!("{} '{}'", self.slot, selection.name);
        let params = entry.schema.resolve(&owner, &selection.params, seed)?;
        (entry.factory)(&params)
    }

    /// `selection` when given, the default entry with default parameters
    /// otherwise.
    pub fn build_or_default(&self, selection: Option<&ModelSelection>, seed: u64) -> SimResult<Box<T>> {
        match selection {
            Some(selection) => self.build(selection, seed),
            None => {
                let name = self.default.as_deref().ok_or_else(|| self.unknown("<default>"))?;
                self.build(&ModelSelection::named(name), seed)
            }
        }
    }

    fn unknown(&self, name: &str) -> SimError {
        SimError::UnknownModel {
            slot: self.slot,
            name: name.to_string(),
        }
    }
}

/// Node behaviors and one catalog per model slot.
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub nodes: Catalog<dyn NodeBehavior>,
    pub connectivity: Catalog<dyn ConnectivityModel>,
    pub mobility: Catalog<dyn MobilityModel>,
    pub interference: Catalog<dyn InterferenceModel>,
    pub reliability: Catalog<dyn ReliabilityModel>,
    pub transmission: Catalog<dyn TransmissionModel>,
    pub distribution: Catalog<dyn DistributionModel>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Project {
            name: name.into(),
            nodes: Catalog::new("node"),
            connectivity: Catalog::new("connectivity"),
            mobility: Catalog::new("mobility"),
            interference: Catalog::new("interference"),
            reliability: Catalog::new("reliability"),
            transmission: Catalog::new("transmission"),
            distribution: Catalog::new("distribution"),
        }
    }

    pub fn build_node(&self, kind: &str, params: &serde_json::Value, seed: u64) -> SimResult<Box<dyn NodeBehavior>> {
        if !self.nodes.contains(kind) {
            return Err(SimError::UnknownNodeKind(kind.to_string()));
        }
        self.nodes.build(&ModelSelection::new(kind, params.clone()), seed)
    }

    /// One model per slot: the selected one, or the project default.
    pub fn build_models(&self, selections: &ModelSelections, seed: u64) -> SimResult<ModelSet> {
        Ok(ModelSet {
            connectivity: self.connectivity.build_or_default(selections.connectivity.as_ref(), seed)?,
            mobility: self.mobility.build_or_default(selections.mobility.as_ref(), seed)?,
            interference: self.interference.build_or_default(selections.interference.as_ref(), seed)?,
            reliability: self.reliability.build_or_default(selections.reliability.as_ref(), seed)?,
            transmission: self.transmission.build_or_default(selections.transmission.as_ref(), seed)?,
            distribution: self.distribution.build_or_default(selections.distribution.as_ref(), seed)?,
        })
    }
}

/// All known projects, by name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    projects: BTreeMap<String, Project>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the projects shipped with the crate.
    pub fn with_builtin() -> Self {
        let mut registry = Registry::new();
        registry.register(builtin::default_project());
        registry.register(builtin::lora_project());
        registry
    }

    pub fn register(&mut self, project: Project) {
        self.projects.insert(project.name.clone(), project);
    }

    pub fn project(&self, name: &str) -> SimResult<&Project> {
        self.projects
            .get(name)
            .ok_or_else(|| SimError::UnknownProject(name.to_string()))
    }

    pub fn project_names(&self) -> impl Iterator<Item = &str> {
        self.projects.keys().map(String::as_str)
    }
}
