//! Parameter registry service for name-to-definition lookups
//!
//! Codecs resolve every column name through a [`ParameterRegistry`] to learn
//! its display order, expected unit, value format and valid range. The
//! registry is shared immutably between readers as `Arc<dyn ParameterRegistry>`.

use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

pub mod builtin;
pub mod loader;
pub mod parameter;

#[cfg(test)]
pub mod tests;

// Re-export key types for convenience
pub use parameter::{FormatKind, Parameter, ValueFormat};

/// Lookup capability consumed by the data model and codecs
pub trait ParameterRegistry: Send + Sync + std::fmt::Debug {
    /// Resolve a parameter by canonical name or alias
    fn lookup(&self, name: &str) -> Result<Arc<Parameter>>;
}

/// In-memory registry indexed by canonical name, with alias resolution
#[derive(Debug, Clone, Default)]
pub struct StandardRegistry {
    pub(crate) parameters: HashMap<String, Arc<Parameter>>,
    pub(crate) aliases: HashMap<String, String>,
}

impl StandardRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in parameter table
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for parameter in builtin::builtin_parameters() {
            // The built-in table has unique names and aliases
            let _ = registry.insert(parameter);
        }
        registry
    }

    /// Build a registry from explicit definitions
    pub fn from_parameters(parameters: impl IntoIterator<Item = Parameter>) -> Result<Self> {
        let mut registry = Self::new();
        for parameter in parameters {
            registry.insert(parameter)?;
        }
        Ok(registry)
    }

    /// Add a definition; names and aliases must not collide
    pub fn insert(&mut self, parameter: Parameter) -> Result<()> {
        if self.contains(&parameter.name) {
            return Err(Error::registry(format!(
                "Parameter '{}' defined twice",
                parameter.name
            )));
        }
        for alias in &parameter.aliases {
            if self.contains(alias) || alias == &parameter.name {
                return Err(Error::registry(format!(
                    "Alias '{}' of '{}' collides with an existing name",
                    alias, parameter.name
                )));
            }
        }

        for alias in &parameter.aliases {
            self.aliases.insert(alias.clone(), parameter.name.clone());
        }
        self.parameters
            .insert(parameter.name.clone(), Arc::new(parameter));
        Ok(())
    }

    /// Whether a name or alias is known
    pub fn contains(&self, name: &str) -> bool {
        self.parameters.contains_key(name) || self.aliases.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// All definitions in display order
    pub fn parameters(&self) -> Vec<Arc<Parameter>> {
        let mut all: Vec<_> = self.parameters.values().cloned().collect();
        all.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        all
    }
}

impl ParameterRegistry for StandardRegistry {
    fn lookup(&self, name: &str) -> Result<Arc<Parameter>> {
        let canonical = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        self.parameters
            .get(canonical)
            .cloned()
            .ok_or_else(|| Error::unknown_parameter(name))
    }
}
