//! The component registry.
//!
//! Maps component identifiers to their definitions. A registry is built once
//! at startup and is immutable afterwards, so it can be shared by `Arc`
//! across any number of concurrent dispatches.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::component::{Component, ComponentDef, TypedComponent};
use crate::error::{DispatchError, Result};

/// Immutable mapping from component id to definition.
pub struct Registry {
    components: BTreeMap<String, Arc<dyn ComponentDef>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up a component definition.
    pub fn get(&self, id: &str) -> Result<&dyn ComponentDef> {
        self.components
            .get(id)
            .map(|def| def.as_ref())
            .ok_or_else(|| DispatchError::UnknownComponent(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.components.contains_key(id)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("components", &self.components.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Collects component definitions before the registry is frozen.
#[derive(Default)]
pub struct RegistryBuilder {
    components: BTreeMap<String, Arc<dyn ComponentDef>>,
}

impl RegistryBuilder {
    /// Register a typed component under its `ID`.
    #[must_use]
    pub fn register<C: Component>(self, component: C) -> Self {
        self.register_def(TypedComponent::new(component))
    }

    /// Register an already-erased definition under its own id.
    ///
    /// A later registration with the same id replaces the earlier one.
    #[must_use]
    pub fn register_def(mut self, def: impl ComponentDef + 'static) -> Self {
        let id = def.id().to_string();
        if self.components.insert(id.clone(), Arc::new(def)).is_some() {
            tracing::warn!(component = %id, "component registered twice, keeping the latest");
        }
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            components: self.components,
        }
    }
}

lazy_static::lazy_static! {
    static ref GLOBAL: RwLock<Option<Arc<Registry>>> = RwLock::new(None);
}

/// Install the process-wide registry.
///
/// May be called once. Later calls fail with `RegistryAlreadyInstalled` and
/// leave the installed registry in place.
pub fn install(registry: Registry) -> Result<Arc<Registry>> {
    let mut slot = GLOBAL.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    if slot.is_some() {
        return Err(DispatchError::RegistryAlreadyInstalled);
    }
    let registry = Arc::new(registry);
    *slot = Some(registry.clone());
    tracing::debug!(components = registry.len(), "installed component registry");
    Ok(registry)
}

/// The process-wide registry, if installed.
pub fn global() -> Result<Arc<Registry>> {
    GLOBAL
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
        .ok_or(DispatchError::RegistryNotInstalled)
}
