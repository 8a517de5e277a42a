//! Integration target subsystems
//!
//! One table per artifact kind: the HTTP route table, the generic module
//! table, and the capability index. All three key their entries by target
//! path, replace atomically on re-registration, and support removal so
//! failed or unloaded integrations can be rolled back.

use crate::error::RegistrationError;
use forge_artifact::{HandleId, HttpMethod, LoadedHandle, TargetPath};
use parking_lot::RwLock;
use std::collections::HashMap;

/// A live route binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteBinding {
    /// HTTP method of the endpoint
    pub method: HttpMethod,
    /// Route path
    pub route: String,
    /// Handle of the code backing the endpoint
    pub handle: HandleId,
}

/// HTTP route table fed by api-kind integrations
///
/// The HTTP front door resolves incoming requests against this table; the
/// pipeline only inserts and removes bindings.
#[derive(Debug, Default)]
pub struct RouteTable {
    inner: RwLock<HashMap<TargetPath, RouteBinding>>,
}

impl RouteTable {
    /// Bind a route for a target path, replacing the target's previous
    /// binding
    ///
    /// Returns the displaced binding so a failed integration can restore
    /// it.
    ///
    /// # Errors
    /// - [`RegistrationError::InvalidRoute`] for malformed routes
    /// - [`RegistrationError::RouteConflict`] when another target path
    ///   already owns the method/route pair
    pub fn register(
        &self,
        target: &TargetPath,
        method: HttpMethod,
        route: &str,
        handle: HandleId,
    ) -> Result<Option<RouteBinding>, RegistrationError> {
        if !route.starts_with('/') {
            return Err(RegistrationError::InvalidRoute {
                route: route.to_string(),
                reason: "must start with '/'".into(),
            });
        }
        if route.chars().any(char::is_whitespace) {
            return Err(RegistrationError::InvalidRoute {
                route: route.to_string(),
                reason: "must not contain whitespace".into(),
            });
        }

        let mut inner = self.inner.write();
        if let Some((existing, _)) = inner
            .iter()
            .find(|(path, b)| *path != target && b.method == method && b.route == route)
        {
            return Err(RegistrationError::RouteConflict {
                method,
                route: route.to_string(),
                existing: existing.clone(),
            });
        }
        let displaced = inner.insert(
            target.clone(),
            RouteBinding {
                method,
                route: route.to_string(),
                handle,
            },
        );
        Ok(displaced)
    }

    /// Remove the binding of a target path
    pub fn remove(&self, target: &TargetPath) -> Option<RouteBinding> {
        self.inner.write().remove(target)
    }

    /// Resolve a method/route pair to the backing handle
    #[must_use]
    pub fn lookup(&self, method: HttpMethod, route: &str) -> Option<HandleId> {
        self.inner
            .read()
            .values()
            .find(|b| b.method == method && b.route == route)
            .map(|b| b.handle)
    }

    /// Number of live bindings
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// Entry in the generic module table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry {
    /// Name the module registered under
    pub name: String,
    /// Exported operation names
    pub operations: Vec<String>,
    /// Handle of the loaded code
    pub handle: HandleId,
}

/// Generic module table fed by module-kind integrations
#[derive(Debug, Default)]
pub struct ModuleTable {
    inner: RwLock<HashMap<TargetPath, ModuleEntry>>,
}

impl ModuleTable {
    /// Register a loaded module under its target path, replacing the
    /// target's previous entry
    ///
    /// # Errors
    /// Returns [`RegistrationError::EmptyExports`] when the handle
    /// exports nothing.
    pub fn register(
        &self,
        target: &TargetPath,
        handle: &LoadedHandle,
    ) -> Result<Option<ModuleEntry>, RegistrationError> {
        if handle.exports().is_empty() {
            return Err(RegistrationError::EmptyExports {
                name: handle.name().to_string(),
            });
        }
        let entry = ModuleEntry {
            name: handle.name().to_string(),
            operations: handle.exports().to_vec(),
            handle: handle.id(),
        };
        Ok(self.inner.write().insert(target.clone(), entry))
    }

    /// Remove the entry of a target path
    pub fn remove(&self, target: &TargetPath) -> Option<ModuleEntry> {
        self.inner.write().remove(target)
    }

    /// Operations exported by a module name
    #[must_use]
    pub fn operations_of(&self, name: &str) -> Option<Vec<String>> {
        self.inner
            .read()
            .values()
            .find(|e| e.name == name)
            .map(|e| e.operations.clone())
    }

    /// Number of registered modules
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// Entry in the capability index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityEntry {
    /// Name the unit registered under
    pub name: String,
    /// Capability names the unit provides
    pub capabilities: Vec<String>,
    /// Handle of the loaded code
    pub handle: HandleId,
}

/// Capability index fed by behavioral-unit integrations
#[derive(Debug, Default)]
pub struct CapabilityIndex {
    inner: RwLock<HashMap<TargetPath, CapabilityEntry>>,
}

impl CapabilityIndex {
    /// Register a capability set under its target path, replacing the
    /// target's previous entry
    ///
    /// # Errors
    /// Returns [`RegistrationError::EmptyExports`] when the handle
    /// declares no capabilities.
    pub fn register(
        &self,
        target: &TargetPath,
        handle: &LoadedHandle,
    ) -> Result<Option<CapabilityEntry>, RegistrationError> {
        if handle.exports().is_empty() {
            return Err(RegistrationError::EmptyExports {
                name: handle.name().to_string(),
            });
        }
        let entry = CapabilityEntry {
            name: handle.name().to_string(),
            capabilities: handle.exports().to_vec(),
            handle: handle.id(),
        };
        Ok(self.inner.write().insert(target.clone(), entry))
    }

    /// Remove the entry of a target path
    pub fn remove(&self, target: &TargetPath) -> Option<CapabilityEntry> {
        self.inner.write().remove(target)
    }

    /// Names of units providing a capability
    #[must_use]
    pub fn providers_of(&self, capability: &str) -> Vec<String> {
        self.inner
            .read()
            .values()
            .filter(|e| e.capabilities.iter().any(|c| c == capability))
            .map(|e| e.name.clone())
            .collect()
    }

    /// Number of registered units
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the index is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
