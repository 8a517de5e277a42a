//! Artifact loaders
//!
//! The loading capability: given an artifact descriptor, produce an
//! invocable handle. One loader exists per artifact kind and the service
//! dispatches through a table keyed by kind — an artifact kind with no
//! table entry cannot be classified into an integration target and fails
//! with [`ClassificationError`].

use crate::error::{ClassificationError, LoadError};
use async_trait::async_trait;
use forge_artifact::{
    Artifact, ArtifactKind, ArtifactStore, ContentHash, LoadedHandle, UnitManifest,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Produce an invocable handle from an artifact descriptor
#[async_trait]
pub trait ArtifactLoader: std::fmt::Debug + Send + Sync {
    /// The artifact kind this loader handles
    fn kind(&self) -> ArtifactKind;

    /// Load the artifact into an executable handle
    ///
    /// # Errors
    /// Returns [`LoadError`] when the source is unresolved, fails to
    /// parse, or violates a kind-specific invariant.
    async fn load(&self, artifact: &Artifact) -> Result<LoadedHandle, LoadError>;
}

/// Resolve the source text of an artifact
///
/// Persisted artifacts are read back from storage — the integrity check
/// guards against a truncated or stale write — while unpersisted ones are
/// loaded from the in-event source text.
async fn resolve_source(store: &ArtifactStore, artifact: &Artifact) -> Result<String, LoadError> {
    if !artifact.persisted() {
        return Ok(artifact.source_text().to_string());
    }
    let text = store
        .read(artifact.target_path())
        .await
        .map_err(|source| LoadError::Unresolved {
            location: store.location_of(artifact.target_path()),
            source,
        })?;
    let actual = ContentHash::compute(text.as_bytes());
    if &actual != artifact.content_hash() {
        return Err(LoadError::IntegrityMismatch {
            expected: *artifact.content_hash(),
            actual,
        });
    }
    Ok(text)
}

/// Parse resolved source into a manifest consistent with the artifact
fn parse_manifest(artifact: &Artifact, source: &str) -> Result<UnitManifest, LoadError> {
    let manifest: UnitManifest = serde_json::from_str(source)?;
    if manifest.kind() != artifact.kind() {
        return Err(LoadError::KindMismatch {
            manifest: manifest.kind(),
            artifact: artifact.kind(),
        });
    }
    if manifest.target_path != *artifact.target_path() {
        return Err(LoadError::TargetMismatch {
            manifest: manifest.target_path.clone(),
            artifact: artifact.target_path().clone(),
        });
    }
    Ok(manifest)
}

/// Loader for module-kind artifacts
#[derive(Debug)]
pub struct ModuleLoader {
    store: Arc<ArtifactStore>,
}

impl ModuleLoader {
    /// Create a module loader resolving persisted sources from `store`
    #[must_use]
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ArtifactLoader for ModuleLoader {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Module
    }

    async fn load(&self, artifact: &Artifact) -> Result<LoadedHandle, LoadError> {
        let source = resolve_source(&self.store, artifact).await?;
        let manifest = parse_manifest(artifact, &source)?;
        if manifest.exports().is_empty() {
            return Err(LoadError::InvalidUnit(format!(
                "module {:?} exports no operations",
                manifest.name
            )));
        }
        Ok(LoadedHandle::new(manifest))
    }
}

/// Loader for api-kind artifacts
#[derive(Debug)]
pub struct ApiLoader {
    store: Arc<ArtifactStore>,
}

impl ApiLoader {
    /// Create an api loader resolving persisted sources from `store`
    #[must_use]
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ArtifactLoader for ApiLoader {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Api
    }

    async fn load(&self, artifact: &Artifact) -> Result<LoadedHandle, LoadError> {
        let source = resolve_source(&self.store, artifact).await?;
        let manifest = parse_manifest(artifact, &source)?;
        if manifest.route_binding().is_none() {
            return Err(LoadError::InvalidUnit(format!(
                "api unit {:?} has no endpoint binding",
                manifest.name
            )));
        }
        Ok(LoadedHandle::new(manifest))
    }
}

/// Loader for behavioral-unit artifacts
#[derive(Debug)]
pub struct BehavioralUnitLoader {
    store: Arc<ArtifactStore>,
}

impl BehavioralUnitLoader {
    /// Create a behavioral-unit loader resolving persisted sources from
    /// `store`
    #[must_use]
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ArtifactLoader for BehavioralUnitLoader {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::BehavioralUnit
    }

    async fn load(&self, artifact: &Artifact) -> Result<LoadedHandle, LoadError> {
        let source = resolve_source(&self.store, artifact).await?;
        let manifest = parse_manifest(artifact, &source)?;
        if manifest.exports().is_empty() {
            return Err(LoadError::InvalidUnit(format!(
                "behavioral unit {:?} declares no capabilities",
                manifest.name
            )));
        }
        Ok(LoadedHandle::new(manifest))
    }
}

/// Dispatch table of loaders keyed by artifact kind
pub struct LoaderRegistry {
    loaders: HashMap<ArtifactKind, Arc<dyn ArtifactLoader>>,
}

impl LoaderRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            loaders: HashMap::new(),
        }
    }

    /// Registry with the built-in loader for every kind
    #[must_use]
    pub fn with_defaults(store: Arc<ArtifactStore>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ModuleLoader::new(Arc::clone(&store))));
        registry.register(Arc::new(ApiLoader::new(Arc::clone(&store))));
        registry.register(Arc::new(BehavioralUnitLoader::new(store)));
        registry
    }

    /// Register a loader under its kind, replacing any existing one
    pub fn register(&mut self, loader: Arc<dyn ArtifactLoader>) {
        self.loaders.insert(loader.kind(), loader);
    }

    /// Look up the loader for a kind
    ///
    /// # Errors
    /// Returns [`ClassificationError::NoLoader`] when the table has no
    /// entry for the kind.
    pub fn get(&self, kind: ArtifactKind) -> Result<Arc<dyn ArtifactLoader>, ClassificationError> {
        self.loaders
            .get(&kind)
            .map(Arc::clone)
            .ok_or(ClassificationError::NoLoader(kind))
    }

    /// Kinds with a registered loader
    #[must_use]
    pub fn kinds(&self) -> Vec<ArtifactKind> {
        self.loaders.keys().copied().collect()
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
