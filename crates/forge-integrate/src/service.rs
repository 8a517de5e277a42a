//! The auto-integration service
//!
//! Subscribes to `code:generated`, drives each artifact through the
//! integration stage machine, wires it into its target subsystem, and
//! keeps the module registry current. All failures are caught at this
//! boundary and converted into `integration:failed` events; a malformed
//! generated artifact must never take down the host process.

use crate::config::IntegrationConfig;
use crate::error::{IntegrationError, LoadError, RegistrationError};
use crate::loader::{ArtifactLoader, LoaderRegistry};
use crate::registry::{FailureEntry, FailureLog, ModuleRegistry};
use crate::targets::{CapabilityIndex, ModuleTable, RouteTable};
use chrono::Utc;
use forge_artifact::stage::validate_transition;
use forge_artifact::{
    Artifact, ArtifactKind, ArtifactStore, IntegrationRecord, IntegrationStage, LoadedHandle,
    TargetPath,
};
use forge_event::{ChannelError, EventChannel, PipelineEvent, SubscriptionId, Topic};
use std::sync::Arc;

/// Integration target a kind maps to during classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationTarget {
    /// The HTTP route table
    Routes,
    /// The generic module table
    Modules,
    /// The capability index
    Capabilities,
}

/// Map an artifact kind to its integration target
///
/// The fallible half of classification is the loader dispatch table
/// lookup; a kind that made it through loading always has a target here.
#[must_use]
pub fn classify(kind: ArtifactKind) -> IntegrationTarget {
    match kind {
        ArtifactKind::Module => IntegrationTarget::Modules,
        ArtifactKind::Api => IntegrationTarget::Routes,
        ArtifactKind::BehavioralUnit => IntegrationTarget::Capabilities,
    }
}

/// Loads generated artifacts and wires them into live subsystems
pub struct AutoIntegrationService {
    config: IntegrationConfig,
    channel: Arc<EventChannel>,
    loaders: LoaderRegistry,
    routes: RouteTable,
    modules: ModuleTable,
    capabilities: CapabilityIndex,
    registry: ModuleRegistry,
    failures: FailureLog,
}

impl AutoIntegrationService {
    /// Create a service with default configuration and loaders
    #[must_use]
    pub fn new(channel: Arc<EventChannel>, store: Arc<ArtifactStore>) -> Self {
        Self::with_config(IntegrationConfig::default(), channel, store)
    }

    /// Create a service with custom configuration and default loaders
    #[must_use]
    pub fn with_config(
        config: IntegrationConfig,
        channel: Arc<EventChannel>,
        store: Arc<ArtifactStore>,
    ) -> Self {
        let loaders = LoaderRegistry::with_defaults(store);
        Self::with_loaders(config, channel, loaders)
    }

    /// Create a service with a custom loader dispatch table
    #[must_use]
    pub fn with_loaders(
        config: IntegrationConfig,
        channel: Arc<EventChannel>,
        loaders: LoaderRegistry,
    ) -> Self {
        let failures = FailureLog::new(config.max_failures_retained);
        Self {
            config,
            channel,
            loaders,
            routes: RouteTable::default(),
            modules: ModuleTable::default(),
            capabilities: CapabilityIndex::default(),
            registry: ModuleRegistry::new(),
            failures,
        }
    }

    /// Subscribe the service to `code:generated` on its channel
    ///
    /// Each delivery runs one integration to completion before the channel
    /// dispatches the next event, so artifacts for different target paths
    /// integrate in publish order without sub-step interleaving.
    ///
    /// # Errors
    /// Returns [`ChannelError::SubscriberLimit`] when the topic is full.
    pub fn attach(self: &Arc<Self>) -> Result<SubscriptionId, ChannelError> {
        let service = Arc::clone(self);
        self.channel.subscribe(Topic::Generated, move |event| {
            let service = Arc::clone(&service);
            async move {
                if let PipelineEvent::Generated(artifact) = event {
                    // Failures have already been converted into
                    // integration:failed events by integrate().
                    let _ = service.integrate(&artifact).await;
                }
            }
        })
    }

    /// Integrate one artifact
    ///
    /// Drives `received → loading → classifying → registering → completed`
    /// and publishes the target-specific registration event plus
    /// `integration:completed` on success.
    ///
    /// # Errors
    /// Any stage failure is published as `integration:failed`, recorded in
    /// the failure log, and returned. The registry is untouched on
    /// failure.
    pub async fn integrate(
        &self,
        artifact: &Artifact,
    ) -> Result<IntegrationRecord, IntegrationError> {
        match self.try_integrate(artifact).await {
            Ok(record) => Ok(record),
            Err(error) => {
                self.record_failure(artifact.target_path(), &error).await;
                Err(error)
            }
        }
    }

    async fn try_integrate(
        &self,
        artifact: &Artifact,
    ) -> Result<IntegrationRecord, IntegrationError> {
        let target = artifact.target_path();
        tracing::info!(target = %target, kind = %artifact.kind(), "integration received");

        self.enter(target, IntegrationStage::Received, IntegrationStage::Loading);
        let loader = self.loaders.get(artifact.kind())?;
        let handle = self.load_with_retry(loader.as_ref(), artifact).await?;

        self.enter(target, IntegrationStage::Loading, IntegrationStage::Classifying);
        let integration_target = classify(artifact.kind());

        self.enter(
            target,
            IntegrationStage::Classifying,
            IntegrationStage::Registering,
        );
        // Each table registration is an atomic validate-then-insert: on
        // error nothing was applied, so failure rollback reduces to not
        // having touched the registry yet. From here to the registry
        // insert there are no fallible operations and no await points.
        let registration_event =
            self.apply_registration(integration_target, target, &handle)?;

        let record = IntegrationRecord::new(target.clone(), handle, *artifact.content_hash());
        let prior = self.registry.insert(record.clone());
        if let Some(prior) = &prior {
            if prior.kind != record.kind {
                // Regeneration changed the kind; the old binding lives in
                // a different table and must not linger.
                self.teardown_binding(prior);
            }
        }
        self.enter(
            target,
            IntegrationStage::Registering,
            IntegrationStage::Completed,
        );

        self.channel.publish(registration_event).await;
        self.channel
            .publish(PipelineEvent::IntegrationCompleted {
                artifact: artifact.clone(),
                record: record.clone(),
            })
            .await;
        tracing::info!(
            target = %target,
            handle = %record.handle.id(),
            replaced = prior.is_some(),
            "integration completed"
        );
        Ok(record)
    }

    /// Snapshot of currently-integrated artifacts
    ///
    /// A copy of the registry at call time; never blocks on in-flight
    /// integrations.
    #[must_use]
    pub fn list_loaded(&self) -> Vec<IntegrationRecord> {
        self.registry.snapshot()
    }

    /// Explicitly unload a target path
    ///
    /// Removes the registry record and tears down its subsystem binding.
    /// Returns the removed record, or `None` when the path was not
    /// loaded.
    pub fn unload(&self, target: &TargetPath) -> Option<IntegrationRecord> {
        let record = self.registry.remove(target)?;
        self.teardown_binding(&record);
        tracing::info!(target = %target, "unloaded");
        Some(record)
    }

    /// Retained integration failures, oldest first
    #[must_use]
    pub fn recent_failures(&self) -> Vec<FailureEntry> {
        self.failures.entries()
    }

    /// The HTTP route table fed by api-kind integrations
    #[inline]
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// The generic module table fed by module-kind integrations
    #[inline]
    #[must_use]
    pub fn modules(&self) -> &ModuleTable {
        &self.modules
    }

    /// The capability index fed by behavioral-unit integrations
    #[inline]
    #[must_use]
    pub fn capabilities(&self) -> &CapabilityIndex {
        &self.capabilities
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    fn enter(&self, target: &TargetPath, from: IntegrationStage, to: IntegrationStage) {
        debug_assert!(validate_transition(from, to).is_ok());
        tracing::debug!(target = %target, %from, %to, "stage transition");
    }

    async fn load_with_retry(
        &self,
        loader: &dyn ArtifactLoader,
        artifact: &Artifact,
    ) -> Result<LoadedHandle, LoadError> {
        let mut attempt = 0u32;
        loop {
            let load = loader.load(artifact);
            let result = match self.config.load_timeout {
                Some(timeout) => match tokio::time::timeout(timeout, load).await {
                    Ok(result) => result,
                    Err(_) => Err(LoadError::Timeout {
                        elapsed_ms: timeout.as_millis() as u64,
                    }),
                },
                None => load.await,
            };
            match result {
                Ok(handle) => return Ok(handle),
                Err(error) if error.is_retryable() && attempt < self.config.load_retries => {
                    attempt += 1;
                    tracing::debug!(
                        target = %artifact.target_path(),
                        attempt,
                        max = self.config.load_retries,
                        "source unresolved, retrying load"
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }

    fn apply_registration(
        &self,
        integration_target: IntegrationTarget,
        target: &TargetPath,
        handle: &LoadedHandle,
    ) -> Result<PipelineEvent, RegistrationError> {
        match integration_target {
            IntegrationTarget::Routes => {
                let (method, route) =
                    handle
                        .route_binding()
                        .ok_or_else(|| RegistrationError::InvalidRoute {
                            route: String::new(),
                            reason: "api unit has no endpoint binding".into(),
                        })?;
                self.routes.register(target, method, route, handle.id())?;
                Ok(PipelineEvent::EndpointRegistered {
                    method,
                    route: route.to_string(),
                    handle: handle.id(),
                })
            }
            IntegrationTarget::Modules => {
                self.modules.register(target, handle)?;
                Ok(PipelineEvent::ModuleRegistered {
                    name: handle.name().to_string(),
                    handle: handle.id(),
                })
            }
            IntegrationTarget::Capabilities => {
                self.capabilities.register(target, handle)?;
                Ok(PipelineEvent::ModuleRegistered {
                    name: handle.name().to_string(),
                    handle: handle.id(),
                })
            }
        }
    }

    fn teardown_binding(&self, record: &IntegrationRecord) {
        match record.kind {
            ArtifactKind::Module => {
                self.modules.remove(&record.target_path);
            }
            ArtifactKind::Api => {
                self.routes.remove(&record.target_path);
            }
            ArtifactKind::BehavioralUnit => {
                self.capabilities.remove(&record.target_path);
            }
        }
    }

    async fn record_failure(&self, target: &TargetPath, error: &IntegrationError) {
        let stage = error.stage();
        let error_kind = error.error_kind();
        tracing::warn!(target = %target, %stage, %error_kind, %error, "integration failed");
        self.enter(target, stage, IntegrationStage::Failed);
        self.failures.push(FailureEntry {
            target_path: target.clone(),
            stage,
            error_kind,
            message: error.to_string(),
            failed_at: Utc::now(),
        });
        self.channel
            .publish(PipelineEvent::IntegrationFailed {
                target_path: target.clone(),
                stage,
                error_kind,
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassificationError;
    use forge_artifact::{
        HttpMethod, IntegrationErrorKind, ManifestBody, UnitManifest,
    };
    use parking_lot::Mutex;

    fn path(s: &str) -> TargetPath {
        s.parse().unwrap()
    }

    fn artifact_with_body(target: &str, kind: ArtifactKind, body: ManifestBody) -> Artifact {
        let target = path(target);
        let manifest = UnitManifest::new(target.clone(), "test unit", body);
        let source = serde_json::to_string_pretty(&manifest).unwrap();
        Artifact::new(target, kind, source, false)
    }

    fn module_artifact(target: &str, operations: &[&str]) -> Artifact {
        artifact_with_body(
            target,
            ArtifactKind::Module,
            ManifestBody::Module {
                operations: operations.iter().map(ToString::to_string).collect(),
            },
        )
    }

    fn api_artifact(target: &str, method: HttpMethod, route: &str) -> Artifact {
        artifact_with_body(
            target,
            ArtifactKind::Api,
            ManifestBody::Api {
                method,
                route: route.to_string(),
            },
        )
    }

    fn service() -> (tempfile::TempDir, Arc<EventChannel>, AutoIntegrationService) {
        let dir = tempfile::tempdir().unwrap();
        let channel = Arc::new(EventChannel::new());
        let store = Arc::new(ArtifactStore::new(dir.path()));
        let service = AutoIntegrationService::new(Arc::clone(&channel), store);
        (dir, channel, service)
    }

    #[test]
    fn classify_maps_kind_to_target() {
        assert_eq!(classify(ArtifactKind::Module), IntegrationTarget::Modules);
        assert_eq!(classify(ArtifactKind::Api), IntegrationTarget::Routes);
        assert_eq!(
            classify(ArtifactKind::BehavioralUnit),
            IntegrationTarget::Capabilities
        );
    }

    #[tokio::test]
    async fn module_integration_updates_registry_and_table() {
        let (_dir, _channel, service) = service();
        let artifact = module_artifact("/gen/strUtils", &["camelCase"]);

        let record = service.integrate(&artifact).await.unwrap();
        assert_eq!(record.kind, ArtifactKind::Module);

        let loaded = service.list_loaded();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].target_path.to_string(), "/gen/strUtils");
        assert_eq!(
            service.modules().operations_of("strUtils"),
            Some(vec!["camelCase".to_string()])
        );
    }

    #[tokio::test]
    async fn api_integration_binds_route() {
        let (_dir, _channel, service) = service();
        let artifact = api_artifact("/gen/status", HttpMethod::Get, "/api/system/status");

        let record = service.integrate(&artifact).await.unwrap();
        assert_eq!(
            service.routes().lookup(HttpMethod::Get, "/api/system/status"),
            Some(record.handle.id())
        );
    }

    #[tokio::test]
    async fn behavioral_unit_integration_indexes_capabilities() {
        let (_dir, _channel, service) = service();
        let artifact = artifact_with_body(
            "/gen/planner",
            ArtifactKind::BehavioralUnit,
            ManifestBody::BehavioralUnit {
                capabilities: vec!["plan".into()],
            },
        );

        service.integrate(&artifact).await.unwrap();
        assert_eq!(service.capabilities().providers_of("plan"), ["planner"]);
    }

    #[tokio::test]
    async fn reintegration_replaces_record_atomically() {
        let (_dir, _channel, service) = service();
        let first = module_artifact("/gen/strUtils", &["camelCase"]);
        let second = module_artifact("/gen/strUtils", &["camelCase", "kebabCase"]);

        let r1 = service.integrate(&first).await.unwrap();
        let r2 = service.integrate(&second).await.unwrap();
        assert_ne!(r1.handle.id(), r2.handle.id());

        let loaded = service.list_loaded();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].handle.id(), r2.handle.id());
        assert_eq!(
            service.modules().operations_of("strUtils"),
            Some(vec!["camelCase".to_string(), "kebabCase".to_string()])
        );
    }

    #[tokio::test]
    async fn kind_change_tears_down_old_binding() {
        let (_dir, _channel, service) = service();
        service
            .integrate(&module_artifact("/gen/morph", &["op"]))
            .await
            .unwrap();
        assert_eq!(service.modules().len(), 1);

        service
            .integrate(&api_artifact("/gen/morph", HttpMethod::Get, "/api/morph"))
            .await
            .unwrap();

        assert!(service.modules().is_empty());
        assert_eq!(service.routes().len(), 1);
        assert_eq!(service.list_loaded().len(), 1);
        assert_eq!(service.list_loaded()[0].kind, ArtifactKind::Api);
    }

    #[tokio::test]
    async fn registration_failure_leaves_registry_untouched() {
        let (_dir, channel, service) = service();

        let failures = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&failures);
        channel
            .subscribe(Topic::IntegrationFailed, move |event| {
                let sink = Arc::clone(&sink);
                async move {
                    if let PipelineEvent::IntegrationFailed { target_path, stage, .. } = event {
                        sink.lock().push((target_path.to_string(), stage));
                    }
                }
            })
            .unwrap();

        service
            .integrate(&api_artifact("/gen/a", HttpMethod::Get, "/api/x"))
            .await
            .unwrap();
        // Same route under a different target path conflicts at registering.
        let err = service
            .integrate(&api_artifact("/gen/b", HttpMethod::Get, "/api/x"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IntegrationError::Registration(RegistrationError::RouteConflict { .. })
        ));

        let loaded = service.list_loaded();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].target_path.to_string(), "/gen/a");

        let failures = failures.lock();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "/gen/b");
        assert_eq!(failures[0].1, IntegrationStage::Registering);
    }

    #[tokio::test]
    async fn missing_loader_is_a_classification_failure() {
        let channel = Arc::new(EventChannel::new());
        let service = AutoIntegrationService::with_loaders(
            IntegrationConfig::new(),
            Arc::clone(&channel),
            LoaderRegistry::new(),
        );

        let err = service
            .integrate(&module_artifact("/gen/x", &["op"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IntegrationError::Classification(ClassificationError::NoLoader(_))
        ));
        assert_eq!(err.stage(), IntegrationStage::Classifying);
        assert!(service.list_loaded().is_empty());

        let failures = service.recent_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].error_kind, IntegrationErrorKind::Classification);
    }

    #[tokio::test]
    async fn unload_removes_record_and_binding() {
        let (_dir, _channel, service) = service();
        let target = path("/gen/strUtils");
        service
            .integrate(&module_artifact("/gen/strUtils", &["camelCase"]))
            .await
            .unwrap();

        let removed = service.unload(&target).unwrap();
        assert_eq!(removed.target_path, target);
        assert!(service.list_loaded().is_empty());
        assert!(service.modules().is_empty());
        assert!(service.unload(&target).is_none());
    }

    #[tokio::test]
    async fn failure_log_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let channel = Arc::new(EventChannel::new());
        let store = Arc::new(ArtifactStore::new(dir.path()));
        let service = AutoIntegrationService::with_config(
            IntegrationConfig::new().with_max_failures_retained(2),
            Arc::clone(&channel),
            store,
        );

        for target in ["/gen/a", "/gen/b", "/gen/c"] {
            let broken = Artifact::new(
                path(target),
                ArtifactKind::Module,
                "not json".into(),
                false,
            );
            let _ = service.integrate(&broken).await;
        }

        let failures = service.recent_failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].target_path.to_string(), "/gen/b");
        assert_eq!(failures[1].target_path.to_string(), "/gen/c");
    }
}
