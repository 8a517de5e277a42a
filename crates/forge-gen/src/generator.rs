//! The artifact generator
//!
//! Owns the publish-after-persist ordering: when a request asks for
//! persistence, the durable write is acknowledged before the
//! `code:generated` event goes out, so a subscriber that immediately loads
//! the artifact from storage sees consistent content.

use crate::config::{GeneratorConfig, OverlapPolicy};
use crate::error::GenerationError;
use crate::render;
use dashmap::DashMap;
use forge_artifact::{Artifact, ArtifactStore, GenerationRequest, PersistenceError, TargetPath};
use forge_event::{EventChannel, PipelineEvent};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Turns generation requests into published artifacts
///
/// Requests sharing a target path are serialized through a per-path
/// exclusion slot; the configured [`OverlapPolicy`] decides whether a
/// second in-flight request is rejected or queued.
pub struct ArtifactGenerator {
    config: GeneratorConfig,
    channel: Arc<EventChannel>,
    store: ArtifactStore,
    in_flight: DashMap<TargetPath, Arc<Mutex<()>>>,
}

impl ArtifactGenerator {
    /// Create a generator publishing on `channel`
    #[must_use]
    pub fn new(config: GeneratorConfig, channel: Arc<EventChannel>) -> Self {
        let store = ArtifactStore::new(config.root_dir.clone());
        Self {
            config,
            channel,
            store,
            in_flight: DashMap::new(),
        }
    }

    /// The generator's artifact store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate an artifact from a request
    ///
    /// Validates, renders, persists when requested, then publishes
    /// `code:generated` carrying the full artifact. The publish does not
    /// happen until the durable write is acknowledged.
    ///
    /// Dropping the returned future before the publish step leaves no
    /// event behind and releases the per-path slot; at most an orphan
    /// file remains.
    ///
    /// # Errors
    /// - [`GenerationError::Validation`] when the kind-specific payload is
    ///   incomplete (no event is published)
    /// - [`GenerationError::PathInFlight`] under `OverlapPolicy::Reject`
    ///   when the path is already being generated
    /// - [`GenerationError::Persistence`] when the durable write fails or
    ///   times out
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<Artifact, GenerationError> {
        request.validate()?;
        let _slot = self.acquire_slot(&request.target_path).await?;

        tracing::info!(
            target = %request.target_path,
            kind = %request.kind(),
            purpose = %request.purpose,
            persist = request.persist,
            "generating artifact"
        );

        let source = render::render_source(&request)?;
        let persisted = if request.persist {
            self.persist(&request.target_path, &source).await?;
            true
        } else {
            false
        };

        let artifact = Artifact::new(
            request.target_path.clone(),
            request.kind(),
            source,
            persisted,
        );
        let delivered = self
            .channel
            .publish(PipelineEvent::Generated(artifact.clone()))
            .await;
        tracing::debug!(
            target = %request.target_path,
            delivered,
            hash = %artifact.content_hash().short(),
            "published code:generated"
        );
        Ok(artifact)
    }

    async fn acquire_slot(
        &self,
        target: &TargetPath,
    ) -> Result<OwnedMutexGuard<()>, GenerationError> {
        let slot = {
            let entry = self.in_flight.entry(target.clone()).or_default();
            Arc::clone(entry.value())
        };
        match self.config.overlap {
            OverlapPolicy::Reject => slot
                .try_lock_owned()
                .map_err(|_| GenerationError::PathInFlight(target.clone())),
            OverlapPolicy::Queue => Ok(slot.lock_owned().await),
        }
    }

    async fn persist(
        &self,
        target: &TargetPath,
        source: &str,
    ) -> Result<(), GenerationError> {
        let write = self.store.write(target, source);
        match self.config.write_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, write).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(PersistenceError::Timeout {
                        location: self.store.location_of(target),
                        elapsed_ms: timeout.as_millis() as u64,
                    }
                    .into())
                }
            },
            None => write.await?,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_artifact::{ArtifactKind, HttpMethod, RequestPayload, ValidationError};
    use forge_event::Topic;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn module_request(path: &str) -> GenerationRequest {
        GenerationRequest::new(
            "utility",
            path.parse().unwrap(),
            "string helpers",
            RequestPayload::Module {
                exposed_operations: vec!["camelCase".into()],
            },
        )
    }

    fn generator(dir: &std::path::Path) -> (Arc<EventChannel>, ArtifactGenerator) {
        let channel = Arc::new(EventChannel::new());
        let generator =
            ArtifactGenerator::new(GeneratorConfig::new(dir), Arc::clone(&channel));
        (channel, generator)
    }

    #[tokio::test]
    async fn generate_publishes_generated_event() {
        let dir = tempfile::tempdir().unwrap();
        let (channel, generator) = generator(dir.path());

        let seen = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&seen);
        channel
            .subscribe(Topic::Generated, move |event| {
                let count = Arc::clone(&count);
                async move {
                    if let PipelineEvent::Generated(artifact) = event {
                        assert_eq!(artifact.kind(), ArtifactKind::Module);
                        assert!(artifact.verify());
                        count.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
            .unwrap();

        let artifact = generator.generate(module_request("/gen/strUtils")).await.unwrap();
        assert!(!artifact.persisted());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalid_request_publishes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (channel, generator) = generator(dir.path());

        let seen = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&seen);
        channel
            .subscribe(Topic::Generated, move |_| {
                let count = Arc::clone(&count);
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                }
            })
            .unwrap();

        let request = GenerationRequest::new(
            "endpoint",
            "/gen/bad".parse().unwrap(),
            "",
            RequestPayload::Api {
                method: HttpMethod::Get,
                route: String::new(),
            },
        );
        let err = generator.generate(request).await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Validation(ValidationError::MissingRoute)
        ));
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn persisted_source_is_visible_to_subscribers() {
        let dir = tempfile::tempdir().unwrap();
        let (channel, generator) = generator(dir.path());
        let store = generator.store().clone();

        let checked = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&checked);
        channel
            .subscribe(Topic::Generated, move |event| {
                let store = store.clone();
                let count = Arc::clone(&count);
                async move {
                    let PipelineEvent::Generated(artifact) = event else {
                        return;
                    };
                    // Publish-after-persist: the source must already be on disk.
                    let on_disk = store.read(artifact.target_path()).await.unwrap();
                    assert_eq!(on_disk, artifact.source_text());
                    count.fetch_add(1, Ordering::SeqCst);
                }
            })
            .unwrap();

        let artifact = generator
            .generate(module_request("/gen/persisted").with_persist(true))
            .await
            .unwrap();
        assert!(artifact.persisted());
        assert_eq!(checked.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reject_policy_refuses_overlapping_path() {
        let dir = tempfile::tempdir().unwrap();
        let (channel, generator) = generator(dir.path());
        let generator = Arc::new(generator);

        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        {
            let entered = Arc::clone(&entered);
            let release = Arc::clone(&release);
            channel
                .subscribe(Topic::Generated, move |_| {
                    let entered = Arc::clone(&entered);
                    let release = Arc::clone(&release);
                    async move {
                        entered.notify_one();
                        release.notified().await;
                    }
                })
                .unwrap();
        }

        let first = {
            let generator = Arc::clone(&generator);
            tokio::spawn(async move { generator.generate(module_request("/gen/busy")).await })
        };
        entered.notified().await;

        // First request still holds the slot while its publish is in flight.
        let err = generator
            .generate(module_request("/gen/busy"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::PathInFlight(_)));

        release.notify_one();
        first.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn queue_policy_serializes_same_path() {
        let dir = tempfile::tempdir().unwrap();
        let channel = Arc::new(EventChannel::new());
        let generator = Arc::new(ArtifactGenerator::new(
            GeneratorConfig::new(dir.path()).with_overlap(OverlapPolicy::Queue),
            Arc::clone(&channel),
        ));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let generator = Arc::clone(&generator);
            handles.push(tokio::spawn(async move {
                generator.generate(module_request("/gen/queued")).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
    }

    #[tokio::test]
    async fn distinct_paths_do_not_contend() {
        let dir = tempfile::tempdir().unwrap();
        let (_, generator) = generator(dir.path());
        let generator = Arc::new(generator);

        let a = {
            let generator = Arc::clone(&generator);
            tokio::spawn(async move { generator.generate(module_request("/gen/a")).await })
        };
        let b = {
            let generator = Arc::clone(&generator);
            tokio::spawn(async move { generator.generate(module_request("/gen/b")).await })
        };

        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();
        assert!(a.verify());
        assert!(b.verify());
        assert_ne!(a.target_path(), b.target_path());
    }
}
