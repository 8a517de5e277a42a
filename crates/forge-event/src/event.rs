//! Pipeline events and topics
//!
//! Events are facts: immutable snapshots of something that already
//! happened. Every event belongs to exactly one [`Topic`]; subscribers
//! register per topic and the channel routes on
//! [`PipelineEvent::topic`].

use forge_artifact::{
    Artifact, HandleId, HttpMethod, IntegrationErrorKind, IntegrationRecord, IntegrationStage,
    TargetPath,
};
use std::fmt::{self, Display, Formatter};

/// Topics carried by the event channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// An artifact was generated (and persisted, when requested)
    Generated,
    /// An artifact was fully integrated
    IntegrationCompleted,
    /// Integration failed at some stage
    IntegrationFailed,
    /// An HTTP endpoint was bound into the route table
    ApiRegisterEndpoint,
    /// A module or behavioral unit was registered
    ModuleRegister,
}

impl Topic {
    /// Canonical wire name of the topic
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Generated => "code:generated",
            Topic::IntegrationCompleted => "integration:completed",
            Topic::IntegrationFailed => "integration:failed",
            Topic::ApiRegisterEndpoint => "api:register-endpoint",
            Topic::ModuleRegister => "module:register",
        }
    }
}

impl Display for Topic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events published by the pipeline core
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// `code:generated` — carries the full artifact
    Generated(Artifact),

    /// `integration:completed` — artifact plus its new registry record
    IntegrationCompleted {
        /// The integrated artifact
        artifact: Artifact,
        /// The record now visible in the module registry
        record: IntegrationRecord,
    },

    /// `integration:failed` — where and how integration failed
    IntegrationFailed {
        /// Identity of the failed artifact
        target_path: TargetPath,
        /// Stage in which the failure occurred
        stage: IntegrationStage,
        /// Coarse error classification
        error_kind: IntegrationErrorKind,
    },

    /// `api:register-endpoint` — a route binding became live
    EndpointRegistered {
        /// HTTP method of the new endpoint
        method: HttpMethod,
        /// Route of the new endpoint
        route: String,
        /// Handle of the loaded code backing the endpoint
        handle: HandleId,
    },

    /// `module:register` — a module or behavioral unit became live
    ModuleRegistered {
        /// Name the unit registered under
        name: String,
        /// Handle of the loaded code
        handle: HandleId,
    },
}

impl PipelineEvent {
    /// Topic this event is delivered on
    #[inline]
    #[must_use]
    pub fn topic(&self) -> Topic {
        match self {
            PipelineEvent::Generated(_) => Topic::Generated,
            PipelineEvent::IntegrationCompleted { .. } => Topic::IntegrationCompleted,
            PipelineEvent::IntegrationFailed { .. } => Topic::IntegrationFailed,
            PipelineEvent::EndpointRegistered { .. } => Topic::ApiRegisterEndpoint,
            PipelineEvent::ModuleRegistered { .. } => Topic::ModuleRegister,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_artifact::ArtifactKind;

    #[test]
    fn topic_wire_names() {
        assert_eq!(Topic::Generated.as_str(), "code:generated");
        assert_eq!(Topic::IntegrationFailed.as_str(), "integration:failed");
        assert_eq!(Topic::ApiRegisterEndpoint.as_str(), "api:register-endpoint");
        assert_eq!(Topic::ModuleRegister.as_str(), "module:register");
    }

    #[test]
    fn event_maps_to_its_topic() {
        let artifact = Artifact::new(
            "/gen/x".parse().unwrap(),
            ArtifactKind::Module,
            "{}".into(),
            false,
        );
        assert_eq!(
            PipelineEvent::Generated(artifact).topic(),
            Topic::Generated
        );

        let failed = PipelineEvent::IntegrationFailed {
            target_path: "/gen/x".parse().unwrap(),
            stage: IntegrationStage::Loading,
            error_kind: IntegrationErrorKind::Load,
        };
        assert_eq!(failed.topic(), Topic::IntegrationFailed);
    }
}
