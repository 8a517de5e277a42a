//! Integration lifecycle stages
//!
//! Every artifact moves through `received → loading → classifying →
//! registering → completed`; `failed` is terminal and reachable from the
//! three active stages. The transition table is the single source of truth
//! for what the integration service may do next.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Per-artifact integration stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationStage {
    /// Artifact received off the event channel
    Received,
    /// Obtaining an executable handle for the artifact's code
    Loading,
    /// Mapping the artifact kind to an integration target
    Classifying,
    /// Performing the kind-specific registration
    Registering,
    /// Terminal success
    Completed,
    /// Terminal failure
    Failed,
}

impl IntegrationStage {
    /// Lowercase stage name as carried in failure events
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationStage::Received => "received",
            IntegrationStage::Loading => "loading",
            IntegrationStage::Classifying => "classifying",
            IntegrationStage::Registering => "registering",
            IntegrationStage::Completed => "completed",
            IntegrationStage::Failed => "failed",
        }
    }

    /// Whether the stage is terminal
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, IntegrationStage::Completed | IntegrationStage::Failed)
    }
}

impl Display for IntegrationStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stages reachable from `from`
#[must_use]
pub fn allowed_transitions(from: IntegrationStage) -> Vec<IntegrationStage> {
    use IntegrationStage::*;
    match from {
        Received => vec![Loading],
        Loading => vec![Classifying, Failed],
        Classifying => vec![Registering, Failed],
        Registering => vec![Completed, Failed],
        Completed => vec![],
        Failed => vec![],
    }
}

/// Validates a stage transition
///
/// # Errors
/// Returns [`StageError::IllegalTransition`] when `to` is not reachable
/// from `from`.
pub fn validate_transition(
    from: IntegrationStage,
    to: IntegrationStage,
) -> Result<(), StageError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(StageError::IllegalTransition { from, to })
    }
}

/// Stage machine errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StageError {
    /// Transition not in the allowed table
    #[error("illegal integration stage transition: {from} -> {to}")]
    IllegalTransition {
        /// Stage transitioned from
        from: IntegrationStage,
        /// Stage transitioned to
        to: IntegrationStage,
    },
}

/// Coarse failure classification carried in `integration:failed` events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationErrorKind {
    /// Artifact source unresolved or failed to parse
    Load,
    /// No integration target for the artifact kind
    Classification,
    /// Target subsystem rejected the registration
    Registration,
}

impl IntegrationErrorKind {
    /// The stage at which this kind of error arises
    #[inline]
    #[must_use]
    pub fn stage(&self) -> IntegrationStage {
        match self {
            IntegrationErrorKind::Load => IntegrationStage::Loading,
            IntegrationErrorKind::Classification => IntegrationStage::Classifying,
            IntegrationErrorKind::Registration => IntegrationStage::Registering,
        }
    }

    /// Lowercase name as carried in failure events
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationErrorKind::Load => "load",
            IntegrationErrorKind::Classification => "classification",
            IntegrationErrorKind::Registration => "registration",
        }
    }
}

impl Display for IntegrationErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use IntegrationStage::*;

    #[test]
    fn happy_path_is_allowed() {
        for (from, to) in [
            (Received, Loading),
            (Loading, Classifying),
            (Classifying, Registering),
            (Registering, Completed),
        ] {
            assert!(validate_transition(from, to).is_ok());
        }
    }

    #[test]
    fn failure_reachable_from_active_stages() {
        for from in [Loading, Classifying, Registering] {
            assert!(validate_transition(from, Failed).is_ok());
        }
    }

    #[test]
    fn received_cannot_fail_directly() {
        assert!(validate_transition(Received, Failed).is_err());
    }

    #[test]
    fn terminal_stages_have_no_exits() {
        assert!(allowed_transitions(Completed).is_empty());
        assert!(allowed_transitions(Failed).is_empty());
        assert!(Completed.is_terminal());
        assert!(Failed.is_terminal());
        assert!(!Registering.is_terminal());
    }

    #[test]
    fn skipping_stages_is_illegal() {
        assert_eq!(
            validate_transition(Received, Registering),
            Err(StageError::IllegalTransition {
                from: Received,
                to: Registering
            })
        );
    }

    #[test]
    fn error_kind_maps_to_stage() {
        assert_eq!(IntegrationErrorKind::Load.stage(), Loading);
        assert_eq!(IntegrationErrorKind::Registration.stage(), Registering);
    }
}
