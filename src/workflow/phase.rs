//! Workflow phases, the pure transition function, and the phase -> controls
//! projection

use thiserror::Error;

use crate::api::Operation;

/// Where the itinerary workflow currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    /// Form not yet accepted by the server
    Idle,
    /// `/submit` in flight
    Submitting,
    /// Stable: submission acknowledged, maybe with an itinerary
    Ready,
    /// First generation or regeneration in flight
    Generating,
    /// Feedback revision in flight
    Revising,
    /// `/finalize_itinerary` in flight
    Finalizing,
    /// Terminal: download link available
    Finalized,
}

/// Input to [`WorkflowPhase::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowEvent {
    Requested(Operation),
    Succeeded(Operation),
    Failed(Operation),
}

/// Rejected transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("another request is in flight ({0:?})")]
    Busy(WorkflowPhase),
    #[error("the trip has not been submitted yet")]
    NotSubmitted,
    #[error("the trip was already submitted")]
    AlreadySubmitted,
    #[error("no itinerary has been generated yet")]
    NoDocument,
    #[error("the itinerary is already finalized")]
    AlreadyFinalized,
    #[error("{event:?} does not apply in phase {phase:?}")]
    Unexpected {
        phase: WorkflowPhase,
        event: WorkflowEvent,
    },
}

impl WorkflowPhase {
    /// Phases with a request in flight
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            WorkflowPhase::Submitting
                | WorkflowPhase::Generating
                | WorkflowPhase::Revising
                | WorkflowPhase::Finalizing
        )
    }

    /// The in-flight phase an operation puts the workflow in
    pub fn in_flight(operation: Operation) -> Self {
        match operation {
            Operation::Submit => WorkflowPhase::Submitting,
            Operation::Generate => WorkflowPhase::Generating,
            Operation::Revise => WorkflowPhase::Revising,
            Operation::Finalize => WorkflowPhase::Finalizing,
        }
    }

    /// Compute the next phase. Pure: the caller commits the result.
    ///
    /// `has_document` is whether an itinerary has been generated; revising
    /// and finalizing need one.
    pub fn apply(self, event: WorkflowEvent, has_document: bool) -> Result<Self, TransitionError> {
        match event {
            WorkflowEvent::Requested(operation) => self.request(operation, has_document),
            WorkflowEvent::Succeeded(operation) | WorkflowEvent::Failed(operation)
                if self != Self::in_flight(operation) =>
            {
                Err(TransitionError::Unexpected { phase: self, event })
            }
            WorkflowEvent::Succeeded(Operation::Finalize) => Ok(WorkflowPhase::Finalized),
            WorkflowEvent::Succeeded(_) => Ok(WorkflowPhase::Ready),
            WorkflowEvent::Failed(Operation::Submit) => Ok(WorkflowPhase::Idle),
            WorkflowEvent::Failed(_) => Ok(WorkflowPhase::Ready),
        }
    }

    fn request(self, operation: Operation, has_document: bool) -> Result<Self, TransitionError> {
        if self.is_transient() {
            return Err(TransitionError::Busy(self));
        }
        match (self, operation) {
            (WorkflowPhase::Finalized, _) => Err(TransitionError::AlreadyFinalized),
            (WorkflowPhase::Idle, Operation::Submit) => Ok(WorkflowPhase::Submitting),
            (_, Operation::Submit) => Err(TransitionError::AlreadySubmitted),
            (WorkflowPhase::Idle, _) => Err(TransitionError::NotSubmitted),
            (_, Operation::Generate) => Ok(WorkflowPhase::Generating),
            (_, _) if !has_document => Err(TransitionError::NoDocument),
            (_, op) => Ok(Self::in_flight(op)),
        }
    }
}

/// How one trigger control should look
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlView {
    pub label: &'static str,
    pub enabled: bool,
    pub visible: bool,
}

/// Projection of the workflow onto every control on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowView {
    /// The multi-step form (replaced by the success panel after submit)
    pub form_visible: bool,
    pub submit: ControlView,
    pub generate: ControlView,
    pub update: ControlView,
    pub finalize: ControlView,
    /// Discard this trip and start over with an empty form
    pub restart: ControlView,
    pub feedback_visible: bool,
    pub itinerary_visible: bool,
    pub download_visible: bool,
}

pub const SUBMIT_LABEL: &str = "Plan My Trip";
pub const SUBMITTING_LABEL: &str = "Planning...";
pub const GENERATE_LABEL: &str = "Generate Itinerary with AI";
pub const GENERATING_LABEL: &str = "Generating Itinerary... (This may take a moment)";
pub const REGENERATE_LABEL: &str = "Regenerate Itinerary";
pub const UPDATE_LABEL: &str = "Update Itinerary";
pub const UPDATING_LABEL: &str = "Updating...";
pub const FINALIZE_LABEL: &str = "Finalize & Download PDF";
pub const FINALIZING_LABEL: &str = "Finalizing...";
pub const FINALIZED_LABEL: &str = "Finalized!";
pub const PLAN_ANOTHER_LABEL: &str = "Plan Another Trip";

/// Derive every control's label, enabled and visible state.
///
/// Every trigger is disabled while any request is in flight, so at most one
/// request can exist at a time. A failed request returns to the stable
/// phase, which brings back the pre-request labels.
pub fn project(phase: WorkflowPhase, has_document: bool) -> WorkflowView {
    use WorkflowPhase as P;

    let submitted = !matches!(phase, P::Idle | P::Submitting);
    let ready = phase == P::Ready;

    let submit = ControlView {
        label: if phase == P::Submitting {
            SUBMITTING_LABEL
        } else {
            SUBMIT_LABEL
        },
        enabled: phase == P::Idle,
        visible: !submitted,
    };

    let generate = ControlView {
        label: match phase {
            P::Generating => GENERATING_LABEL,
            _ if has_document => REGENERATE_LABEL,
            _ => GENERATE_LABEL,
        },
        enabled: ready,
        visible: submitted,
    };

    let update = ControlView {
        label: if phase == P::Revising {
            UPDATING_LABEL
        } else {
            UPDATE_LABEL
        },
        enabled: ready && has_document,
        visible: submitted && has_document,
    };

    let finalize = ControlView {
        label: match phase {
            P::Finalizing => FINALIZING_LABEL,
            P::Finalized => FINALIZED_LABEL,
            _ => FINALIZE_LABEL,
        },
        enabled: ready && has_document,
        visible: submitted && has_document,
    };

    let restart = ControlView {
        label: PLAN_ANOTHER_LABEL,
        enabled: submitted && !phase.is_transient(),
        visible: submitted,
    };

    WorkflowView {
        form_visible: !submitted,
        submit,
        generate,
        update,
        finalize,
        restart,
        feedback_visible: submitted && has_document,
        itinerary_visible: has_document,
        download_visible: phase == P::Finalized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::WorkflowEvent::{Failed, Requested, Succeeded};

    const ALL_OPS: [Operation; 4] = [
        Operation::Submit,
        Operation::Generate,
        Operation::Revise,
        Operation::Finalize,
    ];

    #[test]
    fn test_submit_lifecycle() {
        let phase = WorkflowPhase::Idle;
        let submitting = phase.apply(Requested(Operation::Submit), false).unwrap();
        assert_eq!(submitting, WorkflowPhase::Submitting);
        assert_eq!(
            submitting.apply(Succeeded(Operation::Submit), false),
            Ok(WorkflowPhase::Ready)
        );
        assert_eq!(
            submitting.apply(Failed(Operation::Submit), false),
            Ok(WorkflowPhase::Idle)
        );
    }

    #[test]
    fn test_generation_needs_submission() {
        assert_eq!(
            WorkflowPhase::Idle.apply(Requested(Operation::Generate), false),
            Err(TransitionError::NotSubmitted)
        );
        assert_eq!(
            WorkflowPhase::Ready.apply(Requested(Operation::Generate), false),
            Ok(WorkflowPhase::Generating)
        );
    }

    #[test]
    fn test_revise_and_finalize_need_a_document() {
        for op in [Operation::Revise, Operation::Finalize] {
            assert_eq!(
                WorkflowPhase::Ready.apply(Requested(op), false),
                Err(TransitionError::NoDocument)
            );
        }
        assert_eq!(
            WorkflowPhase::Ready.apply(Requested(Operation::Revise), true),
            Ok(WorkflowPhase::Revising)
        );
        assert_eq!(
            WorkflowPhase::Ready.apply(Requested(Operation::Finalize), true),
            Ok(WorkflowPhase::Finalizing)
        );
    }

    #[test]
    fn test_no_request_while_one_is_in_flight() {
        for busy in [
            WorkflowPhase::Submitting,
            WorkflowPhase::Generating,
            WorkflowPhase::Revising,
            WorkflowPhase::Finalizing,
        ] {
            for op in ALL_OPS {
                assert_eq!(
                    busy.apply(Requested(op), true),
                    Err(TransitionError::Busy(busy))
                );
            }
        }
    }

    #[test]
    fn test_failures_return_to_ready() {
        for op in [Operation::Generate, Operation::Revise, Operation::Finalize] {
            let in_flight = WorkflowPhase::in_flight(op);
            assert_eq!(in_flight.apply(Failed(op), true), Ok(WorkflowPhase::Ready));
        }
    }

    #[test]
    fn test_finalized_is_terminal() {
        let done = WorkflowPhase::Finalizing
            .apply(Succeeded(Operation::Finalize), true)
            .unwrap();
        assert_eq!(done, WorkflowPhase::Finalized);
        for op in ALL_OPS {
            assert_eq!(
                done.apply(Requested(op), true),
                Err(TransitionError::AlreadyFinalized)
            );
        }
    }

    #[test]
    fn test_completion_must_match_in_flight_operation() {
        let err = WorkflowPhase::Generating
            .apply(Succeeded(Operation::Finalize), true)
            .unwrap_err();
        assert!(matches!(err, TransitionError::Unexpected { .. }));

        assert!(WorkflowPhase::Ready
            .apply(Failed(Operation::Generate), true)
            .is_err());
    }

    #[test]
    fn test_projection_before_submit() {
        let view = project(WorkflowPhase::Idle, false);
        assert!(view.form_visible);
        assert!(view.submit.visible && view.submit.enabled);
        assert_eq!(view.submit.label, SUBMIT_LABEL);
        assert!(!view.generate.visible);

        let view = project(WorkflowPhase::Submitting, false);
        assert_eq!(view.submit.label, SUBMITTING_LABEL);
        assert!(!view.submit.enabled);
    }

    #[test]
    fn test_projection_generate_labels() {
        let view = project(WorkflowPhase::Ready, false);
        assert!(!view.form_visible);
        assert_eq!(view.generate.label, GENERATE_LABEL);
        assert!(view.generate.enabled);
        assert!(!view.feedback_visible && !view.finalize.visible);

        let view = project(WorkflowPhase::Generating, false);
        assert_eq!(view.generate.label, GENERATING_LABEL);
        assert!(!view.generate.enabled);

        let view = project(WorkflowPhase::Ready, true);
        assert_eq!(view.generate.label, REGENERATE_LABEL);
        assert!(view.feedback_visible && view.finalize.visible && view.update.visible);
    }

    #[test]
    fn test_projection_disables_everything_in_flight() {
        for phase in [
            WorkflowPhase::Generating,
            WorkflowPhase::Revising,
            WorkflowPhase::Finalizing,
        ] {
            let view = project(phase, true);
            assert!(!view.generate.enabled);
            assert!(!view.update.enabled);
            assert!(!view.finalize.enabled);
        }
        assert_eq!(project(WorkflowPhase::Revising, true).update.label, UPDATING_LABEL);
        assert_eq!(
            project(WorkflowPhase::Finalizing, true).finalize.label,
            FINALIZING_LABEL
        );
    }

    #[test]
    fn test_projection_finalized() {
        let view = project(WorkflowPhase::Finalized, true);
        assert_eq!(view.finalize.label, FINALIZED_LABEL);
        assert!(!view.finalize.enabled);
        assert!(view.download_visible);
        assert!(!view.generate.enabled);
        assert!(view.restart.enabled);
    }

    #[test]
    fn test_projection_plan_another_trip() {
        assert!(!project(WorkflowPhase::Idle, false).restart.visible);
        assert!(!project(WorkflowPhase::Submitting, false).restart.enabled);

        let view = project(WorkflowPhase::Ready, false);
        assert!(view.restart.visible && view.restart.enabled);
        assert_eq!(view.restart.label, PLAN_ANOTHER_LABEL);

        for phase in [
            WorkflowPhase::Generating,
            WorkflowPhase::Revising,
            WorkflowPhase::Finalizing,
        ] {
            let view = project(phase, true);
            assert!(view.restart.visible);
            assert!(!view.restart.enabled);
        }
    }

    #[test]
    fn test_failed_finalize_restores_retry_label() {
        let phase = WorkflowPhase::Finalizing
            .apply(Failed(Operation::Finalize), true)
            .unwrap();
        let view = project(phase, true);
        assert_eq!(view.finalize.label, FINALIZE_LABEL);
        assert!(view.finalize.enabled);
        assert!(!view.download_visible);
    }
}
