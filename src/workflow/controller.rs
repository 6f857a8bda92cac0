//! Post-submission itinerary workflow: submit, generate, revise, finalize

use crossterm::event::KeyCode;
use thiserror::Error;

use super::collage::CollageTemplate;
use super::document::{DownloadArtifact, ItineraryDocument};
use super::phase::{project, TransitionError, WorkflowEvent, WorkflowPhase, WorkflowView};
use crate::api::{
    ApiError, FinalizeRequest, GenerateRequest, GenerateResponse, ItineraryApi, Operation,
    SubmitResponse,
};
use crate::form::{FieldSchema, FieldType, FormField, FormState};

/// Shown when an update is requested with blank feedback
pub const EMPTY_FEEDBACK_MESSAGE: &str = "Please enter some feedback first.";

/// Requests the controller refuses to start
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Please enter some feedback first.")]
    EmptyFeedback,
}

/// A request the controller has committed to. The workflow is already in
/// the matching in-flight phase; [`PendingRequest::dispatch`] performs the
/// network call and the result goes back through
/// [`WorkflowController::complete`].
#[derive(Debug, Clone, PartialEq)]
pub enum PendingRequest {
    Submit(FormState),
    Generate(GenerateRequest),
    Finalize(FinalizeRequest),
}

impl PendingRequest {
    pub fn operation(&self) -> Operation {
        match self {
            PendingRequest::Submit(_) => Operation::Submit,
            PendingRequest::Generate(r) if r.is_revision() => Operation::Revise,
            PendingRequest::Generate(_) => Operation::Generate,
            PendingRequest::Finalize(_) => Operation::Finalize,
        }
    }

    /// Perform the network call
    pub async fn dispatch(self, api: &dyn ItineraryApi) -> Completion {
        match self {
            PendingRequest::Submit(form) => Completion::Submitted(api.submit(&form).await),
            PendingRequest::Generate(request) => Completion::Generated {
                operation: if request.is_revision() {
                    Operation::Revise
                } else {
                    Operation::Generate
                },
                result: api.generate(&request).await,
            },
            PendingRequest::Finalize(request) => Completion::Finalized(
                api.finalize(&request)
                    .await
                    .map(|response| api.resolve_url(&response.pdf_url)),
            ),
        }
    }
}

/// Result of a dispatched request
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Submitted(Result<SubmitResponse, ApiError>),
    Generated {
        operation: Operation,
        result: Result<GenerateResponse, ApiError>,
    },
    /// Resolved download URL on success
    Finalized(Result<String, ApiError>),
}

impl Completion {
    pub fn operation(&self) -> Operation {
        match self {
            Completion::Submitted(_) => Operation::Submit,
            Completion::Generated { operation, .. } => *operation,
            Completion::Finalized(_) => Operation::Finalize,
        }
    }
}

/// What the user should be told after a request completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Server accepted the trip; carries its confirmation message
    Submitted { message: String },
    /// A new itinerary replaced the previous one
    ItineraryReady { revised: bool },
    /// Download link is available
    Finalized { url: String },
    /// Request failed; the alert text to show
    Failed { operation: Operation, alert: String },
}

/// Owns everything that happens after the form is submitted.
///
/// Single writer: only this struct changes the phase, the document, or the
/// artifact, and it does so in [`begin`](Self::begin_generate)/[`complete`](Self::complete)
/// pairs so that a failure never leaves partial state behind.
#[derive(Debug)]
pub struct WorkflowController {
    phase: WorkflowPhase,
    form: Option<FormState>,
    confirmation: Option<String>,
    document: Option<ItineraryDocument>,
    collage: Option<CollageTemplate>,
    collage_url: Option<String>,
    artifact: Option<DownloadArtifact>,
    feedback: FormField,
    scroll_requested: bool,
}

impl WorkflowController {
    pub fn new(collage: Option<CollageTemplate>) -> Self {
        let feedback_schema = FieldSchema {
            name: "feedback".to_string(),
            label: "Feedback".to_string(),
            field_type: FieldType::String,
            required: false,
            default: None,
            options: Vec::new(),
            placeholder: Some("e.g. more museums, fewer early mornings".to_string()),
            max_length: None,
        };
        Self {
            phase: WorkflowPhase::Idle,
            form: None,
            confirmation: None,
            document: None,
            collage,
            collage_url: None,
            artifact: None,
            feedback: FormField::from_schema(&feedback_schema),
            scroll_requested: false,
        }
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.phase
    }

    pub fn view(&self) -> WorkflowView {
        project(self.phase, self.document.is_some())
    }

    pub fn is_busy(&self) -> bool {
        self.phase.is_transient()
    }

    /// Snapshot taken when submission began
    pub fn form(&self) -> Option<&FormState> {
        self.form.as_ref()
    }

    pub fn confirmation(&self) -> Option<&str> {
        self.confirmation.as_deref()
    }

    pub fn document(&self) -> Option<&ItineraryDocument> {
        self.document.as_ref()
    }

    pub fn collage_url(&self) -> Option<&str> {
        self.collage_url.as_deref()
    }

    pub fn artifact(&self) -> Option<&DownloadArtifact> {
        self.artifact.as_ref()
    }

    pub fn feedback_field(&self) -> &FormField {
        &self.feedback
    }

    pub fn feedback_text(&self) -> String {
        self.feedback.value()
    }

    pub fn set_feedback(&mut self, text: &str) {
        self.feedback.set_value(text);
    }

    pub fn handle_feedback_key(&mut self, key: KeyCode) -> bool {
        self.feedback.handle_key(key)
    }

    /// Whether the itinerary should be scrolled into view. Reading clears it.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_requested)
    }

    fn transition(&mut self, event: WorkflowEvent) -> Result<(), TransitionError> {
        let next = self.phase.apply(event, self.document.is_some())?;
        tracing::info!(from = ?self.phase, to = ?next, ?event, "workflow transition");
        self.phase = next;
        Ok(())
    }

    fn submitted_form(&self) -> Result<FormState, TransitionError> {
        self.form.clone().ok_or(TransitionError::NotSubmitted)
    }

    /// Start submitting the form snapshot
    pub fn begin_submit(&mut self, form: FormState) -> Result<PendingRequest, WorkflowError> {
        self.transition(WorkflowEvent::Requested(Operation::Submit))?;
        self.form = Some(form.clone());
        Ok(PendingRequest::Submit(form))
    }

    /// Start a first generation or a regeneration from the form alone
    pub fn begin_generate(&mut self) -> Result<PendingRequest, WorkflowError> {
        let event = WorkflowEvent::Requested(Operation::Generate);
        self.phase.apply(event, self.document.is_some())?;
        let request = GenerateRequest::initial(self.submitted_form()?);
        self.transition(event)?;
        Ok(PendingRequest::Generate(request))
    }

    /// Start a revision with the text in the feedback input. Blank feedback
    /// is rejected before anything changes.
    pub fn begin_revise(&mut self) -> Result<PendingRequest, WorkflowError> {
        let event = WorkflowEvent::Requested(Operation::Revise);
        self.phase.apply(event, self.document.is_some())?;

        let feedback = self.feedback.value();
        let feedback = feedback.trim();
        if feedback.is_empty() {
            return Err(WorkflowError::EmptyFeedback);
        }
        let current = self
            .document
            .as_ref()
            .map(|d| d.plain_text().to_string())
            .ok_or(TransitionError::NoDocument)?;
        let form = self.submitted_form()?;

        self.transition(event)?;
        Ok(PendingRequest::Generate(GenerateRequest::revision(
            form, feedback, current,
        )))
    }

    /// Start finalizing the current itinerary
    pub fn begin_finalize(&mut self) -> Result<PendingRequest, WorkflowError> {
        let event = WorkflowEvent::Requested(Operation::Finalize);
        self.phase.apply(event, self.document.is_some())?;
        let request = FinalizeRequest {
            form: self.submitted_form()?,
            itinerary_text: self
                .document
                .as_ref()
                .map(|d| d.plain_text().to_string())
                .unwrap_or_default(),
            image_url: self.collage_url.clone().unwrap_or_default(),
        };
        self.transition(event)?;
        Ok(PendingRequest::Finalize(request))
    }

    /// Apply a request's result. Success replaces state wholesale; failure
    /// only rolls the phase back.
    pub fn complete(&mut self, completion: Completion) -> Result<Notice, TransitionError> {
        let operation = completion.operation();
        let failed = |err: ApiError| {
            if err.is_server_reported() {
                tracing::warn!(?operation, error = %err, "server rejected request");
            } else {
                tracing::error!(?operation, error = %err, "request failed");
            }
            Notice::Failed {
                operation,
                alert: err.alert_text(operation),
            }
        };

        match completion {
            Completion::Submitted(Ok(response)) => {
                self.transition(WorkflowEvent::Succeeded(operation))?;
                self.confirmation = Some(response.message.clone());
                Ok(Notice::Submitted {
                    message: response.message,
                })
            }
            Completion::Generated {
                result: Ok(response),
                ..
            } => {
                self.transition(WorkflowEvent::Succeeded(operation))?;
                self.document = Some(ItineraryDocument::from_markdown(response.itinerary_text));
                let destination = self.form.as_ref().and_then(FormState::destination);
                self.collage_url = self.collage.as_ref().map(|c| c.url_for(destination));
                self.scroll_requested = true;
                let revised = operation == Operation::Revise;
                if revised {
                    self.feedback.set_value("");
                }
                Ok(Notice::ItineraryReady { revised })
            }
            Completion::Finalized(Ok(url)) => {
                self.transition(WorkflowEvent::Succeeded(operation))?;
                self.artifact = Some(DownloadArtifact { url: url.clone() });
                Ok(Notice::Finalized { url })
            }
            Completion::Submitted(Err(err)) => {
                self.transition(WorkflowEvent::Failed(operation))?;
                // Form is editable again; the next submit takes a new snapshot
                self.form = None;
                Ok(failed(err))
            }
            Completion::Generated { result: Err(err), .. } | Completion::Finalized(Err(err)) => {
                self.transition(WorkflowEvent::Failed(operation))?;
                Ok(failed(err))
            }
        }
    }

    /// Dispatch a committed request and apply its result
    pub async fn run(
        &mut self,
        pending: PendingRequest,
        api: &dyn ItineraryApi,
    ) -> Result<Notice, TransitionError> {
        let completion = pending.dispatch(api).await;
        self.complete(completion)
    }

    pub async fn submit(
        &mut self,
        api: &dyn ItineraryApi,
        form: FormState,
    ) -> Result<Notice, WorkflowError> {
        let pending = self.begin_submit(form)?;
        Ok(self.run(pending, api).await?)
    }

    pub async fn generate(&mut self, api: &dyn ItineraryApi) -> Result<Notice, WorkflowError> {
        let pending = self.begin_generate()?;
        Ok(self.run(pending, api).await?)
    }

    pub async fn revise(
        &mut self,
        api: &dyn ItineraryApi,
        feedback: &str,
    ) -> Result<Notice, WorkflowError> {
        self.set_feedback(feedback);
        let pending = self.begin_revise()?;
        Ok(self.run(pending, api).await?)
    }

    pub async fn finalize(&mut self, api: &dyn ItineraryApi) -> Result<Notice, WorkflowError> {
        let pending = self.begin_finalize()?;
        Ok(self.run(pending, api).await?)
    }
}
