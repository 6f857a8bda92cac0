use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::api::ItineraryApi;
use crate::config::Config;
use crate::form::{FormError, StepWizard};
use crate::ui::{render_wizard, AlertDialog, TerminalGuard, WorkflowPanel};
use crate::workflow::{
    CollageTemplate, Completion, Notice, PendingRequest, WorkflowController, WorkflowError,
};

const SCROLL_STEP: u16 = 1;
const PAGE_STEP: u16 = 10;

pub struct App {
    config: Config,
    api: Arc<dyn ItineraryApi>,
    wizard: StepWizard,
    controller: WorkflowController,
    panel: WorkflowPanel,
    alert: AlertDialog,
    feedback_focused: bool,
    should_quit: bool,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl App {
    pub fn new(config: Config, api: Arc<dyn ItineraryApi>) -> Result<Self> {
        let wizard = fresh_wizard(&config)?;
        let controller = WorkflowController::new(CollageTemplate::from_config(&config.collage));
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        Ok(Self {
            config,
            api,
            wizard,
            controller,
            panel: WorkflowPanel::new(),
            alert: AlertDialog::new(),
            feedback_focused: false,
            should_quit: false,
            completions_tx,
            completions_rx,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut guard = TerminalGuard::new()?;
        let tick_rate = Duration::from_millis(self.config.ui.refresh_rate_ms);
        let shake = Duration::from_millis(self.config.ui.shake_duration_ms);

        while !self.should_quit {
            guard.terminal_mut().draw(|f| {
                let area = f.area();
                if self.controller.view().form_visible {
                    let submit = self.controller.view().submit;
                    render_wizard(f, area, &self.wizard, submit, Instant::now(), shake);
                } else {
                    self.panel
                        .render(f, area, &self.controller, self.feedback_focused);
                }
                self.alert.render(f);
            })?;

            // Requests make progress while this task sleeps
            tokio::select! {
                Some(completion) = self.completions_rx.recv() => self.apply_completion(completion),
                () = tokio::time::sleep(tick_rate) => {}
            }

            while event::poll(Duration::ZERO)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.alert.visible {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.alert.hide();
            }
            return;
        }

        if self.controller.view().form_visible {
            self.handle_form_key(key.code);
        } else if self.feedback_focused {
            self.handle_feedback_key(key.code);
        } else {
            self.handle_workflow_key(key.code);
        }
    }

    fn handle_form_key(&mut self, code: KeyCode) {
        if self.controller.is_busy() {
            return;
        }
        match code {
            KeyCode::Tab | KeyCode::Down => self.wizard.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.wizard.focus_prev(),
            KeyCode::Esc => self.wizard.retreat(),
            KeyCode::Enter if self.wizard.is_last_step() => self.submit_form(),
            KeyCode::Enter => {
                self.wizard.advance();
            }
            other => {
                self.wizard.handle_key(other);
            }
        }
    }

    fn handle_feedback_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => self.feedback_focused = false,
            KeyCode::Enter => {
                let result = self.controller.begin_revise();
                self.start(result);
            }
            other => {
                self.controller.handle_feedback_key(other);
            }
        }
    }

    fn handle_workflow_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('g') => {
                let result = self.controller.begin_generate();
                self.start(result);
            }
            KeyCode::Char('u') => {
                let result = self.controller.begin_revise();
                self.start(result);
            }
            KeyCode::Char('F') => {
                let result = self.controller.begin_finalize();
                self.start(result);
            }
            KeyCode::Char('f') if self.controller.view().feedback_visible => {
                self.feedback_focused = true;
            }
            KeyCode::Char('n') if self.controller.view().restart.enabled => self.plan_another(),
            KeyCode::Down | KeyCode::Char('j') => {
                self.panel.scroll_down(SCROLL_STEP, self.scroll_limit());
            }
            KeyCode::Up | KeyCode::Char('k') => self.panel.scroll_up(SCROLL_STEP),
            KeyCode::PageDown => self.panel.scroll_down(PAGE_STEP, self.scroll_limit()),
            KeyCode::PageUp => self.panel.scroll_up(PAGE_STEP),
            _ => {}
        }
    }

    /// Last line of the itinerary that can sit at the top of the pane
    fn scroll_limit(&self) -> u16 {
        let lines = self
            .controller
            .document()
            .map_or(0, |doc| doc.line_count().saturating_sub(1));
        u16::try_from(lines).unwrap_or(u16::MAX)
    }

    /// Drop the current trip and go back to an empty first step
    fn plan_another(&mut self) {
        match fresh_wizard(&self.config) {
            Ok(wizard) => {
                tracing::info!("starting a new trip");
                self.wizard = wizard;
                self.controller =
                    WorkflowController::new(CollageTemplate::from_config(&self.config.collage));
                self.panel.reset();
                self.feedback_focused = false;
            }
            Err(err) => self.alert.show("Error", format!("{err:#}")),
        }
    }

    fn submit_form(&mut self) {
        match self.wizard.submit() {
            Ok(form) => {
                let result = self.controller.begin_submit(form);
                self.start(result);
            }
            // Failing fields are already flagged on screen
            Err(FormError::MissingRequired(fields)) => {
                tracing::debug!(?fields, "submit blocked by validation");
            }
            Err(err) => tracing::warn!(error = %err, "submit failed"),
        }
    }

    /// Dispatch an accepted request, or explain why it was not started
    fn start(&mut self, result: Result<PendingRequest, WorkflowError>) {
        match result {
            Ok(pending) => self.dispatch(pending),
            Err(WorkflowError::EmptyFeedback) => {
                self.alert
                    .show("Feedback", WorkflowError::EmptyFeedback.to_string());
            }
            // Disabled control; nothing to do
            Err(WorkflowError::Transition(err)) => {
                tracing::debug!(error = %err, "request not started");
            }
        }
    }

    fn dispatch(&self, pending: PendingRequest) {
        let api = Arc::clone(&self.api);
        let tx = self.completions_tx.clone();
        tracing::debug!(operation = ?pending.operation(), "dispatching request");
        tokio::spawn(async move {
            let completion = pending.dispatch(api.as_ref()).await;
            // Receiver only goes away when the app is shutting down
            let _ = tx.send(completion);
        });
    }

    fn apply_completion(&mut self, completion: Completion) {
        match self.controller.complete(completion) {
            Ok(Notice::Failed { alert, .. }) => self.alert.show("Error", alert),
            Ok(notice) => tracing::debug!(?notice, "request completed"),
            Err(err) => tracing::error!(error = %err, "completion did not match workflow state"),
        }
        if self.controller.take_scroll_request() {
            self.panel.reset();
        }
    }
}

fn fresh_wizard(config: &Config) -> Result<StepWizard> {
    Ok(StepWizard::new(&config.form_definition()?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        ApiError, FinalizeRequest, FinalizeResponse, GenerateRequest, GenerateResponse,
        SubmitResponse,
    };
    use crate::form::FormState;
    use crate::workflow::WorkflowPhase;
    use async_trait::async_trait;

    /// Always succeeds; generated text echoes the feedback
    struct EchoApi;

    #[async_trait]
    impl ItineraryApi for EchoApi {
        async fn submit(&self, _form: &FormState) -> Result<SubmitResponse, ApiError> {
            Ok(SubmitResponse {
                message: "Preferences saved successfully.".to_string(),
            })
        }

        async fn generate(
            &self,
            request: &GenerateRequest,
        ) -> Result<GenerateResponse, ApiError> {
            let extra = request.feedback.as_deref().unwrap_or("first draft");
            Ok(GenerateResponse {
                itinerary_text: format!("# Trip\n\n{extra}\n"),
            })
        }

        async fn finalize(
            &self,
            _request: &FinalizeRequest,
        ) -> Result<FinalizeResponse, ApiError> {
            Err(ApiError::server(500, "PDF engine down"))
        }
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    async fn settle(app: &mut App) {
        let completion = app.completions_rx.recv().await.unwrap();
        app.apply_completion(completion);
    }

    fn app() -> App {
        App::new(Config::default(), Arc::new(EchoApi)).unwrap()
    }

    fn fill_form(app: &mut App) {
        for (name, value) in [
            ("name", "Ana"),
            ("email", "ana@example.com"),
            ("destination", "Paris"),
            ("start_location", "Lisbon"),
            ("travel_mode", "Train"),
            ("travel_date", "2026-05-01"),
            ("duration", "5"),
            ("travelers_count", "2"),
            ("budget", "Moderate"),
            ("travel_style", "Cultural"),
        ] {
            app.wizard.set_value(name, value).unwrap();
        }
    }

    #[tokio::test]
    async fn test_enter_is_blocked_by_empty_required_fields() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.wizard.active_index(), 0);
        assert!(!app.wizard.active_step().invalid_fields().is_empty());
    }

    #[tokio::test]
    async fn test_full_flow_through_keys() {
        let mut app = app();
        fill_form(&mut app);

        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        assert!(app.wizard.is_last_step());
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.controller.phase(), WorkflowPhase::Submitting);

        settle(&mut app).await;
        assert_eq!(app.controller.phase(), WorkflowPhase::Ready);
        assert!(!app.controller.view().form_visible);

        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.controller.phase(), WorkflowPhase::Generating);
        // Second trigger while in flight is ignored
        press(&mut app, KeyCode::Char('g'));
        settle(&mut app).await;
        assert!(app.controller.document().is_some());

        press(&mut app, KeyCode::Char('f'));
        assert!(app.feedback_focused);
        type_text(&mut app, "more museums");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.controller.phase(), WorkflowPhase::Revising);
        settle(&mut app).await;
        assert!(app
            .controller
            .document()
            .unwrap()
            .plain_text()
            .contains("more museums"));
        assert_eq!(app.controller.feedback_text(), "");
    }

    #[tokio::test]
    async fn test_scrolling_stops_at_last_itinerary_line() {
        let mut app = app();
        fill_form(&mut app);
        for _ in 0..3 {
            press(&mut app, KeyCode::Enter);
        }
        settle(&mut app).await;
        // Nothing to scroll before an itinerary exists
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.panel.scroll(), 0);

        press(&mut app, KeyCode::Char('g'));
        settle(&mut app).await;
        let last = app.controller.document().unwrap().line_count() - 1;
        for _ in 0..5 {
            press(&mut app, KeyCode::PageDown);
        }
        assert_eq!(usize::from(app.panel.scroll()), last);
    }

    #[tokio::test]
    async fn test_blank_feedback_opens_alert() {
        let mut app = app();
        fill_form(&mut app);
        for _ in 0..3 {
            press(&mut app, KeyCode::Enter);
        }
        settle(&mut app).await;
        press(&mut app, KeyCode::Char('g'));
        settle(&mut app).await;

        press(&mut app, KeyCode::Char('u'));
        assert!(app.alert.visible);
        assert_eq!(app.alert.message, "Please enter some feedback first.");
        assert_eq!(app.controller.phase(), WorkflowPhase::Ready);

        // Alert swallows keys until dismissed
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Enter);
        assert!(!app.alert.visible);
    }

    #[tokio::test]
    async fn test_server_failure_shows_alert_and_reenables() {
        let mut app = app();
        fill_form(&mut app);
        for _ in 0..3 {
            press(&mut app, KeyCode::Enter);
        }
        settle(&mut app).await;
        press(&mut app, KeyCode::Char('g'));
        settle(&mut app).await;

        press(&mut app, KeyCode::Char('F'));
        settle(&mut app).await;
        assert!(app.alert.visible);
        assert_eq!(
            app.alert.message,
            "Error finalizing itinerary: PDF engine down"
        );
        assert!(app.controller.view().finalize.enabled);
    }

    #[tokio::test]
    async fn test_plan_another_trip_resets_form_and_workflow() {
        let mut app = app();
        fill_form(&mut app);
        for _ in 0..3 {
            press(&mut app, KeyCode::Enter);
        }
        // Ignored while the submission is in flight
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.controller.phase(), WorkflowPhase::Submitting);
        settle(&mut app).await;
        press(&mut app, KeyCode::Char('g'));
        settle(&mut app).await;
        app.panel.scroll_down(PAGE_STEP, 100);

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.controller.phase(), WorkflowPhase::Idle);
        assert!(app.controller.view().form_visible);
        assert!(app.controller.document().is_none());
        assert_eq!(app.wizard.active_index(), 0);
        assert_eq!(app.wizard.snapshot().get("destination"), Some(""));
        assert_eq!(app.panel.scroll(), 0);
    }
}
