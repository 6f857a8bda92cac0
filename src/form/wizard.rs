//! Step-by-step form navigation with required-field gating

use crossterm::event::KeyCode;
use std::time::Instant;
use thiserror::Error;

use super::field::Control;
use super::schema::FormDefinition;
use super::state::FormState;

/// Errors raised by the wizard
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("form definition has no steps")]
    NoSteps,
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("'{value}' is not an option for '{field}'")]
    InvalidOption { field: String, value: String },
    #[error("submit is only available on the final step")]
    NotFinalStep,
    #[error("required fields are empty: {}", .0.join(", "))]
    MissingRequired(Vec<String>),
}

/// One screen of the form
#[derive(Debug, Clone)]
pub struct Step {
    pub title: String,
    pub controls: Vec<Control>,
}

impl Step {
    /// Names of the controls currently flagged invalid
    pub fn invalid_fields(&self) -> Vec<String> {
        self.controls
            .iter()
            .filter(|c| c.is_invalid())
            .map(|c| c.name().to_string())
            .collect()
    }
}

/// Linear multi-step form. Exactly one step is active at any time.
#[derive(Debug, Clone)]
pub struct StepWizard {
    steps: Vec<Step>,
    active: usize,
    /// Focused control within the active step
    focused: usize,
}

impl StepWizard {
    pub fn new(definition: &FormDefinition) -> Result<Self, FormError> {
        if definition.steps.is_empty() {
            return Err(FormError::NoSteps);
        }
        let steps = definition
            .steps
            .iter()
            .map(|s| Step {
                title: s.title.clone(),
                controls: s.fields.iter().cloned().map(Control::new).collect(),
            })
            .collect();
        Ok(Self {
            steps,
            active: 0,
            focused: 0,
        })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_step(&self) -> &Step {
        &self.steps[self.active]
    }

    pub fn is_last_step(&self) -> bool {
        self.active == self.steps.len() - 1
    }

    /// Only the active step is shown
    pub fn is_visible(&self, index: usize) -> bool {
        index == self.active
    }

    pub fn focused_index(&self) -> usize {
        self.focused
    }

    /// Check every required control on the active step, flagging the empty
    /// ones and restoring the rest. Does not stop at the first failure.
    pub fn validate_active_step(&mut self) -> bool {
        self.validate_active_step_at(Instant::now())
    }

    pub(crate) fn validate_active_step_at(&mut self, now: Instant) -> bool {
        let mut valid = true;
        for control in &mut self.steps[self.active].controls {
            if control.is_required() && control.field.is_empty() {
                valid = false;
                control.flag_invalid(now);
            } else {
                control.clear_invalid();
            }
        }
        if !valid {
            tracing::debug!(
                step = self.active,
                invalid = ?self.steps[self.active].invalid_fields(),
                "step validation failed"
            );
        }
        valid
    }

    /// Move to the next step if the active one is valid.
    ///
    /// Returns true when the active index changed. The last step submits
    /// instead of advancing, so calling this there never moves.
    pub fn advance(&mut self) -> bool {
        if !self.validate_active_step() || self.is_last_step() {
            return false;
        }
        self.active += 1;
        self.focused = 0;
        tracing::debug!(step = self.active, "advanced to step");
        true
    }

    /// Go back one step without validating. Clamped at the first step.
    pub fn retreat(&mut self) {
        self.active = self.active.saturating_sub(1);
        self.focused = 0;
    }

    /// Validate the final step and take a snapshot of every field on every
    /// step. No snapshot is produced when validation fails.
    pub fn submit(&mut self) -> Result<FormState, FormError> {
        if !self.is_last_step() {
            return Err(FormError::NotFinalStep);
        }
        if !self.validate_active_step() {
            return Err(FormError::MissingRequired(
                self.active_step().invalid_fields(),
            ));
        }
        Ok(self.snapshot())
    }

    /// Current values of all fields across all steps
    pub fn snapshot(&self) -> FormState {
        self.steps
            .iter()
            .flat_map(|s| s.controls.iter())
            .map(|c| (c.name().to_string(), c.field.value()))
            .collect()
    }

    /// Set a field by name on any step
    pub fn set_value(&mut self, name: &str, value: &str) -> Result<(), FormError> {
        let control = self
            .steps
            .iter_mut()
            .flat_map(|s| s.controls.iter_mut())
            .find(|c| c.name() == name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        if control.set_value(value) {
            Ok(())
        } else {
            Err(FormError::InvalidOption {
                field: name.to_string(),
                value: value.to_string(),
            })
        }
    }

    /// Fill fields from a set of answers (used by headless planning)
    pub fn fill(&mut self, answers: &FormState) -> Result<(), FormError> {
        for (name, value) in answers.iter() {
            self.set_value(name, value)?;
        }
        Ok(())
    }

    pub fn focus_next(&mut self) {
        let len = self.active_step().controls.len();
        if len > 0 {
            self.focused = (self.focused + 1) % len;
        }
    }

    pub fn focus_prev(&mut self) {
        let len = self.active_step().controls.len();
        if len > 0 {
            self.focused = (self.focused + len - 1) % len;
        }
    }

    /// Route a key to the focused control
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        let focused = self.focused;
        self.steps[self.active]
            .controls
            .get_mut(focused)
            .is_some_and(|c| c.handle_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::schema::{FieldSchema, FieldType, StepSchema};

    fn field(name: &str, required: bool) -> FieldSchema {
        FieldSchema {
            name: name.to_string(),
            label: name.to_string(),
            field_type: FieldType::String,
            required,
            default: None,
            options: vec![],
            placeholder: None,
            max_length: None,
        }
    }

    fn two_step_form() -> FormDefinition {
        FormDefinition {
            steps: vec![
                StepSchema {
                    title: "Trip".to_string(),
                    fields: vec![field("destination", true), field("notes", false)],
                },
                StepSchema {
                    title: "You".to_string(),
                    fields: vec![field("name", true), field("email", true)],
                },
            ],
        }
    }

    #[test]
    fn test_empty_definition_is_rejected() {
        let err = StepWizard::new(&FormDefinition { steps: vec![] }).unwrap_err();
        assert_eq!(err, FormError::NoSteps);
    }

    #[test]
    fn test_advance_blocked_by_empty_required_field() {
        let mut wizard = StepWizard::new(&two_step_form()).unwrap();

        assert!(!wizard.advance());
        assert_eq!(wizard.active_index(), 0);
        let step = wizard.active_step();
        assert!(step.controls[0].is_invalid());
        assert!(!step.controls[1].is_invalid());
    }

    #[test]
    fn test_advance_moves_exactly_one_step() {
        let mut wizard = StepWizard::new(&two_step_form()).unwrap();
        wizard.set_value("destination", "Paris").unwrap();

        assert!(wizard.advance());
        assert_eq!(wizard.active_index(), 1);
        assert!(wizard.is_visible(1));
        assert!(!wizard.is_visible(0));
    }

    #[test]
    fn test_advance_on_last_step_does_not_move() {
        let mut wizard = StepWizard::new(&two_step_form()).unwrap();
        wizard.set_value("destination", "Paris").unwrap();
        wizard.advance();
        wizard.set_value("name", "Ana").unwrap();
        wizard.set_value("email", "ana@example.com").unwrap();

        assert!(!wizard.advance());
        assert_eq!(wizard.active_index(), 1);
    }

    #[test]
    fn test_validation_flags_all_failures_in_one_pass() {
        let mut wizard = StepWizard::new(&two_step_form()).unwrap();
        wizard.set_value("destination", "Paris").unwrap();
        wizard.advance();

        assert!(!wizard.validate_active_step());
        assert_eq!(
            wizard.active_step().invalid_fields(),
            vec!["name".to_string(), "email".to_string()]
        );
    }

    #[test]
    fn test_revalidation_restores_fixed_fields() {
        let mut wizard = StepWizard::new(&two_step_form()).unwrap();
        assert!(!wizard.validate_active_step());
        wizard.set_value("destination", "Rome").unwrap();
        assert!(wizard.validate_active_step());
        assert!(wizard.active_step().invalid_fields().is_empty());
    }

    #[test]
    fn test_retreat_ignores_validity() {
        let mut wizard = StepWizard::new(&two_step_form()).unwrap();
        wizard.set_value("destination", "Paris").unwrap();
        wizard.advance();
        wizard.set_value("destination", "").unwrap();

        wizard.retreat();
        assert_eq!(wizard.active_index(), 0);
    }

    #[test]
    fn test_retreat_clamps_at_first_step() {
        let mut wizard = StepWizard::new(&two_step_form()).unwrap();
        wizard.retreat();
        assert_eq!(wizard.active_index(), 0);
    }

    #[test]
    fn test_submit_requires_final_step_validation() {
        let mut wizard = StepWizard::new(&two_step_form()).unwrap();
        assert_eq!(wizard.submit().unwrap_err(), FormError::NotFinalStep);

        wizard.set_value("destination", "Paris").unwrap();
        wizard.advance();
        wizard.set_value("name", "Ana").unwrap();

        let err = wizard.submit().unwrap_err();
        assert_eq!(err, FormError::MissingRequired(vec!["email".to_string()]));
    }

    #[test]
    fn test_submit_snapshots_every_step() {
        let mut wizard = StepWizard::new(&two_step_form()).unwrap();
        wizard.set_value("destination", "Paris").unwrap();
        wizard.advance();
        wizard.set_value("name", "Ana").unwrap();
        wizard.set_value("email", "ana@example.com").unwrap();

        let form = wizard.submit().unwrap();
        assert_eq!(form.len(), 4);
        assert_eq!(form.get("destination"), Some("Paris"));
        assert_eq!(form.get("notes"), Some(""));
        assert_eq!(form.get("email"), Some("ana@example.com"));
    }

    #[test]
    fn test_fill_rejects_unknown_field() {
        let mut wizard = StepWizard::new(&two_step_form()).unwrap();
        let mut answers = FormState::new();
        answers.insert("planet", "Mars");
        assert_eq!(
            wizard.fill(&answers).unwrap_err(),
            FormError::UnknownField("planet".to_string())
        );
    }

    #[test]
    fn test_fill_rejects_unknown_option() {
        let mut wizard = StepWizard::new(&FormDefinition::travel()).unwrap();
        let mut answers = FormState::new();
        answers.insert("food_habits", "Pescatarian");
        assert_eq!(
            wizard.fill(&answers).unwrap_err(),
            FormError::InvalidOption {
                field: "food_habits".to_string(),
                value: "Pescatarian".to_string(),
            }
        );
        assert_eq!(wizard.snapshot().get("food_habits"), Some(""));
    }

    #[test]
    fn test_typing_into_flagged_field_clears_it() {
        let mut wizard = StepWizard::new(&two_step_form()).unwrap();
        wizard.validate_active_step();
        assert!(wizard.handle_key(KeyCode::Char('L')));
        assert!(!wizard.active_step().controls[0].is_invalid());
    }

    #[test]
    fn test_focus_wraps() {
        let mut wizard = StepWizard::new(&two_step_form()).unwrap();
        wizard.focus_prev();
        assert_eq!(wizard.focused_index(), 1);
        wizard.focus_next();
        assert_eq!(wizard.focused_index(), 0);
    }
}
