//! `travel-buddy plan`: drive the wizard and workflow without a terminal UI

use anyhow::{anyhow, bail, Context, Result};
use std::path::Path;

use crate::api::ItineraryApi;
use crate::form::{FormDefinition, FormState, StepWizard};
use crate::workflow::{CollageTemplate, Notice, WorkflowController};

/// What a headless run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOutcome {
    /// Confirmation message from `/submit`
    pub confirmation: String,
    /// Markdown of the last itinerary
    pub itinerary: String,
    /// Download link, when finalized
    pub download_url: Option<String>,
}

/// Read answers from a TOML table. Scalars are stringified so that
/// `duration = 5` and `duration = "5"` mean the same thing.
pub fn load_answers(path: &Path) -> Result<FormState> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read answers file {}", path.display()))?;
    parse_answers(&content)
}

fn parse_answers(content: &str) -> Result<FormState> {
    let table: toml::Table = toml::from_str(content).context("Failed to parse answers TOML")?;
    table
        .into_iter()
        .map(|(name, value)| {
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Datetime(d) => d.to_string(),
                other => bail!("answer '{}' must be a scalar, got {}", name, other.type_str()),
            };
            Ok((name, value))
        })
        .collect()
}

/// Walk every step of the form with the given answers and take the submit
/// snapshot. Fails on the first step that does not validate.
pub fn complete_form(definition: &FormDefinition, answers: &FormState) -> Result<FormState> {
    let mut wizard = StepWizard::new(definition)?;
    wizard.fill(answers)?;

    while !wizard.is_last_step() {
        if !wizard.advance() {
            let step = wizard.active_step();
            bail!(
                "step '{}' is missing required fields: {}",
                step.title,
                step.invalid_fields().join(", ")
            );
        }
    }
    Ok(wizard.submit()?)
}

fn expect_success(notice: Notice) -> Result<Notice> {
    match notice {
        Notice::Failed { alert, .. } => Err(anyhow!(alert)),
        other => Ok(other),
    }
}

/// Submit, generate, apply each feedback as a revision, optionally finalize
pub async fn run_plan(
    api: &dyn ItineraryApi,
    definition: &FormDefinition,
    collage: Option<CollageTemplate>,
    answers: &FormState,
    feedback: &[String],
    finalize: bool,
) -> Result<PlanOutcome> {
    let form = complete_form(definition, answers)?;
    let mut controller = WorkflowController::new(collage);

    let confirmation = match expect_success(controller.submit(api, form).await?)? {
        Notice::Submitted { message } => message,
        other => bail!("unexpected result from submit: {other:?}"),
    };
    tracing::info!(%confirmation, "trip submitted");

    expect_success(controller.generate(api).await?)?;
    for text in feedback {
        expect_success(controller.revise(api, text).await?)?;
    }

    let download_url = if finalize {
        match expect_success(controller.finalize(api).await?)? {
            Notice::Finalized { url } => Some(url),
            other => bail!("unexpected result from finalize: {other:?}"),
        }
    } else {
        None
    };

    let itinerary = controller
        .document()
        .map(|d| d.source().to_string())
        .unwrap_or_default();

    Ok(PlanOutcome {
        confirmation,
        itinerary,
        download_url,
    })
}
