//! Schema definitions for the trip planning form

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A complete form: an ordered list of steps
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormDefinition {
    /// Steps shown one at a time, in order
    pub steps: Vec<StepSchema>,
}

/// One screen of the form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepSchema {
    /// Heading shown above the step's fields
    pub title: String,
    /// Fields on this step, in display order
    pub fields: Vec<FieldSchema>,
}

/// Schema definition for a single form field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSchema {
    /// Field identifier, used as the JSON key on submission
    pub name: String,
    /// Label shown next to the input
    pub label: String,
    /// Type of the field
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Whether this field must be filled before leaving the step
    #[serde(default)]
    pub required: bool,
    /// Default value if any
    #[serde(default)]
    pub default: Option<String>,
    /// Options for enum fields
    #[serde(default)]
    pub options: Vec<String>,
    /// Placeholder text shown while the field is empty
    #[serde(default)]
    pub placeholder: Option<String>,
    /// Maximum length for text fields
    #[serde(default)]
    pub max_length: Option<usize>,
}

/// Types of input controls
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Single-line text input
    #[default]
    String,
    /// Selection from predefined options
    Enum,
    /// Date field (YYYY-MM-DD format)
    Date,
    /// Non-negative whole number
    Number,
}

impl FormDefinition {
    /// Load a form definition from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read form definition {}", path.display()))?;
        let definition: FormDefinition =
            toml::from_str(&content).context("Failed to parse form definition")?;
        Ok(definition)
    }

    /// Serialize to pretty TOML (used by `travel-buddy form`)
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize form definition")
    }

    /// Iterate all fields across all steps
    pub fn fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.steps.iter().flat_map(|s| s.fields.iter())
    }

    /// The built-in travel preferences form
    pub fn travel() -> Self {
        Self {
            steps: vec![
                StepSchema {
                    title: "About You".to_string(),
                    fields: vec![
                        text("name", "Full name", true, "Jane Doe"),
                        text("email", "Email", true, "jane@example.com"),
                    ],
                },
                StepSchema {
                    title: "Your Trip".to_string(),
                    fields: vec![
                        text("destination", "Destination", true, "Paris"),
                        text("start_location", "Starting from", true, "Mumbai"),
                        select(
                            "travel_mode",
                            "Travel mode",
                            true,
                            &["Flight", "Train", "Bus", "Car"],
                        ),
                        FieldSchema {
                            field_type: FieldType::Date,
                            ..text("travel_date", "Travel date", true, "YYYY-MM-DD")
                        },
                        FieldSchema {
                            field_type: FieldType::Number,
                            ..text("duration", "Duration (days)", true, "5")
                        },
                        FieldSchema {
                            field_type: FieldType::Number,
                            ..text("travelers_count", "Travelers", true, "2")
                        },
                    ],
                },
                StepSchema {
                    title: "Preferences".to_string(),
                    fields: vec![
                        select("budget", "Budget", true, &["Budget", "Moderate", "Luxury"]),
                        select(
                            "travel_style",
                            "Travel style",
                            true,
                            &["Relaxed", "Adventure", "Cultural", "Family"],
                        ),
                        select(
                            "food_habits",
                            "Food habits",
                            false,
                            &["Vegetarian", "Non-Vegetarian", "Vegan", "Any"],
                        ),
                        text("interests", "Interests", false, "museums, food, hiking"),
                    ],
                },
            ],
        }
    }
}

fn text(name: &str, label: &str, required: bool, placeholder: &str) -> FieldSchema {
    FieldSchema {
        name: name.to_string(),
        label: label.to_string(),
        field_type: FieldType::String,
        required,
        default: None,
        options: Vec::new(),
        placeholder: Some(placeholder.to_string()),
        max_length: None,
    }
}

fn select(name: &str, label: &str, required: bool, options: &[&str]) -> FieldSchema {
    FieldSchema {
        field_type: FieldType::Enum,
        options: options.iter().map(|o| (*o).to_string()).collect(),
        placeholder: None,
        ..text(name, label, required, "")
    }
}
