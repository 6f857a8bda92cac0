//! Form field widgets for the trip planning wizard

use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::time::{Duration, Instant};

use super::schema::{FieldSchema, FieldType};

/// Horizontal offsets (in cells) of the shake played on an invalid field
const SHAKE_KEYFRAMES: [i16; 4] = [0, -1, 1, 0];

/// An input widget that can handle different input types
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    /// Single-line text input
    TextInput {
        value: String,
        cursor_pos: usize,
        placeholder: String,
        max_length: Option<usize>,
    },
    /// Selection from predefined options; `None` until the user picks one
    EnumSelect {
        options: Vec<String>,
        selected: Option<usize>,
    },
    /// Date input (YYYY-MM-DD format)
    DateInput { value: String, cursor_pos: usize },
    /// Whole number input
    NumberInput { value: String, cursor_pos: usize },
}

impl FormField {
    /// Create a form field from a schema definition
    pub fn from_schema(schema: &FieldSchema) -> Self {
        let default_value = schema.default.clone().unwrap_or_default();
        let cursor_pos = default_value.chars().count();
        match schema.field_type {
            FieldType::String => FormField::TextInput {
                cursor_pos,
                value: default_value,
                placeholder: schema.placeholder.clone().unwrap_or_default(),
                max_length: schema.max_length,
            },
            FieldType::Enum => {
                let selected = schema
                    .default
                    .as_ref()
                    .and_then(|d| schema.options.iter().position(|o| o == d));
                FormField::EnumSelect {
                    options: schema.options.clone(),
                    selected,
                }
            }
            FieldType::Date => FormField::DateInput {
                cursor_pos,
                value: default_value,
            },
            FieldType::Number => FormField::NumberInput {
                cursor_pos,
                value: default_value,
            },
        }
    }

    /// Get the current value as a string
    pub fn value(&self) -> String {
        match self {
            FormField::TextInput { value, .. }
            | FormField::DateInput { value, .. }
            | FormField::NumberInput { value, .. } => value.clone(),
            FormField::EnumSelect { options, selected } => selected
                .and_then(|i| options.get(i))
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Set the value from a string. Returns false, leaving the field as it
    /// was, when a select is given something other than one of its options
    /// or the empty string.
    pub fn set_value(&mut self, new_value: &str) -> bool {
        match self {
            FormField::TextInput {
                value, cursor_pos, ..
            }
            | FormField::DateInput { value, cursor_pos }
            | FormField::NumberInput { value, cursor_pos } => {
                *value = new_value.to_string();
                *cursor_pos = value.chars().count();
                true
            }
            FormField::EnumSelect { options, selected } => {
                if new_value.is_empty() {
                    *selected = None;
                    return true;
                }
                match options.iter().position(|o| o == new_value) {
                    Some(i) => {
                        *selected = Some(i);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// A field is empty when it holds no characters at all
    pub fn is_empty(&self) -> bool {
        match self {
            FormField::EnumSelect { options, selected } => {
                selected.and_then(|i| options.get(i)).is_none()
            }
            _ => self.value().is_empty(),
        }
    }

    /// Handle a key event, returns true if the key was consumed
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        match self {
            FormField::TextInput {
                value,
                cursor_pos,
                max_length,
                ..
            } => match key {
                KeyCode::Char(c) => {
                    if max_length.map_or(true, |m| value.chars().count() < m) {
                        insert_char(value, cursor_pos, c);
                    }
                    true
                }
                other => edit_cursor(value, cursor_pos, other),
            },
            FormField::EnumSelect { options, selected } => {
                if options.is_empty() {
                    return false;
                }
                let last = options.len() - 1;
                match key {
                    KeyCode::Left | KeyCode::Char('h') => {
                        *selected = Some(match *selected {
                            Some(0) | None => last,
                            Some(i) => i - 1,
                        });
                        true
                    }
                    KeyCode::Right | KeyCode::Char('l' | ' ') => {
                        *selected = Some(match *selected {
                            Some(i) if i < last => i + 1,
                            _ => 0,
                        });
                        true
                    }
                    KeyCode::Backspace | KeyCode::Delete => {
                        *selected = None;
                        true
                    }
                    _ => false,
                }
            }
            FormField::DateInput { value, cursor_pos } => match key {
                KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => {
                    if value.len() < 10 {
                        insert_char(value, cursor_pos, c);
                    }
                    true
                }
                KeyCode::Char(_) => true,
                other => edit_cursor(value, cursor_pos, other),
            },
            FormField::NumberInput { value, cursor_pos } => match key {
                KeyCode::Char(c) if c.is_ascii_digit() => {
                    insert_char(value, cursor_pos, c);
                    true
                }
                KeyCode::Char(_) => true,
                other => edit_cursor(value, cursor_pos, other),
            },
        }
    }

    /// Render the field on a single line
    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool, invalid: bool) {
        let base = if invalid {
            Style::default().fg(Color::LightRed)
        } else if focused {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::Gray)
        };

        let line = match self {
            FormField::TextInput {
                value,
                cursor_pos,
                placeholder,
                max_length,
            } => {
                if value.is_empty() && !focused {
                    Line::from(Span::styled(
                        placeholder.clone(),
                        Style::default().fg(Color::DarkGray),
                    ))
                } else {
                    let suffix = max_length
                        .map(|m| format!(" ({}/{})", value.chars().count(), m))
                        .unwrap_or_default();
                    Line::from(vec![
                        Span::raw(with_cursor(value, *cursor_pos, focused)),
                        Span::styled(suffix, Style::default().fg(Color::DarkGray)),
                    ])
                }
            }
            FormField::EnumSelect { options, selected } => {
                let current = selected
                    .and_then(|i| options.get(i))
                    .map_or("(choose)", String::as_str);
                let arrow = if focused {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                Line::from(vec![
                    Span::styled("< ", arrow),
                    Span::styled(current.to_string(), base.add_modifier(Modifier::BOLD)),
                    Span::styled(" >", arrow),
                ])
            }
            FormField::DateInput { value, cursor_pos } => {
                if value.is_empty() && !focused {
                    Line::from(Span::styled(
                        "YYYY-MM-DD",
                        Style::default().fg(Color::DarkGray),
                    ))
                } else {
                    Line::from(with_cursor(value, *cursor_pos, focused))
                }
            }
            FormField::NumberInput { value, cursor_pos } => {
                Line::from(with_cursor(value, *cursor_pos, focused))
            }
        };

        frame.render_widget(Paragraph::new(line).style(base), area);
    }
}

/// A field on a step, with its schema and validation flag
#[derive(Debug, Clone)]
pub struct Control {
    pub schema: FieldSchema,
    pub field: FormField,
    invalid: bool,
    shake_started: Option<Instant>,
}

impl Control {
    pub fn new(schema: FieldSchema) -> Self {
        let field = FormField::from_schema(&schema);
        Self {
            schema,
            field,
            invalid: false,
            shake_started: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn is_required(&self) -> bool {
        self.schema.required
    }

    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    /// Highlight the field and start a shake
    pub fn flag_invalid(&mut self, now: Instant) {
        self.invalid = true;
        self.shake_started = Some(now);
    }

    /// Restore normal styling
    pub fn clear_invalid(&mut self) {
        self.invalid = false;
        self.shake_started = None;
    }

    /// Feed a key to the field. Any input that leaves the field non-empty
    /// clears its failure styling.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        let consumed = self.field.handle_key(key);
        if consumed && self.invalid && !self.field.is_empty() {
            self.clear_invalid();
        }
        consumed
    }

    /// See [`FormField::set_value`]
    pub fn set_value(&mut self, value: &str) -> bool {
        let accepted = self.field.set_value(value);
        if self.invalid && !self.field.is_empty() {
            self.clear_invalid();
        }
        accepted
    }

    /// Current horizontal shake offset, zero once the animation has finished
    pub fn shake_offset(&self, now: Instant, duration: Duration) -> i16 {
        let Some(started) = self.shake_started else {
            return 0;
        };
        let elapsed = now.saturating_duration_since(started);
        if elapsed >= duration || duration.is_zero() {
            return 0;
        }
        let frame = (elapsed.as_millis() * SHAKE_KEYFRAMES.len() as u128) / duration.as_millis();
        SHAKE_KEYFRAMES[(frame as usize).min(SHAKE_KEYFRAMES.len() - 1)]
    }
}

fn byte_index(value: &str, cursor_pos: usize) -> usize {
    value
        .char_indices()
        .nth(cursor_pos)
        .map_or(value.len(), |(i, _)| i)
}

fn insert_char(value: &mut String, cursor_pos: &mut usize, c: char) {
    let at = byte_index(value, *cursor_pos);
    value.insert(at, c);
    *cursor_pos += 1;
}

/// Shared cursor movement and deletion for text-like fields
fn edit_cursor(value: &mut String, cursor_pos: &mut usize, key: KeyCode) -> bool {
    let len = value.chars().count();
    match key {
        KeyCode::Backspace => {
            if *cursor_pos > 0 {
                *cursor_pos -= 1;
                let at = byte_index(value, *cursor_pos);
                value.remove(at);
            }
            true
        }
        KeyCode::Delete => {
            if *cursor_pos < len {
                let at = byte_index(value, *cursor_pos);
                value.remove(at);
            }
            true
        }
        KeyCode::Left => {
            *cursor_pos = cursor_pos.saturating_sub(1);
            true
        }
        KeyCode::Right => {
            if *cursor_pos < len {
                *cursor_pos += 1;
            }
            true
        }
        KeyCode::Home => {
            *cursor_pos = 0;
            true
        }
        KeyCode::End => {
            *cursor_pos = len;
            true
        }
        _ => false,
    }
}

fn with_cursor(value: &str, cursor_pos: usize, focused: bool) -> String {
    let mut text = value.to_string();
    if focused {
        text.insert(byte_index(value, cursor_pos), '|');
    }
    text
}
