//! Rendering of the multi-step trip form

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::time::{Duration, Instant};

use crate::form::StepWizard;
use crate::workflow::ControlView;

/// Rows used by one control: label, input, gap
const CONTROL_HEIGHT: u16 = 3;

/// Draw the active step only. Invalid controls are drawn in red and shifted
/// sideways while their shake animation runs.
pub fn render_wizard(
    frame: &mut Frame,
    area: Rect,
    wizard: &StepWizard,
    submit: ControlView,
    now: Instant,
    shake: Duration,
) {
    let step = wizard.active_step();
    let title = format!(
        " Step {} of {}: {} ",
        wizard.active_index() + 1,
        wizard.steps().len(),
        step.title
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut constraints: Vec<Constraint> = step
        .controls
        .iter()
        .map(|_| Constraint::Length(CONTROL_HEIGHT))
        .collect();
    constraints.push(Constraint::Min(0));
    constraints.push(Constraint::Length(1));

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .margin(1)
        .split(inner);

    for (i, control) in step.controls.iter().enumerate() {
        let focused = i == wizard.focused_index();
        let invalid = control.is_invalid();
        let offset = control.shake_offset(now, shake);

        let row = rows[i];
        let row = Rect {
            x: row.x.saturating_add_signed(offset).max(inner.x),
            ..row
        };

        let label_style = if invalid {
            Style::default().fg(Color::LightRed)
        } else if focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let marker = if control.is_required() { " *" } else { "" };
        let label = Line::from(vec![
            Span::styled(control.schema.label.clone(), label_style),
            Span::styled(marker, Style::default().fg(Color::Red)),
        ]);
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(row);
        frame.render_widget(Paragraph::new(label), parts[0]);
        control.field.render(frame, parts[1], focused, invalid);
    }

    let footer_row = rows[rows.len() - 1];
    frame.render_widget(Paragraph::new(footer(wizard, submit)), footer_row);
}

fn footer(wizard: &StepWizard, submit: ControlView) -> Line<'static> {
    let key = Style::default().fg(Color::Yellow);
    let mut spans = Vec::new();
    if wizard.active_index() > 0 {
        spans.push(Span::styled("[Esc] ", key));
        spans.push(Span::raw("Back   "));
    }
    spans.push(Span::styled("[Enter] ", key));
    if wizard.is_last_step() {
        let style = if submit.enabled {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(submit.label, style));
    } else {
        spans.push(Span::raw("Next"));
    }
    spans.push(Span::styled("   [Tab] ", key));
    spans.push(Span::raw("Next field"));
    Line::from(spans)
}
