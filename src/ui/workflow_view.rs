//! Post-submission screen: success panel, triggers, itinerary, feedback

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::workflow::{ControlView, WorkflowController};

/// Scroll state of the itinerary pane
#[derive(Debug, Default)]
pub struct WorkflowPanel {
    scroll: u16,
}

impl WorkflowPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    /// Scroll towards the end, stopping at `max`
    pub fn scroll_down(&mut self, lines: u16, max: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(max);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    /// Bring the top of the itinerary into view
    pub fn reset(&mut self) {
        self.scroll = 0;
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        controller: &WorkflowController,
        feedback_focused: bool,
    ) {
        let view = controller.view();
        let show_collage = view.itinerary_visible && controller.collage_url().is_some();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Length(u16::from(show_collage)),
                Constraint::Min(5),
                Constraint::Length(if view.feedback_visible { 3 } else { 0 }),
                Constraint::Length(u16::from(view.download_visible)),
                Constraint::Length(1),
            ])
            .split(area);

        // Success panel
        let confirmation = controller.confirmation().unwrap_or_default();
        let success = Paragraph::new(Line::from(vec![
            Span::styled("✓ ", Style::default().fg(Color::Green)),
            Span::raw(confirmation.to_string()),
        ]))
        .block(
            Block::default()
                .title(" Trip submitted ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        );
        frame.render_widget(success, chunks[0]);

        let mut triggers = Vec::new();
        for (key, control) in [
            ("g", view.generate),
            ("u", view.update),
            ("F", view.finalize),
            ("n", view.restart),
        ] {
            if control.visible {
                triggers.extend(trigger(key, control));
                triggers.push(Span::raw("   "));
            }
        }
        frame.render_widget(Paragraph::new(Line::from(triggers)), chunks[1]);

        if let Some(url) = controller.collage_url().filter(|_| show_collage) {
            let collage = Line::from(vec![
                Span::styled("Collage: ", Style::default().fg(Color::Gray)),
                Span::styled(url.to_string(), Style::default().fg(Color::Blue)),
            ]);
            frame.render_widget(Paragraph::new(collage), chunks[2]);
        }

        let itinerary_block = Block::default()
            .title(" Itinerary ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let itinerary = match controller.document() {
            Some(doc) => Paragraph::new(doc.rendered().clone())
                .wrap(Wrap { trim: false })
                .scroll((self.scroll, 0)),
            None => Paragraph::new(Span::styled(
                "No itinerary yet.",
                Style::default().fg(Color::DarkGray),
            )),
        };
        frame.render_widget(itinerary.block(itinerary_block), chunks[3]);

        if view.feedback_visible {
            let border = if feedback_focused {
                Color::Yellow
            } else {
                Color::DarkGray
            };
            let block = Block::default()
                .title(" Feedback ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border));
            let inner = block.inner(chunks[4]);
            frame.render_widget(block, chunks[4]);
            controller
                .feedback_field()
                .render(frame, inner, feedback_focused, false);
        }

        if let Some(artifact) = controller.artifact().filter(|_| view.download_visible) {
            let download = Line::from(vec![
                Span::styled("Download PDF: ", Style::default().fg(Color::Green)),
                Span::styled(
                    artifact.url.clone(),
                    Style::default()
                        .fg(Color::Blue)
                        .add_modifier(Modifier::UNDERLINED),
                ),
            ]);
            frame.render_widget(Paragraph::new(download), chunks[5]);
        }

        frame.render_widget(Paragraph::new(hints(feedback_focused)), chunks[6]);
    }
}

fn trigger(key: &'static str, control: ControlView) -> [Span<'static>; 2] {
    let (key_style, label_style) = if control.enabled {
        (
            Style::default().fg(Color::Yellow),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )
    } else {
        (
            Style::default().fg(Color::DarkGray),
            Style::default().fg(Color::DarkGray),
        )
    };
    [
        Span::styled(format!("[{key}] "), key_style),
        Span::styled(control.label, label_style),
    ]
}

fn hints(feedback_focused: bool) -> Line<'static> {
    let key = Style::default().fg(Color::Yellow);
    if feedback_focused {
        Line::from(vec![
            Span::styled("[Enter] ", key),
            Span::raw("Update   "),
            Span::styled("[Esc] ", key),
            Span::raw("Done editing"),
        ])
    } else {
        Line::from(vec![
            Span::styled("[f] ", key),
            Span::raw("Feedback   "),
            Span::styled("[↑/↓] ", key),
            Span::raw("Scroll   "),
            Span::styled("[q] ", key),
            Span::raw("Quit"),
        ])
    }
}
