//! The itinerary being refined, and its rendered form

use ratatui::text::{Line, Span, Text};

/// Current itinerary: Markdown source plus its rendering.
///
/// Replaced wholesale on every successful generation or revision.
#[derive(Debug, Clone, PartialEq)]
pub struct ItineraryDocument {
    source: String,
    rendered: Text<'static>,
    plain_text: String,
}

impl ItineraryDocument {
    pub fn from_markdown(source: impl Into<String>) -> Self {
        let source = source.into();
        let rendered = render_markdown(&source);
        let plain_text = plain_text(&rendered);
        Self {
            source,
            rendered,
            plain_text,
        }
    }

    /// Markdown as returned by the server
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn rendered(&self) -> &Text<'static> {
        &self.rendered
    }

    /// Text content of the rendering, without styling. This is what gets
    /// sent back as `current_itinerary` and `itinerary_text`.
    pub fn plain_text(&self) -> &str {
        &self.plain_text
    }

    pub fn line_count(&self) -> usize {
        self.rendered.lines.len()
    }
}

/// Render Markdown into styled terminal text
pub fn render_markdown(source: &str) -> Text<'static> {
    let text = tui_markdown::from_str(source);
    Text::from(
        text.lines
            .into_iter()
            .map(|line| {
                let spans: Vec<Span<'static>> = line
                    .spans
                    .into_iter()
                    .map(|s| Span::styled(s.content.into_owned(), s.style))
                    .collect();
                Line::from(spans).style(line.style)
            })
            .collect::<Vec<_>>(),
    )
}

/// Concatenate span contents line by line
pub fn plain_text(text: &Text<'_>) -> String {
    text.lines
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|s| s.content.as_ref())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Link to the finalized PDF
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARIS: &str = "# Paris Trip\n\nA week of **art** and food.\n\n## Day 1\n\n- Louvre\n- Seine cruise\n";

    #[test]
    fn test_heading_text_survives_rendering() {
        let doc = ItineraryDocument::from_markdown(PARIS);
        assert!(doc.plain_text().contains("Paris Trip"));
        assert!(doc.plain_text().contains("Louvre"));
        assert!(doc.plain_text().contains("art"));
        assert_eq!(doc.source(), PARIS);
    }

    #[test]
    fn test_markup_is_not_left_in_emphasis() {
        let doc = ItineraryDocument::from_markdown("Visit the **Louvre** early");
        assert!(!doc.plain_text().contains("**"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let a = ItineraryDocument::from_markdown(PARIS);
        let b = ItineraryDocument::from_markdown(PARIS);
        assert_eq!(a, b);
        assert!(a.line_count() > 3);
    }

    #[test]
    fn test_plain_text_joins_spans() {
        let text = Text::from(vec![
            Line::from(vec![Span::raw("Day "), Span::raw("1")]),
            Line::from("Louvre"),
        ]);
        assert_eq!(plain_text(&text), "Day 1\nLouvre");
    }
}
