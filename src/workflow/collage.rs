//! Destination collage image URL

use crate::config::CollageConfig;

/// Used when the form has no destination
const FALLBACK_DESTINATION: &str = "travel";

/// Builds the decorative collage URL for a destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollageTemplate {
    url_template: String,
}

impl CollageTemplate {
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
        }
    }

    /// `None` when collages are turned off
    pub fn from_config(config: &CollageConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.url_template.clone()))
    }

    pub fn url_for(&self, destination: Option<&str>) -> String {
        let destination = destination
            .filter(|d| !d.is_empty())
            .unwrap_or(FALLBACK_DESTINATION);
        self.url_template
            .replace("{destination}", &encode_uri_component(destination))
    }
}

impl Default for CollageTemplate {
    fn default() -> Self {
        Self::new(CollageConfig::default().url_template)
    }
}

/// Percent-encode everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`
fn encode_uri_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
