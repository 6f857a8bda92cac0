//! Submitted form snapshot

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field values collected from every step at submit time.
///
/// Serializes as a flat JSON object (`{"destination": "Paris", ...}`), which
/// is the body of `POST /submit` and the base of every later request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState(BTreeMap<String, String>);

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Destination name, if one was entered
    pub fn destination(&self) -> Option<&str> {
        self.get("destination").filter(|d| !d.is_empty())
    }
}

impl FromIterator<(String, String)> for FormState {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
