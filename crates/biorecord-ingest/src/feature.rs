//! Feature table model shared by the EMBL and GenBank decoders
//!
//! A [`Feature`] keeps its location string exactly as written and maps
//! qualifier names (with their leading `/`) to unquoted values.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Qualifier whose wrapped lines are joined without a separator
const UNSPACED_QUALIFIER: &str = "/translation";

/// Ordered qualifier map
///
/// Iteration follows first insertion. Inserting a name that is already
/// present replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Qualifiers {
    entries: Vec<(String, String)>,
}

impl Qualifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a qualifier, returning the value it replaced
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((name, value));
                None
            },
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Qualifiers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut qualifiers = Qualifiers::new();
        for (name, value) in iter {
            qualifiers.insert(name, value);
        }
        qualifiers
    }
}

impl Serialize for Qualifiers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// An annotated region of a sequence
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct Feature {
    /// Feature key, e.g. `source`, `CDS`, `gene`
    pub key: String,
    /// Location exactly as written, e.g. `complement(join(1..10,20..30))`
    pub location: String,
    pub qualifiers: Qualifiers,
}

/// Strip one layer of surrounding double quotes
///
/// An unterminated leading quote (a value cut short by the end of the
/// feature) is dropped on its own.
pub fn unquote(value: &str) -> &str {
    match value.strip_prefix('"') {
        Some(rest) => rest.strip_suffix('"').unwrap_or(rest),
        None => value,
    }
}

/// A quoted value is complete once its quotes pair up; `""` inside the
/// value is an escaped quote and never closes it.
fn is_closed(value: &str) -> bool {
    !value.starts_with('"') || value.bytes().filter(|&b| b == b'"').count() % 2 == 0
}

/// A qualifier whose quoted value continues on following lines
#[derive(Debug)]
struct OpenQualifier {
    name: String,
    value: String,
}

/// In-progress feature while its table lines are being read
#[derive(Debug)]
pub struct FeatureBuilder {
    key: String,
    location: String,
    qualifiers: Qualifiers,
    open: Option<OpenQualifier>,
}

impl FeatureBuilder {
    pub fn new(key: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            location: location.into(),
            qualifiers: Qualifiers::new(),
            open: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// True while a quoted qualifier value is waiting for its closing quote
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Add a `/name=value` line (leading whitespace already removed)
    ///
    /// A value opened with `"` but not closed on the same line stays open
    /// until [`FeatureBuilder::continue_line`] sees the closing quote.
    pub fn push_qualifier(&mut self, body: &str) {
        self.close_open_qualifier();

        let (name, value) = match body.split_once('=') {
            Some((name, value)) => (name.trim(), value.trim()),
            None => (body.trim(), ""),
        };

        if is_closed(value) {
            self.qualifiers.insert(name, unquote(value));
        } else {
            self.open = Some(OpenQualifier {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
    }

    /// Continue the open qualifier value, or the location if no qualifier
    /// has been seen yet
    ///
    /// Returns `false` when the text had nowhere to go.
    pub fn continue_line(&mut self, text: &str) -> bool {
        let text = text.trim();

        if let Some(open) = self.open.as_mut() {
            if open.name != UNSPACED_QUALIFIER && !open.value.is_empty() {
                open.value.push(' ');
            }
            open.value.push_str(text);
            if is_closed(&open.value) {
                self.close_open_qualifier();
            }
            return true;
        }

        if self.qualifiers.is_empty() {
            self.location.push_str(text);
            return true;
        }

        false
    }

    fn close_open_qualifier(&mut self) {
        if let Some(open) = self.open.take() {
            self.qualifiers.insert(open.name, unquote(&open.value));
        }
    }

    pub fn finish(mut self) -> Feature {
        self.close_open_qualifier();
        Feature {
            key: self.key,
            location: self.location,
            qualifiers: self.qualifiers,
        }
    }
}

/// Move the in-progress feature, if any, onto the finished list
pub fn flush_feature(current: &mut Option<FeatureBuilder>, features: &mut Vec<Feature>) {
    if let Some(builder) = current.take() {
        features.push(builder.finish());
    }
}
