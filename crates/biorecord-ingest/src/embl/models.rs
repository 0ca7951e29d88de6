// Data model for EMBL records

use crate::feature::Feature;
use serde::Serialize;

/// One decoded EMBL entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmblRecord {
    /// Text of the `ID` line with its trailing `;` removed
    pub identifier: String,
    pub accessions: Vec<String>,
    pub keywords: Vec<String>,
    /// Organism species from the `OS` line(s)
    pub source: String,
    pub features: Vec<Feature>,
    /// Sequence letters with whitespace and position counters removed
    pub sequence: String,
}

impl EmblRecord {
    /// First accession, falling back to the identifier
    pub fn primary_accession(&self) -> &str {
        self.accessions
            .first()
            .map(String::as_str)
            .unwrap_or(&self.identifier)
    }

    /// Features with the given key, in table order
    pub fn features_by_key<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Feature> + 'a {
        self.features.iter().filter(move |f| f.key == key)
    }
}
