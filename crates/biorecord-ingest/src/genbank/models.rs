// Data models for GenBank records

use crate::feature::Feature;
use serde::Serialize;

/// One decoded GenBank entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenbankRecord {
    /// Payload of the LOCUS line, e.g. `LISOD  756 bp  DNA  linear  BCT 30-JUN-1993`
    pub locus: String,
    pub definition: String,
    pub accessions: Vec<String>,
    /// Payload of the VERSION line, e.g. `X64011.1  GI:44010`
    pub version: String,
    pub keywords: Vec<String>,
    pub source: String,
    /// Organism name followed by its classification lines, space-joined
    pub organism: String,
    /// Organism name alone, from the ORGANISM line
    pub organism_name: String,
    /// Classification split into taxa, e.g. `["Bacteria", "Firmicutes"]`
    pub taxonomy: Vec<String>,
    pub references: Vec<Reference>,
    pub features: Vec<Feature>,
    /// Sequence letters from the ORIGIN block, case preserved
    pub sequence: String,
}

impl GenbankRecord {
    /// Locus name (first token of the LOCUS line)
    pub fn locus_name(&self) -> &str {
        self.locus.split_whitespace().next().unwrap_or_default()
    }

    /// Versioned accession, falling back to the first accession, then the locus name
    pub fn accession_version(&self) -> &str {
        self.version
            .split_whitespace()
            .next()
            .or_else(|| self.accessions.first().map(String::as_str))
            .unwrap_or_else(|| self.locus_name())
    }
}

/// A literature reference from a REFERENCE block
///
/// Every field except the number is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub number: String,
    /// Rest of the REFERENCE line, e.g. `(bases 1 to 756)`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consortium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pubmed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
