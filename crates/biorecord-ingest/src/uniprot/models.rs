// Data models for UniProt XML entries

use serde::Serialize;

/// One `<entry>` element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UniprotEntry {
    /// `Swiss-Prot` or `TrEMBL`
    pub dataset: String,
    pub created: String,
    pub modified: String,
    pub version: u32,
    pub accessions: Vec<String>,
    pub names: Vec<String>,
    pub protein: Protein,
    pub genes: Vec<Gene>,
    pub organism: Organism,
    pub references: Vec<UniprotReference>,
    pub keywords: Vec<Keyword>,
    /// Type attribute of `<proteinExistence>`, e.g. `evidence at protein level`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein_existence: Option<String>,
    pub sequence: Sequence,
}

impl UniprotEntry {
    /// Primary accession (the first `<accession>`)
    pub fn primary_accession(&self) -> Option<&str> {
        self.accessions.first().map(String::as_str)
    }

    /// Entry name, e.g. `1001R_ASFK5`
    pub fn entry_name(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }

    /// Recommended full name, falling back to the first submitted name
    pub fn protein_name(&self) -> Option<&str> {
        self.protein
            .recommended_name
            .as_ref()
            .or_else(|| self.protein.submitted_names.first())
            .map(|name| name.full_name.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Protein {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_name: Option<ProteinName>,
    pub alternative_names: Vec<ProteinName>,
    pub submitted_names: Vec<ProteinName>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProteinName {
    pub full_name: String,
    pub short_names: Vec<String>,
    pub ec_numbers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Gene {
    pub names: Vec<GeneName>,
}

/// Gene name with its type (`primary`, `synonym`, `ORF`, `ordered locus`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneName {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Organism {
    pub names: Vec<OrganismName>,
    pub db_references: Vec<DbReference>,
    /// Taxa from the root down, e.g. `["Viruses", "Varidnaviria"]`
    pub lineage: Vec<String>,
}

impl Organism {
    /// Name with type `scientific`
    pub fn scientific_name(&self) -> Option<&str> {
        self.names
            .iter()
            .find(|name| name.kind == "scientific")
            .map(|name| name.value.as_str())
    }

    /// NCBI taxonomy identifier from the organism's cross-references
    pub fn taxonomy_id(&self) -> Option<&str> {
        self.db_references
            .iter()
            .find(|xref| xref.kind == "NCBI Taxonomy")
            .map(|xref| xref.id.as_str())
    }
}

/// Organism name with its type (`scientific`, `common`, `synonym`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrganismName {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DbReference {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Keyword {
    pub id: String,
    pub value: String,
}

/// The `<sequence>` element: attributes plus residues
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sequence {
    pub length: u32,
    /// Molecular mass in Daltons
    pub mass: u32,
    /// CRC64 checksum as written, e.g. `C5E63C34B941711C`
    pub checksum: String,
    pub modified: String,
    pub version: u32,
    /// Residues with whitespace removed
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UniprotReference {
    pub key: String,
    pub citation: Citation,
    /// e.g. `NUCLEOTIDE SEQUENCE [LARGE SCALE GENOMIC DNA]`
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Citation {
    /// `journal article`, `submission`, `book`, ...
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub authors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protein_name_fallback() {
        let mut entry = UniprotEntry::default();
        assert_eq!(entry.protein_name(), None);

        entry.protein.submitted_names.push(ProteinName {
            full_name: "Uncharacterized protein".to_string(),
            ..Default::default()
        });
        assert_eq!(entry.protein_name(), Some("Uncharacterized protein"));

        entry.protein.recommended_name = Some(ProteinName {
            full_name: "Protein MGF 100-1R".to_string(),
            ..Default::default()
        });
        assert_eq!(entry.protein_name(), Some("Protein MGF 100-1R"));
    }

    #[test]
    fn test_organism_lookups() {
        let organism = Organism {
            names: vec![
                OrganismName {
                    kind: "common".to_string(),
                    value: "ASFV".to_string(),
                },
                OrganismName {
                    kind: "scientific".to_string(),
                    value: "African swine fever virus".to_string(),
                },
            ],
            db_references: vec![DbReference {
                kind: "NCBI Taxonomy".to_string(),
                id: "10497".to_string(),
            }],
            lineage: Vec::new(),
        };
        assert_eq!(organism.scientific_name(), Some("African swine fever virus"));
        assert_eq!(organism.taxonomy_id(), Some("10497"));
    }

    #[test]
    fn test_kind_serialized_as_type() {
        let name = GeneName {
            kind: "primary".to_string(),
            value: "sodA".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&name).unwrap_or_default(),
            r#"{"type":"primary","value":"sodA"}"#
        );
    }
}
