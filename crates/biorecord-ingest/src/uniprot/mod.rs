// UniProt XML decoding
//
// Streams <entry> elements one at a time from a UniProtKB XML document
// (uniprot_sprot.xml / uniprot_trembl.xml) without building a DOM.

pub mod models;
pub mod parser;

pub use models::{
    Citation, DbReference, Gene, GeneName, Keyword, Organism, OrganismName, Protein, ProteinName,
    Sequence, UniprotEntry, UniprotReference,
};
pub use parser::UniprotReader;
