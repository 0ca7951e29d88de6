// GenBank flat file decoding
//
// A keyword state machine with nested ORGANISM, REFERENCE, FEATURES and
// ORIGIN sections, reading one record per call from a LineSource.

pub mod models;
pub mod parser;

pub use models::{GenbankRecord, Reference};
pub use parser::{decode_next, GenbankReader, GenbankState};
