// EMBL flat file decoding
//
// Records are read one at a time from a LineSource; nothing beyond the
// current record is kept in memory.

pub mod models;
pub mod parser;

pub use models::EmblRecord;
pub use parser::{decode_next, EmblReader, EmblState};
