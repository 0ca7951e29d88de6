//! Biorecord Ingest Library
//!
//! Streaming decoders for biological sequence record files.
//!
//! # Supported Formats
//!
//! - **EMBL**: two-letter line codes, `FT` feature table, `SQ` sequence block
//! - **GenBank**: keyword lines with `REFERENCE`, `FEATURES` and `ORIGIN` sections
//! - **UniProt XML**: one `<entry>` element at a time from arbitrarily large documents
//!
//! Plain and gzip-compressed inputs are accepted everywhere; compression is
//! detected from the first two bytes.
//!
//! # Example
//!
//! ```no_run
//! use biorecord_ingest::{Format, RecordReader};
//!
//! fn main() -> anyhow::Result<()> {
//!     for record in RecordReader::open("uniprot_sprot.xml.gz", Format::Uniprot)? {
//!         let record = record?;
//!         println!("{}\t{}", record.accession(), record.sequence().len());
//!     }
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod amino;
pub mod batch;
pub mod config;
pub mod embl;
pub mod error;
pub mod feature;
pub mod genbank;
pub mod io;
pub mod output;
pub mod record;
pub mod uniprot;

pub use config::IngestConfig;
pub use error::{DecodeError, DecodeResult};
pub use feature::{Feature, Qualifiers};
pub use output::{OutputFormat, RecordWriter};
pub use record::{Format, Record, RecordReader};
