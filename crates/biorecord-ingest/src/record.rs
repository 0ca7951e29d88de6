//! Format selection and a single reader over all three decoders

use crate::embl::{EmblReader, EmblRecord};
use crate::error::DecodeResult;
use crate::genbank::{GenbankReader, GenbankRecord};
use crate::io::{self, BoxedBufRead, LineReader};
use crate::uniprot::{UniprotEntry, UniprotReader};
use biorecord_common::BiorecordError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Input record format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Embl,
    Genbank,
    Uniprot,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Embl => "embl",
            Format::Genbank => "genbank",
            Format::Uniprot => "uniprot",
        }
    }

    /// Infer the format from a file name, ignoring a trailing `.gz`
    ///
    /// `records.embl.gz` -> EMBL, `gbvrl1.seq` -> GenBank,
    /// `uniprot_sprot.xml` -> UniProt
    pub fn from_path(path: impl AsRef<Path>) -> Option<Format> {
        let name = path.as_ref().file_name()?.to_str()?.to_ascii_lowercase();
        let name = name.strip_suffix(".gz").unwrap_or(&name);
        let (_, extension) = name.rsplit_once('.')?;
        match extension {
            "embl" | "dat" | "em" => Some(Format::Embl),
            "gb" | "gbk" | "gbff" | "genbank" | "seq" => Some(Format::Genbank),
            "xml" => Some(Format::Uniprot),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = BiorecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "embl" => Ok(Format::Embl),
            "genbank" | "gb" | "gbk" => Ok(Format::Genbank),
            "uniprot" | "xml" => Ok(Format::Uniprot),
            other => Err(BiorecordError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// A decoded record of any format
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum Record {
    Embl(EmblRecord),
    Genbank(GenbankRecord),
    Uniprot(UniprotEntry),
}

impl Record {
    pub fn format(&self) -> Format {
        match self {
            Record::Embl(_) => Format::Embl,
            Record::Genbank(_) => Format::Genbank,
            Record::Uniprot(_) => Format::Uniprot,
        }
    }

    /// Primary accession (versioned for GenBank)
    pub fn accession(&self) -> &str {
        match self {
            Record::Embl(r) => r.primary_accession(),
            Record::Genbank(r) => r.accession_version(),
            Record::Uniprot(e) => e.primary_accession().unwrap_or_default(),
        }
    }

    /// Short human-readable name: EMBL identifier, GenBank definition,
    /// UniProt entry name
    pub fn name(&self) -> &str {
        match self {
            Record::Embl(r) => &r.identifier,
            Record::Genbank(r) => &r.definition,
            Record::Uniprot(e) => e.entry_name().unwrap_or_default(),
        }
    }

    pub fn organism(&self) -> &str {
        match self {
            Record::Embl(r) => &r.source,
            Record::Genbank(r) => &r.organism_name,
            Record::Uniprot(e) => e.organism.scientific_name().unwrap_or_default(),
        }
    }

    pub fn sequence(&self) -> &str {
        match self {
            Record::Embl(r) => &r.sequence,
            Record::Genbank(r) => &r.sequence,
            Record::Uniprot(e) => &e.sequence.value,
        }
    }

    pub fn feature_count(&self) -> usize {
        match self {
            Record::Embl(r) => r.features.len(),
            Record::Genbank(r) => r.features.len(),
            Record::Uniprot(_) => 0,
        }
    }

    pub fn reference_count(&self) -> usize {
        match self {
            Record::Embl(_) => 0,
            Record::Genbank(r) => r.references.len(),
            Record::Uniprot(e) => e.references.len(),
        }
    }
}

/// Reader over any supported format, yielding [`Record`]s
pub enum RecordReader {
    Embl(EmblReader<LineReader<BoxedBufRead>>),
    Genbank(GenbankReader<LineReader<BoxedBufRead>>),
    Uniprot(UniprotReader<BoxedBufRead>),
}

impl RecordReader {
    /// Wrap an already decompressed stream
    pub fn new(format: Format, input: BoxedBufRead) -> Self {
        match format {
            Format::Embl => RecordReader::Embl(EmblReader::new(LineReader::new(input))),
            Format::Genbank => RecordReader::Genbank(GenbankReader::new(LineReader::new(input))),
            Format::Uniprot => RecordReader::Uniprot(UniprotReader::new(input)),
        }
    }

    /// Open a plain or gzip-compressed file
    pub fn open(path: impl AsRef<Path>, format: Format) -> std::io::Result<Self> {
        Ok(Self::new(format, io::open_reader(path)?))
    }

    pub fn format(&self) -> Format {
        match self {
            RecordReader::Embl(_) => Format::Embl,
            RecordReader::Genbank(_) => Format::Genbank,
            RecordReader::Uniprot(_) => Format::Uniprot,
        }
    }

    pub fn next_record(&mut self) -> DecodeResult<Option<Record>> {
        Ok(match self {
            RecordReader::Embl(r) => r.next_record()?.map(Record::Embl),
            RecordReader::Genbank(r) => r.next_record()?.map(Record::Genbank),
            RecordReader::Uniprot(r) => r.next_entry()?.map(Record::Uniprot),
        })
    }
}

impl Iterator for RecordReader {
    type Item = DecodeResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
