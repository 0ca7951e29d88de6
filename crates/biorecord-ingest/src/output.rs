//! Re-serialization of decoded records
//!
//! - FASTA, wrapped at a configurable width
//! - TSV with a header row chosen by the first record's format
//! - JSON Lines (one object per record)
//! - a plain-text summary per record

use crate::amino;
use crate::record::{Format, Record};
use biorecord_common::{BiorecordError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_LINE_WIDTH: usize = 60;

const UNIPROT_TSV_HEADER: &str = "Accession\tDataset\tName\tTaxon\tSequence";
const FLAT_TSV_HEADER: &str = "Accession\tName\tOrganism\tLength\tSequence";

/// Output encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Tsv,
    Fasta,
    Summary,
}

impl OutputFormat {
    /// File extension used by batch output
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "jsonl",
            OutputFormat::Tsv => "tsv",
            OutputFormat::Fasta => "fa",
            OutputFormat::Summary => "txt",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Json => "json",
            OutputFormat::Tsv => "tsv",
            OutputFormat::Fasta => "fasta",
            OutputFormat::Summary => "summary",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = BiorecordError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" | "jsonl" => Ok(OutputFormat::Json),
            "tsv" => Ok(OutputFormat::Tsv),
            "fasta" | "fa" => Ok(OutputFormat::Fasta),
            "summary" | "txt" => Ok(OutputFormat::Summary),
            other => Err(BiorecordError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// SHA-256 of a sequence as lowercase hex
pub fn sequence_hash(sequence: &str) -> String {
    hex::encode(Sha256::digest(sequence.as_bytes()))
}

/// FASTA header text (without the leading `>`)
pub fn fasta_header(record: &Record) -> String {
    match record {
        Record::Embl(r) => r.identifier.clone(),
        Record::Genbank(r) => join_nonempty(r.accession_version(), &r.definition),
        Record::Uniprot(e) => join_nonempty(
            e.primary_accession().unwrap_or_default(),
            e.entry_name().unwrap_or_default(),
        ),
    }
}

fn join_nonempty(first: &str, second: &str) -> String {
    match (first.is_empty(), second.is_empty()) {
        (_, true) => first.to_string(),
        (true, false) => second.to_string(),
        (false, false) => format!("{first} {second}"),
    }
}

/// Replace characters that would break a TSV row
fn tsv_field(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}

/// Writes records to any `Write` in one [`OutputFormat`]
pub struct RecordWriter<W: Write> {
    out: W,
    format: OutputFormat,
    line_width: usize,
    header_written: bool,
    records: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            line_width: DEFAULT_LINE_WIDTH,
            header_written: false,
            records: 0,
        }
    }

    /// FASTA line width; 0 writes each sequence on one line
    pub fn with_line_width(mut self, width: usize) -> Self {
        self.line_width = width;
        self
    }

    pub fn records_written(&self) -> usize {
        self.records
    }

    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.write_json(record)?,
            OutputFormat::Tsv => self.write_tsv(record)?,
            OutputFormat::Fasta => self.write_fasta(record)?,
            OutputFormat::Summary => self.write_summary(record)?,
        }
        self.records += 1;
        Ok(())
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_json(&mut self, record: &Record) -> Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn write_tsv(&mut self, record: &Record) -> Result<()> {
        if !self.header_written {
            let header = match record.format() {
                Format::Uniprot => UNIPROT_TSV_HEADER,
                Format::Embl | Format::Genbank => FLAT_TSV_HEADER,
            };
            writeln!(self.out, "{header}")?;
            self.header_written = true;
        }

        match record {
            Record::Uniprot(e) => writeln!(
                self.out,
                "{}\t{}\t{}\t{}\t{}",
                tsv_field(e.primary_accession().unwrap_or_default()),
                tsv_field(&e.dataset),
                tsv_field(e.entry_name().unwrap_or_default()),
                tsv_field(e.organism.lineage.first().map(String::as_str).unwrap_or("N/A")),
                e.sequence.value
            )?,
            _ => writeln!(
                self.out,
                "{}\t{}\t{}\t{}\t{}",
                tsv_field(record.accession()),
                tsv_field(record.name()),
                tsv_field(record.organism()),
                record.sequence().len(),
                record.sequence()
            )?,
        }
        Ok(())
    }

    fn write_fasta(&mut self, record: &Record) -> Result<()> {
        writeln!(self.out, ">{}", fasta_header(record))?;
        let sequence = record.sequence().as_bytes();
        if self.line_width == 0 {
            self.out.write_all(sequence)?;
            self.out.write_all(b"\n")?;
        } else {
            for line in sequence.chunks(self.line_width) {
                self.out.write_all(line)?;
                self.out.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    fn write_summary(&mut self, record: &Record) -> Result<()> {
        let out = &mut self.out;
        writeln!(out, "Accession:   {} ({})", record.accession(), record.format())?;
        writeln!(out, "Name:        {}", record.name())?;
        writeln!(out, "Organism:    {}", record.organism())?;
        writeln!(out, "Length:      {}", record.sequence().len())?;
        writeln!(out, "SHA-256:     {}", sequence_hash(record.sequence()))?;

        match record {
            Record::Embl(r) => {
                writeln!(out, "Features:    {}", r.features.len())?;
            },
            Record::Genbank(r) => {
                writeln!(out, "Features:    {}", r.features.len())?;
                writeln!(out, "References:  {}", r.references.len())?;
            },
            Record::Uniprot(e) => {
                if let Some(name) = e.protein_name() {
                    writeln!(out, "Protein:     {name}")?;
                }
                writeln!(out, "References:  {}", e.references.len())?;
                match amino::parse_protein(&e.sequence.value) {
                    Ok(residues) => {
                        let counts: Vec<String> = amino::composition(&residues)
                            .into_iter()
                            .map(|(aa, n)| format!("{}:{}", aa.three_letter(), n))
                            .collect();
                        writeln!(out, "Residues:    {}", counts.join(" "))?;
                    },
                    Err(err) => writeln!(out, "Residues:    {err}")?,
                }
            },
        }
        writeln!(out)?;
        Ok(())
    }
}

/// File sink for batch output, optionally gzip-compressed
pub enum OutputSink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl OutputSink {
    pub fn create(path: impl AsRef<Path>, compress: bool) -> io::Result<Self> {
        let file = BufWriter::new(File::create(path)?);
        Ok(if compress {
            OutputSink::Gzip(GzEncoder::new(file, Compression::default()))
        } else {
            OutputSink::Plain(file)
        })
    }

    /// Write the gzip trailer (if any) and flush to disk
    pub fn close(self) -> io::Result<()> {
        let mut file = match self {
            OutputSink::Plain(file) => file,
            OutputSink::Gzip(encoder) => encoder.finish()?,
        };
        file.flush()
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::Plain(w) => w.write(buf),
            OutputSink::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::Plain(w) => w.flush(),
            OutputSink::Gzip(w) => w.flush(),
        }
    }
}
