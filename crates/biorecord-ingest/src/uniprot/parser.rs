// UniProt XML parser
//
// Pull-parses the document with quick-xml and decodes one <entry> subtree
// per call. Elements not modelled here are skipped with their subtrees.
// Schema: https://www.uniprot.org/docs/uniprot.xsd

use super::models::{
    Citation, DbReference, Gene, GeneName, Keyword, Organism, OrganismName, Protein, ProteinName,
    Sequence, UniprotEntry, UniprotReference,
};
use crate::error::{DecodeError, DecodeResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;
use std::str::FromStr;
use tracing::debug;

/// A start tag taken out of the read buffer
struct Element {
    start: BytesStart<'static>,
    /// `<name/>`: no children and no end tag follow
    empty: bool,
}

impl Element {
    fn local_name(&self) -> &[u8] {
        self.start.local_name().into_inner()
    }

    fn name(&self) -> String {
        String::from_utf8_lossy(self.local_name()).into_owned()
    }

    fn attr(&self, name: &[u8]) -> DecodeResult<Option<String>> {
        for attr in self.start.attributes() {
            let attr = attr?;
            if attr.key.local_name().as_ref() == name {
                return Ok(Some(attr.unescape_value()?.into_owned()));
            }
        }
        Ok(None)
    }

    fn attr_or_default(&self, name: &[u8]) -> DecodeResult<String> {
        Ok(self.attr(name)?.unwrap_or_default())
    }

    fn numeric_attr<T: FromStr + Default>(&self, name: &[u8]) -> DecodeResult<T> {
        match self.attr(name)? {
            Some(value) => value.trim().parse().map_err(|_| DecodeError::InvalidAttribute {
                element: self.name(),
                attribute: String::from_utf8_lossy(name).into_owned(),
                value,
            }),
            None => Ok(T::default()),
        }
    }
}

/// Read the next start (or empty) tag below `parent`, or `None` at its end tag
///
/// Child subtrees must be consumed by the caller before asking for the next
/// child.
fn next_child<B: BufRead>(
    reader: &mut Reader<B>,
    buf: &mut Vec<u8>,
    parent: &Element,
) -> DecodeResult<Option<Element>> {
    if parent.empty {
        return Ok(None);
    }
    loop {
        buf.clear();
        let element = match reader.read_event_into(buf)? {
            Event::Start(e) => Element {
                start: e.into_owned(),
                empty: false,
            },
            Event::Empty(e) => Element {
                start: e.into_owned(),
                empty: true,
            },
            Event::End(_) => return Ok(None),
            Event::Eof => return Err(DecodeError::UnexpectedEof(parent.name())),
            _ => continue,
        };
        return Ok(Some(element));
    }
}

/// Consume `element` through its end tag, collecting its character data
fn read_text<B: BufRead>(
    reader: &mut Reader<B>,
    buf: &mut Vec<u8>,
    element: &Element,
) -> DecodeResult<String> {
    let mut text = String::new();
    if element.empty {
        return Ok(text);
    }

    let mut depth = 0usize;
    loop {
        buf.clear();
        match reader.read_event_into(buf)? {
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            },
            Event::Eof => return Err(DecodeError::UnexpectedEof(element.name())),
            _ => {},
        }
    }

    Ok(text.trim().to_string())
}

/// Consume `element` through its end tag, ignoring its content
fn skip<B: BufRead>(reader: &mut Reader<B>, buf: &mut Vec<u8>, element: &Element) -> DecodeResult<()> {
    if element.empty {
        return Ok(());
    }
    let mut depth = 0usize;
    loop {
        buf.clear();
        match reader.read_event_into(buf)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            },
            Event::Eof => return Err(DecodeError::UnexpectedEof(element.name())),
            _ => {},
        }
    }
}

fn decode_entry<B: BufRead>(
    reader: &mut Reader<B>,
    buf: &mut Vec<u8>,
    element: &Element,
) -> DecodeResult<UniprotEntry> {
    let mut entry = UniprotEntry {
        dataset: element.attr_or_default(b"dataset")?,
        created: element.attr_or_default(b"created")?,
        modified: element.attr_or_default(b"modified")?,
        version: element.numeric_attr(b"version")?,
        ..Default::default()
    };

    while let Some(child) = next_child(reader, buf, element)? {
        match child.local_name() {
            b"accession" => entry.accessions.push(read_text(reader, buf, &child)?),
            b"name" => entry.names.push(read_text(reader, buf, &child)?),
            b"protein" => entry.protein = decode_protein(reader, buf, &child)?,
            b"gene" => entry.genes.push(decode_gene(reader, buf, &child)?),
            b"organism" => entry.organism = decode_organism(reader, buf, &child)?,
            b"reference" => entry.references.push(decode_reference(reader, buf, &child)?),
            b"keyword" => {
                let id = child.attr_or_default(b"id")?;
                let value = read_text(reader, buf, &child)?;
                entry.keywords.push(Keyword { id, value });
            },
            b"proteinExistence" => {
                entry.protein_existence = child.attr(b"type")?;
                skip(reader, buf, &child)?;
            },
            b"sequence" => entry.sequence = decode_sequence(reader, buf, &child)?,
            _ => skip(reader, buf, &child)?,
        }
    }

    Ok(entry)
}

fn decode_protein<B: BufRead>(
    reader: &mut Reader<B>,
    buf: &mut Vec<u8>,
    element: &Element,
) -> DecodeResult<Protein> {
    let mut protein = Protein::default();
    while let Some(child) = next_child(reader, buf, element)? {
        match child.local_name() {
            b"recommendedName" => {
                protein.recommended_name = Some(decode_protein_name(reader, buf, &child)?);
            },
            b"alternativeName" => protein
                .alternative_names
                .push(decode_protein_name(reader, buf, &child)?),
            b"submittedName" => protein
                .submitted_names
                .push(decode_protein_name(reader, buf, &child)?),
            // domain, component, allergenName, cdAntigenName, ...
            _ => skip(reader, buf, &child)?,
        }
    }
    Ok(protein)
}

fn decode_protein_name<B: BufRead>(
    reader: &mut Reader<B>,
    buf: &mut Vec<u8>,
    element: &Element,
) -> DecodeResult<ProteinName> {
    let mut name = ProteinName::default();
    while let Some(child) = next_child(reader, buf, element)? {
        match child.local_name() {
            b"fullName" => name.full_name = read_text(reader, buf, &child)?,
            b"shortName" => name.short_names.push(read_text(reader, buf, &child)?),
            b"ecNumber" => name.ec_numbers.push(read_text(reader, buf, &child)?),
            _ => skip(reader, buf, &child)?,
        }
    }
    Ok(name)
}

fn decode_gene<B: BufRead>(
    reader: &mut Reader<B>,
    buf: &mut Vec<u8>,
    element: &Element,
) -> DecodeResult<Gene> {
    let mut gene = Gene::default();
    while let Some(child) = next_child(reader, buf, element)? {
        if child.local_name() == b"name" {
            let kind = child.attr_or_default(b"type")?;
            let value = read_text(reader, buf, &child)?;
            gene.names.push(GeneName { kind, value });
        } else {
            skip(reader, buf, &child)?;
        }
    }
    Ok(gene)
}

fn decode_organism<B: BufRead>(
    reader: &mut Reader<B>,
    buf: &mut Vec<u8>,
    element: &Element,
) -> DecodeResult<Organism> {
    let mut organism = Organism::default();
    while let Some(child) = next_child(reader, buf, element)? {
        match child.local_name() {
            b"name" => {
                let kind = child.attr_or_default(b"type")?;
                let value = read_text(reader, buf, &child)?;
                organism.names.push(OrganismName { kind, value });
            },
            b"dbReference" => {
                organism.db_references.push(DbReference {
                    kind: child.attr_or_default(b"type")?,
                    id: child.attr_or_default(b"id")?,
                });
                skip(reader, buf, &child)?;
            },
            b"lineage" => {
                while let Some(taxon) = next_child(reader, buf, &child)? {
                    if taxon.local_name() == b"taxon" {
                        organism.lineage.push(read_text(reader, buf, &taxon)?);
                    } else {
                        skip(reader, buf, &taxon)?;
                    }
                }
            },
            _ => skip(reader, buf, &child)?,
        }
    }
    Ok(organism)
}

fn decode_sequence<B: BufRead>(
    reader: &mut Reader<B>,
    buf: &mut Vec<u8>,
    element: &Element,
) -> DecodeResult<Sequence> {
    let length = element.numeric_attr(b"length")?;
    let mass = element.numeric_attr(b"mass")?;
    let checksum = element.attr_or_default(b"checksum")?;
    let modified = element.attr_or_default(b"modified")?;
    let version = element.numeric_attr(b"version")?;
    let value = read_text(reader, buf, element)?
        .split_whitespace()
        .collect();

    Ok(Sequence {
        length,
        mass,
        checksum,
        modified,
        version,
        value,
    })
}

fn decode_reference<B: BufRead>(
    reader: &mut Reader<B>,
    buf: &mut Vec<u8>,
    element: &Element,
) -> DecodeResult<UniprotReference> {
    let mut reference = UniprotReference {
        key: element.attr_or_default(b"key")?,
        ..Default::default()
    };
    while let Some(child) = next_child(reader, buf, element)? {
        match child.local_name() {
            b"citation" => reference.citation = decode_citation(reader, buf, &child)?,
            b"scope" => reference.scopes.push(read_text(reader, buf, &child)?),
            _ => skip(reader, buf, &child)?,
        }
    }
    Ok(reference)
}

fn decode_citation<B: BufRead>(
    reader: &mut Reader<B>,
    buf: &mut Vec<u8>,
    element: &Element,
) -> DecodeResult<Citation> {
    let mut citation = Citation {
        kind: element.attr_or_default(b"type")?,
        date: element.attr(b"date")?,
        name: element.attr(b"name")?,
        ..Default::default()
    };
    while let Some(child) = next_child(reader, buf, element)? {
        match child.local_name() {
            b"title" => citation.title = read_text(reader, buf, &child)?,
            b"authorList" => {
                while let Some(author) = next_child(reader, buf, &child)? {
                    if let Some(name) = author.attr(b"name")? {
                        citation.authors.push(name);
                    }
                    skip(reader, buf, &author)?;
                }
            },
            _ => skip(reader, buf, &child)?,
        }
    }
    Ok(citation)
}

/// Streaming reader over a UniProt XML document
///
/// Each call to [`UniprotReader::next_entry`] skips ahead to the next
/// `<entry>` start tag and decodes that subtree only, so memory use is
/// bounded by the largest entry rather than the document.
pub struct UniprotReader<B: BufRead> {
    reader: Reader<B>,
    buf: Vec<u8>,
    finished: bool,
    limit: Option<usize>,
    emitted: usize,
}

impl<B: BufRead> UniprotReader<B> {
    pub fn new(inner: B) -> Self {
        let mut reader = Reader::from_reader(inner);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            buf: Vec::with_capacity(8 * 1024),
            finished: false,
            limit: None,
            emitted: 0,
        }
    }

    /// Stop after `limit` entries
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Decode the next entry, or `Ok(None)` once the document has no more
    ///
    /// A malformed document is reported once; the reader is finished after
    /// any error.
    pub fn next_entry(&mut self) -> DecodeResult<Option<UniprotEntry>> {
        if self.finished || self.limit.is_some_and(|limit| self.emitted >= limit) {
            return Ok(None);
        }

        match self.scan_to_entry() {
            Ok(Some(entry)) => {
                self.emitted += 1;
                debug!(
                    accession = entry.primary_accession().unwrap_or_default(),
                    sequence_len = entry.sequence.value.len(),
                    "decoded UniProt entry"
                );
                Ok(Some(entry))
            },
            other => {
                self.finished = true;
                other
            },
        }
    }

    fn scan_to_entry(&mut self) -> DecodeResult<Option<UniprotEntry>> {
        loop {
            self.buf.clear();
            let element = match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) if e.local_name().as_ref() == b"entry" => Element {
                    start: e.into_owned(),
                    empty: false,
                },
                Event::Empty(e) if e.local_name().as_ref() == b"entry" => Element {
                    start: e.into_owned(),
                    empty: true,
                },
                Event::Eof => return Ok(None),
                _ => continue,
            };
            return decode_entry(&mut self.reader, &mut self.buf, &element).map(Some);
        }
    }

    /// Number of entries returned so far
    pub fn entries_read(&self) -> usize {
        self.emitted
    }
}

impl<B: BufRead> Iterator for UniprotReader<B> {
    type Item = DecodeResult<UniprotEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}
