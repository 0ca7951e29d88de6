// GenBank flat file parser
//
// Parses GenBank/RefSeq flat file format into GenbankRecord structs, one
// record per call. Keyword payloads start at column 12; feature qualifiers
// at column 21.
// Format documentation: https://www.ncbi.nlm.nih.gov/Sitemap/samplerecord.html

use super::models::{GenbankRecord, Reference};
use crate::error::{DecodeError, DecodeResult};
use crate::feature::{flush_feature, FeatureBuilder};
use crate::io::LineSource;
use tracing::{debug, trace};

/// Column where keyword payloads begin (0-based)
const PAYLOAD_COLUMN: usize = 12;

/// Column where feature qualifiers begin (0-based)
const QUALIFIER_COLUMN: usize = 21;

/// Indentation of a continuation line in the header and REFERENCE blocks
const CONTINUATION: &str = "            ";

const TERMINATOR: &str = "//";

/// Where the decoder is inside the current record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenbankState {
    /// Top-level keyword lines
    Scanning,
    /// Classification lines following ORGANISM
    Organism,
    /// Sub-keyword lines of a REFERENCE block
    Reference,
    /// The feature table, up to ORIGIN
    Features,
    /// Numbered sequence lines, up to `//`
    Origin,
}

enum Transition {
    /// Consume the line and move to the given state
    Next(GenbankState),
    /// Hand the line back to be dispatched again in the given state
    Redispatch(GenbankState),
    Complete,
}

/// Header field extended by a 12-space continuation line
#[derive(Debug, Clone, Copy)]
enum HeaderField {
    Definition,
    Accession,
    Keywords,
    Source,
}

#[derive(Debug, Clone, Copy)]
enum ReferenceField {
    Location,
    Authors,
    Consortium,
    Title,
    Journal,
    Medline,
    Pubmed,
    Comment,
}

impl ReferenceField {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "AUTHORS" => Some(Self::Authors),
            "CONSRTM" => Some(Self::Consortium),
            "TITLE" => Some(Self::Title),
            "JOURNAL" => Some(Self::Journal),
            "MEDLINE" => Some(Self::Medline),
            "PUBMED" => Some(Self::Pubmed),
            "COMMENT" | "REMARK" => Some(Self::Comment),
            _ => None,
        }
    }

    fn slot(self, reference: &mut Reference) -> &mut Option<String> {
        match self {
            Self::Location => &mut reference.location,
            Self::Authors => &mut reference.authors,
            Self::Consortium => &mut reference.consortium,
            Self::Title => &mut reference.title,
            Self::Journal => &mut reference.journal,
            Self::Medline => &mut reference.medline,
            Self::Pubmed => &mut reference.pubmed,
            Self::Comment => &mut reference.comment,
        }
    }
}

/// Text from the payload column on, trimmed
fn payload(line: &str, line_no: usize) -> DecodeResult<&str> {
    line.get(PAYLOAD_COLUMN..).map(str::trim).ok_or_else(|| {
        DecodeError::structural(
            line_no,
            format!("keyword line shorter than {PAYLOAD_COLUMN} columns: {line:?}"),
        )
    })
}

fn append_spaced(target: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(text);
}

fn is_continuation(line: &str) -> bool {
    line.starts_with(CONTINUATION) && !line.trim().is_empty()
}

/// Accumulates one record while its lines are read
struct RecordBuilder {
    record: GenbankRecord,
    keywords_text: String,
    header_field: Option<HeaderField>,
    reference: Option<Reference>,
    reference_field: Option<ReferenceField>,
    feature: Option<FeatureBuilder>,
    /// Set once an ORGANISM block reaches its classification lines
    in_lineage: bool,
    has_content: bool,
}

impl RecordBuilder {
    fn new() -> Self {
        Self {
            record: GenbankRecord::default(),
            keywords_text: String::new(),
            header_field: None,
            reference: None,
            reference_field: None,
            feature: None,
            in_lineage: false,
            has_content: false,
        }
    }

    fn step(&mut self, state: GenbankState, line: &str, line_no: usize) -> DecodeResult<Transition> {
        match state {
            GenbankState::Scanning => self.scan(line, line_no),
            GenbankState::Organism => Ok(self.organism_line(line)),
            GenbankState::Reference => self.reference_line(line, line_no),
            GenbankState::Features => Ok(self.feature_line(line)),
            GenbankState::Origin => Ok(self.origin_line(line)),
        }
    }

    fn scan(&mut self, line: &str, line_no: usize) -> DecodeResult<Transition> {
        if line.trim().is_empty() {
            return Ok(Transition::Next(GenbankState::Scanning));
        }
        if line.trim_end() == TERMINATOR {
            if self.has_content {
                return Ok(Transition::Complete);
            }
            trace!(line_no, "terminator before any record content");
            return Ok(Transition::Next(GenbankState::Scanning));
        }
        self.has_content = true;

        if is_continuation(line) {
            self.continue_header(line.trim());
            return Ok(Transition::Next(GenbankState::Scanning));
        }

        let keyword = line.split_whitespace().next().unwrap_or_default();
        self.header_field = None;

        match keyword {
            "LOCUS" => self.record.locus = payload(line, line_no)?.to_string(),
            "DEFINITION" => {
                self.record.definition = payload(line, line_no)?.to_string();
                self.header_field = Some(HeaderField::Definition);
            },
            "ACCESSION" => {
                let accessions = payload(line, line_no)?;
                self.record
                    .accessions
                    .extend(accessions.split_whitespace().map(String::from));
                self.header_field = Some(HeaderField::Accession);
            },
            "VERSION" => self.record.version = payload(line, line_no)?.to_string(),
            "KEYWORDS" => {
                self.keywords_text = payload(line, line_no)?.to_string();
                self.header_field = Some(HeaderField::Keywords);
            },
            "SOURCE" => {
                self.record.source = payload(line, line_no)?.to_string();
                self.header_field = Some(HeaderField::Source);
            },
            "ORGANISM" => {
                let name = payload(line, line_no)?;
                self.record.organism = name.to_string();
                self.record.organism_name = name.to_string();
                self.in_lineage = false;
                return Ok(Transition::Next(GenbankState::Organism));
            },
            "REFERENCE" => {
                let text = payload(line, line_no)?;
                let (number, location) = match text.split_once(char::is_whitespace) {
                    Some((number, rest)) => (number, rest.trim()),
                    None => (text, ""),
                };
                self.reference = Some(Reference {
                    number: number.to_string(),
                    location: (!location.is_empty()).then(|| location.to_string()),
                    ..Default::default()
                });
                self.reference_field = Some(ReferenceField::Location);
                return Ok(Transition::Next(GenbankState::Reference));
            },
            "FEATURES" => return Ok(Transition::Next(GenbankState::Features)),
            "ORIGIN" => return Ok(Transition::Next(GenbankState::Origin)),
            _ => trace!(line_no, keyword, "ignoring line"),
        }

        Ok(Transition::Next(GenbankState::Scanning))
    }

    fn continue_header(&mut self, text: &str) {
        match self.header_field {
            Some(HeaderField::Definition) => append_spaced(&mut self.record.definition, text),
            Some(HeaderField::Accession) => self
                .record
                .accessions
                .extend(text.split_whitespace().map(String::from)),
            Some(HeaderField::Keywords) => append_spaced(&mut self.keywords_text, text),
            Some(HeaderField::Source) => append_spaced(&mut self.record.source, text),
            None => trace!(text, "continuation without an open field"),
        }
    }

    fn organism_line(&mut self, line: &str) -> Transition {
        if line.trim().is_empty() {
            return Transition::Next(GenbankState::Scanning);
        }
        if !line.starts_with(CONTINUATION) {
            return Transition::Redispatch(GenbankState::Scanning);
        }

        let text = line.trim();
        append_spaced(&mut self.record.organism, text);
        // A name too long for one line wraps before the lineage starts
        if !self.in_lineage && !text.contains(';') && !text.ends_with('.') {
            append_spaced(&mut self.record.organism_name, text);
            return Transition::Next(GenbankState::Organism);
        }
        self.in_lineage = true;
        self.record.taxonomy.extend(
            text.trim_end_matches('.')
                .split(';')
                .map(str::trim)
                .filter(|taxon| !taxon.is_empty())
                .map(String::from),
        );
        Transition::Next(GenbankState::Organism)
    }

    fn reference_line(&mut self, line: &str, line_no: usize) -> DecodeResult<Transition> {
        if is_continuation(line) {
            if let (Some(reference), Some(field)) = (self.reference.as_mut(), self.reference_field) {
                let slot = field.slot(reference);
                append_spaced(slot.get_or_insert_with(String::new), line.trim());
            }
            return Ok(Transition::Next(GenbankState::Reference));
        }

        if line.starts_with(' ') {
            let keyword = line.split_whitespace().next().unwrap_or_default();
            if let Some(field) = ReferenceField::from_keyword(keyword) {
                let text = payload(line, line_no)?;
                if let Some(reference) = self.reference.as_mut() {
                    *field.slot(reference) = Some(text.to_string());
                }
                self.reference_field = Some(field);
                return Ok(Transition::Next(GenbankState::Reference));
            }
        }

        self.flush_reference();
        Ok(Transition::Redispatch(GenbankState::Scanning))
    }

    fn flush_reference(&mut self) {
        self.reference_field = None;
        if let Some(reference) = self.reference.take() {
            self.record.references.push(reference);
        }
    }

    fn feature_line(&mut self, line: &str) -> Transition {
        let text = line.trim();
        if text.is_empty() {
            return Transition::Next(GenbankState::Features);
        }
        if !line.starts_with(' ') {
            flush_feature(&mut self.feature, &mut self.record.features);
            return Transition::Redispatch(GenbankState::Scanning);
        }

        let indent = line.len() - line.trim_start().len();
        let wrapped = indent >= QUALIFIER_COLUMN;
        if let Some(feature) = self.feature.as_mut().filter(|f| wrapped && f.is_open()) {
            feature.continue_line(text);
        } else if text.starts_with('/') {
            match self.feature.as_mut() {
                Some(feature) => feature.push_qualifier(text),
                None => trace!(qualifier = text, "qualifier outside of a feature"),
            }
        } else if indent < QUALIFIER_COLUMN {
            flush_feature(&mut self.feature, &mut self.record.features);
            let mut tokens = text.split_whitespace();
            let key = tokens.next().unwrap_or_default();
            let location = tokens.collect::<Vec<_>>().join(" ");
            self.feature = Some(FeatureBuilder::new(key, location));
        } else if let Some(feature) = self.feature.as_mut() {
            if !feature.continue_line(text) {
                trace!(key = feature.key(), text, "unattached feature continuation");
            }
        }

        Transition::Next(GenbankState::Features)
    }

    fn origin_line(&mut self, line: &str) -> Transition {
        if line.trim_end() == TERMINATOR {
            return Transition::Complete;
        }

        let mut tokens = line.split_whitespace().peekable();
        if tokens
            .peek()
            .is_some_and(|first| first.bytes().all(|b| b.is_ascii_digit()))
        {
            tokens.next();
        }
        for token in tokens {
            self.record.sequence.push_str(token);
        }
        Transition::Next(GenbankState::Origin)
    }

    fn finish(mut self) -> GenbankRecord {
        flush_feature(&mut self.feature, &mut self.record.features);
        self.flush_reference();

        self.record.keywords = self
            .keywords_text
            .trim()
            .trim_end_matches('.')
            .split(';')
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty())
            .map(String::from)
            .collect();

        debug!(
            locus = self.record.locus_name(),
            references = self.record.references.len(),
            features = self.record.features.len(),
            sequence_len = self.record.sequence.len(),
            "decoded GenBank record"
        );
        self.record
    }
}

/// Decode the next record from `source`
///
/// Returns `Ok(None)` once the stream holds no further record content. A
/// keyword line too short to reach the payload column is a
/// [`DecodeError::Structural`] error.
pub fn decode_next<S: LineSource + ?Sized>(source: &mut S) -> DecodeResult<Option<GenbankRecord>> {
    let mut builder = RecordBuilder::new();
    let mut state = GenbankState::Scanning;

    while let Some(line) = source.next_line()? {
        let line_no = source.line_number();
        loop {
            match builder.step(state, &line, line_no)? {
                Transition::Next(next) => {
                    state = next;
                    break;
                },
                Transition::Redispatch(next) => state = next,
                Transition::Complete => return Ok(Some(builder.finish())),
            }
        }
    }

    if builder.has_content {
        Ok(Some(builder.finish()))
    } else {
        Ok(None)
    }
}

/// Streaming reader yielding one [`GenbankRecord`] per call
pub struct GenbankReader<S> {
    source: S,
    finished: bool,
}

impl<S: LineSource> GenbankReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            finished: false,
        }
    }

    /// Decode the next record, or `Ok(None)` at end of stream
    ///
    /// After an error the reader stays finished.
    pub fn next_record(&mut self) -> DecodeResult<Option<GenbankRecord>> {
        if self.finished {
            return Ok(None);
        }
        let result = decode_next(&mut self.source);
        if !matches!(result, Ok(Some(_))) {
            self.finished = true;
        }
        result
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: LineSource> Iterator for GenbankReader<S> {
    type Item = DecodeResult<GenbankRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
