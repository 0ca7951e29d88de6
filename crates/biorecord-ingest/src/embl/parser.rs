// EMBL flat file parser
//
// Dispatches on the two-character line code in columns 1-2.
// Format documentation: https://ftp.ebi.ac.uk/pub/databases/embl/doc/usrman.txt

use super::models::EmblRecord;
use crate::error::DecodeResult;
use crate::feature::{flush_feature, FeatureBuilder};
use crate::io::LineSource;
use tracing::{debug, trace};

/// Column where a feature key starts on an `FT` line (0-based)
const FT_KEY_COLUMN: usize = 5;

const TERMINATOR: &str = "//";

/// Where the decoder is inside the current record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmblState {
    /// Header and feature table lines
    Scanning,
    /// Lines after `SQ`, up to the `//` terminator
    InSequence,
}

enum Transition {
    Next(EmblState),
    Complete,
}

/// Accumulates one record while its lines are read
struct RecordBuilder {
    record: EmblRecord,
    feature: Option<FeatureBuilder>,
    has_content: bool,
}

impl RecordBuilder {
    fn new() -> Self {
        Self {
            record: EmblRecord::default(),
            feature: None,
            has_content: false,
        }
    }

    fn step(&mut self, state: EmblState, line: &str) -> Transition {
        match state {
            EmblState::Scanning => self.scan(line),
            EmblState::InSequence => self.sequence_line(line),
        }
    }

    fn scan(&mut self, line: &str) -> Transition {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            return Transition::Next(EmblState::Scanning);
        }
        if trimmed == TERMINATOR {
            if self.has_content {
                return Transition::Complete;
            }
            trace!("terminator before any record content");
            return Transition::Next(EmblState::Scanning);
        }
        self.has_content = true;

        let Some(code) = line.get(..2) else {
            return Transition::Next(EmblState::Scanning);
        };
        let body = &line[2..];

        match code {
            "ID" => {
                let id = body.trim();
                self.record.identifier = id.strip_suffix(';').unwrap_or(id).to_string();
            },
            "AC" => push_tokens(&mut self.record.accessions, body),
            "KW" => push_tokens(&mut self.record.keywords, body),
            "OS" => {
                let species = body.trim();
                if !self.record.source.is_empty() {
                    self.record.source.push(' ');
                }
                self.record.source.push_str(species);
            },
            "FT" => self.feature_line(line),
            "SQ" => return Transition::Next(EmblState::InSequence),
            _ => trace!(code, "ignoring line"),
        }

        Transition::Next(EmblState::Scanning)
    }

    fn feature_line(&mut self, line: &str) {
        let table = line.get(FT_KEY_COLUMN..).unwrap_or("");
        let text = table.trim();
        if text.is_empty() {
            return;
        }

        let indented = table.starts_with(char::is_whitespace);
        if let Some(feature) = self.feature.as_mut().filter(|f| indented && f.is_open()) {
            feature.continue_line(text);
        } else if text.starts_with('/') {
            match self.feature.as_mut() {
                Some(feature) => feature.push_qualifier(text),
                None => trace!(qualifier = text, "qualifier outside of a feature"),
            }
        } else if !indented {
            flush_feature(&mut self.feature, &mut self.record.features);
            let mut tokens = text.split_whitespace();
            let key = tokens.next().unwrap_or_default();
            let location = tokens.next().unwrap_or_default();
            self.feature = Some(FeatureBuilder::new(key, location));
        } else if let Some(feature) = self.feature.as_mut() {
            if !feature.continue_line(text) {
                trace!(key = feature.key(), text, "unattached feature continuation");
            }
        }
    }

    fn sequence_line(&mut self, line: &str) -> Transition {
        if line.trim_end() == TERMINATOR {
            return Transition::Complete;
        }
        for token in line.split_whitespace() {
            if !token.bytes().all(|b| b.is_ascii_digit()) {
                self.record.sequence.push_str(token);
            }
        }
        Transition::Next(EmblState::InSequence)
    }

    fn finish(mut self) -> EmblRecord {
        flush_feature(&mut self.feature, &mut self.record.features);
        debug!(
            identifier = %self.record.identifier,
            features = self.record.features.len(),
            sequence_len = self.record.sequence.len(),
            "decoded EMBL record"
        );
        self.record
    }
}

fn push_tokens(target: &mut Vec<String>, body: &str) {
    target.extend(
        body.split(';')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(String::from),
    );
}

/// Decode the next record from `source`
///
/// Returns `Ok(None)` once the stream holds no further record content.
/// A record cut short by the end of the stream is still returned, with its
/// open feature flushed.
pub fn decode_next<S: LineSource + ?Sized>(source: &mut S) -> DecodeResult<Option<EmblRecord>> {
    let mut builder = RecordBuilder::new();
    let mut state = EmblState::Scanning;

    while let Some(line) = source.next_line()? {
        match builder.step(state, &line) {
            Transition::Next(next) => state = next,
            Transition::Complete => return Ok(Some(builder.finish())),
        }
    }

    if builder.has_content {
        Ok(Some(builder.finish()))
    } else {
        Ok(None)
    }
}

/// Streaming reader yielding one [`EmblRecord`] per call
pub struct EmblReader<S> {
    source: S,
    finished: bool,
}

impl<S: LineSource> EmblReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            finished: false,
        }
    }

    /// Decode the next record, or `Ok(None)` at end of stream
    ///
    /// After an error the reader stays finished.
    pub fn next_record(&mut self) -> DecodeResult<Option<EmblRecord>> {
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

impl<S: LineSource> Iterator for EmblReader<S> {
    type Item = DecodeResult<EmblRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::io::LineReader;
    use std::io::{self, Cursor};

    fn reader(data: &str) -> LineReader<Cursor<Vec<u8>>> {
        LineReader::new(Cursor::new(data.as_bytes().to_vec()))
    }

    fn decode_one(data: &str) -> EmblRecord {
        decode_next(&mut reader(data)).unwrap().unwrap()
    }

    const TWO_FEATURES: &str = "
ID   EMBL000001;
AC   X56734; M74088;
KW   gene; protein; virus;
FT   source          1..1234
FT                   /organism=\"Homo sapiens\"
FT                   /mol_type=\"mRNA\"
FT                   /db_xref=\"taxon:9606\"
FT   CDS             1..1234
FT                   /gene=\"example_gene\"
FT                   /product=\"example protein\"
SQ   Sequence 1234 BP; 614 A; 324 C; 170 G; 126 T; 0 other;
     aaagtttatttagagactaatttgctaaacatattcgcaggcgggcatg
     ttagctatgcggtggcaggttggcactgagctcaggagccggtcgtgcg
//
";

    #[test]
    fn test_minimal_record() {
        let record = decode_one(
            "ID   EMBL000001;\nAC   X56734; M74088;\nFT   source          1..1234\nFT                   /organism=\"Homo sapiens\"\nSQ   ...\n     aaag\n//\n",
        );

        assert_eq!(record.identifier, "EMBL000001");
        assert_eq!(record.accessions, vec!["X56734", "M74088"]);
        assert_eq!(record.features.len(), 1);
        let source = &record.features[0];
        assert_eq!(source.key, "source");
        assert_eq!(source.location, "1..1234");
        assert_eq!(source.qualifiers.get("/organism"), Some("Homo sapiens"));
        assert_eq!(source.qualifiers.len(), 1);
        assert_eq!(record.sequence, "aaag");
    }

    #[test]
    fn test_features_in_source_order() {
        let record = decode_one(TWO_FEATURES);

        assert_eq!(record.keywords, vec!["gene", "protein", "virus"]);
        let keys: Vec<_> = record.features.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["source", "CDS"]);

        let source = &record.features[0].qualifiers;
        assert_eq!(
            source.keys().collect::<Vec<_>>(),
            vec!["/organism", "/mol_type", "/db_xref"]
        );
        assert_eq!(source.get("/db_xref"), Some("taxon:9606"));

        let cds = &record.features[1].qualifiers;
        assert_eq!(cds.len(), 2);
        assert_eq!(cds.get("/product"), Some("example protein"));

        assert_eq!(
            record.sequence,
            "aaagtttatttagagactaatttgctaaacatattcgcaggcgggcatgttagctatgcggtggcaggttggcactgagctcaggagccggtcgtgcg"
        );
    }

    #[test]
    fn test_consecutive_records_then_end_of_stream() {
        let data = format!("{TWO_FEATURES}ID   SECOND;\nAC   Z00001;\nSQ   \n     acgt\n//\n");
        let mut source = reader(&data);

        let first = decode_next(&mut source).unwrap().unwrap();
        let second = decode_next(&mut source).unwrap().unwrap();
        assert_eq!(first.identifier, "EMBL000001");
        assert_eq!(second.identifier, "SECOND");
        assert!(second.features.is_empty());
        assert_eq!(second.sequence, "acgt");
        assert!(decode_next(&mut source).unwrap().is_none());
    }

    #[test]
    fn test_empty_and_blank_streams() {
        assert!(decode_next(&mut reader("")).unwrap().is_none());
        assert!(decode_next(&mut reader("\n   \n\n")).unwrap().is_none());
    }

    #[test]
    fn test_any_feature_key_is_recognized() {
        let record = decode_one(
            "ID   X;\nFT   gene            <1..>400\nFT                   /gene=\"abc\"\nFT   mRNA            join(1..50,60..400)\nFT   misc_feature    12\n//\n",
        );
        let keys: Vec<_> = record.features.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["gene", "mRNA", "misc_feature"]);
        assert_eq!(record.features[1].location, "join(1..50,60..400)");
        assert!(record.features[1].qualifiers.is_empty());
    }

    #[test]
    fn test_wrapped_qualifiers() {
        let record = decode_one(
            "ID   X;\nFT   CDS             1..30\nFT                   /note=\"first half\nFT                   second half\"\nFT                   /translation=\"MVRLFYNPIK\nFT                   YLFYRRS\"\nFT                   /pseudo\n//\n",
        );
        let q = &record.features[0].qualifiers;
        assert_eq!(q.get("/note"), Some("first half second half"));
        assert_eq!(q.get("/translation"), Some("MVRLFYNPIKYLFYRRS"));
        assert_eq!(q.get("/pseudo"), Some(""));
    }

    #[test]
    fn test_wrapped_value_line_starting_with_slash() {
        let record = decode_one(
            "ID   X;\nFT   misc_feature    1..10\nFT                   /note=\"and/or\nFT                   /partial region\"\nFT                   /gene=\"abc\"\n//\n",
        );
        let q = &record.features[0].qualifiers;
        assert_eq!(q.keys().collect::<Vec<_>>(), vec!["/note", "/gene"]);
        assert_eq!(q.get("/note"), Some("and/or /partial region"));
    }

    #[test]
    fn test_escaped_quote_at_line_end_keeps_value_open() {
        let record = decode_one(
            "ID   X;\nFT   misc_feature    1..10\nFT                   /note=\"the so-called \"\"\nFT                   alpha\"\" form\"\nFT                   /gene=\"abc\"\n//\n",
        );
        let q = &record.features[0].qualifiers;
        assert_eq!(q.keys().collect::<Vec<_>>(), vec!["/note", "/gene"]);
        assert_eq!(q.get("/note"), Some("the so-called \"\" alpha\"\" form"));
    }

    #[test]
    fn test_repeated_qualifier_last_write_wins() {
        let record = decode_one(
            "ID   X;\nFT   CDS             1..9\nFT                   /gene=\"a\"\nFT                   /note=\"n\"\nFT                   /gene=\"b\"\n//\n",
        );
        let q = &record.features[0].qualifiers;
        assert_eq!(q.keys().collect::<Vec<_>>(), vec!["/gene", "/note"]);
        assert_eq!(q.get("/gene"), Some("b"));
    }

    #[test]
    fn test_source_organism_lines() {
        let record = decode_one("ID   X;\nOS   Homo sapiens\nOS   (human)\n//\n");
        assert_eq!(record.source, "Homo sapiens (human)");
    }

    #[test]
    fn test_position_counters_dropped() {
        let record = decode_one(
            "ID   X;\nSQ   Sequence 20 BP;\n     gatcctccat atacaacggt        20\n     aa                           22\n//\n",
        );
        assert_eq!(record.sequence, "gatcctccatatacaacggtaa");
    }

    #[test]
    fn test_end_of_stream_flushes_open_feature() {
        let record = decode_one("ID   CUT;\nFT   CDS             5..10\nFT                   /gene=\"x\"\n");
        assert_eq!(record.identifier, "CUT");
        assert_eq!(record.features.len(), 1);
        assert_eq!(record.features[0].qualifiers.get("/gene"), Some("x"));
    }

    #[test]
    fn test_unknown_codes_and_stray_qualifiers_ignored() {
        let record = decode_one(
            "ID   X;\nXX\nDE   description\nFT                   /orphan=\"1\"\nCC   comment\n//\n",
        );
        assert!(record.features.is_empty());
        assert!(record.accessions.is_empty());
    }

    #[test]
    fn test_decoding_is_repeatable() {
        let first = decode_one(TWO_FEATURES);
        let second = decode_one(TWO_FEATURES);
        assert_eq!(first, second);
    }

    struct FailingSource {
        served: usize,
    }

    impl LineSource for FailingSource {
        fn next_line(&mut self) -> io::Result<Option<String>> {
            self.served += 1;
            if self.served == 1 {
                Ok(Some("ID   X;".to_string()))
            } else {
                Err(io::Error::new(io::ErrorKind::InvalidData, "corrupt deflate stream"))
            }
        }

        fn line_number(&self) -> usize {
            self.served
        }
    }

    #[test]
    fn test_stream_error_is_surfaced_and_stops_reader() {
        let mut reader = EmblReader::new(FailingSource { served: 0 });
        assert!(matches!(reader.next_record(), Err(DecodeError::Io(_))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_reader_iterates_all_records() {
        let data = format!("{TWO_FEATURES}{TWO_FEATURES}");
        let records: Vec<_> = EmblReader::new(reader(&data))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], records[1]);
    }
}
