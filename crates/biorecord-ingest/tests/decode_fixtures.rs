//! Decoding the bundled fixture files, plain and gzip-compressed

use biorecord_ingest::embl::EmblReader;
use biorecord_ingest::genbank::GenbankReader;
use biorecord_ingest::io::{self, LineReader};
use biorecord_ingest::uniprot::UniprotReader;
use biorecord_ingest::{Format, Record, RecordReader};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn gzip_copy(name: &str, dir: &tempfile::TempDir) -> PathBuf {
    let data = std::fs::read(fixture(name)).unwrap();
    let path = dir.path().join(format!("{name}.gz"));
    let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
    encoder.write_all(&data).unwrap();
    encoder.finish().unwrap();
    path
}

fn read_all(path: &PathBuf) -> Vec<Record> {
    let format = Format::from_path(path).unwrap();
    RecordReader::open(path, format)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

#[test]
fn embl_fixture_decodes_both_records() {
    let mut reader = EmblReader::new(io::open_path(fixture("sample.embl")).unwrap());

    let first = reader.next_record().unwrap().unwrap();
    assert_eq!(first.identifier, "X56734");
    assert_eq!(first.accessions, vec!["X56734", "S46826"]);
    assert_eq!(first.keywords, vec!["beta-glucosidase"]);
    assert_eq!(first.source, "Trifolium repens (white clover)");
    assert_eq!(
        first.sequence,
        "aaacaaaccaaatatggattttattgtagccatatttgctctgtttgttattagctcatt"
    );

    let keys: Vec<_> = first.features.iter().map(|f| f.key.as_str()).collect();
    assert_eq!(keys, vec!["source", "mRNA", "CDS"]);

    let source = &first.features[0];
    assert_eq!(source.location, "1..60");
    let qualifiers: Vec<_> = source.qualifiers.iter().collect();
    assert_eq!(
        qualifiers,
        vec![
            ("/organism", "Trifolium repens"),
            ("/mol_type", "mRNA"),
            ("/clone_lib", "lambda gt10"),
        ]
    );

    let cds: Vec<_> = first.features_by_key("CDS").collect();
    assert_eq!(cds.len(), 1);
    assert_eq!(first.features_by_key("gene").count(), 0);
    let cds = cds[0];
    assert_eq!(cds.location, "14..>60");
    assert_eq!(cds.qualifiers.get("/product"), Some("beta-glucosidase"));
    assert_eq!(
        cds.qualifiers.get("/translation"),
        Some("MDFSLHLLLLLSLLSSSSSHHHHHH")
    );

    let second = reader.next_record().unwrap().unwrap();
    assert_eq!(second.identifier, "AB000263");
    assert_eq!(second.source, "Homo sapiens (human)");
    assert_eq!(second.sequence, "acaagatgccattgtccccc");
    assert_eq!(second.features.len(), 1);
    assert_eq!(second.features_by_key("CDS").count(), 1);
    assert_eq!(second.features[0].qualifiers.get("/pseudo"), Some(""));

    assert!(reader.next_record().unwrap().is_none());
    assert!(reader.next_record().unwrap().is_none());
}

#[test]
fn genbank_fixture_decodes_both_records() {
    let mut reader = GenbankReader::new(io::open_path(fixture("sample.gbk")).unwrap());

    let lisod = reader.next_record().unwrap().unwrap();
    assert_eq!(lisod.locus_name(), "LISOD");
    assert_eq!(lisod.accession_version(), "X64011.1");
    assert_eq!(lisod.references.len(), 2);
    assert_eq!(
        lisod.references[1].journal.as_deref(),
        Some(
            "Submitted (21-APR-1992) J. Kreft, Institut f. Mikrobiologie, \
             Universitaet Wuerzburg, Germany"
        )
    );

    let keys: Vec<_> = lisod.features.iter().map(|f| f.key.as_str()).collect();
    assert_eq!(keys, vec!["source", "gene", "CDS"]);
    assert_eq!(
        lisod.features[2].qualifiers.get("/translation"),
        Some(
            "MTYELPKLPYTYDALEPNFDKETMEIHYTKHHNIYVTKLNEAVS\
             GHAELASKPGEELVANLDSVPEEIRGAVRNHGGGHANHTLFWSSLSPNGGG"
        )
    );
    assert_eq!(
        lisod.sequence,
        "cgttatttaaggtgttacatagttctatggaaatagggtctatacctttcgccttacaatgtaatttctt"
    );

    let yeast = reader.next_record().unwrap().unwrap();
    assert_eq!(yeast.locus_name(), "SCU49845");
    assert_eq!(yeast.accession_version(), "U49845.1");
    assert!(yeast.keywords.is_empty());
    assert!(yeast.references.is_empty());
    assert_eq!(yeast.organism_name, "Saccharomyces cerevisiae");
    assert_eq!(
        yeast.taxonomy,
        vec!["Eukaryota", "Fungi", "Ascomycota", "Saccharomycetes"]
    );
    assert_eq!(yeast.sequence, "gatcctccatatacaacggtatctccacct");

    assert!(reader.next_record().unwrap().is_none());
}

#[test]
fn uniprot_fixture_decodes_both_entries() {
    let file = BufReader::new(File::open(fixture("uniprot.xml")).unwrap());
    let mut reader = UniprotReader::new(file);

    let first = reader.next_entry().unwrap().unwrap();
    assert_eq!(first.primary_accession(), Some("P0C9F0"));
    assert_eq!(first.sequence.value.len(), 122);

    let second = reader.next_entry().unwrap().unwrap();
    assert_eq!(second.dataset, "TrEMBL");
    assert_eq!(second.version, 52);
    assert_eq!(second.accessions, vec!["F4HVG8", "Q9C9X4"]);
    assert_eq!(second.protein_name(), Some("Uncharacterized protein"));
    assert_eq!(second.genes.len(), 1);
    assert_eq!(second.genes[0].names[0].kind, "ordered locus");
    assert_eq!(second.genes[0].names[0].value, "At1g01010");
    assert_eq!(second.organism.taxonomy_id(), Some("3702"));
    assert!(second.organism.lineage.is_empty());
    assert_eq!(second.sequence.value, "MEDQVGFGFRPN");

    assert!(reader.next_entry().unwrap().is_none());
    assert_eq!(reader.entries_read(), 2);
}

#[test]
fn gzip_input_decodes_like_plain_input() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["sample.embl", "sample.gbk", "uniprot.xml"] {
        let plain = read_all(&fixture(name));
        let compressed = read_all(&gzip_copy(name, &dir));
        assert_eq!(plain.len(), 2, "{name}");
        assert_eq!(plain, compressed, "{name}");
    }
}

#[test]
fn gzip_detection_uses_content_not_extension() {
    let dir = tempfile::tempdir().unwrap();
    let compressed = gzip_copy("sample.embl", &dir);
    let disguised = dir.path().join("disguised.embl");
    std::fs::rename(&compressed, &disguised).unwrap();

    let records = read_all(&disguised);
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].accession(), "AB000263");
}

#[test]
fn record_reader_exposes_common_fields() {
    let genbank = read_all(&fixture("sample.gbk"));
    assert_eq!(genbank[0].format(), Format::Genbank);
    assert_eq!(genbank[0].accession(), "X64011.1");
    assert_eq!(genbank[0].organism(), "Listeria ivanovii");
    assert_eq!(genbank[0].feature_count(), 3);
    assert_eq!(genbank[0].reference_count(), 2);

    let uniprot = read_all(&fixture("uniprot.xml"));
    assert_eq!(uniprot[1].name(), "F4HVG8_ARATH");
    assert_eq!(uniprot[1].organism(), "Arabidopsis thaliana");
    assert_eq!(uniprot[0].reference_count(), 1);
}

#[test]
fn line_reader_counts_lines() {
    use biorecord_ingest::io::LineSource;

    let mut lines = LineReader::new(BufReader::new(File::open(fixture("sample.gbk")).unwrap()));
    let mut count = 0;
    while lines.next_line().unwrap().is_some() {
        count += 1;
    }
    assert_eq!(lines.line_number(), count);
    assert_eq!(count, 49);
}
