// Batch conversion of a directory of record files
//
// Every matching file becomes one blocking task that owns its decoder and
// output writers from start to finish. Tasks are fanned out through
// buffer_unordered so at most `concurrency` files are open at once.

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::IngestConfig;
use crate::output::{OutputFormat, OutputSink, RecordWriter};
use crate::record::{Format, RecordReader};

/// A file that was converted
#[derive(Debug, Clone, Serialize)]
pub struct FileSuccess {
    pub path: PathBuf,
    pub format: Format,
    pub records: usize,
    pub outputs: Vec<PathBuf>,
}

/// A file that could not be converted
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub succeeded: Vec<FileSuccess>,
    pub failed: Vec<FileFailure>,
    pub duration_seconds: f64,
}

impl BatchSummary {
    pub fn total_records(&self) -> usize {
        self.succeeded.iter().map(|s| s.records).sum()
    }

    pub fn files_processed(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Files directly under `dir` whose name ends with `suffix`, sorted by path
pub fn list_input_files(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(suffix));
        if matches {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// File name without `.gz` and without its last extension
///
/// `sprot_001.xml.gz` -> `sprot_001`, `gbvrl1.seq` -> `gbvrl1`
pub fn output_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

fn progress_bar(total: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );
    pb.set_message("Converting files");
    Ok(pb)
}

/// Convert every matching file in `dir`
///
/// With `format == None` each file's format is inferred from its name.
/// Failures are collected in the summary; only a listing or setup error
/// aborts the whole run.
pub async fn process_directory(
    dir: impl AsRef<Path>,
    format: Option<Format>,
    outputs: &[OutputFormat],
    config: &IngestConfig,
) -> Result<BatchSummary> {
    let dir = dir.as_ref();
    let start_time = Instant::now();
    config.validate()?;
    if outputs.is_empty() {
        anyhow::bail!("At least one output format is required");
    }

    let files = list_input_files(dir, &config.suffix)?;
    if files.is_empty() {
        warn!("No files ending with '{}' in {}", config.suffix, dir.display());
    }

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output directory {}", config.output_dir.display())
    })?;

    info!(
        "Processing {} files from {} (concurrency={})",
        files.len(),
        dir.display(),
        config.concurrency
    );

    let total = files.len();
    let pb = progress_bar(total as u64)?;

    let results: Vec<std::result::Result<FileSuccess, FileFailure>> =
        stream::iter(files.into_iter().enumerate())
            .map(|(index, path)| {
                let outputs = outputs.to_vec();
                let config = config.clone();
                let pb = pb.clone();

                async move {
                    info!("Starting {} ({} / {})", path.display(), index + 1, total);

                    let task_path = path.clone();
                    let outcome = tokio::task::spawn_blocking(move || {
                        process_file(&task_path, format, &outputs, &config)
                    })
                    .await
                    .context("Worker task panicked")
                    .and_then(|r| r);
                    pb.inc(1);

                    match outcome {
                        Ok(success) => {
                            info!(
                                "Completed {} ({} / {}): {} records",
                                path.display(),
                                index + 1,
                                total,
                                success.records
                            );
                            Ok(success)
                        },
                        Err(e) => {
                            error!(
                                "Failed {} ({} / {}): {:#}",
                                path.display(),
                                index + 1,
                                total,
                                e
                            );
                            Err(FileFailure {
                                path,
                                error: format!("{e:#}"),
                            })
                        },
                    }
                }
            })
            .buffer_unordered(config.concurrency)
            .collect()
            .await;

    pb.finish_with_message("Done");

    let mut summary = BatchSummary::default();
    for result in results {
        match result {
            Ok(success) => summary.succeeded.push(success),
            Err(failure) => summary.failed.push(failure),
        }
    }
    summary.succeeded.sort_by(|a, b| a.path.cmp(&b.path));
    summary.failed.sort_by(|a, b| a.path.cmp(&b.path));
    summary.duration_seconds = start_time.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} files converted, {} failed, {} records in {:.2}s",
        summary.succeeded.len(),
        summary.failed.len(),
        summary.total_records(),
        summary.duration_seconds
    );

    Ok(summary)
}

/// Decode one file and write every requested output next to the others
pub fn process_file(
    path: &Path,
    format: Option<Format>,
    outputs: &[OutputFormat],
    config: &IngestConfig,
) -> Result<FileSuccess> {
    let format = match format {
        Some(format) => format,
        None => Format::from_path(path)
            .with_context(|| format!("Cannot infer record format of {}", path.display()))?,
    };

    let mut reader = RecordReader::open(path, format)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let stem = output_stem(path);
    let output_paths: Vec<PathBuf> = outputs
        .iter()
        .map(|output| {
            config.output_dir.join(format!(
                "{}.{}{}",
                stem,
                output.extension(),
                config.compression_suffix()
            ))
        })
        .collect();
    let partial_paths: Vec<PathBuf> = output_paths.iter().map(|p| partial_path(p)).collect();

    let records = match write_outputs(&mut reader, path, outputs, &partial_paths, config) {
        Ok(records) => records,
        Err(err) => {
            for partial in &partial_paths {
                if let Err(remove_err) = std::fs::remove_file(partial) {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        warn!("Failed to remove {}: {}", partial.display(), remove_err);
                    }
                }
            }
            return Err(err);
        },
    };

    for (partial, out_path) in partial_paths.iter().zip(&output_paths) {
        std::fs::rename(partial, out_path)
            .with_context(|| format!("Failed to move output into place at {}", out_path.display()))?;
    }

    debug!("{}: {} records -> {} outputs", path.display(), records, output_paths.len());

    Ok(FileSuccess {
        path: path.to_path_buf(),
        format,
        records,
        outputs: output_paths,
    })
}

/// Sibling path an output is written to until its file converts cleanly
fn partial_path(out_path: &Path) -> PathBuf {
    let mut name = out_path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// Decode records into one writer per output, returning the record count
fn write_outputs(
    reader: &mut RecordReader,
    path: &Path,
    outputs: &[OutputFormat],
    partial_paths: &[PathBuf],
    config: &IngestConfig,
) -> Result<usize> {
    let mut writers = Vec::with_capacity(outputs.len());
    for (output, partial) in outputs.iter().zip(partial_paths) {
        let sink = OutputSink::create(partial, config.compress_output)
            .with_context(|| format!("Failed to create {}", partial.display()))?;
        writers.push(RecordWriter::new(sink, *output).with_line_width(config.line_width));
    }

    let mut records = 0;
    while config.limit.map_or(true, |limit| records < limit) {
        let Some(record) = reader
            .next_record()
            .with_context(|| format!("Failed to decode record {} of {}", records + 1, path.display()))?
        else {
            break;
        };
        for writer in &mut writers {
            writer.write_record(&record)?;
        }
        records += 1;
    }

    for writer in writers {
        writer.finish()?.close()?;
    }
    Ok(records)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;

    const EMBL: &str = "ID   A1;\nAC   X1;\nSQ   Sequence 8 BP;\n     acgtacgt 8\n//\n";

    #[test]
    fn test_output_stem() {
        assert_eq!(output_stem(Path::new("/data/sprot_001.xml.gz")), "sprot_001");
        assert_eq!(output_stem(Path::new("gbvrl1.seq")), "gbvrl1");
        assert_eq!(output_stem(Path::new("README")), "README");
        assert_eq!(output_stem(Path::new(".hidden")), ".hidden");
    }

    #[test]
    fn test_list_input_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.embl"), EMBL).unwrap();
        fs::write(dir.path().join("a.embl"), EMBL).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("nested.embl")).unwrap();

        let files = list_input_files(dir.path(), ".embl").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.embl", "b.embl"]);
    }

    #[test]
    fn test_process_file_writes_each_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("one.embl");
        fs::write(&input, EMBL).unwrap();
        let config = IngestConfig::default()
            .with_output_dir(dir.path().join("out"))
            .with_compression(false);
        fs::create_dir_all(&config.output_dir).unwrap();

        let result = process_file(
            &input,
            None,
            &[OutputFormat::Fasta, OutputFormat::Tsv],
            &config,
        )
        .unwrap();

        assert_eq!(result.records, 1);
        assert_eq!(result.format, Format::Embl);
        let fasta = fs::read_to_string(config.output_dir.join("one.fa")).unwrap();
        assert_eq!(fasta, ">A1\nacgtacgt\n");
        let tsv = fs::read_to_string(config.output_dir.join("one.tsv")).unwrap();
        assert!(tsv.ends_with("X1\tA1\t\t8\tacgtacgt\n"));
    }

    #[tokio::test]
    async fn test_process_directory_collects_failures() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("good.embl"), EMBL).unwrap();
        fs::write(dir.path().join("bad.xml"), "<uniprot><entry><accession>P1</accession>").unwrap();
        let config = IngestConfig::default()
            .with_suffix("")
            .with_output_dir(dir.path().join("out"))
            .with_concurrency(2);

        // an empty suffix is rejected up front
        assert!(process_directory(dir.path(), None, &[OutputFormat::Json], &config)
            .await
            .is_err());

        let config = config.with_suffix("l");
        let summary = process_directory(dir.path(), None, &[OutputFormat::Json], &config)
            .await
            .unwrap();
        assert_eq!(summary.files_processed(), 2);
        assert_eq!(summary.succeeded.len(), 1);
        assert_eq!(summary.total_records(), 1);
        assert_eq!(summary.failed.len(), 1);
        assert!(summary.failed[0].path.ends_with("bad.xml"));
        assert!(!summary.is_success());
        assert!(config.output_dir.join("good.jsonl.gz").exists());
        assert!(!config.output_dir.join("bad.jsonl.gz").exists());
    }

    #[test]
    fn test_failed_file_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad2.gbk");
        fs::write(&input, "LOCUS       A\nORIGIN\n        1 acgt\n//\nLOCUS\n//\n").unwrap();
        let config = IngestConfig::default()
            .with_output_dir(dir.path().join("out"))
            .with_compression(false);
        fs::create_dir_all(&config.output_dir).unwrap();

        let err = process_file(&input, None, &[OutputFormat::Fasta, OutputFormat::Json], &config)
            .unwrap_err();
        assert!(format!("{err:#}").contains("record 2"));
        assert_eq!(fs::read_dir(&config.output_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("out/one.fa.gz")),
            PathBuf::from("out/one.fa.gz.partial")
        );
    }
}
