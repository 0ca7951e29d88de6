//! Biorecord Ingest - record conversion tool

use anyhow::{Context, Result};
use biorecord_common::logging::{init_logging, LogConfig, LogLevel};
use biorecord_ingest::batch;
use biorecord_ingest::{Format, IngestConfig, OutputFormat, RecordReader, RecordWriter};
use clap::{Parser, Subcommand};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(name = "biorecord-ingest")]
#[command(author, version, about = "Decode EMBL, GenBank and UniProt XML record files")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output (debug level; BIORECORD_LOG_LEVEL overrides this flag)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode one file and write the records to stdout
    Parse {
        /// Input file (plain or gzip)
        file: PathBuf,

        /// Record format (inferred from the file name when omitted)
        #[arg(short, long)]
        format: Option<Format>,

        /// Output encoding
        #[arg(short, long, default_value = "json")]
        output: OutputFormat,

        /// Stop after this many records
        #[arg(short, long)]
        limit: Option<usize>,

        /// FASTA line width (0 = unwrapped)
        #[arg(long, env = "BIORECORD_LINE_WIDTH", default_value_t = 60)]
        line_width: usize,
    },

    /// Convert every matching file in a directory
    Batch {
        /// Input directory
        #[arg(short, long)]
        dir: PathBuf,

        /// Only process files ending with this suffix
        #[arg(short, long, env = "BIORECORD_SUFFIX")]
        suffix: Option<String>,

        /// Record format (inferred per file when omitted)
        #[arg(short, long)]
        format: Option<Format>,

        /// Outputs to write for each file
        #[arg(short, long, value_delimiter = ',', default_value = "tsv,fasta")]
        emit: Vec<OutputFormat>,

        /// Output directory
        #[arg(short, long, env = "BIORECORD_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,

        /// Files processed at the same time
        #[arg(short, long, env = "BIORECORD_CONCURRENCY")]
        concurrency: Option<usize>,

        /// Stop after this many records per file
        #[arg(short, long)]
        limit: Option<usize>,

        /// Write plain instead of gzip-compressed outputs
        #[arg(long)]
        no_compress: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("biorecord-ingest")
        .build();

    // Environment variables take precedence over the flags
    let log_config = match log_config.clone().merge_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Ignoring invalid logging environment: {e:#}");
            log_config
        },
    };

    let _guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e:#}");
            std::process::exit(1);
        },
    };

    if let Err(e) = run(cli.command).await {
        error!("{:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Parse {
            file,
            format,
            output,
            limit,
            line_width,
        } => parse_file(file, format, output, limit, line_width),
        Command::Batch {
            dir,
            suffix,
            format,
            emit,
            output_dir,
            concurrency,
            limit,
            no_compress,
        } => {
            let mut config = IngestConfig::from_env()?;
            if let Some(suffix) = suffix {
                config = config.with_suffix(suffix);
            }
            if let Some(output_dir) = output_dir {
                config = config.with_output_dir(output_dir);
            }
            if let Some(concurrency) = concurrency {
                config = config.with_concurrency(concurrency);
            }
            if limit.is_some() {
                config = config.with_limit(limit);
            }
            if no_compress {
                config = config.with_compression(false);
            }
            debug!(?config, "batch configuration");

            let summary = batch::process_directory(&dir, format, &emit, &config).await?;
            for failure in &summary.failed {
                eprintln!("FAILED {}: {}", failure.path.display(), failure.error);
            }
            if !summary.is_success() {
                anyhow::bail!(
                    "{} of {} files failed",
                    summary.failed.len(),
                    summary.files_processed()
                );
            }
            Ok(())
        },
    }
}

fn parse_file(
    file: PathBuf,
    format: Option<Format>,
    output: OutputFormat,
    limit: Option<usize>,
    line_width: usize,
) -> Result<()> {
    let format = match format {
        Some(format) => format,
        None => Format::from_path(&file).with_context(|| {
            format!(
                "Cannot infer record format of {}; pass --format",
                file.display()
            )
        })?,
    };
    info!("Decoding {} as {}", file.display(), format);

    let reader = RecordReader::open(&file, format)
        .with_context(|| format!("Failed to open {}", file.display()))?;

    let stdout = io::stdout();
    let mut writer = RecordWriter::new(BufWriter::new(stdout.lock()), output)
        .with_line_width(line_width);

    for record in reader.take(limit.unwrap_or(usize::MAX)) {
        let record = record.with_context(|| {
            format!(
                "Failed to decode record {} of {}",
                writer.records_written() + 1,
                file.display()
            )
        })?;
        writer.write_record(&record)?;
    }

    let count = writer.records_written();
    writer.finish()?;
    info!("Decoded {} records from {}", count, file.display());
    Ok(())
}
