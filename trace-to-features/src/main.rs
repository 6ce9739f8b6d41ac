use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use nanopore_common::{TracerOptions, init_tracer};
use std::path::PathBuf;
use tracing::{debug, error, info};
use trace_to_features::{
    DetectionParameters, ExtractConfig, InputParameters, NormalisationParameters,
    formats::FileFormat,
    processing::{self, first_failure},
};

// cargo run --bin trace-to-features -- extract --input run.mat --output features.csv --threshold 3 --level-tolerance 0.5
// cargo run --bin trace-to-features -- batch --input-pattern "traces/*.csv" --output-dir features --format mat --threshold -40 --polarity lower
// cargo run --bin trace-to-features -- extract --input input.mat --output output.csv --layout event-database

#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Disable coloured log output.
    #[clap(long)]
    no_ansi: bool,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    #[clap(about = "Extracts features from a single trace file and writes them as a feature table.")]
    Extract {
        #[clap(long)]
        input: PathBuf,

        #[clap(long)]
        output: PathBuf,

        #[command(flatten)]
        detection: DetectionParameters,

        #[command(flatten)]
        names: InputParameters,

        #[command(flatten)]
        normalisation: NormalisationParameters,
    },
    #[clap(about = "Extracts features from every trace file matching a glob pattern.")]
    Batch {
        #[clap(long)]
        input_pattern: String,

        #[clap(long)]
        output_dir: PathBuf,

        #[clap(long, value_enum, default_value_t = FileFormat::Csv)]
        format: FileFormat,

        #[command(flatten)]
        detection: DetectionParameters,

        #[command(flatten)]
        names: InputParameters,

        #[command(flatten)]
        normalisation: NormalisationParameters,
    },
    #[clap(about = "Converts a feature table between CSV and matrix formats.")]
    Convert {
        #[clap(long)]
        input: PathBuf,

        #[clap(long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let _tracer = init_tracer!(TracerOptions {
        ansi: !args.no_ansi,
        ..Default::default()
    })?;
    debug!("Args: {:?}", args);

    match args.mode {
        Mode::Extract {
            input,
            output,
            detection,
            names,
            normalisation,
        } => {
            let report = processing::process_file(&ExtractConfig {
                input_path: input,
                output_path: output,
                detection,
                input: names,
                normalisation,
            })?;
            info!("Features saved to {}", report.output_path.display());
        }
        Mode::Batch {
            input_pattern,
            output_dir,
            format,
            detection,
            names,
            normalisation,
        } => {
            let inputs = processing::glob_inputs(&input_pattern)?;
            if inputs.is_empty() {
                return Err(anyhow!("No files match {input_pattern}"));
            }
            std::fs::create_dir_all(&output_dir)?;

            let results = processing::process_batch(
                &inputs,
                &output_dir,
                format,
                &detection,
                &names,
                &normalisation,
            )?;
            let failed = results.iter().filter(|result| result.is_err()).count();
            match first_failure(results) {
                Ok(reports) => {
                    let events: usize = reports.iter().map(|report| report.events).sum();
                    info!("Processed {} files, {events} events", reports.len());
                }
                Err(e) => {
                    error!("{failed} of {} files failed", inputs.len());
                    return Err(e.into());
                }
            }
        }
        Mode::Convert { input, output } => {
            processing::convert_table(&input, &output)?;
        }
    }
    Ok(())
}
