use std::path::PathBuf;

use cadence_domain::{
    report::exporter_for, AcidizerTags, ExportFormat, FalsePositiveTolerance, MirConfig,
};
use cadence_mir::{ImportJob, ImportPipeline};
use clap::{Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => ExportFormat::Json,
            OutputFormat::Yaml => ExportFormat::Yaml,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Infer the tempo of an audio loop and how to sync it to a project", long_about = None)]
struct Cli {
    /// Path to the audio file to analyze
    input: String,
    /// Tempo found in the file's loop tags
    #[arg(long)]
    acid_bpm: Option<f64>,
    /// The loop tags mark the file as a one-shot
    #[arg(long)]
    one_shot: bool,
    /// Tempo of the project the file is imported into
    #[arg(short, long)]
    project_tempo: Option<f64>,
    /// Overrides the tolerance from the config file
    #[arg(short, long)]
    tolerance: Option<FalsePositiveTolerance>,
    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => MirConfig::load(path)?,
        None => MirConfig::default(),
    };
    if let Some(tolerance) = cli.tolerance {
        config.tolerance = tolerance;
    }
    let job = ImportJob {
        audio_path: cli.input,
        tags: AcidizerTags::from_parts(cli.acid_bpm, cli.one_shot),
        project_tempo: cli.project_tempo,
    };
    let pipeline = ImportPipeline::new(config);
    let report = pipeline.analyze(&job, &mut |fraction| debug!(fraction, "analysis progress"))?;
    let format = ExportFormat::from(cli.format);
    let bytes = exporter_for(format).export(&report, format)?;
    println!("{}", String::from_utf8_lossy(&bytes));
    Ok(())
}
