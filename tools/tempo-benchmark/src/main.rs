use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Result;
use cadence_domain::{AcidizerTags, FalsePositiveTolerance, MirConfig};
use cadence_mir::{ImportJob, ImportPipeline};
use clap::Parser;
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Measure tempo inference accuracy over annotated audio files"
)]
struct Args {
    /// Path to an input JSON file with annotated files
    input: PathBuf,
    #[arg(short, long)]
    tolerance: Option<FalsePositiveTolerance>,
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Largest deviation in BPM still counted as a hit
    #[arg(long, default_value_t = 2.0)]
    max_error: f64,
}

#[derive(Debug, Deserialize)]
struct AnnotationRecord {
    path: String,
    /// `None` for files without a tempo, such as one-shots.
    expected_bpm: Option<f64>,
    #[serde(default)]
    acid_bpm: Option<f64>,
    #[serde(default)]
    one_shot: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Hit,
    OctaveError,
    Miss,
    FalsePositive,
    CorrectRejection,
}

fn classify(expected: Option<f64>, detected: Option<f64>, max_error: f64) -> Outcome {
    match (expected, detected) {
        (None, None) => Outcome::CorrectRejection,
        (None, Some(_)) => Outcome::FalsePositive,
        (Some(_), None) => Outcome::Miss,
        (Some(expected), Some(detected)) => {
            if (detected - expected).abs() <= max_error {
                Outcome::Hit
            } else if [0.25, 0.5, 2.0, 4.0]
                .iter()
                .any(|factor| (detected * factor - expected).abs() <= max_error)
            {
                Outcome::OctaveError
            } else {
                Outcome::Miss
            }
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    hits: usize,
    octave_errors: usize,
    misses: usize,
    false_positives: usize,
    correct_rejections: usize,
}

impl Tally {
    fn add(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Hit => self.hits += 1,
            Outcome::OctaveError => self.octave_errors += 1,
            Outcome::Miss => self.misses += 1,
            Outcome::FalsePositive => self.false_positives += 1,
            Outcome::CorrectRejection => self.correct_rejections += 1,
        }
    }

    fn total(&self) -> usize {
        self.hits + self.octave_errors + self.misses + self.false_positives + self.correct_rejections
    }

    fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => (self.hits + self.correct_rejections) as f64 / total as f64,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => MirConfig::load(path)?,
        None => MirConfig::default(),
    };
    if let Some(tolerance) = args.tolerance {
        config.tolerance = tolerance;
    }
    let file = File::open(&args.input)?;
    let reader = BufReader::new(file);
    let annotations: Vec<AnnotationRecord> = serde_json::from_reader(reader)?;
    info!(count = annotations.len(), tolerance = %config.tolerance, "loaded annotations");

    let pipeline = ImportPipeline::new(config);
    let mut tally = Tally::default();
    for record in &annotations {
        let job = ImportJob {
            audio_path: record.path.clone(),
            tags: AcidizerTags::from_parts(record.acid_bpm, record.one_shot),
            project_tempo: None,
        };
        let detected = match pipeline.analyze(&job, &mut |_| {}) {
            Ok(report) => report.raw_tempo.map(f64::from),
            Err(err) => {
                warn!(path = %record.path, error = %err, "analysis failed");
                None
            }
        };
        let outcome = classify(record.expected_bpm, detected, args.max_error);
        info!(path = %record.path, expected = ?record.expected_bpm, ?detected, ?outcome, "scored");
        tally.add(outcome);
    }

    println!(
        "{} files: {} hits, {} octave errors, {} misses, {} false positives, {} correct rejections ({:.1}% accurate)",
        tally.total(),
        tally.hits,
        tally.octave_errors,
        tally.misses,
        tally.false_positives,
        tally.correct_rejections,
        tally.accuracy() * 100.0
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_outcomes() {
        assert_eq!(classify(Some(120.0), Some(121.0), 2.0), Outcome::Hit);
        assert_eq!(classify(Some(120.0), Some(60.5), 2.0), Outcome::OctaveError);
        assert_eq!(classify(Some(120.0), Some(90.0), 2.0), Outcome::Miss);
        assert_eq!(classify(Some(120.0), None, 2.0), Outcome::Miss);
        assert_eq!(classify(None, Some(120.0), 2.0), Outcome::FalsePositive);
        assert_eq!(classify(None, None, 2.0), Outcome::CorrectRejection);
    }

    #[test]
    fn tally_accuracy() {
        let mut tally = Tally::default();
        assert_eq!(tally.accuracy(), 0.0);
        tally.add(Outcome::Hit);
        tally.add(Outcome::CorrectRejection);
        tally.add(Outcome::Miss);
        tally.add(Outcome::OctaveError);
        assert_eq!(tally.total(), 4);
        assert_eq!(tally.accuracy(), 0.5);
    }

    #[test]
    fn annotation_defaults() {
        let records: Vec<AnnotationRecord> =
            serde_json::from_str(r#"[{"path": "kick.wav", "expected_bpm": null, "one_shot": true}]"#)
                .unwrap();
        assert!(records[0].one_shot);
        assert!(records[0].acid_bpm.is_none());
    }
}
