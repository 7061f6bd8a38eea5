use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use cadence_audio::io::FileAudioReader;
use cadence_audio::MirAudioReader;
use cadence_domain::{AcidizerTags, MirConfig, TempoReport};

use crate::resolver::TempoResolver;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJob {
    pub audio_path: String,
    pub tags: Option<AcidizerTags>,
    pub project_tempo: Option<f64>,
}

pub struct ImportPipeline {
    resolver: TempoResolver,
}

impl ImportPipeline {
    pub fn new(config: MirConfig) -> Self {
        Self {
            resolver: TempoResolver::new(config),
        }
    }

    pub fn with_resolver(resolver: TempoResolver) -> Self {
        Self { resolver }
    }

    #[instrument(skip(self, progress))]
    pub fn analyze(&self, job: &ImportJob, progress: &mut dyn FnMut(f64)) -> Result<TempoReport> {
        info!("analyzing import path={}", job.audio_path);
        if let Some(project_tempo) = job.project_tempo {
            anyhow::ensure!(
                project_tempo.is_finite() && project_tempo > 0.0,
                "project tempo must be positive, got {project_tempo}"
            );
        }
        let reader = FileAudioReader::new(&job.audio_path);
        let mut music = self
            .resolver
            .resolve(job.tags, &job.audio_path, &reader, progress);
        if music.is_reliable() && music.clip_duration().is_none() {
            music = music.with_clip_duration(reader.duration());
        }
        info!(
            reliable = music.is_reliable(),
            decoded = reader.is_decoded(),
            "import analyzed"
        );
        Ok(TempoReport {
            source: job.audio_path.clone(),
            reliable: music.is_reliable(),
            raw_tempo: music.raw_tempo(),
            provenance: music.provenance(),
            sync: music.project_sync_info(job.project_tempo),
        })
    }
}

impl Default for ImportPipeline {
    fn default() -> Self {
        Self::new(MirConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_domain::TempoProvenance;
    use hound::{WavSpec, WavWriter};
    use tempfile::TempDir;

    #[test]
    fn filename_tempo_without_decoding() {
        let pipeline = ImportPipeline::default();
        let job = ImportJob {
            audio_path: "missing/Drum Loop - 174 BPM.wav".to_string(),
            tags: None,
            project_tempo: Some(87.0),
        };
        let report = pipeline.analyze(&job, &mut |_| {}).unwrap();
        assert!(report.reliable);
        assert_eq!(report.provenance, Some(TempoProvenance::Filename));
        let sync = report.sync.unwrap();
        assert_eq!(sync.raw_audio_tempo, 174.0);
        assert_eq!(sync.stretch_minimizing_pow_of_two, 0.5);
    }

    #[test]
    fn directory_names_count() {
        let pipeline = ImportPipeline::default();
        let job = ImportJob {
            audio_path: "packs/128 BPM loops/hat.wav".to_string(),
            tags: None,
            project_tempo: None,
        };
        let report = pipeline.analyze(&job, &mut |_| {}).unwrap();
        assert_eq!(report.raw_tempo.unwrap(), 128.0);
    }

    #[test]
    fn filename_tempo_reports_excess_duration() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Loop 100 BPM.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        // 2.7 s, four and a half quarter notes at 100 BPM.
        for _ in 0..21_600 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let job = ImportJob {
            audio_path: path.to_string_lossy().into_owned(),
            tags: None,
            project_tempo: Some(100.0),
        };
        let report = ImportPipeline::default().analyze(&job, &mut |_| {}).unwrap();
        let sync = report.sync.unwrap();
        assert_eq!(sync.raw_audio_tempo, 100.0);
        assert!((sync.excess_duration_in_quarter_notes - 0.5).abs() < 1e-6);
    }

    #[test]
    fn missing_audio_without_hints_is_unreliable() {
        let pipeline = ImportPipeline::default();
        let job = ImportJob {
            audio_path: "missing.wav".to_string(),
            tags: None,
            project_tempo: None,
        };
        let report = pipeline.analyze(&job, &mut |_| {}).unwrap();
        assert!(!report.reliable);
        assert!(report.sync.is_none());
    }

    #[test]
    fn rejects_nonsensical_project_tempo() {
        let pipeline = ImportPipeline::default();
        let job = ImportJob {
            audio_path: "loop 120 bpm.wav".to_string(),
            tags: None,
            project_tempo: Some(-1.0),
        };
        assert!(pipeline.analyze(&job, &mut |_| {}).is_err());
    }
}
