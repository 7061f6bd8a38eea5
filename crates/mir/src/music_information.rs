use cadence_audio::MirAudioReader;
use cadence_domain::{
    AcidizerTags, Bpm, FalsePositiveTolerance, MirConfig, ProjectSyncInfo, TempoProvenance,
};
use time::Duration;

use crate::resolver::TempoResolver;
use crate::sync::{excess_duration_in_quarter_notes, ProjectSyncCalculator};

/// What is known about the tempo of one imported asset.
///
/// Resolved once at construction and immutable afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct MusicInformation {
    raw_tempo: Option<Bpm>,
    provenance: Option<TempoProvenance>,
    is_one_shot: bool,
    clip_duration: Option<Duration>,
}

impl MusicInformation {
    /// Resolves with the default estimator and `tolerance` applied to [`MirConfig::default`].
    ///
    /// `progress` is only called while audio content is analyzed.
    pub fn new(
        tags: Option<AcidizerTags>,
        filename: &str,
        reader: &dyn MirAudioReader,
        tolerance: FalsePositiveTolerance,
        progress: &mut dyn FnMut(f64),
    ) -> Self {
        TempoResolver::new(MirConfig::with_tolerance(tolerance))
            .resolve(tags, filename, reader, progress)
    }

    pub(crate) fn one_shot() -> Self {
        Self {
            raw_tempo: None,
            provenance: None,
            is_one_shot: true,
            clip_duration: None,
        }
    }

    pub(crate) fn unresolved() -> Self {
        Self {
            raw_tempo: None,
            provenance: None,
            is_one_shot: false,
            clip_duration: None,
        }
    }

    pub(crate) fn resolved(
        bpm: Bpm,
        provenance: TempoProvenance,
        clip_duration: Option<Duration>,
    ) -> Self {
        Self {
            raw_tempo: Some(bpm),
            provenance: Some(provenance),
            is_one_shot: false,
            clip_duration,
        }
    }

    /// Attaches the clip length used for the excess duration in [`Self::project_sync_info`].
    ///
    /// Only known up front when the content was analyzed; textual tempos leave it to the caller.
    pub fn with_clip_duration(self, clip_duration: Duration) -> Self {
        Self {
            clip_duration: Some(clip_duration),
            ..self
        }
    }

    pub fn clip_duration(&self) -> Option<Duration> {
        self.clip_duration
    }

    pub fn is_reliable(&self) -> bool {
        !self.is_one_shot && self.raw_tempo.is_some()
    }

    pub fn is_one_shot(&self) -> bool {
        self.is_one_shot
    }

    pub fn raw_tempo(&self) -> Option<Bpm> {
        self.raw_tempo.filter(|_| !self.is_one_shot)
    }

    pub fn provenance(&self) -> Option<TempoProvenance> {
        self.provenance
    }

    /// How the asset should be aligned to `project_tempo`; `None` without a reliable tempo.
    pub fn project_sync_info(&self, project_tempo: Option<f64>) -> Option<ProjectSyncInfo> {
        let raw_tempo = self.raw_tempo()?;
        let provenance = self.provenance?;
        let excess = self.clip_duration.map_or(0.0, |duration| {
            excess_duration_in_quarter_notes(duration.as_seconds_f64(), raw_tempo)
        });
        Some(ProjectSyncCalculator.compute(raw_tempo, project_tempo, excess, provenance))
    }
}
