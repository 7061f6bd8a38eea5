use cadence_audio::{AutocorrelationTempoEstimator, MirAudioReader, TempoEstimator};
use cadence_domain::{AcidizerTags, Bpm, MirConfig, TempoProvenance};
use time::Duration;
use tracing::{debug, warn};

use crate::music_information::MusicInformation;
use crate::tempo_source::{TempoSource, TextualTempo};

/// Builds [`MusicInformation`] from tags, file name and, as a last resort, audio content.
pub struct TempoResolver {
    config: MirConfig,
    estimator: Box<dyn TempoEstimator>,
}

impl TempoResolver {
    pub fn new(config: MirConfig) -> Self {
        Self::with_estimator(config, Box::new(AutocorrelationTempoEstimator::default()))
    }

    pub fn with_estimator(config: MirConfig, estimator: Box<dyn TempoEstimator>) -> Self {
        Self { config, estimator }
    }

    pub fn config(&self) -> &MirConfig {
        &self.config
    }

    /// Tags, then file name, then audio content.
    ///
    /// The reader is only touched on the analysis path.
    pub fn resolve(
        &self,
        tags: Option<AcidizerTags>,
        filename: &str,
        reader: &dyn MirAudioReader,
        progress: &mut dyn FnMut(f64),
    ) -> MusicInformation {
        let (bpm, provenance, clip_duration) = match TempoSource::new(tags, filename).resolve() {
            TextualTempo::OneShot => return MusicInformation::one_shot(),
            TextualTempo::Found { bpm, provenance } => (bpm, provenance, None),
            TextualTempo::Missing => match self.analyze(reader, progress) {
                Some((bpm, duration)) => (bpm, TempoProvenance::AudioAnalysis, Some(duration)),
                None => {
                    debug!(filename, "no reliable tempo");
                    return MusicInformation::unresolved();
                }
            },
        };
        debug!(filename, %bpm, ?provenance, ?clip_duration, "resolved tempo");
        MusicInformation::resolved(bpm, provenance, clip_duration)
    }

    fn analyze(
        &self,
        reader: &dyn MirAudioReader,
        progress: &mut dyn FnMut(f64),
    ) -> Option<(Bpm, Duration)> {
        if !self.config.analysis_enabled {
            return None;
        }
        // File readers probe for the duration but decode to answer `is_empty`.
        let seconds = reader.duration().as_seconds_f64();
        if seconds > self.config.max_analysis_seconds {
            debug!(seconds, max = self.config.max_analysis_seconds, "too long to analyze");
            return None;
        }
        if reader.is_empty() {
            return None;
        }
        let estimate = match self.estimator.estimate(reader, progress) {
            Ok(Some(estimate)) => estimate,
            Ok(None) => return None,
            Err(err) => {
                warn!(estimator = self.estimator.name(), error = %err, "tempo analysis failed");
                return None;
            }
        };
        let min_confidence = self.config.min_confidence();
        if estimate.confidence.is_nan() || estimate.confidence < min_confidence {
            debug!(
                bpm = estimate.bpm,
                confidence = estimate.confidence,
                min_confidence,
                tolerance = %self.config.tolerance,
                "rejecting low-confidence estimate"
            );
            return None;
        }
        let Some(bpm) = Bpm::new(estimate.bpm) else {
            debug!(bpm = estimate.bpm, "estimate outside tempo range");
            return None;
        };
        // Decoded by now, so file readers report the decoded length.
        Some((bpm, reader.duration()))
    }
}

impl Default for TempoResolver {
    fn default() -> Self {
        Self::new(MirConfig::default())
    }
}
