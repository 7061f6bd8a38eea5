use cadence_domain::{Bpm, ProjectSyncInfo, TempoProvenance};
use tracing::debug;

/// Picks the power-of-two multiple of an asset's tempo closest to the project tempo.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProjectSyncCalculator;

impl ProjectSyncCalculator {
    /// `2^round(log2(project / raw))`, ties rounding away from zero.
    ///
    /// Returns 1 without a project tempo, or when the project tempo is not a positive
    /// finite number.
    pub fn stretch_minimizing_pow_of_two(&self, raw_tempo: Bpm, project_tempo: Option<f64>) -> f64 {
        let Some(project_tempo) = project_tempo else {
            return 1.0;
        };
        if !project_tempo.is_finite() || project_tempo <= 0.0 {
            debug!(project_tempo, "ignoring unusable project tempo");
            return 1.0;
        }
        let exponent = (project_tempo / raw_tempo.get()).log2().round();
        2f64.powi(exponent as i32)
    }

    pub fn compute(
        &self,
        raw_tempo: Bpm,
        project_tempo: Option<f64>,
        excess_duration_in_quarter_notes: f64,
        provenance: TempoProvenance,
    ) -> ProjectSyncInfo {
        ProjectSyncInfo {
            raw_audio_tempo: raw_tempo,
            stretch_minimizing_pow_of_two: self
                .stretch_minimizing_pow_of_two(raw_tempo, project_tempo),
            excess_duration_in_quarter_notes,
            provenance,
        }
    }
}

/// Fraction of a quarter note by which `duration_seconds` overshoots a whole number of
/// quarter notes at `tempo`.
pub fn excess_duration_in_quarter_notes(duration_seconds: f64, tempo: Bpm) -> f64 {
    if duration_seconds <= 0.0 {
        return 0.0;
    }
    let quarter_notes = duration_seconds / tempo.seconds_per_beat();
    let excess = quarter_notes - quarter_notes.floor();
    if excess < 1e-3 || 1.0 - excess < 1e-3 {
        0.0
    } else {
        excess
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn factor(project_tempo: Option<f64>) -> f64 {
        ProjectSyncCalculator.stretch_minimizing_pow_of_two(Bpm::new(100.0).unwrap(), project_tempo)
    }

    #[test]
    fn powers_of_two() {
        assert_eq!(factor(Some(100.0)), 1.0);
        assert_eq!(factor(Some(200.0)), 2.0);
        assert_eq!(factor(Some(400.0)), 4.0);
        assert_eq!(factor(Some(50.0)), 0.5);
        assert_eq!(factor(Some(25.0)), 0.25);
    }

    #[test]
    fn rounding_edges() {
        assert_eq!(factor(Some(100.0 * 2f64.powf(0.51))), 2.0);
        assert_eq!(factor(Some(100.0 * 2f64.powf(0.49))), 1.0);
        assert_eq!(factor(Some(100.0 * 2f64.powf(-0.49))), 1.0);
        assert_eq!(factor(Some(100.0 * 2f64.powf(-0.51))), 0.5);
    }

    #[test]
    fn missing_or_unusable_project_tempo() {
        assert_eq!(factor(None), 1.0);
        assert_eq!(factor(Some(0.0)), 1.0);
        assert_eq!(factor(Some(-120.0)), 1.0);
        assert_eq!(factor(Some(f64::NAN)), 1.0);
        assert_eq!(factor(Some(f64::INFINITY)), 1.0);
    }

    #[test]
    fn compute_carries_raw_tempo() {
        let info = ProjectSyncCalculator.compute(
            Bpm::new(100.0).unwrap(),
            None,
            0.0,
            TempoProvenance::AcidTag,
        );
        assert_eq!(info.raw_audio_tempo, 100.0);
        assert_eq!(info.stretch_minimizing_pow_of_two, 1.0);
        assert!(!info.used_filename_bpm());
    }

    #[test]
    fn excess_duration() {
        let tempo = Bpm::new(120.0).unwrap();
        assert_abs_diff_eq!(excess_duration_in_quarter_notes(8.0, tempo), 0.0);
        assert_abs_diff_eq!(excess_duration_in_quarter_notes(8.25, tempo), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(excess_duration_in_quarter_notes(0.0, tempo), 0.0);
    }
}
