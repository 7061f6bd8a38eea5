use anyhow::Result;
use ndarray::{s, Array1};
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::dsp::{hann_window, normalize_buffer};
use crate::reader::MirAudioReader;

pub const FRAME_SIZE: usize = 1024;
pub const HOP_SIZE: usize = 512;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TempoEstimate {
    pub bpm: f64,
    /// How periodic the onset envelope is at `bpm`, in `[0, 1]`.
    pub confidence: f64,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid sample rate {0}")]
    InvalidSampleRate(u32),
    #[error("fft failed: {0}")]
    Fft(String),
}

/// Content-based tempo detection backend.
pub trait TempoEstimator: Send + Sync {
    /// Estimates the tempo of the reader's content, reporting progress in `[0, 1]`.
    ///
    /// `Ok(None)` means the content carries no detectable pulse.
    fn estimate(
        &self,
        reader: &dyn MirAudioReader,
        progress: &mut dyn FnMut(f64),
    ) -> Result<Option<TempoEstimate>>;

    fn name(&self) -> &'static str;
}

pub struct NullTempoEstimator;

impl TempoEstimator for NullTempoEstimator {
    fn estimate(
        &self,
        _reader: &dyn MirAudioReader,
        _progress: &mut dyn FnMut(f64),
    ) -> Result<Option<TempoEstimate>> {
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

/// Autocorrelation of a spectral-flux onset envelope.
#[derive(Debug, Clone)]
pub struct AutocorrelationTempoEstimator {
    pub min_bpm: f64,
    pub max_bpm: f64,
    /// Center of the log-Gaussian tempo prior.
    pub prior_center_bpm: f64,
    /// Prior width in octaves.
    pub prior_octaves: f64,
    /// Relative distance within which the estimate snaps to a whole number of beats.
    pub snap_tolerance: f64,
}

impl Default for AutocorrelationTempoEstimator {
    fn default() -> Self {
        Self {
            min_bpm: 30.0,
            max_bpm: 300.0,
            prior_center_bpm: 120.0,
            prior_octaves: 1.0,
            snap_tolerance: 0.03,
        }
    }
}

impl AutocorrelationTempoEstimator {
    fn onset_envelope(
        &self,
        reader: &dyn MirAudioReader,
        progress: &mut dyn FnMut(f64),
    ) -> Result<Option<Array1<f32>>> {
        let total = reader.num_samples();
        let frame_count = ((total - FRAME_SIZE as u64) / HOP_SIZE as u64 + 1) as usize;

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(FRAME_SIZE);
        let window = hann_window(FRAME_SIZE);
        let mut frame = vec![0.0f32; FRAME_SIZE];
        let mut input = fft.make_input_vec();
        let mut spectrum = fft.make_output_vec();
        let mut previous = vec![0.0f32; spectrum.len()];
        let mut flux = Array1::<f32>::zeros(frame_count);

        for index in 0..frame_count {
            reader.read_floats(index as u64 * HOP_SIZE as u64, &mut frame);
            for ((dst, sample), weight) in input.iter_mut().zip(&frame).zip(&window) {
                *dst = sample * weight;
            }
            fft.process(&mut input, &mut spectrum)
                .map_err(|err| AnalysisError::Fft(err.to_string()))?;
            let mut rise = 0.0f32;
            for (bin, prev) in spectrum.iter().zip(previous.iter_mut()) {
                let magnitude = bin.norm().ln_1p();
                rise += (magnitude - *prev).max(0.0);
                *prev = magnitude;
            }
            flux[index] = rise;
            if index % 64 == 0 {
                progress(0.8 * index as f64 / frame_count as f64);
            }
        }
        progress(0.8);
        if let Some(values) = flux.as_slice_mut() {
            if normalize_buffer(values).is_silent() {
                return Ok(None);
            }
        }

        let smoothed = Array1::from_shape_fn(frame_count, |i| {
            let here = flux[i];
            let before = if i > 0 { flux[i - 1] } else { here };
            let after = flux.get(i + 1).copied().unwrap_or(here);
            0.25 * before + 0.5 * here + 0.25 * after
        });
        let mean = smoothed.mean().unwrap_or(0.0);
        Ok(Some(smoothed.mapv(|v| v - mean)))
    }

    fn prior(&self, bpm: f64) -> f64 {
        let octaves = (bpm / self.prior_center_bpm).log2() / self.prior_octaves;
        (-0.5 * octaves * octaves).exp()
    }

    fn snap_to_whole_beats(&self, bpm: f64, duration_seconds: f64) -> f64 {
        let beats = (duration_seconds * bpm / 60.0).round();
        if beats < 1.0 {
            return bpm;
        }
        let snapped = beats * 60.0 / duration_seconds;
        if ((snapped - bpm) / bpm).abs() <= self.snap_tolerance {
            snapped
        } else {
            bpm
        }
    }
}

impl TempoEstimator for AutocorrelationTempoEstimator {
    fn estimate(
        &self,
        reader: &dyn MirAudioReader,
        progress: &mut dyn FnMut(f64),
    ) -> Result<Option<TempoEstimate>> {
        let sample_rate = reader.sample_rate();
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidSampleRate(sample_rate).into());
        }
        progress(0.0);
        if reader.num_samples() < FRAME_SIZE as u64 {
            progress(1.0);
            return Ok(None);
        }

        let Some(envelope) = self.onset_envelope(reader, progress)? else {
            debug!("no onsets found");
            progress(1.0);
            return Ok(None);
        };
        let n = envelope.len();
        let frame_rate = sample_rate as f64 / HOP_SIZE as f64;
        let energy = envelope.dot(&envelope) as f64;
        let min_lag = ((60.0 * frame_rate / self.max_bpm).floor() as usize).max(1);
        let max_lag =
            ((60.0 * frame_rate / self.min_bpm).ceil() as usize).min(n.saturating_sub(2));
        if energy <= f64::EPSILON || min_lag >= max_lag {
            debug!(frames = n, min_lag, max_lag, "no usable onset envelope");
            progress(1.0);
            return Ok(None);
        }

        let acf: Vec<f64> = (0..=max_lag + 1)
            .map(|lag| {
                envelope
                    .slice(s![..n - lag])
                    .dot(&envelope.slice(s![lag..])) as f64
            })
            .collect();
        progress(0.9);

        let best = (min_lag..=max_lag)
            .filter(|&lag| acf[lag] > 0.0)
            .map(|lag| (lag, acf[lag] * self.prior(60.0 * frame_rate / lag as f64)))
            .max_by(|a, b| a.1.total_cmp(&b.1));
        let Some((lag, _)) = best else {
            progress(1.0);
            return Ok(None);
        };

        let (before, peak, after) = (acf[lag - 1], acf[lag], acf[lag + 1]);
        let curvature = before - 2.0 * peak + after;
        let offset = if curvature < 0.0 {
            (0.5 * (before - after) / curvature).clamp(-0.5, 0.5)
        } else {
            0.0
        };
        let raw_bpm = 60.0 * frame_rate / (lag as f64 + offset);
        let duration = reader.num_samples() as f64 / sample_rate as f64;
        let bpm = self.snap_to_whole_beats(raw_bpm, duration);
        let confidence = (peak / energy).clamp(0.0, 1.0);
        debug!(lag, raw_bpm, bpm, confidence, "autocorrelation tempo estimate");
        progress(1.0);
        Ok(Some(TempoEstimate { bpm, confidence }))
    }

    fn name(&self) -> &'static str {
        "autocorrelation"
    }
}
