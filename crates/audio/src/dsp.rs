use std::f32::consts::PI;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeakLevel {
    pub max: f32,
    pub min: f32,
}

impl PeakLevel {
    pub fn silence() -> Self {
        Self { max: 0.0, min: 0.0 }
    }

    pub fn is_silent(&self) -> bool {
        self.max.abs().max(self.min.abs()) <= 1e-6
    }
}

/// Scales `buffer` to unit peak and returns the peak found before scaling.
pub fn normalize_buffer(buffer: &mut [f32]) -> PeakLevel {
    let mut peak = PeakLevel::silence();
    for sample in buffer.iter() {
        peak.max = peak.max.max(*sample);
        peak.min = peak.min.min(*sample);
    }
    let gain = peak.max.abs().max(peak.min.abs()).max(1e-6);
    for sample in buffer.iter_mut() {
        *sample /= gain;
    }
    peak
}

pub fn hann_window(size: usize) -> Vec<f32> {
    if size < 2 {
        return vec![1.0; size];
    }
    let denom = (size - 1) as f32;
    (0..size)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f32 / denom).cos())
        .collect()
}
