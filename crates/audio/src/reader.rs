use time::Duration;

/// Random access to the mono sample content of an audio asset.
pub trait MirAudioReader {
    fn sample_rate(&self) -> u32;

    /// Number of mono frames.
    fn num_samples(&self) -> u64;

    /// Fills `buffer` with frames starting at `start`; frames past the end read as silence.
    fn read_floats(&self, start: u64, buffer: &mut [f32]);

    fn duration(&self) -> Duration {
        let rate = self.sample_rate();
        if rate == 0 {
            return Duration::ZERO;
        }
        Duration::seconds_f64(self.num_samples() as f64 / rate as f64)
    }

    fn is_empty(&self) -> bool {
        self.num_samples() == 0
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyAudioReader;

impl MirAudioReader for EmptyAudioReader {
    fn sample_rate(&self) -> u32 {
        44_100
    }

    fn num_samples(&self) -> u64 {
        0
    }

    fn read_floats(&self, _start: u64, buffer: &mut [f32]) {
        buffer.fill(0.0);
    }
}
