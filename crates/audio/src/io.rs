use std::cell::OnceCell;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use time::Duration;
use tracing::{debug, warn};

use crate::reader::MirAudioReader;

/// Fully decoded audio, downmixed to mono.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    /// Channel count of the source before downmixing.
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl DecodedAudio {
    pub fn from_samples(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            channels: 1,
            samples,
        }
    }
}

impl MirAudioReader for DecodedAudio {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn num_samples(&self) -> u64 {
        self.samples.len() as u64
    }

    fn read_floats(&self, start: u64, buffer: &mut [f32]) {
        buffer.fill(0.0);
        let Ok(start) = usize::try_from(start) else {
            return;
        };
        if start >= self.samples.len() {
            return;
        }
        let available = &self.samples[start..];
        let count = available.len().min(buffer.len());
        buffer[..count].copy_from_slice(&available[..count]);
    }
}

pub struct AudioDecoder;

impl AudioDecoder {
    fn probe(path_ref: &Path) -> Result<Box<dyn FormatReader>> {
        let file =
            File::open(path_ref).with_context(|| format!("open audio file {:?}", path_ref))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());
        let mut hint = Hint::new();
        if let Some(ext) = path_ref.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(ext);
        }
        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .with_context(|| format!("probe audio format of {:?}", path_ref))?;
        Ok(probed.format)
    }

    /// Duration announced by the container, without decoding any packet.
    pub fn probe_duration<P: AsRef<Path>>(path: P) -> Result<Option<Duration>> {
        let format = Self::probe(path.as_ref())?;
        let Some(track) = format.default_track() else {
            return Ok(None);
        };
        let params = &track.codec_params;
        Ok(match (params.n_frames, params.sample_rate) {
            (Some(frames), Some(rate)) if rate > 0 => {
                Some(Duration::seconds_f64(frames as f64 / rate as f64))
            }
            _ => None,
        })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<DecodedAudio> {
        let path_ref = path.as_ref();
        let mut format = Self::probe(path_ref)?;
        let track = format
            .default_track()
            .ok_or_else(|| anyhow::anyhow!("no default track found"))?;
        let track_id = track.id;
        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())?;
        let sample_rate = track.codec_params.sample_rate.unwrap_or(48_000);
        let channels = track
            .codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(1);
        let mut samples = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(err) => return Err(err.into()),
            };
            if packet.track_id() != track_id {
                continue;
            }
            let buffer = match decoder.decode(&packet) {
                Ok(buffer) => buffer,
                Err(SymphError::DecodeError(reason)) => {
                    warn!(reason, "skipping undecodable packet");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            let spec = *buffer.spec();
            let channel_count = spec.channels.count().max(1);
            let mut interleaved = SampleBuffer::<f32>::new(buffer.capacity() as u64, spec);
            interleaved.copy_interleaved_ref(buffer);
            samples.extend(
                interleaved
                    .samples()
                    .chunks(channel_count)
                    .map(|frame| frame.iter().sum::<f32>() / channel_count as f32),
            );
        }

        debug!(
            path = ?path_ref,
            sample_rate,
            channels,
            frames = samples.len(),
            "decoded audio"
        );
        Ok(DecodedAudio {
            sample_rate,
            channels,
            samples,
        })
    }
}

/// Reader that decodes its file on first access.
///
/// A file that cannot be decoded reads as empty.
pub struct FileAudioReader {
    path: PathBuf,
    decoded: OnceCell<DecodedAudio>,
    probed_duration: OnceCell<Duration>,
}

impl FileAudioReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            decoded: OnceCell::new(),
            probed_duration: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn audio(&self) -> &DecodedAudio {
        self.decoded
            .get_or_init(|| match AudioDecoder::open(&self.path) {
                Ok(audio) => audio,
                Err(err) => {
                    warn!(path = ?self.path, error = %err, "could not decode audio, treating as empty");
                    DecodedAudio::default()
                }
            })
    }

    pub fn is_decoded(&self) -> bool {
        self.decoded.get().is_some()
    }
}

impl MirAudioReader for FileAudioReader {
    fn sample_rate(&self) -> u32 {
        self.audio().sample_rate
    }

    fn num_samples(&self) -> u64 {
        self.audio().num_samples()
    }

    fn read_floats(&self, start: u64, buffer: &mut [f32]) {
        self.audio().read_floats(start, buffer)
    }

    fn duration(&self) -> Duration {
        if let Some(audio) = self.decoded.get() {
            return audio.duration();
        }
        *self
            .probed_duration
            .get_or_init(|| match AudioDecoder::probe_duration(&self.path) {
                Ok(Some(duration)) => duration,
                Ok(None) => {
                    debug!(path = ?self.path, "container does not announce a duration");
                    Duration::ZERO
                }
                Err(err) => {
                    debug!(path = ?self.path, error = %err, "could not probe duration");
                    Duration::ZERO
                }
            })
    }
}
