pub mod analysis;
pub mod dsp;
pub mod io;
pub mod reader;

pub use analysis::{AutocorrelationTempoEstimator, NullTempoEstimator, TempoEstimate, TempoEstimator};
pub use dsp::{hann_window, normalize_buffer, PeakLevel};
pub use io::{AudioDecoder, DecodedAudio, FileAudioReader};
pub use reader::{EmptyAudioReader, MirAudioReader};
