pub mod filename;
pub mod music_information;
pub mod pipeline;
pub mod resolver;
pub mod sync;
pub mod tempo_source;

pub use filename::bpm_from_filename;
pub use music_information::MusicInformation;
pub use pipeline::{ImportJob, ImportPipeline};
pub use resolver::TempoResolver;
pub use sync::ProjectSyncCalculator;
pub use tempo_source::{TempoSource, TextualTempo};
