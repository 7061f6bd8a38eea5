use cadence_domain::{AcidizerTags, Bpm, TempoProvenance};
use tracing::debug;

use crate::filename::bpm_from_filename;

/// Result of consulting the textual tempo sources of an asset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextualTempo {
    /// Tagged as a one-shot; no tempo applies.
    OneShot,
    Found { bpm: Bpm, provenance: TempoProvenance },
    /// Nothing usable; content analysis may still find a tempo.
    Missing,
}

/// The metadata-level tempo sources of one asset: its loop tags and its file name.
#[derive(Clone, Copy, Debug)]
pub struct TempoSource<'a> {
    tags: Option<AcidizerTags>,
    filename: &'a str,
}

impl<'a> TempoSource<'a> {
    pub fn new(tags: Option<AcidizerTags>, filename: &'a str) -> Self {
        Self { tags, filename }
    }

    /// One-shot tags win over everything, then a valid tag tempo, then the file name.
    pub fn resolve(&self) -> TextualTempo {
        if let Some(tags) = self.tags {
            if tags.is_one_shot {
                debug!(filename = self.filename, "tagged as one-shot");
                return TextualTempo::OneShot;
            }
            if let Some(bpm) = tags.valid_bpm() {
                return TextualTempo::Found {
                    bpm,
                    provenance: TempoProvenance::AcidTag,
                };
            }
            debug!(tag_bpm = tags.bpm, "ignoring out-of-range tag tempo");
        }
        match bpm_from_filename(self.filename) {
            Some(bpm) => TextualTempo::Found {
                bpm,
                provenance: TempoProvenance::Filename,
            },
            None => TextualTempo::Missing,
        }
    }
}
