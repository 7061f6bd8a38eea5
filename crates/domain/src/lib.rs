pub mod config;
pub mod error;
pub mod report;
pub mod tempo;

pub use crate::config::{FalsePositiveTolerance, MirConfig};
pub use crate::error::DomainError;
pub use crate::report::{ExportFormat, ReportExporter, TempoReport};
pub use crate::tempo::{AcidizerTags, Bpm, ProjectSyncInfo, TempoProvenance};
