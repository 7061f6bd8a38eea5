use serde::{Deserialize, Serialize};

use crate::{
    error::DomainError,
    tempo::{Bpm, ProjectSyncInfo, TempoProvenance},
};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Yaml,
}

/// Outcome of analyzing one imported asset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TempoReport {
    pub source: String,
    pub reliable: bool,
    pub raw_tempo: Option<Bpm>,
    pub provenance: Option<TempoProvenance>,
    pub sync: Option<ProjectSyncInfo>,
}

pub trait ReportExporter {
    fn export(&self, report: &TempoReport, format: ExportFormat) -> Result<Vec<u8>, DomainError>;
}

pub struct JsonExporter;

impl ReportExporter for JsonExporter {
    fn export(&self, report: &TempoReport, format: ExportFormat) -> Result<Vec<u8>, DomainError> {
        match format {
            ExportFormat::Json => serde_json::to_vec_pretty(report)
                .map_err(|err| DomainError::Serialization(err.to_string())),
            other => Err(DomainError::validation(format!(
                "JsonExporter cannot handle {:?}",
                other
            ))),
        }
    }
}

pub struct YamlExporter;

impl ReportExporter for YamlExporter {
    fn export(&self, report: &TempoReport, format: ExportFormat) -> Result<Vec<u8>, DomainError> {
        match format {
            ExportFormat::Yaml => serde_yaml::to_string(report)
                .map(String::into_bytes)
                .map_err(|err| DomainError::Serialization(err.to_string())),
            other => Err(DomainError::validation(format!(
                "YamlExporter cannot handle {:?}",
                other
            ))),
        }
    }
}

pub fn exporter_for(format: ExportFormat) -> Box<dyn ReportExporter> {
    match format {
        ExportFormat::Json => Box::new(JsonExporter),
        ExportFormat::Yaml => Box::new(YamlExporter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> TempoReport {
        let bpm = Bpm::new(120.0).unwrap();
        TempoReport {
            source: "loop_120bpm.wav".into(),
            reliable: true,
            raw_tempo: Some(bpm),
            provenance: Some(TempoProvenance::Filename),
            sync: Some(ProjectSyncInfo {
                raw_audio_tempo: bpm,
                stretch_minimizing_pow_of_two: 1.0,
                excess_duration_in_quarter_notes: 0.0,
                provenance: TempoProvenance::Filename,
            }),
        }
    }

    #[test]
    fn exports_json() {
        let bytes = JsonExporter.export(&report(), ExportFormat::Json).unwrap();
        let output = String::from_utf8(bytes).unwrap();
        assert!(output.contains("\"raw_tempo\": 120.0"));
        assert!(output.contains("\"provenance\": \"filename\""));
    }

    #[test]
    fn exports_yaml() {
        let bytes = exporter_for(ExportFormat::Yaml)
            .export(&report(), ExportFormat::Yaml)
            .unwrap();
        let output = String::from_utf8(bytes).unwrap();
        assert!(output.contains("reliable: true"));
    }

    #[test]
    fn exporter_rejects_foreign_format() {
        assert!(JsonExporter.export(&report(), ExportFormat::Yaml).is_err());
    }
}
