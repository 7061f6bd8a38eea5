use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::DomainError;

/// How willing the resolver is to trust a tempo that only audio analysis backs.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FalsePositiveTolerance {
    Strict,
    #[default]
    Lenient,
}

impl FromStr for FalsePositiveTolerance {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(DomainError::validation(format!(
                "unknown tolerance {other:?}, expected strict or lenient"
            ))),
        }
    }
}

impl fmt::Display for FalsePositiveTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => f.write_str("strict"),
            Self::Lenient => f.write_str("lenient"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MirConfig {
    pub tolerance: FalsePositiveTolerance,
    /// Minimum estimator confidence accepted under [`FalsePositiveTolerance::Strict`].
    pub strict_min_confidence: f64,
    /// Minimum estimator confidence accepted under [`FalsePositiveTolerance::Lenient`].
    pub lenient_min_confidence: f64,
    pub analysis_enabled: bool,
    /// Clips longer than this are not analyzed.
    pub max_analysis_seconds: f64,
}

impl Default for MirConfig {
    fn default() -> Self {
        Self {
            tolerance: FalsePositiveTolerance::default(),
            strict_min_confidence: 0.8,
            lenient_min_confidence: 0.0,
            analysis_enabled: true,
            max_analysis_seconds: 60.0,
        }
    }
}

impl MirConfig {
    pub fn with_tolerance(tolerance: FalsePositiveTolerance) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }

    pub fn from_yaml_str(source: &str) -> Result<Self, DomainError> {
        let config: Self =
            serde_yaml::from_str(source).map_err(|err| DomainError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DomainError> {
        let path = path.as_ref();
        debug!(?path, "loading mir config");
        let source = fs::read_to_string(path)
            .map_err(|err| DomainError::Config(format!("read {:?}: {err}", path)))?;
        Self::from_yaml_str(&source)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        for (name, value) in [
            ("strict_min_confidence", self.strict_min_confidence),
            ("lenient_min_confidence", self.lenient_min_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DomainError::validation(format!(
                    "{name} must be between 0 and 1, got {value}"
                )));
            }
        }
        if self.max_analysis_seconds.is_nan() || self.max_analysis_seconds <= 0.0 {
            return Err(DomainError::validation(
                "max_analysis_seconds must be positive",
            ));
        }
        Ok(())
    }

    /// Confidence an analysis estimate must reach under the configured tolerance.
    pub fn min_confidence(&self) -> f64 {
        match self.tolerance {
            FalsePositiveTolerance::Strict => self.strict_min_confidence,
            FalsePositiveTolerance::Lenient => self.lenient_min_confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = MirConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tolerance, FalsePositiveTolerance::Lenient);
        assert_eq!(config.min_confidence(), 0.0);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = MirConfig::from_yaml_str("tolerance: strict\n").unwrap();
        assert_eq!(config.tolerance, FalsePositiveTolerance::Strict);
        assert_eq!(config.min_confidence(), 0.8);
        assert!(config.analysis_enabled);
    }

    #[test]
    fn yaml_validation() {
        assert!(MirConfig::from_yaml_str("strict_min_confidence: 1.5\n").is_err());
        assert!(MirConfig::from_yaml_str("max_analysis_seconds: 0\n").is_err());
        assert!(matches!(
            MirConfig::from_yaml_str("tolerance: [").unwrap_err(),
            DomainError::Config(_)
        ));
    }

    #[test]
    fn tolerance_parses_case_insensitively() {
        assert_eq!(
            "STRICT".parse::<FalsePositiveTolerance>().unwrap(),
            FalsePositiveTolerance::Strict
        );
        assert!("maybe".parse::<FalsePositiveTolerance>().is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        assert!(MirConfig::load("does-not-exist.yaml").is_err());
    }
}
