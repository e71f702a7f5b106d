use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_TRACK_COUNT: usize = 64;
pub const DEFAULT_FPS: f64 = 29.97;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Tracks created per type (audio and video).
    pub track_count: usize,
    pub fps: f64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            track_count: DEFAULT_TRACK_COUNT,
            fps: DEFAULT_FPS,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub sequence: SequenceConfig,
    /// Maximum number of history entries, `0` keeps everything.
    pub undo_limit: usize,
}

impl WorkflowConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sequence.track_count == 0 {
            return Err(ConfigError::Invalid("track_count must be at least 1"));
        }
        if self.sequence.track_count > u32::MAX as usize {
            return Err(ConfigError::Invalid(
                "track_count exceeds the track id range",
            ));
        }
        if !self.sequence.fps.is_finite() || self.sequence.fps <= 0.0 {
            return Err(ConfigError::Invalid("fps must be a positive number"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = WorkflowConfig::from_json(r#"{ "undo_limit": 20 }"#).unwrap();
        assert_eq!(config.undo_limit, 20);
        assert_eq!(config.sequence, SequenceConfig::default());

        let config = WorkflowConfig::from_json(r#"{ "sequence": { "track_count": 8 } }"#).unwrap();
        assert_eq!(config.sequence.track_count, 8);
        assert_eq!(config.sequence.fps, DEFAULT_FPS);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            WorkflowConfig::from_json(r#"{ "sequence": { "track_count": 0 } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            WorkflowConfig::from_json(r#"{ "sequence": { "fps": -1.0 } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            WorkflowConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn json_round_trip() {
        let config = WorkflowConfig {
            undo_limit: 3,
            ..WorkflowConfig::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(WorkflowConfig::from_json(&json).unwrap(), config);
    }
}
