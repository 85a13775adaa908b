//! Configuration schema types
//!
//! This module defines the build configuration for interchange
//! emission. Every key maps to the documented configuration surface:
//! interchange identifiers, usage indicator, payer preset, emission
//! mode, and delimiter overrides.

use crate::codes;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// ISA15 usage indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UsageIndicator {
    /// Test interchange (ISA15 = T)
    #[default]
    Test,
    /// Production interchange (ISA15 = P)
    Production,
}

impl UsageIndicator {
    /// The single-character ISA15 value
    pub fn as_x12(&self) -> &'static str {
        match self {
            UsageIndicator::Test => "T",
            UsageIndicator::Production => "P",
        }
    }
}

/// Build configuration
///
/// This is the root configuration structure; it maps directly to a
/// TOML file loaded through [`load_config`](crate::config::load_config)
/// or can be constructed in code. Defaults produce a valid test-mode
/// interchange addressed to placeholder identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// ISA05 sender id qualifier
    #[serde(default = "default_qual")]
    pub interchange_sender_qual: String,

    /// ISA06 sender id
    #[serde(default = "default_sender_id")]
    pub interchange_sender_id: String,

    /// ISA07 receiver id qualifier
    #[serde(default = "default_qual")]
    pub interchange_receiver_qual: String,

    /// ISA08 receiver id
    #[serde(default = "default_receiver_id")]
    pub interchange_receiver_id: String,

    /// GS02 application sender code
    #[serde(default = "default_gs_sender")]
    pub gs_sender_code: String,

    /// GS03 application receiver code
    #[serde(default = "default_gs_receiver")]
    pub gs_receiver_code: String,

    /// ISA15 test/production flag
    #[serde(default)]
    pub usage_indicator: UsageIndicator,

    /// Symbolic payer preset key; overrides receiver payer_id/payer_name
    #[serde(default)]
    pub payer_preset: Option<String>,

    /// When true (default), pickup/dropoff travel in CR109/CR110 and
    /// loops 2310E/F and 2420G/H are suppressed; when false, the legacy
    /// NTE + location-loop rendition is emitted
    #[serde(default = "default_true")]
    pub use_cr1_locations: bool,

    /// Segment terminator override (single character)
    #[serde(default = "default_segment_terminator")]
    pub segment_terminator: String,

    /// Element separator override (single character)
    #[serde(default = "default_element_separator")]
    pub element_separator: String,

    /// Component separator (single character)
    #[serde(default = "default_component_separator")]
    pub component_separator: String,

    /// Repetition separator (single character)
    #[serde(default = "default_repetition_separator")]
    pub repetition_separator: String,

    /// Newline after every terminator, for diagnostics only
    #[serde(default)]
    pub pretty: bool,

    /// Submitter fallback for batch flows whose trips carry no submitter
    #[serde(default)]
    pub submitter_name: Option<String>,

    /// Submitter id fallback for batch flows
    #[serde(default)]
    pub submitter_id: Option<String>,

    /// Starting ISA control number
    #[serde(default = "default_control")]
    pub isa_control_start: u32,

    /// Starting GS control number
    #[serde(default = "default_control")]
    pub gs_control_start: u32,

    /// Starting ST control number
    #[serde(default = "default_control")]
    pub st_control_start: u32,

    /// Fixed interchange timestamp; when unset the wall clock is used.
    /// Set this for byte-reproducible output.
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            interchange_sender_qual: default_qual(),
            interchange_sender_id: default_sender_id(),
            interchange_receiver_qual: default_qual(),
            interchange_receiver_id: default_receiver_id(),
            gs_sender_code: default_gs_sender(),
            gs_receiver_code: default_gs_receiver(),
            usage_indicator: UsageIndicator::default(),
            payer_preset: None,
            use_cr1_locations: true,
            segment_terminator: default_segment_terminator(),
            element_separator: default_element_separator(),
            component_separator: default_component_separator(),
            repetition_separator: default_repetition_separator(),
            pretty: false,
            submitter_name: None,
            submitter_id: None,
            isa_control_start: default_control(),
            gs_control_start: default_control(),
            st_control_start: default_control(),
            timestamp: None,
        }
    }
}

impl BuildConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("segment_terminator", &self.segment_terminator),
            ("element_separator", &self.element_separator),
            ("component_separator", &self.component_separator),
            ("repetition_separator", &self.repetition_separator),
        ] {
            if value.chars().count() != 1 {
                return Err(format!(
                    "{name} must be a single character, got {value:?}"
                ));
            }
        }

        let mut delims = [
            self.segment_terminator.as_str(),
            self.element_separator.as_str(),
            self.component_separator.as_str(),
            self.repetition_separator.as_str(),
        ];
        delims.sort_unstable();
        if delims.windows(2).any(|w| w[0] == w[1]) {
            return Err("delimiter characters must be pairwise distinct".to_string());
        }

        if let Some(key) = &self.payer_preset {
            if codes::payer_preset(key).is_none() {
                let known: Vec<&str> = codes::payer_presets().iter().map(|p| p.key).collect();
                return Err(format!(
                    "Unknown payer_preset '{}'. Known presets: {}",
                    key,
                    known.join(", ")
                ));
            }
        }

        if self.interchange_sender_qual.len() > 2 || self.interchange_receiver_qual.len() > 2 {
            return Err("interchange qualifiers are limited to 2 characters".to_string());
        }
        if self.interchange_sender_id.len() > 15 || self.interchange_receiver_id.len() > 15 {
            return Err("interchange ids are limited to 15 characters".to_string());
        }

        Ok(())
    }

    /// The four delimiter characters as chars
    ///
    /// Only valid after [`validate`](Self::validate) has passed.
    pub fn delimiter_chars(&self) -> (char, char, char, char) {
        (
            self.element_separator.chars().next().unwrap_or('*'),
            self.segment_terminator.chars().next().unwrap_or('~'),
            self.component_separator.chars().next().unwrap_or(':'),
            self.repetition_separator.chars().next().unwrap_or('^'),
        )
    }
}

fn default_qual() -> String {
    "ZZ".to_string()
}

fn default_sender_id() -> String {
    "SENDERID".to_string()
}

fn default_receiver_id() -> String {
    "RECEIVERID".to_string()
}

fn default_gs_sender() -> String {
    "SENDER".to_string()
}

fn default_gs_receiver() -> String {
    "RECEIVER".to_string()
}

fn default_true() -> bool {
    true
}

fn default_segment_terminator() -> String {
    "~".to_string()
}

fn default_element_separator() -> String {
    "*".to_string()
}

fn default_component_separator() -> String {
    ":".to_string()
}

fn default_repetition_separator() -> String {
    "^".to_string()
}

fn default_control() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = BuildConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.use_cr1_locations);
        assert_eq!(config.usage_indicator.as_x12(), "T");
    }

    #[test]
    fn test_rejects_multichar_delimiter() {
        let config = BuildConfig {
            segment_terminator: "~~".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_duplicate_delimiters() {
        let config = BuildConfig {
            element_separator: "~".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_preset() {
        let config = BuildConfig {
            payer_preset: Some("AETNA".to_string()),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("UHC_CS"));
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_src = r#"
            interchange_sender_id = "KZN001"
            usage_indicator = "production"
            payer_preset = "UHC_CS"
            use_cr1_locations = false
        "#;
        let config: BuildConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(config.interchange_sender_id, "KZN001");
        assert_eq!(config.usage_indicator, UsageIndicator::Production);
        assert!(!config.use_cr1_locations);
        assert!(config.validate().is_ok());
    }
}
