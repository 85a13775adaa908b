//! Configuration loader with TOML parsing and environment overrides
//!
//! Loads a [`BuildConfig`] from a TOML file and applies `KAIZEN_*`
//! environment variable overrides before validation, so containerized
//! callers can adjust routing without editing files:
//!
//! ```bash
//! KAIZEN_USAGE_INDICATOR=production
//! KAIZEN_PAYER_PRESET=UHC_CS
//! KAIZEN_INTERCHANGE_SENDER_ID=KZN001
//! ```

use crate::config::schema::{BuildConfig, UsageIndicator};
use crate::domain::{KaizenError, Result};
use std::path::Path;

/// Loads configuration from a TOML file
///
/// # Errors
///
/// Returns [`KaizenError::Configuration`] when the file cannot be read,
/// parsed, or fails validation.
pub fn load_config(path: impl AsRef<Path>) -> Result<BuildConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        KaizenError::Configuration(format!("Failed to read {}: {e}", path.display()))
    })?;

    let mut config: BuildConfig = toml::from_str(&raw)?;
    apply_env_overrides(&mut config);

    config.validate().map_err(KaizenError::Configuration)?;

    tracing::debug!(
        path = %path.display(),
        usage = ?config.usage_indicator,
        payer_preset = config.payer_preset.as_deref().unwrap_or("-"),
        "Configuration loaded"
    );

    Ok(config)
}

/// Applies `KAIZEN_*` environment variable overrides
fn apply_env_overrides(config: &mut BuildConfig) {
    if let Ok(v) = std::env::var("KAIZEN_INTERCHANGE_SENDER_ID") {
        config.interchange_sender_id = v;
    }
    if let Ok(v) = std::env::var("KAIZEN_INTERCHANGE_RECEIVER_ID") {
        config.interchange_receiver_id = v;
    }
    if let Ok(v) = std::env::var("KAIZEN_GS_SENDER_CODE") {
        config.gs_sender_code = v;
    }
    if let Ok(v) = std::env::var("KAIZEN_GS_RECEIVER_CODE") {
        config.gs_receiver_code = v;
    }
    if let Ok(v) = std::env::var("KAIZEN_PAYER_PRESET") {
        if v.is_empty() {
            config.payer_preset = None;
        } else {
            config.payer_preset = Some(v);
        }
    }
    if let Ok(v) = std::env::var("KAIZEN_USAGE_INDICATOR") {
        match v.to_ascii_lowercase().as_str() {
            "production" | "p" => config.usage_indicator = UsageIndicator::Production,
            "test" | "t" => config.usage_indicator = UsageIndicator::Test,
            other => {
                tracing::warn!(value = other, "Ignoring unknown KAIZEN_USAGE_INDICATOR");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "kaizen-config-test-{}.toml",
            std::process::id() as u64 + contents.len() as u64
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_valid_config() {
        let path = write_temp(
            r#"
            interchange_sender_id = "KZN001"
            gs_sender_code = "KZN"
            payer_preset = "UHC_KY"
            "#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.interchange_sender_id, "KZN001");
        assert_eq!(config.payer_preset.as_deref(), Some("UHC_KY"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = load_config("/nonexistent/kaizen.toml").unwrap_err();
        assert!(matches!(err, KaizenError::Configuration(_)));
    }

    #[test]
    fn test_invalid_preset_rejected() {
        let path = write_temp(r#"payer_preset = "NOT_A_PAYER""#);
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("payer_preset"));
        std::fs::remove_file(path).ok();
    }
}
