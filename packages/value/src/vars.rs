//! Runtime variables consulted by blocking builtins.
//!
//! Two interpreter variables matter here: CONVFMT, the numeric format used
//! when a number is coerced to a string, and OFS, the output field
//! separator placed between a notifier prefix and the ready handle. Both can
//! be reassigned by the running script at any time, so consumers hold a
//! [`VariableManager`] and read through it on every use.

use std::path::Path;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{FormatError, SettingsError};
use crate::format::{NumberFormat, DEFAULT_CONVFMT};
use crate::value::Value;

/// Live access to the runtime variables.
pub trait VariableManager: Send + Sync {
    /// The current numeric conversion format (CONVFMT).
    fn convfmt(&self) -> NumberFormat;

    /// The current output field separator (OFS).
    fn ofs(&self) -> Value;
}

/// Initial values for the runtime variables.
///
/// # Example
///
/// ```rust
/// use anyready_value::RuntimeSettings;
///
/// let settings = RuntimeSettings::from_json_str(r#"{"ofs": ","}"#).unwrap();
/// assert_eq!(settings.ofs, ",");
/// assert_eq!(settings.convfmt, "%.6g");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Numeric conversion format.
    pub convfmt: String,

    /// Output field separator.
    pub ofs: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            convfmt: DEFAULT_CONVFMT.to_string(),
            ofs: " ".to_string(),
        }
    }
}

impl RuntimeSettings {
    /// Parse settings from a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[derive(Debug)]
struct VarState {
    convfmt: NumberFormat,
    ofs: Value,
}

/// Shared, interior-mutable runtime variables.
///
/// Typically wrapped in an `Arc` and handed to every waiter the runtime
/// creates; assignments made by the script are visible on the next read.
#[derive(Debug)]
pub struct RuntimeVars {
    state: RwLock<VarState>,
}

impl RuntimeVars {
    /// Create variables holding the default settings.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(VarState {
                convfmt: NumberFormat::default(),
                ofs: Value::from(" "),
            }),
        }
    }

    /// Create variables from loaded settings.
    pub fn from_settings(settings: &RuntimeSettings) -> Result<Self, SettingsError> {
        let convfmt = NumberFormat::parse(&settings.convfmt)?;
        Ok(Self {
            state: RwLock::new(VarState {
                convfmt,
                ofs: Value::from(settings.ofs.as_str()),
            }),
        })
    }

    /// Assign CONVFMT. The previous format stays in effect if `spec` is invalid.
    pub fn set_convfmt(&self, spec: &str) -> Result<(), FormatError> {
        let convfmt = NumberFormat::parse(spec)?;
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .convfmt = convfmt;
        Ok(())
    }

    /// Assign OFS. Any scalar is allowed; numbers are rendered on read.
    pub fn set_ofs(&self, ofs: impl Into<Value>) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .ofs = ofs.into();
    }
}

impl Default for RuntimeVars {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableManager for RuntimeVars {
    fn convfmt(&self) -> NumberFormat {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .convfmt
            .clone()
    }

    fn ofs(&self) -> Value {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .ofs
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn settings_default() {
        let settings = RuntimeSettings::default();
        assert_eq!(settings.convfmt, "%.6g");
        assert_eq!(settings.ofs, " ");
    }

    #[test]
    fn settings_from_json_fills_defaults() {
        let settings = RuntimeSettings::from_json_str(r#"{"convfmt": "%.2f"}"#).unwrap();
        assert_eq!(settings.convfmt, "%.2f");
        assert_eq!(settings.ofs, " ");
    }

    #[test]
    fn settings_from_invalid_json() {
        let result = RuntimeSettings::from_json_str("{not json");
        assert!(matches!(result, Err(SettingsError::Json(_))));
    }

    #[test]
    fn settings_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"convfmt": "%.3g", "ofs": "|"}}"#).unwrap();

        let settings = RuntimeSettings::from_path(file.path()).unwrap();
        assert_eq!(settings.convfmt, "%.3g");
        assert_eq!(settings.ofs, "|");
    }

    #[test]
    fn settings_from_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let result = RuntimeSettings::from_path(dir.path().join("missing.json"));
        assert!(matches!(result, Err(SettingsError::Io(_))));
    }

    #[test]
    fn vars_from_settings_rejects_bad_format() {
        let settings = RuntimeSettings {
            convfmt: "%q".to_string(),
            ofs: " ".to_string(),
        };
        let result = RuntimeVars::from_settings(&settings);
        assert!(matches!(result, Err(SettingsError::Format(_))));
    }

    #[test]
    fn vars_read_live_values() {
        let vars = RuntimeVars::new();
        assert_eq!(vars.ofs(), Value::from(" "));
        assert_eq!(vars.convfmt().as_str(), "%.6g");

        vars.set_ofs(",");
        vars.set_convfmt("%.2f").unwrap();
        assert_eq!(vars.ofs(), Value::from(","));
        assert_eq!(vars.convfmt().format(0.126), "0.13");
    }

    #[test]
    fn invalid_convfmt_keeps_previous() {
        let vars = RuntimeVars::new();
        assert!(vars.set_convfmt("no conversion").is_err());
        assert_eq!(vars.convfmt().as_str(), "%.6g");
    }

    #[test]
    fn oversized_convfmt_is_rejected() {
        let vars = RuntimeVars::new();
        assert!(matches!(
            vars.set_convfmt("%.70000f"),
            Err(FormatError::Malformed { .. })
        ));
        assert_eq!(vars.convfmt().format(0.5), "0.5");
    }
}
