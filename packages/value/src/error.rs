//! Error types for the value layer.

/// Errors raised while parsing a printf-style numeric format.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("numeric format {spec:?} has no conversion")]
    MissingConversion { spec: String },

    #[error("numeric format {spec:?} has more than one conversion")]
    MultipleConversions { spec: String },

    #[error("numeric format {spec:?} uses unsupported conversion '{conversion}'")]
    UnsupportedConversion { spec: String, conversion: char },

    #[error("numeric format {spec:?} is malformed at byte {position}")]
    Malformed { spec: String, position: usize },
}

/// Errors raised while loading runtime settings.
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Format error: {0}")]
    Format(#[from] FormatError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_display() {
        let e = FormatError::UnsupportedConversion {
            spec: "%s".to_string(),
            conversion: 's',
        };
        let display = e.to_string();
        assert!(display.contains("unsupported conversion"));
        assert!(display.contains("'s'"));
    }

    #[test]
    fn settings_error_wraps_format_error() {
        let e: SettingsError = FormatError::MissingConversion {
            spec: "abc".to_string(),
        }
        .into();
        assert!(e.to_string().starts_with("Format error"));
    }
}
