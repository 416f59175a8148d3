use std::path::PathBuf;

/// Errors that can occur across issuepulse.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette` diagnostics at the boundary.
///
/// # Examples
///
/// ```
/// use issuepulse_core::PulseError;
///
/// let err = PulseError::Config("missing data path".into());
/// assert!(err.to_string().contains("missing data path"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum PulseError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The issue export could not be understood.
    #[error("data error: {0}")]
    Data(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PulseError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = PulseError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn data_error_displays_message() {
        let err = PulseError::Data("not a JSON array".into());
        assert_eq!(err.to_string(), "data error: not a JSON array");
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = PulseError::FileNotFound(PathBuf::from("/tmp/issues.json"));
        assert!(err.to_string().contains("/tmp/issues.json"));
    }
}
