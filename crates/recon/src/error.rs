use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (threshold ordering, currency settings, etc.).
    ConfigValidation(String),
    /// Snapshot JSON could not be deserialized.
    SnapshotParse(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::SnapshotParse(msg) => write!(f, "snapshot parse error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
