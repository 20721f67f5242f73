//! Store configuration.

use std::path::PathBuf;

/// Default document file extension.
pub const DEFAULT_EXTENSION: &str = "usr";

/// Configuration for opening a [`Store`](crate::Store).
///
/// Passed explicitly to `Store::open`; there is no ambient or global
/// configuration lookup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory for document files.
    pub directory: PathBuf,

    /// File extension for document files (without the dot).
    pub extension: String,

    /// Whether to create the base directory if it doesn't exist.
    pub create_if_missing: bool,
}

impl Config {
    /// Creates a configuration rooted at `directory` with defaults.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            create_if_missing: true,
        }
    }

    /// Sets the document file extension.
    #[must_use]
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Sets whether to create the base directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }
}
