//! Reader and export configuration.

/// Configuration for a [`crate::RecordReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Whether to verify fragment checksums.
    ///
    /// Disabling this skips CRC computation entirely. A fragment whose
    /// payload or type byte was damaged but whose length is still plausible
    /// is then returned as if it were valid.
    pub verify_checksums: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            verify_checksums: true,
        }
    }
}

impl ReaderConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to verify fragment checksums.
    #[must_use]
    pub const fn verify_checksums(mut self, value: bool) -> Self {
        self.verify_checksums = value;
        self
    }
}

/// Options for exporting a log file to JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Reader configuration.
    pub reader: ReaderConfig,

    /// Whether to indent the output document.
    pub pretty: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            reader: ReaderConfig::default(),
            pretty: true,
        }
    }
}

impl ExportOptions {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to verify fragment checksums.
    #[must_use]
    pub const fn verify_checksums(mut self, value: bool) -> Self {
        self.reader.verify_checksums = value;
        self
    }

    /// Sets whether to indent the output document.
    #[must_use]
    pub const fn pretty(mut self, value: bool) -> Self {
        self.pretty = value;
        self
    }
}
