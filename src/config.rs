//! Configuration options for opening a block manager.

/// Options controlling how a database file is opened.
#[derive(Debug, Clone)]
pub struct Options {
    /// Open the file read-only. Read-only handles never create files and
    /// reject checkpoints at the I/O layer.
    /// Default: false
    pub read_only: bool,

    /// Create the database file if it doesn't exist. Ignored for read-only
    /// opens.
    /// Default: true
    pub create_if_missing: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { read_only: false, create_if_missing: true }
    }
}

impl Options {
    /// Creates a new Options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to open the file read-only.
    pub fn read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        self
    }

    /// Sets whether to create the database file if it doesn't exist.
    pub fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = Options::default();
        assert!(!opts.read_only);
        assert!(opts.create_if_missing);
    }

    #[test]
    fn test_options_builder() {
        let opts = Options::new().read_only(true).create_if_missing(false);
        assert!(opts.read_only);
        assert!(!opts.create_if_missing);
    }
}
