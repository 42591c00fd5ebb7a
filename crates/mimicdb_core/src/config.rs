//! Engine configuration.

/// Configuration for opening a MimicDB database.
#[derive(Debug, Clone)]
pub struct Config {
    /// Logical database name; namespaces the sidecar keys.
    pub database_name: String,

    /// How many queued rows per store feed index inference.
    pub index_sample_size: usize,

    /// Page size used when a page query does not carry one.
    pub default_page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_name: "mimicdb".to_string(),
            index_sample_size: 20,
            default_page_size: 10,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the logical database name.
    #[must_use]
    pub fn database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = name.into();
        self
    }

    /// Sets the index inference sample size.
    #[must_use]
    pub fn index_sample_size(mut self, size: usize) -> Self {
        self.index_sample_size = size;
        self
    }

    /// Sets the fallback page size.
    #[must_use]
    pub fn default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }
}
