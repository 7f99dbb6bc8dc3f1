//! Store configuration.

/// Configuration for opening a namespace.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the namespace to open or create.
    pub namespace: String,

    /// Whether file-backed writes fsync before a write reports success
    /// (safer but slower). Batches stay atomic either way.
    pub sync_on_commit: bool,
}

impl Config {
    /// Creates a configuration for the given namespace with defaults.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            sync_on_commit: true,
        }
    }

    /// Sets whether writes fsync before reporting success.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::new("app");
        assert_eq!(config.namespace, "app");
        assert!(config.sync_on_commit);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new("app").sync_on_commit(false);
        assert!(!config.sync_on_commit);
    }
}
