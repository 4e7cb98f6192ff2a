//! Transaction configuration.

use txkv_storage::WriteOptions;

/// Configuration for transactions created through a [`crate::TransactionDb`]
/// or [`crate::Transaction::begin_with_config`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether the store should sync each committed batch (safer but slower).
    pub sync_on_commit: bool,

    /// Whether transactions report into the database's statistics.
    pub collect_stats: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sync_on_commit: false,
            collect_stats: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to sync on every commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }

    /// Sets whether transactions update statistics.
    #[must_use]
    pub const fn collect_stats(mut self, value: bool) -> Self {
        self.collect_stats = value;
        self
    }

    /// Write options used when applying a committed batch.
    #[must_use]
    pub const fn write_options(&self) -> WriteOptions {
        WriteOptions::new().sync(self.sync_on_commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(!config.sync_on_commit);
        assert!(config.collect_stats);
        assert!(!config.write_options().sync);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new().sync_on_commit(true).collect_stats(false);

        assert!(config.sync_on_commit);
        assert!(!config.collect_stats);
        assert!(config.write_options().sync);
    }
}
