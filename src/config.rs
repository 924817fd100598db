/// Configuration for a [`crate::KvStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KvConfig {
    /// Maximum number of conditional-update attempts after the initial
    /// insert collides with an existing record.
    pub max_retries: usize,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

impl KvConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// A config that gives up on the first collision.
    pub fn no_retry() -> Self {
        Self { max_retries: 0 }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }
}
