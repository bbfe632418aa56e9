//! Detection tuning knobs, read from the environment with safe defaults.

use log::{debug, info, warn};
use std::env;
use std::num::NonZeroUsize;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;
pub const DEFAULT_PROGRESS_BATCH_SIZE: usize = 100;
pub const DEFAULT_MEMO_CACHE_SIZE: usize = 50_000;

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// Minimum normalized name similarity (and length ratio) for a match.
    pub similarity_threshold: f64,
    /// Records visited between two progress events.
    pub progress_batch_size: NonZeroUsize,
    /// Entries kept in the run-scoped edit distance memo.
    pub memo_cache_size: NonZeroUsize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            progress_batch_size: NonZeroUsize::new(DEFAULT_PROGRESS_BATCH_SIZE)
                .unwrap_or(NonZeroUsize::MIN),
            memo_cache_size: NonZeroUsize::new(DEFAULT_MEMO_CACHE_SIZE)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl DetectionConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let similarity_threshold = env::var("DEDUPE_SIMILARITY_THRESHOLD")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(defaults.similarity_threshold);

        let progress_batch_size = env::var("DEDUPE_PROGRESS_BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .and_then(NonZeroUsize::new)
            .unwrap_or(defaults.progress_batch_size);

        let memo_cache_size = env::var("DEDUPE_MEMO_CACHE_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .and_then(NonZeroUsize::new)
            .unwrap_or(defaults.memo_cache_size);

        let config = Self {
            similarity_threshold,
            progress_batch_size,
            memo_cache_size,
        }
        .validated();

        debug!("Detection config from env: {:?}", config);
        config
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self.validated()
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        if let Some(size) = NonZeroUsize::new(batch_size) {
            self.progress_batch_size = size;
        } else {
            warn!("Ignoring progress batch size 0, keeping {}", self.progress_batch_size);
        }
        self
    }

    pub fn with_memo_cache_size(mut self, size: usize) -> Self {
        if let Some(size) = NonZeroUsize::new(size) {
            self.memo_cache_size = size;
        }
        self
    }

    fn validated(mut self) -> Self {
        if !self.similarity_threshold.is_finite() {
            warn!(
                "Similarity threshold {} is not a number, falling back to {}",
                self.similarity_threshold, DEFAULT_SIMILARITY_THRESHOLD
            );
            self.similarity_threshold = DEFAULT_SIMILARITY_THRESHOLD;
        } else if !(0.0..=1.0).contains(&self.similarity_threshold) {
            let clamped = self.similarity_threshold.clamp(0.0, 1.0);
            warn!(
                "Similarity threshold {} outside [0, 1], clamped to {}",
                self.similarity_threshold, clamped
            );
            self.similarity_threshold = clamped;
        }
        self
    }

    /// Log the current configuration
    pub fn log_config(&self) {
        info!("⚙️  Duplicate detection configuration:");
        info!("   • Similarity threshold: {:.2}", self.similarity_threshold);
        info!("   • Progress every {} records", self.progress_batch_size);
        info!("   • Edit distance memo capacity: {}", self.memo_cache_size);
    }
}
