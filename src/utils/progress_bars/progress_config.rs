// src/utils/progress_bars/progress_config.rs

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::env;
use std::time::Duration;

/// Configuration for the terminal progress bar of the `dedupe` binary
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Whether to show the progress bar at all
    pub enabled: bool,
    /// Refresh rate for the progress bar in milliseconds
    pub refresh_rate_ms: u64,
    /// Whether to show memory usage in progress messages
    pub show_memory: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            refresh_rate_ms: 100,
            show_memory: true,
        }
    }
}

impl ProgressConfig {
    /// Create progress configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            enabled: env::var("PROGRESS_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            refresh_rate_ms: env::var("PROGRESS_REFRESH_RATE_MS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(100),
            show_memory: env::var("PROGRESS_SHOW_MEMORY")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        }
    }

    /// A 0..=100 bar when progress is enabled, None otherwise
    pub fn create_run_bar(&self) -> Option<ProgressBar> {
        if !self.enabled {
            return None;
        }
        let pb = ProgressBar::new(100);
        let refresh_hz = (1000 / self.refresh_rate_ms.max(1)).clamp(1, 60) as u8;
        pb.set_draw_target(ProgressDrawTarget::stderr_with_hz(refresh_hz));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}% {msg}")
        {
            pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
        }
        pb.enable_steady_tick(Duration::from_millis(self.refresh_rate_ms.max(1)));
        Some(pb)
    }

    /// Check if memory usage should be shown
    pub fn should_show_memory(&self) -> bool {
        self.enabled && self.show_memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = ProgressConfig::default();
        assert!(config.enabled);
        assert_eq!(config.refresh_rate_ms, 100);
        assert!(config.show_memory);
    }

    #[test]
    fn test_env_config() {
        env::set_var("PROGRESS_ENABLED", "false");
        env::set_var("PROGRESS_REFRESH_RATE_MS", "50");
        env::set_var("PROGRESS_SHOW_MEMORY", "not-a-bool");

        let config = ProgressConfig::from_env();
        assert!(!config.enabled);
        assert_eq!(config.refresh_rate_ms, 50);
        assert!(config.show_memory);

        // Clean up
        env::remove_var("PROGRESS_ENABLED");
        env::remove_var("PROGRESS_REFRESH_RATE_MS");
        env::remove_var("PROGRESS_SHOW_MEMORY");
    }

    #[test]
    fn test_bar_creation() {
        let mut config = ProgressConfig::default();

        config.enabled = false;
        assert!(config.create_run_bar().is_none());
        assert!(!config.should_show_memory());

        config.enabled = true;
        let pb = config.create_run_bar();
        assert!(pb.is_some());
        if let Some(pb) = pb {
            assert_eq!(pb.length(), Some(100));
            pb.finish_and_clear();
        }
    }
}
