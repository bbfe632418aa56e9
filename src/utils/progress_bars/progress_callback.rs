// src/utils/progress_bars/progress_callback.rs - Progress callbacks for detection runs

use crate::utils::get_memory_usage;
use indicatif::ProgressBar;
use log::debug;
use std::sync::Arc;

/// Receives the run's completion percentage (0..=100).
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Callback that only writes debug lines, for hosts without a terminal
pub fn create_simple_callback(label: &str) -> ProgressCallback {
    let label = label.to_string();
    Arc::new(move |percent: u8| {
        debug!("[{}] Progress: {}%", label, percent);
    })
}

/// Callback that drives an indicatif bar sized 0..=100
pub fn create_bar_callback(pb: ProgressBar, show_memory: bool) -> ProgressCallback {
    Arc::new(move |percent: u8| {
        pb.set_position(u64::from(percent));
        if show_memory && (percent % 10 == 0 || percent == 100) {
            pb.set_message(format!("Scanning clients... (Memory: {} MB)", get_memory_usage()));
        } else if !show_memory {
            pb.set_message("Scanning clients...");
        }
    })
}

/// Convenience macro for reporting progress through an optional callback
#[macro_export]
macro_rules! update_progress {
    ($callback:expr, $percent:expr) => {
        if let Some(ref cb) = $callback {
            cb($percent);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_simple_callback_creation() {
        let callback = create_simple_callback("TestRun");
        // Must not panic for any percentage
        callback(0);
        callback(100);
    }

    #[test]
    fn test_update_progress_macro() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let callback: Option<ProgressCallback> = Some(Arc::new(move |p: u8| {
            seen_clone.lock().unwrap().push(p);
        }));
        update_progress!(callback, 10);
        update_progress!(callback, 55);

        let none: Option<ProgressCallback> = None;
        update_progress!(none, 99);

        assert_eq!(*seen.lock().unwrap(), vec![10, 55]);
    }

    #[test]
    fn test_bar_callback_tracks_position() {
        let pb = ProgressBar::hidden();
        pb.set_length(100);
        let callback = create_bar_callback(pb.clone(), false);
        callback(42);
        assert_eq!(pb.position(), 42);
        callback(100);
        assert_eq!(pb.position(), 100);
    }
}
