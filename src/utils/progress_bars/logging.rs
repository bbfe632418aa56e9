// src/utils/progress_bars/logging.rs - Logging helpers for duplicate detection runs
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// Stage of the detection engine a log line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionStage {
    Index,
    Grouping,
    Engine,
}

impl DetectionStage {
    fn label(&self) -> (&'static str, &'static str) {
        match self {
            DetectionStage::Index => ("INDEX", "🗂️"),
            DetectionStage::Grouping => ("GROUPING", "👥"),
            DetectionStage::Engine => ("ENGINE", "⚙️"),
        }
    }
}

#[derive(Clone)]
pub struct DetectionLogger {
    stage_name: &'static str,
    stage_emoji: &'static str,
    start_time: Instant,
}

impl DetectionLogger {
    pub fn new(stage: DetectionStage) -> Self {
        let (stage_name, stage_emoji) = stage.label();
        Self {
            stage_name,
            stage_emoji,
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, run_id: &str, threshold: f64) {
        info!(
            "[{}] {} 🚀 Starting duplicate detection (run ID: {}, threshold {:.2})",
            self.stage_name, self.stage_emoji, run_id, threshold
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        let msg = if let Some(details) = details {
            format!(
                "[{}] {} 🔄 Phase: {} - {} [+{:.1}s]",
                self.stage_name, self.stage_emoji, phase, details, elapsed.as_secs_f32()
            )
        } else {
            format!(
                "[{}] {} 🔄 Phase: {} [+{:.1}s]",
                self.stage_name, self.stage_emoji, phase, elapsed.as_secs_f32()
            )
        };
        info!("{}", msg);
    }

    pub fn log_data_loaded(&self, count: usize, data_type: &str) {
        info!(
            "[{}] {} 📊 Received {} {} records",
            self.stage_name, self.stage_emoji, count, data_type
        );
    }

    pub fn log_index_built(&self, indexed: usize, buckets: usize, largest_bucket: usize) {
        info!(
            "[{}] {} 🏷️  Blocking index: {} records in {} buckets, largest bucket: {} records",
            self.stage_name, self.stage_emoji, indexed, buckets, largest_bucket
        );
    }

    pub fn log_batch_progress(&self, visited: usize, total: usize, percent: u8) {
        debug!(
            "[{}] {} 📦 Visited {}/{} records ({}%)",
            self.stage_name, self.stage_emoji, visited, total, percent
        );
    }

    pub fn log_cache_results(&self, cache_hits: usize, cache_misses: usize) {
        let total = cache_hits + cache_misses;
        if total > 0 {
            let hit_rate = (cache_hits as f64 / total as f64) * 100.0;
            info!(
                "[{}] {} 💾 Edit distance memo: {} hits, {} misses ({:.1}% hit rate)",
                self.stage_name, self.stage_emoji, cache_hits, cache_misses, hit_rate
            );
        }
    }

    pub fn log_completion(&self, groups: usize, clients_grouped: usize, comparisons: usize) {
        let duration = self.start_time.elapsed();
        info!(
            "[{}] {} 🎉 COMPLETED: {} cross-advisor duplicate groups found in {:.2?}",
            self.stage_name, self.stage_emoji, groups, duration
        );
        info!(
            "[{}] {} 📊 Results: {} clients grouped, {} candidate comparisons",
            self.stage_name, self.stage_emoji, clients_grouped, comparisons
        );
    }

    pub fn log_cancelled(&self, visited: usize, total: usize) {
        info!(
            "[{}] {} 🛑 Run cancelled after {}/{} records [+{:.1}s]",
            self.stage_name,
            self.stage_emoji,
            visited,
            total,
            self.start_time.elapsed().as_secs_f32()
        );
    }

    pub fn log_data_quality_issue(&self, issue_type: &str, count: usize) {
        if count > 0 {
            warn!(
                "[{}] {} ⚠️  Data quality: {} instances of {}",
                self.stage_name, self.stage_emoji, count, issue_type
            );
        }
    }

    pub fn log_warning(&self, message: &str) {
        warn!("[{}] {} ⚠️  {}", self.stage_name, self.stage_emoji, message);
    }

    pub fn log_debug(&self, message: &str) {
        debug!("[{}] {} {}", self.stage_name, self.stage_emoji, message);
    }

    pub fn get_elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}
