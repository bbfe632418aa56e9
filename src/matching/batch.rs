// src/matching/batch.rs - Drives the group builder in fixed slices and reports progress
use std::num::NonZeroUsize;

use crate::matching::grouping::{unknown_owner_count, GroupBuilder, GroupingStats};
use crate::models::{AdvisorRecord, ClientRecord, DuplicateGroup};
use crate::update_progress;
use crate::utils::config::DetectionConfig;
use crate::utils::progress_bars::logging::{DetectionLogger, DetectionStage};
use crate::utils::progress_bars::progress_callback::ProgressCallback;

/// Decides when a progress percentage is due.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    total: usize,
    batch_size: NonZeroUsize,
}

impl ProgressReporter {
    pub fn new(total: usize, batch_size: NonZeroUsize) -> Self {
        Self { total, batch_size }
    }

    /// Rounded share of `visited` over the total, 100 for an empty run.
    pub fn percent(&self, visited: usize) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let ratio = visited.min(self.total) as f64 / self.total as f64;
        (ratio * 100.0).round() as u8
    }

    /// `Some(percent)` at every slice boundary and at the final record.
    pub fn observe(&self, visited: usize) -> Option<u8> {
        if visited == self.total || visited % self.batch_size.get() == 0 {
            Some(self.percent(visited))
        } else {
            None
        }
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    Completed {
        groups: Vec<DuplicateGroup>,
        stats: GroupingStats,
    },
    Cancelled {
        visited: usize,
    },
}

pub struct BatchRunner<'a> {
    builder: GroupBuilder<'a>,
    reporter: ProgressReporter,
    logger: DetectionLogger,
}

impl<'a> BatchRunner<'a> {
    pub fn new(
        clients: &'a [ClientRecord],
        advisors: &[AdvisorRecord],
        config: &DetectionConfig,
    ) -> Self {
        let logger = DetectionLogger::new(DetectionStage::Grouping);
        logger.log_data_loaded(clients.len(), "client");
        logger.log_data_loaded(advisors.len(), "advisor");
        logger.log_data_quality_issue(
            "advisor ids missing from the advisor directory",
            unknown_owner_count(clients, advisors),
        );

        let builder = GroupBuilder::new(clients, config);
        let reporter = ProgressReporter::new(builder.total(), config.progress_batch_size);
        Self {
            builder,
            reporter,
            logger,
        }
    }

    pub fn total(&self) -> usize {
        self.builder.total()
    }

    /// Visits every record in input order. `is_cancelled` is polled before
    /// each record; once it returns true the run stops and its state is dropped.
    pub fn run<P, C>(mut self, mut on_progress: P, is_cancelled: C) -> RunOutcome
    where
        P: FnMut(u8),
        C: Fn() -> bool,
    {
        let total = self.builder.total();
        self.logger.log_phase(
            "Grouping",
            Some(&format!(
                "{} owned clients, progress every {} records",
                total, self.reporter.batch_size
            )),
        );

        if total == 0 {
            if is_cancelled() {
                return RunOutcome::Cancelled { visited: 0 };
            }
            on_progress(self.reporter.percent(0));
        }

        for position in 0..total {
            if is_cancelled() {
                self.logger.log_cancelled(position, total);
                return RunOutcome::Cancelled { visited: position };
            }
            self.builder.step(position);

            let visited = position + 1;
            if let Some(percent) = self.reporter.observe(visited) {
                self.logger.log_batch_progress(visited, total, percent);
                on_progress(percent);
            }
        }

        let (groups, stats) = self.builder.finish();
        self.logger.log_cache_results(stats.memo_hits, stats.memo_misses);
        self.logger
            .log_completion(groups.len(), stats.clients_grouped, stats.comparisons);
        RunOutcome::Completed { groups, stats }
    }
}

/// Synchronous run reporting through an optional callback; never cancelled.
pub fn build_groups_with_progress(
    clients: &[ClientRecord],
    advisors: &[AdvisorRecord],
    config: &DetectionConfig,
    progress_callback: Option<ProgressCallback>,
) -> (Vec<DuplicateGroup>, GroupingStats) {
    let runner = BatchRunner::new(clients, advisors, config);
    match runner.run(|percent| update_progress!(progress_callback, percent), || false) {
        RunOutcome::Completed { groups, stats } => (groups, stats),
        RunOutcome::Cancelled { .. } => (Vec::new(), GroupingStats::default()),
    }
}
