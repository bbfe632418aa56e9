// src/matching/grouping.rs - Greedy single-pass cross-advisor grouping
use std::collections::HashSet;

use crate::matching::blocking::BlockingIndex;
use crate::matching::scorer::SimilarityScorer;
use crate::models::{AdvisorRecord, ClientRecord, DuplicateGroup};
use crate::utils::config::DetectionConfig;
use crate::utils::progress_bars::logging::{DetectionLogger, DetectionStage};

/// Counters describing one grouping run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    pub clients_seen: usize,
    pub ownerless_excluded: usize,
    pub indexed: usize,
    pub comparisons: usize,
    pub memo_hits: usize,
    pub memo_misses: usize,
    pub groups_accepted: usize,
    pub clients_grouped: usize,
    pub single_owner_clusters_discarded: usize,
}

/// Result of visiting one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    AlreadyProcessed,
    Singleton,
    SingleOwnerCluster { size: usize },
    Accepted { size: usize },
}

/// Walks owned clients in input order, consuming each record at most once.
///
/// A tentative cluster that stays within one advisor is dropped but its
/// members remain consumed, so they cannot join a later cross-advisor group.
pub struct GroupBuilder<'a> {
    records: Vec<&'a ClientRecord>,
    index: BlockingIndex,
    scorer: SimilarityScorer,
    processed: HashSet<i64>,
    groups: Vec<DuplicateGroup>,
    stats: GroupingStats,
}

impl<'a> GroupBuilder<'a> {
    pub fn new(clients: &'a [ClientRecord], config: &DetectionConfig) -> Self {
        let logger = DetectionLogger::new(DetectionStage::Index);

        let records: Vec<&'a ClientRecord> =
            clients.iter().filter(|c| c.owner_id.is_some()).collect();
        let index = BlockingIndex::build_from(records.iter().copied());
        logger.log_index_built(index.indexed(), index.bucket_count(), index.largest_bucket());

        let stats = GroupingStats {
            clients_seen: clients.len(),
            ownerless_excluded: clients.len() - records.len(),
            indexed: index.indexed(),
            ..Default::default()
        };
        logger.log_data_quality_issue("clients without an advisor (excluded)", stats.ownerless_excluded);
        logger.log_data_quality_issue(
            "owned clients without a name (never grouped)",
            records.len() - stats.indexed,
        );

        Self {
            records,
            index,
            scorer: SimilarityScorer::new(config.similarity_threshold, config.memo_cache_size),
            processed: HashSet::new(),
            groups: Vec::new(),
            stats,
        }
    }

    /// Number of records the builder will visit.
    pub fn total(&self) -> usize {
        self.records.len()
    }

    /// Visit the record at `position` of the owned-client sequence.
    pub fn step(&mut self, position: usize) -> StepOutcome {
        let Some(current) = self.records.get(position).copied() else {
            return StepOutcome::AlreadyProcessed;
        };
        if !self.processed.insert(current.id) {
            return StepOutcome::AlreadyProcessed;
        }

        let mut members = vec![current.clone()];
        for candidate_position in self.index.candidates(&current.name) {
            let candidate = self.records[candidate_position];
            if candidate.id == current.id || self.processed.contains(&candidate.id) {
                continue;
            }
            if self.scorer.similar(current, candidate) {
                self.processed.insert(candidate.id);
                members.push(candidate.clone());
            }
        }

        let group = DuplicateGroup { members };
        if group.spans_multiple_owners() {
            let size = group.len();
            self.stats.groups_accepted += 1;
            self.stats.clients_grouped += size;
            self.groups.push(group);
            StepOutcome::Accepted { size }
        } else if group.len() > 1 {
            self.stats.single_owner_clusters_discarded += 1;
            StepOutcome::SingleOwnerCluster { size: group.len() }
        } else {
            StepOutcome::Singleton
        }
    }

    pub fn stats(&self) -> GroupingStats {
        let (memo_hits, memo_misses) = self.scorer.memo_stats();
        GroupingStats {
            comparisons: self.scorer.comparisons(),
            memo_hits,
            memo_misses,
            ..self.stats.clone()
        }
    }

    /// Accepted groups in acceptance order, plus final counters.
    pub fn finish(self) -> (Vec<DuplicateGroup>, GroupingStats) {
        let stats = self.stats();
        (self.groups, stats)
    }
}

/// Owners referenced by clients but absent from the advisor directory.
pub fn unknown_owner_count(clients: &[ClientRecord], advisors: &[AdvisorRecord]) -> usize {
    let known: HashSet<i64> = advisors.iter().map(|a| a.id).collect();
    clients
        .iter()
        .filter_map(|c| c.owner_id)
        .filter(|owner| !known.contains(owner))
        .collect::<HashSet<_>>()
        .len()
}

/// Runs the whole grouping pass synchronously.
pub fn build_groups(
    clients: &[ClientRecord],
    advisors: &[AdvisorRecord],
    config: &DetectionConfig,
) -> Vec<DuplicateGroup> {
    let logger = DetectionLogger::new(DetectionStage::Grouping);
    logger.log_data_quality_issue(
        "advisor ids missing from the advisor directory",
        unknown_owner_count(clients, advisors),
    );

    let mut builder = GroupBuilder::new(clients, config);
    for position in 0..builder.total() {
        builder.step(position);
    }
    let (groups, stats) = builder.finish();
    logger.log_cache_results(stats.memo_hits, stats.memo_misses);
    logger.log_completion(groups.len(), stats.clients_grouped, stats.comparisons);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(id: i64, name: &str, phone: &str, owner: Option<i64>) -> ClientRecord {
        ClientRecord::new(id, name, phone, owner)
    }

    fn advisors() -> Vec<AdvisorRecord> {
        vec![
            AdvisorRecord::new(10, "Lucia"),
            AdvisorRecord::new(20, "Pedro"),
            AdvisorRecord::new(30, "Sofia"),
        ]
    }

    fn id_sets(groups: &[DuplicateGroup]) -> Vec<Vec<i64>> {
        groups.iter().map(DuplicateGroup::ids).collect()
    }

    #[test]
    fn test_cross_owner_scenario() {
        let clients = vec![
            client(1, "Juan Perez", "999", Some(10)),
            client(2, "Juan Peres", "999", Some(20)),
            client(3, "Ana Lopez", "111", Some(10)),
        ];
        let groups = build_groups(&clients, &advisors(), &DetectionConfig::default());
        assert_eq!(id_sets(&groups), vec![vec![1, 2]]);
    }

    #[test]
    fn test_same_owner_is_not_reported() {
        let clients = vec![
            client(1, "Juan Perez", "999", Some(10)),
            client(2, "Juan Peres", "999", Some(10)),
            client(3, "Ana Lopez", "111", Some(10)),
        ];
        let groups = build_groups(&clients, &advisors(), &DetectionConfig::default());
        assert!(groups.is_empty());
    }

    #[test]
    fn test_short_name_with_different_phone_not_grouped() {
        let clients = vec![
            client(1, "Maria", "111", Some(10)),
            client(2, "Mar", "222", Some(20)),
        ];
        let groups = build_groups(&clients, &advisors(), &DetectionConfig::default());
        assert!(groups.is_empty());
    }

    #[test]
    fn test_exact_name_groups_regardless_of_threshold() {
        let clients = vec![
            client(1, "Ana Lopez", "1", Some(10)),
            client(2, "ana lopez", "2", Some(20)),
        ];
        let config = DetectionConfig::default().with_threshold(1.0);
        let groups = build_groups(&clients, &advisors(), &config);
        assert_eq!(id_sets(&groups), vec![vec![1, 2]]);
    }

    #[test]
    fn test_exact_contact_groups_dissimilar_names() {
        let clients = vec![
            client(1, "Roberto Gomez", "5550101", Some(10)),
            client(2, "Rx", " 5550101", Some(20)),
        ];
        let groups = build_groups(&clients, &advisors(), &DetectionConfig::default());
        assert_eq!(id_sets(&groups), vec![vec![1, 2]]);
    }

    #[test]
    fn test_ownerless_clients_are_excluded() {
        let clients = vec![
            client(1, "Juan Perez", "999", None),
            client(2, "Juan Perez", "999", Some(20)),
        ];
        let mut builder = GroupBuilder::new(&clients, &DetectionConfig::default());
        assert_eq!(builder.total(), 1);
        assert_eq!(builder.step(0), StepOutcome::Singleton);
        let (groups, stats) = builder.finish();
        assert!(groups.is_empty());
        assert_eq!(stats.ownerless_excluded, 1);
        assert_eq!(stats.clients_seen, 2);
    }

    #[test]
    fn test_empty_names_never_grouped() {
        let clients = vec![
            client(1, "", "999", Some(10)),
            client(2, "", "999", Some(20)),
        ];
        let groups = build_groups(&clients, &advisors(), &DetectionConfig::default());
        assert!(groups.is_empty());
    }

    #[test]
    fn test_group_collects_every_similar_candidate() {
        let clients = vec![
            client(1, "Juan Perez", "1", Some(10)),
            client(2, "Juan Peres", "2", Some(20)),
            client(3, "Jaun Perez", "3", Some(30)),
            client(4, "Juan Perez", "4", Some(10)),
        ];
        let groups = build_groups(&clients, &advisors(), &DetectionConfig::default());
        assert_eq!(groups.len(), 1);
        let mut ids = groups[0].ids();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_single_owner_cluster_consumes_members() {
        // "marta dias" is close to both neighbours, "marta dxxs" only to it.
        // Record 1 claims record 2 under the same advisor first, so the
        // cross-advisor pair (2, 3) is never reported.
        let clients = vec![
            client(1, "Marta Diaz", "1", Some(10)),
            client(2, "Marta Dias", "2", Some(10)),
            client(3, "Marta Dxxs", "3", Some(20)),
        ];
        let mut builder = GroupBuilder::new(&clients, &DetectionConfig::default());
        assert_eq!(builder.step(0), StepOutcome::SingleOwnerCluster { size: 2 });
        assert_eq!(builder.step(1), StepOutcome::AlreadyProcessed);
        assert_eq!(builder.step(2), StepOutcome::Singleton);
        let (groups, stats) = builder.finish();
        assert!(groups.is_empty());
        assert_eq!(stats.single_owner_clusters_discarded, 1);

        // Without record 1 the same pair is reported
        let groups = build_groups(&clients[1..], &advisors(), &DetectionConfig::default());
        assert_eq!(id_sets(&groups), vec![vec![2, 3]]);
    }

    #[test]
    fn test_groups_respect_invariants_and_are_deterministic() {
        let clients = crate::synthetic::generate_registry(400, 6, 7).clients;
        let config = DetectionConfig::default();
        let first = build_groups(&clients, &[], &config);
        let second = build_groups(&clients, &[], &config);
        assert_eq!(first, second);

        let mut seen = HashSet::new();
        for group in &first {
            assert!(group.len() >= 2);
            assert!(group.owner_ids().len() >= 2);
            for id in group.ids() {
                assert!(seen.insert(id), "client {} reported twice", id);
            }
        }
    }

    #[test]
    fn test_memo_capacity_does_not_change_groups() {
        let clients = crate::synthetic::generate_registry(300, 5, 13).clients;
        let roomy = build_groups(&clients, &[], &DetectionConfig::default());
        let tiny = build_groups(
            &clients,
            &[],
            &DetectionConfig::default().with_memo_cache_size(1),
        );
        assert_eq!(roomy, tiny);
    }

    #[test]
    fn test_unknown_owner_count() {
        let clients = vec![
            client(1, "A", "", Some(10)),
            client(2, "B", "", Some(99)),
            client(3, "C", "", Some(99)),
            client(4, "D", "", None),
        ];
        assert_eq!(unknown_owner_count(&clients, &advisors()), 1);
    }
}
