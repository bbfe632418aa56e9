// src/report.rs - Labeled summary of one detection run
use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{AdvisorRecord, DuplicateGroup, StartRequest};

#[derive(Debug, Clone, Serialize)]
pub struct MemberSummary {
    pub client_id: i64,
    pub name: String,
    pub phone: String,
    pub advisor_id: Option<i64>,
    pub advisor_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub group_number: usize,
    pub advisor_count: usize,
    pub members: Vec<MemberSummary>,
}

/// Groups from one run with advisor names resolved, ready to hand to people.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub similarity_threshold: f64,
    pub clients_analyzed: usize,
    pub ownerless_clients: usize,
    pub advisors: usize,
    pub clients_flagged: usize,
    pub groups: Vec<GroupSummary>,
}

/// Display label for an owner id; ids missing from the directory get a placeholder.
pub fn advisor_label(names: &HashMap<i64, &str>, advisor_id: Option<i64>) -> String {
    match advisor_id {
        Some(id) => match names.get(&id) {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => format!("advisor #{}", id),
        },
        None => "unassigned".to_string(),
    }
}

fn advisor_names(advisors: &[AdvisorRecord]) -> HashMap<i64, &str> {
    advisors.iter().map(|a| (a.id, a.name.as_str())).collect()
}

impl DuplicateReport {
    pub fn build(
        run_id: Uuid,
        request: &StartRequest,
        groups: &[DuplicateGroup],
        similarity_threshold: f64,
    ) -> Self {
        let names = advisor_names(&request.advisors);
        let summaries: Vec<GroupSummary> = groups
            .iter()
            .enumerate()
            .map(|(i, group)| GroupSummary {
                group_number: i + 1,
                advisor_count: group.owner_ids().len(),
                members: group
                    .members
                    .iter()
                    .map(|m| MemberSummary {
                        client_id: m.id,
                        name: m.name.clone(),
                        phone: m.phone.trim().to_string(),
                        advisor_id: m.owner_id,
                        advisor_name: advisor_label(&names, m.owner_id),
                    })
                    .collect(),
            })
            .collect();

        Self {
            run_id,
            generated_at: Utc::now(),
            similarity_threshold,
            clients_analyzed: request.clients.len(),
            ownerless_clients: request.clients.iter().filter(|c| c.owner_id.is_none()).count(),
            advisors: request.advisors.len(),
            clients_flagged: groups.iter().map(DuplicateGroup::len).sum(),
            groups: summaries,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize duplicate report")
    }

    /// One line per group: `#n: Name (Advisor) | Name (Advisor)`.
    pub fn summary_lines(&self) -> Vec<String> {
        self.groups
            .iter()
            .map(|group| {
                let members: Vec<String> = group
                    .members
                    .iter()
                    .map(|m| format!("{} [{}] ({})", m.name, m.client_id, m.advisor_name))
                    .collect();
                format!("#{}: {}", group.group_number, members.join(" | "))
            })
            .collect()
    }

    pub fn log_summary(&self) {
        info!("=== Duplicate Detection Summary ===");
        info!("Run ID: {}", self.run_id);
        info!("Generated at: {}", self.generated_at.to_rfc3339());
        info!("Similarity threshold: {:.2}", self.similarity_threshold);
        info!(
            "Clients analyzed: {} ({} without advisor)",
            self.clients_analyzed, self.ownerless_clients
        );
        info!("Advisors: {}", self.advisors);
        info!(
            "Cross-advisor groups: {} covering {} clients",
            self.groups.len(),
            self.clients_flagged
        );
        for line in self.summary_lines() {
            info!("  {}", line);
        }
    }
}
