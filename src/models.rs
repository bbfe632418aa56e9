// src/models.rs - Client/advisor records and the engine message protocol

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// A client as handed over by the record store.
///
/// Field recovery is lenient: the store is an external collaborator and a
/// missing or mistyped field must never abort a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, alias = "contact_number", deserialize_with = "lenient_contact")]
    pub phone: String,
    #[serde(
        default,
        rename = "owner",
        alias = "owner_id",
        alias = "advisor_id",
        deserialize_with = "lenient_owner"
    )]
    pub owner_id: Option<i64>,
}

impl ClientRecord {
    pub fn new(id: i64, name: &str, phone: &str, owner_id: Option<i64>) -> Self {
        Self {
            id,
            name: name.to_string(),
            phone: phone.to_string(),
            owner_id,
        }
    }

    /// Lowercased display name used by every matching stage.
    pub fn normalized_name(&self) -> String {
        self.name.to_lowercase()
    }

    /// Trimmed contact number, `None` when blank.
    pub fn contact(&self) -> Option<&str> {
        let trimmed = self.phone.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
}

impl AdvisorRecord {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

/// Records that plausibly describe one person, entered under at least two
/// different advisors. Serializes as the list of member ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "Vec<i64>")]
pub struct DuplicateGroup {
    pub members: Vec<ClientRecord>,
}

impl DuplicateGroup {
    pub fn ids(&self) -> Vec<i64> {
        self.members.iter().map(|m| m.id).collect()
    }

    pub fn owner_ids(&self) -> BTreeSet<i64> {
        self.members.iter().filter_map(|m| m.owner_id).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// A tentative cluster is only reportable when it spans two owners.
    pub fn spans_multiple_owners(&self) -> bool {
        self.members.len() > 1 && self.owner_ids().len() > 1
    }
}

impl From<DuplicateGroup> for Vec<i64> {
    fn from(group: DuplicateGroup) -> Self {
        group.ids()
    }
}

/// Payload that begins one detection run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub clients: Vec<ClientRecord>,
    #[serde(default)]
    pub advisors: Vec<AdvisorRecord>,
}

impl StartRequest {
    pub fn new(clients: Vec<ClientRecord>, advisors: Vec<AdvisorRecord>) -> Self {
        Self { clients, advisors }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EngineEvent {
    Progress { progress: u8 },
    Complete { duplicates: Vec<DuplicateGroup> },
}

impl EngineEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EngineEvent::Complete { .. })
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        _ => String::new(),
    })
}

fn lenient_contact<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_owner<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_i64()))
}
