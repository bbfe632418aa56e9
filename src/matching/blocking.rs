// src/matching/blocking.rs - Name-prefix blocking to bound candidate comparisons
use std::collections::HashMap;

use crate::models::ClientRecord;

const KEY_LENGTH: usize = 2;

/// Buckets of record positions keyed by the lowercased two-letter name prefix.
///
/// Positions refer to the slice the index was built from, in input order.
#[derive(Debug, Default)]
pub struct BlockingIndex {
    buckets: HashMap<String, Vec<usize>>,
    indexed: usize,
}

/// Lowercased first two characters of `name`; empty when the name is empty.
pub fn bucket_key(name: &str) -> String {
    name.chars().take(KEY_LENGTH).collect::<String>().to_lowercase()
}

/// Keys whose buckets may hold a match for `name`: its own key first, then
/// every `first letter + a..z` variant so a typo in the second character is
/// still compared. A different first character is never looked up.
pub fn candidate_keys(name: &str) -> Vec<String> {
    let own_key = bucket_key(name);
    let mut keys = vec![own_key.clone()];
    if let Some(first) = own_key.chars().next() {
        for letter in 'a'..='z' {
            let key = format!("{}{}", first, letter);
            if key != own_key {
                keys.push(key);
            }
        }
    }
    keys
}

impl BlockingIndex {
    pub fn build(records: &[ClientRecord]) -> Self {
        Self::build_from(records.iter())
    }

    pub fn build_from<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ClientRecord>,
    {
        let mut index = Self::default();
        for (position, record) in records.into_iter().enumerate() {
            if record.name.is_empty() {
                continue;
            }
            index
                .buckets
                .entry(bucket_key(&record.name))
                .or_default()
                .push(position);
            index.indexed += 1;
        }
        index
    }

    pub fn bucket(&self, key: &str) -> &[usize] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Positions of every record sharing a candidate key with `name`.
    pub fn candidates<'a>(&'a self, name: &str) -> impl Iterator<Item = usize> + 'a {
        candidate_keys(name)
            .into_iter()
            .flat_map(move |key| self.bucket(&key).iter().copied())
    }

    pub fn indexed(&self) -> usize {
        self.indexed
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn largest_bucket(&self) -> usize {
        self.buckets.values().map(Vec::len).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(id: i64, name: &str) -> ClientRecord {
        ClientRecord::new(id, name, "", Some(1))
    }

    #[test]
    fn test_bucket_key() {
        assert_eq!(bucket_key("Juan Perez"), "ju");
        assert_eq!(bucket_key("J"), "j");
        assert_eq!(bucket_key(""), "");
        assert_eq!(bucket_key("ÁNGEL"), "án");
    }

    #[test]
    fn test_candidate_keys_widen_second_character_only() {
        let keys = candidate_keys("Juan");
        assert_eq!(keys[0], "ju");
        assert_eq!(keys.len(), 26);
        assert!(keys.iter().all(|k| k.starts_with('j')));
        assert!(keys.contains(&"ja".to_string()));

        // Own key outside a..z adds a 27th key
        let keys = candidate_keys("J. Perez");
        assert_eq!(keys[0], "j.");
        assert_eq!(keys.len(), 27);

        assert_eq!(candidate_keys(""), vec![String::new()]);
    }

    #[test]
    fn test_build_skips_empty_names_and_keeps_order() {
        let records = vec![
            client(1, "Juan"),
            client(2, ""),
            client(3, "JUANA"),
            client(4, "Ana"),
        ];
        let index = BlockingIndex::build(&records);
        assert_eq!(index.indexed(), 3);
        assert_eq!(index.bucket("ju"), &[0, 2]);
        assert_eq!(index.bucket("an"), &[3]);
        assert_eq!(index.bucket_count(), 2);
        assert_eq!(index.largest_bucket(), 2);
    }

    #[test]
    fn test_candidates_tolerate_second_letter_typo() {
        let records = vec![
            client(1, "Juan Perez"),
            client(2, "Jaun Perez"),
            client(3, "Huan Perez"),
            client(4, "Ana"),
        ];
        let index = BlockingIndex::build(&records);
        let candidates: Vec<usize> = index.candidates("Juan Perez").collect();
        assert_eq!(candidates, vec![0, 1]);
        // First-letter typo is outside the candidate set
        assert!(!candidates.contains(&2));
    }

    #[test]
    fn test_candidates_never_cross_first_character() {
        let names = ["Maria", "Mario", "Nora", "Lara", "marta", "Mx", "M"];
        let records: Vec<ClientRecord> = names
            .iter()
            .enumerate()
            .map(|(i, n)| client(i as i64, n))
            .collect();
        let index = BlockingIndex::build(&records);
        for record in &records {
            let first = bucket_key(&record.name).chars().next();
            for position in index.candidates(&record.name) {
                assert_eq!(bucket_key(&records[position].name).chars().next(), first);
            }
        }
    }
}
