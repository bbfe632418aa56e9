// src/synthetic.rs - Seeded synthetic client registries for demos and tests
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::models::{AdvisorRecord, ClientRecord, StartRequest};

const FIRST_NAMES: &[&str] = &[
    "Juan", "Maria", "Jose", "Ana", "Luis", "Carmen", "Carlos", "Lucia", "Miguel", "Elena",
    "Pedro", "Sofia", "Jorge", "Laura", "Diego", "Marta", "Pablo", "Rosa", "Andres", "Isabel",
    "Fernando", "Paula", "Ricardo", "Teresa", "Alberto", "Beatriz", "Hector", "Gloria",
];

const LAST_NAMES: &[&str] = &[
    "Perez", "Lopez", "Garcia", "Martinez", "Rodriguez", "Sanchez", "Ramirez", "Torres",
    "Flores", "Rivera", "Gomez", "Diaz", "Reyes", "Morales", "Ortiz", "Castillo", "Romero",
    "Herrera", "Medina", "Aguilar", "Vargas", "Castro", "Mendoza", "Ruiz", "Alvarez",
];

const ADVISOR_NAMES: &[&str] = &[
    "Valeria", "Tomas", "Camila", "Martin", "Julieta", "Santiago", "Renata", "Emilio",
];

/// Share of clients re-entered by another advisor.
const DUPLICATE_RATE: f64 = 0.15;
/// Share of clients left without an advisor.
const OWNERLESS_RATE: f64 = 0.03;

/// Builds `count` clients spread over `advisors` advisors.
///
/// Some clients are re-entered under a different advisor with a one-letter
/// typo or a reformatted contact number, which is what the detector should
/// flag. The same seed always yields the same registry.
pub fn generate_registry(count: usize, advisors: usize, seed: u64) -> StartRequest {
    let mut rng = StdRng::seed_from_u64(seed);

    let advisor_records: Vec<AdvisorRecord> = (0..advisors)
        .map(|i| {
            let base = ADVISOR_NAMES[i % ADVISOR_NAMES.len()];
            AdvisorRecord::new(i as i64 + 1, &format!("{} {}", base, i / ADVISOR_NAMES.len() + 1))
        })
        .collect();

    let mut clients: Vec<ClientRecord> = Vec::with_capacity(count);
    while clients.len() < count {
        let id = clients.len() as i64 + 1;
        let owner = pick_owner(&mut rng, advisors);

        let duplicate_of = if !clients.is_empty() && advisors > 1 && rng.gen_bool(DUPLICATE_RATE) {
            clients.choose(&mut rng).cloned()
        } else {
            None
        };

        let client = match duplicate_of {
            Some(original) => {
                let owner = other_owner(&mut rng, original.owner_id, advisors);
                if rng.gen_bool(0.5) {
                    ClientRecord::new(id, &with_typo(&mut rng, &original.name), &random_phone(&mut rng), owner)
                } else {
                    ClientRecord::new(id, &original.name.to_uppercase(), &format!(" {} ", original.phone), owner)
                }
            }
            None => {
                let first = FIRST_NAMES.choose(&mut rng).copied().unwrap_or("Juan");
                let last = LAST_NAMES.choose(&mut rng).copied().unwrap_or("Perez");
                ClientRecord::new(id, &format!("{} {}", first, last), &random_phone(&mut rng), owner)
            }
        };
        clients.push(client);
    }

    StartRequest::new(clients, advisor_records)
}

fn pick_owner(rng: &mut StdRng, advisors: usize) -> Option<i64> {
    if advisors == 0 || rng.gen_bool(OWNERLESS_RATE) {
        None
    } else {
        Some(rng.gen_range(1..=advisors as i64))
    }
}

fn other_owner(rng: &mut StdRng, current: Option<i64>, advisors: usize) -> Option<i64> {
    let current = current.unwrap_or(0);
    loop {
        let candidate = rng.gen_range(1..=advisors as i64);
        if candidate != current {
            return Some(candidate);
        }
    }
}

fn random_phone(rng: &mut StdRng) -> String {
    format!("555{:07}", rng.gen_range(0..10_000_000u32))
}

/// Replaces one letter past the two-character prefix so the copy stays in
/// the original's blocking bucket.
fn with_typo(rng: &mut StdRng, name: &str) -> String {
    let mut chars: Vec<char> = name.chars().collect();
    let positions: Vec<usize> = (2..chars.len()).filter(|&i| chars[i].is_alphabetic()).collect();
    if let Some(&position) = positions.choose(&mut *rng) {
        let replacement = loop {
            let letter = rng.gen_range(b'a'..=b'z') as char;
            if letter != chars[position].to_ascii_lowercase() {
                break letter;
            }
        };
        chars[position] = replacement;
    }
    chars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_same_seed_same_registry() {
        let a = generate_registry(250, 5, 99);
        let b = generate_registry(250, 5, 99);
        assert_eq!(a.clients, b.clients);
        assert_eq!(a.advisors, b.advisors);

        let c = generate_registry(250, 5, 100);
        assert_ne!(a.clients, c.clients);
    }

    #[test]
    fn test_shape_of_registry() {
        let registry = generate_registry(500, 8, 1);
        assert_eq!(registry.clients.len(), 500);
        assert_eq!(registry.advisors.len(), 8);

        let ids: HashSet<i64> = registry.clients.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 500);

        let advisor_ids: HashSet<i64> = registry.advisors.iter().map(|a| a.id).collect();
        for owner in registry.clients.iter().filter_map(|c| c.owner_id) {
            assert!(advisor_ids.contains(&owner));
        }
        assert!(registry.clients.iter().all(|c| !c.name.is_empty()));
    }

    #[test]
    fn test_injected_duplicates_are_detected() {
        let registry = generate_registry(300, 6, 5);
        let groups = crate::matching::grouping::build_groups(
            &registry.clients,
            &registry.advisors,
            &crate::utils::config::DetectionConfig::default(),
        );
        assert!(!groups.is_empty());
    }

    #[test]
    fn test_typo_keeps_prefix() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let typo = with_typo(&mut rng, "Juan Perez");
            assert!(typo.starts_with("Ju"));
            assert_eq!(typo.chars().count(), 10);
            assert_ne!(typo, "Juan Perez");
        }
    }

    #[test]
    fn test_no_advisors_means_no_owners() {
        let registry = generate_registry(20, 0, 4);
        assert!(registry.clients.iter().all(|c| c.owner_id.is_none()));
    }
}
