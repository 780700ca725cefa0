//! Identifier generation.
//!
//! Ids are UUID v4 values rendered in the canonical hyphenated lowercase form,
//! e.g. `550e8400-e29b-41d4-a716-446655440000`.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Generate a random unique id (UUID v4, hyphenated).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Source of unique identifiers, injectable where deterministic ids are needed.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Default generator backed by [`generate_id`].
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV4Generator;

impl IdGenerator for UuidV4Generator {
    fn generate(&self) -> String {
        generate_id()
    }
}

/// Deterministic generator producing UUID-shaped ids from a counter.
/// Useful in tests and fixtures; never use it where ids must be unguessable.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn starting_at(start: u64) -> Self {
        Self { next: AtomicU64::new(start) }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        Uuid::from_u128(n as u128).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_id_is_canonical_v4() {
        let id = generate_id();
        assert_eq!(id.len(), 36);
        assert_eq!(id, id.to_lowercase());
        let parsed = Uuid::parse_str(&id).expect("parse uuid");
        assert_eq!(parsed.get_version_num(), 4);
        let dashes: Vec<usize> = id.match_indices('-').map(|(i, _)| i).collect();
        assert_eq!(dashes, vec![8, 13, 18, 23]);
    }

    #[test]
    fn ids_do_not_repeat() {
        let gen = UuidV4Generator;
        let ids: HashSet<String> = (0..1000).map(|_| gen.generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn sequential_generator_counts_up() {
        let gen = SequentialIdGenerator::starting_at(1);
        assert_eq!(gen.generate(), "00000000-0000-0000-0000-000000000001");
        assert_eq!(gen.generate(), "00000000-0000-0000-0000-000000000002");
    }
}
