//! Consistent-hash placement ring
//!
//! Maps chunk hashes to storage nodes on a 32-bit ring. Each physical node
//! contributes [`VIRTUAL_NODES_PER_NODE`] virtual entries so load stays even
//! under consistent-hash skew; adding or removing one of `n` nodes remaps
//! only ~1/(n+1) of the keys.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::RwLock;

/// Virtual nodes per physical node for better distribution
pub const VIRTUAL_NODES_PER_NODE: usize = 150;

/// 32-bit ring position: first 4 bytes of SHA-256, big-endian
fn hash32(key: &str) -> u32 {
    let digest = Sha256::digest(key.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

#[derive(Default)]
struct RingState {
    /// (position, node_id), sorted by position
    entries: Vec<(u32, String)>,
    nodes: HashSet<String>,
}

/// Consistent-hash ring over storage node ids
///
/// Lookups take the shared lock, membership changes the exclusive one, so a
/// concurrent lookup sees either the pre- or post-mutation ring, never a
/// torn state.
#[derive(Default)]
pub struct HashRing {
    state: RwLock<RingState>,
}

impl HashRing {
    /// Create an empty ring
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a physical node, inserting its virtual entries
    ///
    /// Idempotent: re-adding a present node leaves the ring unchanged.
    pub fn add_node(&self, node_id: &str) {
        let mut state = self.state.write().expect("ring lock poisoned");
        if !state.nodes.insert(node_id.to_string()) {
            return;
        }

        for i in 0..VIRTUAL_NODES_PER_NODE {
            let position = hash32(&format!("{}-vnode-{}", node_id, i));
            state.entries.push((position, node_id.to_string()));
        }
        state.entries.sort_unstable_by_key(|&(position, _)| position);
    }

    /// Remove a physical node and all its virtual entries
    pub fn remove_node(&self, node_id: &str) {
        let mut state = self.state.write().expect("ring lock poisoned");
        if !state.nodes.remove(node_id) {
            return;
        }
        state.entries.retain(|(_, id)| id != node_id);
    }

    /// The node responsible for a chunk hash, or `None` on an empty ring
    pub fn primary(&self, chunk_hash: &str) -> Option<String> {
        let state = self.state.read().expect("ring lock poisoned");
        if state.entries.is_empty() {
            return None;
        }

        let position = hash32(chunk_hash);
        let idx = state
            .entries
            .partition_point(|&(p, _)| p < position)
            % state.entries.len();
        Some(state.entries[idx].1.clone())
    }

    /// Up to `count` distinct physical nodes for replica placement
    ///
    /// Walks the ring clockwise from the hash's position. Silently capped at
    /// the number of physical nodes; the walk is bounded at 2x the ring
    /// length in case an invariant is ever violated.
    pub fn replicas(&self, chunk_hash: &str, count: usize) -> Vec<String> {
        let state = self.state.read().expect("ring lock poisoned");
        if state.entries.is_empty() {
            return Vec::new();
        }

        let count = count.min(state.nodes.len());
        let position = hash32(chunk_hash);
        let start = state.entries.partition_point(|&(p, _)| p < position);

        let mut selected: HashSet<&str> = HashSet::new();
        let mut result = Vec::with_capacity(count);

        for step in 0..state.entries.len() * 2 {
            if result.len() >= count {
                break;
            }
            let (_, node_id) = &state.entries[(start + step) % state.entries.len()];
            if selected.insert(node_id.as_str()) {
                result.push(node_id.clone());
            }
        }

        result
    }

    /// Number of physical nodes on the ring
    pub fn node_count(&self) -> usize {
        self.state.read().expect("ring lock poisoned").nodes.len()
    }

    /// Whether a node is on the ring
    pub fn contains_node(&self, node_id: &str) -> bool {
        self.state
            .read()
            .expect("ring lock poisoned")
            .nodes
            .contains(node_id)
    }

    /// True if no nodes have been added
    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_with(nodes: &[&str]) -> HashRing {
        let ring = HashRing::new();
        for node in nodes {
            ring.add_node(node);
        }
        ring
    }

    #[test]
    fn test_empty_ring() {
        let ring = HashRing::new();
        assert!(ring.is_empty());
        assert_eq!(ring.primary("abc"), None);
        assert!(ring.replicas("abc", 3).is_empty());
    }

    #[test]
    fn test_primary_is_deterministic() {
        let ring = ring_with(&["n1", "n2", "n3"]);

        for i in 0..100 {
            let hash = format!("chunk-{}", i);
            let a = ring.primary(&hash).unwrap();
            let b = ring.primary(&hash).unwrap();
            assert_eq!(a, b);
        }

        // A second ring with the same membership agrees
        let other = ring_with(&["n1", "n2", "n3"]);
        for i in 0..100 {
            let hash = format!("chunk-{}", i);
            assert_eq!(ring.primary(&hash), other.primary(&hash));
        }
    }

    #[test]
    fn test_replicas_are_distinct_and_start_at_primary() {
        let ring = ring_with(&["n1", "n2", "n3", "n4", "n5"]);

        for i in 0..100 {
            let hash = format!("chunk-{}", i);
            let replicas = ring.replicas(&hash, 3);
            assert_eq!(replicas.len(), 3);
            assert_eq!(replicas[0], ring.primary(&hash).unwrap());

            let unique: HashSet<&String> = replicas.iter().collect();
            assert_eq!(unique.len(), 3);
        }
    }

    #[test]
    fn test_replica_count_caps_at_node_count() {
        let ring = ring_with(&["n1", "n2"]);
        let replicas = ring.replicas("some-chunk", 5);
        assert_eq!(replicas.len(), 2);
    }

    #[test]
    fn test_add_node_is_idempotent() {
        let ring = ring_with(&["n1"]);
        ring.add_node("n1");
        assert_eq!(ring.node_count(), 1);

        // No duplicate virtual entries: replicas of 1 from a 1-node ring
        let replicas = ring.replicas("x", 1);
        assert_eq!(replicas, vec!["n1".to_string()]);
    }

    #[test]
    fn test_remove_node_restores_prior_mapping() {
        let ring = ring_with(&["n1", "n2", "n3"]);

        let before: Vec<Option<String>> = (0..500)
            .map(|i| ring.primary(&format!("chunk-{}", i)))
            .collect();

        ring.add_node("n4");
        ring.remove_node("n4");
        assert!(!ring.contains_node("n4"));

        let after: Vec<Option<String>> = (0..500)
            .map(|i| ring.primary(&format!("chunk-{}", i)))
            .collect();

        assert_eq!(before, after);
    }

    #[test]
    fn test_minimal_rebalancing_on_node_add() {
        let ring = ring_with(&["n1", "n2", "n3"]);
        let samples = 10_000;

        let before: Vec<String> = (0..samples)
            .map(|i| ring.primary(&format!("chunk-{}", i)).unwrap())
            .collect();

        ring.add_node("n4");

        let moved = (0..samples)
            .filter(|&i| ring.primary(&format!("chunk-{}", i)).unwrap() != before[i])
            .count();

        let fraction = moved as f64 / samples as f64;
        // Going from 3 to 4 nodes should remap ~1/4 of keys, within
        // statistical tolerance
        assert!(
            fraction < 0.30,
            "too many keys moved: {:.1}%",
            fraction * 100.0
        );
        assert!(
            fraction > 0.15,
            "suspiciously few keys moved: {:.1}%",
            fraction * 100.0
        );

        // Every moved key must have landed on the new node
        for i in 0..samples {
            let now = ring.primary(&format!("chunk-{}", i)).unwrap();
            if now != before[i] {
                assert_eq!(now, "n4");
            }
        }
    }

    #[test]
    fn test_distribution_is_roughly_even() {
        let ring = ring_with(&["n1", "n2", "n3", "n4"]);
        let samples = 10_000;

        let mut counts: std::collections::HashMap<String, usize> = Default::default();
        for i in 0..samples {
            *counts
                .entry(ring.primary(&format!("chunk-{}", i)).unwrap())
                .or_default() += 1;
        }

        let expected = samples / 4;
        for (node, count) in counts {
            let skew = (count as f64 - expected as f64).abs() / expected as f64;
            assert!(skew < 0.25, "node {} holds {} of {}", node, count, samples);
        }
    }
}
