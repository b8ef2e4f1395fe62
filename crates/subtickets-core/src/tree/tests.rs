//! Tests for subticket tree resolution.

use std::collections::BTreeSet;

use proptest::prelude::*;

use super::{resolve_children, ResolveLimits, TreeError};
use crate::links::{Link, LinkStore, LinkStoreError, MemoryLinkStore};
use crate::ticket::TicketId;

fn id(n: u32) -> TicketId {
    TicketId::new(n)
}

fn store(links: &[(u32, u32)]) -> MemoryLinkStore {
    let mut store = MemoryLinkStore::new();
    for (parent, child) in links {
        store.link(id(*parent), id(*child));
    }
    store
}

/// Link store that reports the same child twice for one parent, as a
/// backend with duplicate rows would.
struct DuplicateRowStore;

impl LinkStore for DuplicateRowStore {
    fn links_by_parent(&self, parent: TicketId) -> Result<Vec<Link>, LinkStoreError> {
        if parent == id(1) {
            Ok(vec![Link::new(parent, id(2)), Link::new(parent, id(2))])
        } else {
            Ok(Vec::new())
        }
    }
}

struct FailingLinkStore;

impl LinkStore for FailingLinkStore {
    fn links_by_parent(&self, _parent: TicketId) -> Result<Vec<Link>, LinkStoreError> {
        Err(LinkStoreError::Backend {
            reason: "connection refused".to_string(),
        })
    }
}

// =============================================================================
// Resolution Tests
// =============================================================================

#[test]
fn test_resolve_without_links_is_empty() {
    let tree = resolve_children(&store(&[]), id(1), &ResolveLimits::default()).unwrap();
    assert!(tree.is_empty());
    assert_eq!(tree.node_count(), 0);
}

#[test]
fn test_resolve_nested_levels() {
    let store = store(&[(1, 2), (1, 3), (3, 4)]);
    let tree = resolve_children(&store, id(1), &ResolveLimits::default()).unwrap();

    assert_eq!(tree.child_count(), 2);
    assert_eq!(tree.node_count(), 3);
    assert_eq!(tree.ids(), vec![id(2), id(3), id(4)]);

    let third = tree.get(id(3)).unwrap();
    assert!(third.contains(id(4)));
    assert!(tree.get(id(2)).unwrap().is_empty());
}

#[test]
fn test_duplicate_rows_collapse_into_one_child() {
    let tree = resolve_children(&DuplicateRowStore, id(1), &ResolveLimits::default()).unwrap();
    assert_eq!(tree.child_count(), 1);
    assert!(tree.contains(id(2)));
}

#[test]
fn test_child_under_two_parents_resolves_under_both() {
    let store = store(&[(1, 2), (1, 3), (2, 4), (3, 4)]);
    let tree = resolve_children(&store, id(1), &ResolveLimits::default()).unwrap();

    assert!(tree.get(id(2)).unwrap().contains(id(4)));
    assert!(tree.get(id(3)).unwrap().contains(id(4)));
    assert_eq!(tree.node_count(), 4);
}

#[test]
fn test_resolution_is_idempotent() {
    let store = store(&[(1, 2), (2, 3), (1, 4)]);
    let first = resolve_children(&store, id(1), &ResolveLimits::default()).unwrap();
    let second = resolve_children(&store, id(1), &ResolveLimits::default()).unwrap();
    assert_eq!(first, second);
}

// =============================================================================
// Guard Tests
// =============================================================================

#[test]
fn test_self_link_is_a_cycle() {
    let err = resolve_children(&store(&[(1, 1)]), id(1), &ResolveLimits::default()).unwrap_err();
    assert!(matches!(
        err,
        TreeError::CycleDetected { ticket_id } if ticket_id == id(1)
    ));
}

#[test]
fn test_two_node_cycle_is_detected() {
    let err =
        resolve_children(&store(&[(1, 2), (2, 1)]), id(1), &ResolveLimits::default()).unwrap_err();
    assert!(matches!(
        err,
        TreeError::CycleDetected { ticket_id } if ticket_id == id(1)
    ));
}

#[test]
fn test_deep_cycle_is_detected() {
    let store = store(&[(1, 2), (2, 3), (3, 2)]);
    let err = resolve_children(&store, id(1), &ResolveLimits::default()).unwrap_err();
    assert!(matches!(
        err,
        TreeError::CycleDetected { ticket_id } if ticket_id == id(2)
    ));
}

#[test]
fn test_depth_limit() {
    let store = store(&[(1, 2), (2, 3)]);
    let err = resolve_children(&store, id(1), &ResolveLimits::with_max_depth(2)).unwrap_err();
    assert!(matches!(
        err,
        TreeError::DepthLimitExceeded { max_depth: 2 }
    ));

    // The same chain fits within three levels.
    assert!(resolve_children(&store, id(1), &ResolveLimits::with_max_depth(3)).is_ok());
}

#[test]
fn test_link_store_failure_propagates() {
    let err = resolve_children(&FailingLinkStore, id(1), &ResolveLimits::default()).unwrap_err();
    assert!(matches!(err, TreeError::LinkStore(_)));
}

// =============================================================================
// Properties
// =============================================================================

/// Reference transitive closure over the raw link pairs.
fn closure(links: &[(u32, u32)], root: u32) -> BTreeSet<u32> {
    let mut reached = BTreeSet::new();
    let mut frontier = vec![root];
    while let Some(parent) = frontier.pop() {
        for (from, to) in links {
            if *from == parent && reached.insert(*to) {
                frontier.push(*to);
            }
        }
    }
    reached
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: for acyclic link data the resolved node set equals the
    /// transitive closure of child links from the root.
    #[test]
    fn prop_node_set_matches_transitive_closure(
        pairs in prop::collection::vec((1u32..15, 1u32..15), 0..40)
    ) {
        // Orienting every pair small→large rules out cycles.
        let links: Vec<(u32, u32)> = pairs
            .into_iter()
            .filter(|(a, b)| a != b)
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();

        let tree = resolve_children(&store(&links), id(1), &ResolveLimits::default()).unwrap();
        let resolved: BTreeSet<u32> = tree.ids().into_iter().map(TicketId::value).collect();
        prop_assert_eq!(resolved, closure(&links, 1));
    }

    /// Property: resolution of unchanged link data is deterministic.
    #[test]
    fn prop_resolution_is_deterministic(
        pairs in prop::collection::vec((1u32..15, 1u32..15), 0..40)
    ) {
        let links: Vec<(u32, u32)> = pairs
            .into_iter()
            .filter(|(a, b)| a != b)
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();

        let store = store(&links);
        let first = resolve_children(&store, id(1), &ResolveLimits::default()).unwrap();
        let second = resolve_children(&store, id(1), &ResolveLimits::default()).unwrap();
        prop_assert_eq!(first, second);
    }
}
