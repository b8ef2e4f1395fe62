//! Recursive subticket tree resolution.
//!
//! [`resolve_children`] turns a parent ticket id into the nested
//! [`Subtree`] of its descendants by querying the [`LinkStore`] level by
//! level. Key order inside a subtree carries no display meaning; the sort
//! engine orders siblings separately at render time.
//!
//! Link data is a general directed graph, not a strict tree: a child may be
//! linked under several parents, and each occurrence resolves its full
//! reachable subtree independently. Only a repeated id along a single
//! ancestor path is rejected, as that would never terminate.
//!
//! # Invariants
//!
//! - [INV-TREE-001] For acyclic link data the resolved node set equals the
//!   transitive closure of child links from the root.
//! - [INV-TREE-002] Resolution of unchanged link data is deterministic:
//!   two runs produce structurally identical trees.
//! - [INV-TREE-003] Resolution always terminates: cyclic data fails with
//!   [`TreeError::CycleDetected`] and pathological depth fails with
//!   [`TreeError::DepthLimitExceeded`] instead of exhausting the stack.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::links::{LinkStore, LinkStoreError};
use crate::ticket::TicketId;

/// Default bound on resolution depth.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Limits threaded through tree resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveLimits {
    /// Maximum number of nested levels resolution may visit, the root's
    /// level included.
    pub max_depth: usize,
}

impl ResolveLimits {
    /// Creates limits with the given maximum depth.
    #[must_use]
    pub const fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl Default for ResolveLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Errors from tree resolution.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TreeError {
    /// A ticket id reappeared along its own ancestor path.
    #[error("cycle detected: ticket #{ticket_id} is its own ancestor")]
    CycleDetected {
        /// The id that closed the cycle.
        ticket_id: TicketId,
    },

    /// The tree is nested deeper than the configured limit allows.
    #[error("subticket tree deeper than {max_depth} levels")]
    DepthLimitExceeded {
        /// The limit that was hit.
        max_depth: usize,
    },

    /// The link store failed.
    #[error(transparent)]
    LinkStore(#[from] LinkStoreError),
}

/// The resolved descendants of a ticket: a mapping from child id to that
/// child's own subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Subtree {
    children: BTreeMap<TicketId, Subtree>,
}

impl Subtree {
    /// Creates an empty subtree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the subtree has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of direct children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Number of nodes in the whole subtree. A ticket linked under several
    /// parents counts once per occurrence.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.children
            .values()
            .map(|subtree| 1 + subtree.node_count())
            .sum()
    }

    /// Whether `id` is a direct child.
    #[must_use]
    pub fn contains(&self, id: TicketId) -> bool {
        self.children.contains_key(&id)
    }

    /// Returns the subtree of a direct child.
    #[must_use]
    pub fn get(&self, id: TicketId) -> Option<&Subtree> {
        self.children.get(&id)
    }

    /// Iterates over direct children and their subtrees, in id order.
    pub fn children(&self) -> impl Iterator<Item = (TicketId, &Subtree)> {
        self.children.iter().map(|(id, subtree)| (*id, subtree))
    }

    /// Every id in the subtree, depth first in id order at each level.
    /// Occurrences under distinct parents repeat.
    #[must_use]
    pub fn ids(&self) -> Vec<TicketId> {
        let mut out = Vec::with_capacity(self.children.len());
        for (id, subtree) in self.children() {
            out.push(id);
            out.extend(subtree.ids());
        }
        out
    }

    fn insert(&mut self, id: TicketId, subtree: Subtree) {
        self.children.insert(id, subtree);
    }
}

/// Resolves the full descendant tree of `parent`.
///
/// Each level queries the link store once; duplicate links to the same
/// child under one parent collapse into a single node.
///
/// # Errors
///
/// Returns [`TreeError::CycleDetected`] if an id reappears along its own
/// ancestor path, [`TreeError::DepthLimitExceeded`] if nesting exceeds
/// `limits.max_depth`, and [`TreeError::LinkStore`] if a query fails.
pub fn resolve_children<L>(
    links: &L,
    parent: TicketId,
    limits: &ResolveLimits,
) -> Result<Subtree, TreeError>
where
    L: LinkStore + ?Sized,
{
    let mut path = Vec::new();
    let tree = resolve_level(links, parent, limits, &mut path)?;
    debug!(%parent, nodes = tree.node_count(), "resolved subticket tree");
    Ok(tree)
}

fn resolve_level<L>(
    links: &L,
    parent: TicketId,
    limits: &ResolveLimits,
    path: &mut Vec<TicketId>,
) -> Result<Subtree, TreeError>
where
    L: LinkStore + ?Sized,
{
    if path.len() >= limits.max_depth {
        return Err(TreeError::DepthLimitExceeded {
            max_depth: limits.max_depth,
        });
    }
    path.push(parent);
    let result = resolve_direct(links, parent, limits, path);
    path.pop();
    result
}

fn resolve_direct<L>(
    links: &L,
    parent: TicketId,
    limits: &ResolveLimits,
    path: &mut Vec<TicketId>,
) -> Result<Subtree, TreeError>
where
    L: LinkStore + ?Sized,
{
    let mut tree = Subtree::new();
    for link in links.links_by_parent(parent)? {
        let child = link.child;
        if path.contains(&child) {
            return Err(TreeError::CycleDetected { ticket_id: child });
        }
        if tree.contains(child) {
            continue;
        }
        let subtree = resolve_level(links, child, limits, path)?;
        tree.insert(child, subtree);
    }
    Ok(tree)
}

#[cfg(test)]
mod tests;
