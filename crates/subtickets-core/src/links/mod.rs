//! Parent→child link storage interface.
//!
//! The durable set of subticket relationships lives in the host tracker.
//! [`LinkStore`] is the read-only query surface this crate needs from it;
//! link creation and deletion stay in the host's ticket-edit workflow.
//! [`MemoryLinkStore`] backs tests and database-less hosts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ticket::TicketId;

/// An ordered parent→child pair.
///
/// Several links may share a parent (siblings) and a child may appear under
/// several parents; nothing here assumes a strict tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// The parent ticket id.
    pub parent: TicketId,
    /// The child ticket id.
    pub child: TicketId,
}

impl Link {
    /// Creates a link from parent and child ids.
    #[must_use]
    pub const fn new(parent: TicketId, child: TicketId) -> Self {
        Self { parent, child }
    }
}

/// Errors from a [`LinkStore`] query.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum LinkStoreError {
    /// The host backend failed to answer the query.
    #[error("link backend failure: {reason}")]
    Backend {
        /// Backend-provided failure description.
        reason: String,
    },
}

/// Read-only access to the host's parent→child links.
pub trait LinkStore {
    /// Returns every link whose parent is `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkStoreError::Backend`] if the query failed.
    fn links_by_parent(&self, parent: TicketId) -> Result<Vec<Link>, LinkStoreError>;
}

/// In-memory [`LinkStore`] backed by a per-parent child list.
#[derive(Debug, Clone, Default)]
pub struct MemoryLinkStore {
    by_parent: BTreeMap<TicketId, Vec<TicketId>>,
}

impl MemoryLinkStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parent→child link. Adding the same link twice is a no-op.
    pub fn link(&mut self, parent: TicketId, child: TicketId) {
        let children = self.by_parent.entry(parent).or_default();
        if !children.contains(&child) {
            children.push(child);
        }
    }

    /// Removes a parent→child link. Returns whether the link existed.
    pub fn unlink(&mut self, parent: TicketId, child: TicketId) -> bool {
        let Some(children) = self.by_parent.get_mut(&parent) else {
            return false;
        };
        let before = children.len();
        children.retain(|c| *c != child);
        before != children.len()
    }
}

impl LinkStore for MemoryLinkStore {
    fn links_by_parent(&self, parent: TicketId) -> Result<Vec<Link>, LinkStoreError> {
        Ok(self
            .by_parent
            .get(&parent)
            .map(|children| {
                children
                    .iter()
                    .map(|child| Link::new(parent, *child))
                    .collect()
            })
            .unwrap_or_default())
    }
}
