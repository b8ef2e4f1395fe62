//! Workflow guards over the subticket graph.
//!
//! Two ticket transitions are constrained by subticket relationships:
//!
//! - **resolve**: a ticket cannot be closed while any of its direct
//!   children is still open. Only direct children are checked, not the
//!   full subtree; closing proceeds bottom-up naturally.
//! - **reopen**: a ticket cannot be reopened while any of its parents is
//!   closed.
//!
//! Everything else passes unconstrained. Validation never mutates
//! anything and never raises for a failed guard: it returns
//! [`Violation`]s as plain data, and the host's ticket-update flow
//! refuses to commit when the list is non-empty.

mod error;


pub use error::ValidationError;

use tracing::debug;

use crate::links::LinkStore;
use crate::ticket::{Ticket, TicketId, TicketStore};

/// A requested ticket state transition, by workflow action name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketAction {
    /// Close the ticket.
    Resolve,
    /// Reopen a closed ticket.
    Reopen,
    /// Any other workflow action; carries no subticket constraint.
    Other(String),
}

impl TicketAction {
    /// Maps a host workflow action name onto a [`TicketAction`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "resolve" => Self::Resolve,
            "reopen" => Self::Reopen,
            other => Self::Other(other.to_string()),
        }
    }

    /// The host workflow action name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Resolve => "resolve",
            Self::Reopen => "reopen",
            Self::Other(name) => name,
        }
    }
}

/// What kind of guard a violation tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// A direct child is not closed yet.
    OpenChild,
    /// A parent is closed.
    ClosedParent,
}

/// One advisory message blocking a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Which guard tripped.
    pub kind: ViolationKind,
    /// The child or parent ticket the message refers to.
    pub ticket_id: TicketId,
    /// Operator-facing message.
    pub message: String,
}

impl Violation {
    fn open_child(ticket_id: TicketId) -> Self {
        Self {
            kind: ViolationKind::OpenChild,
            ticket_id,
            message: format!("child ticket #{ticket_id} has not been closed yet"),
        }
    }

    fn closed_parent(ticket_id: TicketId) -> Self {
        Self {
            kind: ViolationKind::ClosedParent,
            ticket_id,
            message: format!("parent ticket #{ticket_id} is closed"),
        }
    }
}

/// Checks whether `action` on `ticket` violates any subticket guard.
///
/// Missing child or parent tickets are skipped; a violation can only ever
/// name a ticket that was actually loaded.
///
/// # Errors
///
/// Returns [`ValidationError`] when a store backend fails; guard failures
/// are returned as [`Violation`]s, never as errors.
pub fn validate_transition<L, T>(
    ticket: &Ticket,
    action: &TicketAction,
    links: &L,
    tickets: &T,
) -> Result<Vec<Violation>, ValidationError>
where
    L: LinkStore + ?Sized,
    T: TicketStore + ?Sized,
{
    match action {
        TicketAction::Resolve => children_all_closed(ticket, links, tickets),
        TicketAction::Reopen => parents_all_open(ticket, tickets),
        TicketAction::Other(_) => Ok(Vec::new()),
    }
}

fn children_all_closed<L, T>(
    ticket: &Ticket,
    links: &L,
    tickets: &T,
) -> Result<Vec<Violation>, ValidationError>
where
    L: LinkStore + ?Sized,
    T: TicketStore + ?Sized,
{
    let mut violations = Vec::new();
    for link in links.links_by_parent(ticket.id())? {
        match tickets.ticket(link.child) {
            Ok(child) => {
                if !child.is_closed() {
                    violations.push(Violation::open_child(link.child));
                }
            }
            Err(err) if err.is_not_found() => {
                debug!(child = %link.child, "skipping missing child in resolve guard");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(violations)
}

fn parents_all_open<T>(ticket: &Ticket, tickets: &T) -> Result<Vec<Violation>, ValidationError>
where
    T: TicketStore + ?Sized,
{
    let mut violations = Vec::new();
    for id in ticket.parent_ids() {
        match tickets.ticket(id) {
            Ok(parent) => {
                if parent.is_closed() {
                    violations.push(Violation::closed_parent(id));
                }
            }
            Err(err) if err.is_not_found() => {
                debug!(parent = %id, "skipping missing parent in reopen guard");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(violations)
}
