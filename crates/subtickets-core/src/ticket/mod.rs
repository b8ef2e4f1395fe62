//! Ticket entities and host ticket access.
//!
//! Tickets are owned by the host tracker; this crate only reads them. The
//! [`TicketStore`] trait is the narrow collaborator interface the host
//! implements, and [`MemoryTicketStore`] is the in-memory implementation
//! used by tests and by hosts without a database backend.
//!
//! A ticket's parent references live in its own `parents` field as free-form
//! text ("7, 9", "see #12", ...); [`Ticket::parent_ids`] extracts the
//! numeric ids from that text.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status value that marks a ticket as closed.
pub const STATUS_CLOSED: &str = "closed";

/// Name of the field holding the textual list of parent ticket ids.
pub const PARENTS_FIELD: &str = "parents";

static TICKET_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("ticket id regex is valid"));

/// Identifier of a ticket in the host tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(u32);

impl TicketId {
    /// Creates a ticket id from its numeric value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the numeric value of the id.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TicketId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>().map(Self)
    }
}

impl From<u32> for TicketId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// A ticket as seen by this crate: an id plus a string-keyed field map.
///
/// Field names are host-defined (`status`, `summary`, `owner`, ...); only
/// `status` and `parents` carry meaning here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    id: TicketId,
    fields: HashMap<String, String>,
}

impl Ticket {
    /// Creates a ticket with no fields.
    #[must_use]
    pub fn new(id: TicketId) -> Self {
        Self {
            id,
            fields: HashMap::new(),
        }
    }

    /// Creates a ticket from an id and an iterator of field pairs.
    pub fn with_fields<I, K, V>(id: TicketId, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            id,
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the ticket id.
    #[must_use]
    pub const fn id(&self) -> TicketId {
        self.id
    }

    /// Looks up a field value by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Sets a field value, replacing any previous value.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Returns the `status` field, if set.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.field("status")
    }

    /// Whether the ticket's status is [`STATUS_CLOSED`].
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.status() == Some(STATUS_CLOSED)
    }

    /// Parses the ticket's `parents` field into a deduplicated, ascending
    /// list of ticket ids. An absent field yields an empty list.
    #[must_use]
    pub fn parent_ids(&self) -> Vec<TicketId> {
        extract_ticket_ids(self.field(PARENTS_FIELD).unwrap_or(""))
    }
}

/// Extracts every decimal ticket id from free-form text, deduplicated and
/// in ascending numeric order.
///
/// Runs of digits too large for a ticket id are ignored.
#[must_use]
pub fn extract_ticket_ids(text: &str) -> Vec<TicketId> {
    let mut ids = BTreeSet::new();
    for found in TICKET_ID_RE.find_iter(text) {
        if let Ok(id) = found.as_str().parse::<TicketId>() {
            ids.insert(id);
        }
    }
    ids.into_iter().collect()
}

/// Errors from a [`TicketStore`] lookup.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum TicketLookupError {
    /// The ticket does not exist. Best-effort rendering paths skip this;
    /// it is never treated as a backend failure.
    #[error("ticket not found: #{id}")]
    NotFound {
        /// The id that was looked up.
        id: TicketId,
    },

    /// The host backend failed to answer the lookup.
    #[error("ticket backend failure for #{id}: {reason}")]
    Backend {
        /// The id that was looked up.
        id: TicketId,
        /// Backend-provided failure description.
        reason: String,
    },
}

impl TicketLookupError {
    /// Whether this error is a skippable [`NotFound`](Self::NotFound).
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Read-only access to the host's tickets.
pub trait TicketStore {
    /// Fetches a ticket by id.
    ///
    /// # Errors
    ///
    /// Returns [`TicketLookupError::NotFound`] if no such ticket exists and
    /// [`TicketLookupError::Backend`] if the lookup itself failed.
    fn ticket(&self, id: TicketId) -> Result<Ticket, TicketLookupError>;
}

/// In-memory [`TicketStore`] backed by a hash map.
#[derive(Debug, Clone, Default)]
pub struct MemoryTicketStore {
    tickets: HashMap<TicketId, Ticket>,
}

impl MemoryTicketStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a ticket, replacing any ticket with the same id.
    pub fn insert(&mut self, ticket: Ticket) {
        self.tickets.insert(ticket.id(), ticket);
    }

    /// Number of tickets in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}

impl TicketStore for MemoryTicketStore {
    fn ticket(&self, id: TicketId) -> Result<Ticket, TicketLookupError> {
        self.tickets
            .get(&id)
            .cloned()
            .ok_or(TicketLookupError::NotFound { id })
    }
}
