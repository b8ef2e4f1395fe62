//! Sibling ordering for the children list.
//!
//! A [`SortSpec`] is an ordered sequence of [`SortKey`]s. Keys are applied
//! as stable sort passes in **reverse declaration order**: with a stable
//! sort, a later pass takes precedence over an earlier one, so running the
//! passes back to front makes the first-declared key the primary criterion,
//! the second-declared the tie-breaker, and so on. This composition is
//! load-bearing and must not be reordered.
//!
//! # Invariants
//!
//! - [INV-SORT-001] The first-declared key dominates the final order.
//! - [INV-SORT-002] Every pass is stable; ties keep their order from the
//!   previous pass.
//! - [INV-SORT-003] A ranked key places values missing from its value
//!   sequence after every listed value.

use thiserror::Error;

use crate::ticket::{Ticket, TicketId};

/// A single sort criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    /// The numeric ticket id itself.
    Id,

    /// A raw field value, compared lexicographically. Tickets without the
    /// field sort before tickets with it.
    Field(String),

    /// A field value coerced to an integer. A present but non-numeric
    /// value is a [`SortError::NonNumericField`]; an absent value sorts
    /// first.
    IntField(String),

    /// A field value ranked by its position in an explicit value sequence.
    RankedField {
        /// The field name.
        name: String,
        /// Allowed values in ascending rank order. Values absent from the
        /// sequence rank after all listed values.
        values: Vec<String>,
    },
}

/// An ordered multi-key sort specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    /// Creates a specification from keys in declaration order, most
    /// significant first.
    #[must_use]
    pub fn new(keys: Vec<SortKey>) -> Self {
        Self { keys }
    }

    /// The keys in declaration order.
    #[must_use]
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }
}

impl Default for SortSpec {
    /// The default specification orders by numeric ticket id.
    fn default() -> Self {
        Self {
            keys: vec![SortKey::Id],
        }
    }
}

/// Errors from sibling sorting.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum SortError {
    /// An integer-typed sort key hit a value that does not parse.
    #[error("field '{field}' of ticket #{ticket_id} is not numeric: '{value}'")]
    NonNumericField {
        /// The field named by the sort key.
        field: String,
        /// The ticket carrying the bad value.
        ticket_id: TicketId,
        /// The value that failed to parse.
        value: String,
    },
}

/// Orders sibling ids according to `spec`.
///
/// `lookup` maps an id to its ticket; ids whose lookup fails sort as if
/// every field were absent. The input order breaks any remaining ties.
///
/// # Errors
///
/// Returns [`SortError::NonNumericField`] when an [`SortKey::IntField`]
/// pass hits a present but non-numeric value.
pub fn sort_siblings<F>(
    ids: &[TicketId],
    spec: &SortSpec,
    mut lookup: F,
) -> Result<Vec<TicketId>, SortError>
where
    F: FnMut(TicketId) -> Option<Ticket>,
{
    let mut order = ids.to_vec();
    for key in spec.keys().iter().rev() {
        apply_pass(&mut order, key, &mut lookup)?;
    }
    Ok(order)
}

fn apply_pass<F>(
    order: &mut Vec<TicketId>,
    key: &SortKey,
    lookup: &mut F,
) -> Result<(), SortError>
where
    F: FnMut(TicketId) -> Option<Ticket>,
{
    match key {
        SortKey::Id => {
            order.sort_by_key(|id| id.value());
        }
        SortKey::Field(name) => {
            let decorated = order
                .iter()
                .map(|&id| (field_value(lookup, id, name), id))
                .collect();
            *order = undecorate(decorated);
        }
        SortKey::IntField(name) => {
            let mut decorated = Vec::with_capacity(order.len());
            for &id in order.iter() {
                let rank = match field_value(lookup, id, name) {
                    None => None,
                    Some(raw) => match raw.trim().parse::<i64>() {
                        Ok(value) => Some(value),
                        Err(_) => {
                            return Err(SortError::NonNumericField {
                                field: name.clone(),
                                ticket_id: id,
                                value: raw,
                            });
                        }
                    },
                };
                decorated.push((rank, id));
            }
            *order = undecorate(decorated);
        }
        SortKey::RankedField { name, values } => {
            let decorated = order
                .iter()
                .map(|&id| {
                    let rank = field_value(lookup, id, name)
                        .and_then(|value| values.iter().position(|allowed| *allowed == value))
                        .unwrap_or(values.len());
                    (rank, id)
                })
                .collect();
            *order = undecorate(decorated);
        }
    }
    Ok(())
}

fn field_value<F>(lookup: &mut F, id: TicketId, name: &str) -> Option<String>
where
    F: FnMut(TicketId) -> Option<Ticket>,
{
    lookup(id).and_then(|ticket| ticket.field(name).map(str::to_owned))
}

fn undecorate<K: Ord>(mut decorated: Vec<(K, TicketId)>) -> Vec<TicketId> {
    decorated.sort_by(|a, b| a.0.cmp(&b.0));
    decorated.into_iter().map(|(_, id)| id).collect()
}
