//! Numeric accumulation across a resolved subtree.
//!
//! An accumulation sums one integer field over every descendant of a
//! ticket, e.g. total estimated effort. Values that do not parse as
//! integers contribute nothing; the sum is best effort by design, matching
//! how operators use free-form ticket fields.

use serde::Serialize;
use tracing::debug;

use crate::ticket::{TicketId, TicketLookupError, TicketStore};
use crate::tree::Subtree;

/// How field values are combined across a subtree.
///
/// Only summation is defined; configuration parsing rejects anything else
/// before a method ever reaches this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulationMethod {
    /// Sum the field as integers.
    Sum,
}

impl AccumulationMethod {
    /// The configuration name of the method.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sum => "sum",
        }
    }
}

/// One configured accumulation: which field, shown under which label,
/// combined how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccumulationSpec {
    /// The ticket field to accumulate.
    pub field: String,
    /// The label the host shows next to the result.
    pub label: String,
    /// The combination method.
    pub method: AccumulationMethod,
}

/// A computed accumulation, ready for the host templating layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccumulationRow {
    /// The configured display label.
    pub label: String,
    /// The accumulated value.
    pub value: i64,
}

/// Accumulates `field` over every node of `tree`.
///
/// Missing tickets and values that do not parse as integers are skipped.
/// An empty tree accumulates to 0.
///
/// # Errors
///
/// Returns [`TicketLookupError::Backend`] if the ticket store fails;
/// [`TicketLookupError::NotFound`] never escapes.
pub fn accumulate<T>(
    tree: &Subtree,
    field: &str,
    method: AccumulationMethod,
    tickets: &T,
) -> Result<i64, TicketLookupError>
where
    T: TicketStore + ?Sized,
{
    match method {
        AccumulationMethod::Sum => sum_subtree(tree, field, tickets),
    }
}

/// Computes one [`AccumulationRow`] per spec, in configuration order.
///
/// # Errors
///
/// Returns [`TicketLookupError::Backend`] if the ticket store fails.
pub fn accumulation_rows<T>(
    tree: &Subtree,
    specs: &[AccumulationSpec],
    tickets: &T,
) -> Result<Vec<AccumulationRow>, TicketLookupError>
where
    T: TicketStore + ?Sized,
{
    specs
        .iter()
        .map(|spec| {
            Ok(AccumulationRow {
                label: spec.label.clone(),
                value: accumulate(tree, &spec.field, spec.method, tickets)?,
            })
        })
        .collect()
}

fn sum_subtree<T>(tree: &Subtree, field: &str, tickets: &T) -> Result<i64, TicketLookupError>
where
    T: TicketStore + ?Sized,
{
    let mut total = 0i64;
    for (id, subtree) in tree.children() {
        match tickets.ticket(id) {
            Ok(ticket) => {
                if let Some(raw) = ticket.field(field) {
                    match raw.trim().parse::<i64>() {
                        Ok(value) => total = total.saturating_add(value),
                        Err(_) => skip_value(id, field, raw),
                    }
                }
            }
            Err(err) if err.is_not_found() => {
                debug!(%id, "skipping missing ticket in accumulation");
            }
            Err(err) => return Err(err),
        }
        total = total.saturating_add(sum_subtree(subtree, field, tickets)?);
    }
    Ok(total)
}

fn skip_value(id: TicketId, field: &str, raw: &str) {
    debug!(%id, field, value = raw, "skipping non-numeric value in accumulation");
}
