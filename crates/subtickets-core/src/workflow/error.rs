//! Workflow validation error types.

use thiserror::Error;

use crate::links::LinkStoreError;
use crate::ticket::TicketLookupError;

/// Errors that abort transition validation outright.
///
/// A failed guard is not an error; it surfaces as a
/// [`Violation`](super::Violation). These variants mean a store could not
/// be consulted at all.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// The link store failed.
    #[error(transparent)]
    LinkStore(#[from] LinkStoreError),

    /// The ticket backend failed.
    #[error(transparent)]
    TicketLookup(#[from] TicketLookupError),
}
