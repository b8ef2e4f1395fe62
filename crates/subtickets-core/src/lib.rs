//! Parent/child ("subticket") relationships for a ticket tracker.
//!
//! This crate is the embedded core behind a subticket feature: it persists
//! nothing and renders nothing itself, but given read access to the host's
//! tickets and parent/child links it can
//!
//! - resolve the full descendant tree of a ticket ([`tree`]),
//! - order siblings at every level by a declarative multi-key specification
//!   ([`sort`]),
//! - sum numeric fields across a subtree ([`accumulate`]),
//! - check workflow guards before a state transition ([`workflow`]), and
//! - assemble the plain-data view model the host templating layer turns
//!   into markup ([`render`]).
//!
//! # Architecture
//!
//! ```text
//! host ticket tracker
//!   |            |
//!   v            v
//! TicketStore  LinkStore        (narrow read-only collaborator traits)
//!   |            |
//!   +-----+------+
//!         v
//!   tree::resolve_children --> sort::sort_siblings --> render::build_page_data
//!         |                                                 ^
//!         +--> accumulate::accumulation_rows ---------------+
//!         |
//!         +--> workflow::validate_transition
//! ```
//!
//! All computation is synchronous and request-scoped: one fresh traversal
//! per page render or validation, no caching across requests, no shared
//! mutable state. Configuration is parsed once at startup
//! ([`config::SubticketsConfig`]) and passed by reference into each entry
//! point.
//!
//! # Example
//!
//! ```rust
//! use subtickets_core::config::SubticketsConfig;
//! use subtickets_core::links::MemoryLinkStore;
//! use subtickets_core::render::build_page_data;
//! use subtickets_core::ticket::{MemoryTicketStore, Ticket, TicketId, TicketStore};
//! use subtickets_core::tree::ResolveLimits;
//!
//! let mut tickets = MemoryTicketStore::new();
//! tickets.insert(Ticket::with_fields(
//!     TicketId::new(1),
//!     [("summary", "build the importer"), ("status", "new")],
//! ));
//! tickets.insert(Ticket::with_fields(
//!     TicketId::new(2),
//!     [("summary", "parse the feed"), ("status", "new"), ("parents", "1")],
//! ));
//!
//! let mut links = MemoryLinkStore::new();
//! links.link(TicketId::new(1), TicketId::new(2));
//!
//! let config = SubticketsConfig::default();
//! let viewed = tickets.ticket(TicketId::new(1)).unwrap();
//! let page = build_page_data(&viewed, &config, &links, &tickets, &ResolveLimits::default())
//!     .unwrap();
//!
//! assert_eq!(page.children.len(), 1);
//! assert_eq!(page.children[0].id, TicketId::new(2));
//! assert!(page.can_add_subticket);
//! ```

#![warn(missing_docs)]

pub mod accumulate;
pub mod config;
pub mod links;
pub mod render;
pub mod sort;
pub mod ticket;
pub mod tree;
pub mod workflow;
