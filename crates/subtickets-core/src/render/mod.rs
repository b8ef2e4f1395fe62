//! Render data contract for the host templating layer.
//!
//! This module produces plain data, never markup: the host turns a
//! [`TicketPageData`] into whatever its template language wants. One call
//! to [`build_page_data`] performs one fresh traversal; nothing is cached
//! between requests.
//!
//! Missing tickets never abort a render. A parent link or child row whose
//! ticket cannot be found is dropped and logged, matching the tracker's
//! long-standing best-effort behavior; only backend failures propagate.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::accumulate::{accumulation_rows, AccumulationRow};
use crate::config::SubticketsConfig;
use crate::links::LinkStore;
use crate::sort::{sort_siblings, SortError};
use crate::ticket::{Ticket, TicketId, TicketLookupError, TicketStore, STATUS_CLOSED};
use crate::tree::{resolve_children, ResolveLimits, Subtree, TreeError};

/// A rendered link to one parent ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentLink {
    /// The parent ticket id.
    pub id: TicketId,
    /// The parent's status, for styling.
    pub status: String,
    /// The parent's summary, for the link title.
    pub summary: String,
}

impl ParentLink {
    /// Whether the linked parent is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.status == STATUS_CLOSED
    }
}

/// One row of the children table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildRow {
    /// The child ticket id.
    pub id: TicketId,
    /// The child's summary.
    pub summary: String,
    /// Nesting depth below the viewed ticket; direct children are 0. The
    /// host multiplies this by its indent unit.
    pub depth: usize,
    /// Whether the child is closed, for styling.
    pub closed: bool,
    /// Values of the configured `show_fields`, in column order. Missing
    /// values render empty.
    pub fields: Vec<String>,
}

/// Everything the host template needs to render the subticket section of
/// one ticket page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketPageData {
    /// Links to the viewed ticket's parents, ascending by id.
    pub parent_links: Vec<ParentLink>,
    /// The resolved descendant tree, keyed by id.
    pub tree: Subtree,
    /// The children table in display order: depth first, siblings ordered
    /// by the configured sort specification.
    pub children: Vec<ChildRow>,
    /// Accumulation results, in configuration order. Empty when the
    /// ticket has no children or nothing is configured.
    pub accumulations: Vec<AccumulationRow>,
    /// Whether the host should offer the "add subticket" affordance;
    /// false once the viewed ticket is closed.
    pub can_add_subticket: bool,
}

/// Errors that abort a page-data build.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RenderError {
    /// Tree resolution failed.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Sibling sorting failed.
    #[error(transparent)]
    Sort(#[from] SortError),

    /// The ticket backend failed. Missing tickets are skipped and never
    /// surface here.
    #[error(transparent)]
    TicketLookup(#[from] TicketLookupError),
}

/// Assembles the subticket view model for one ticket page.
///
/// # Errors
///
/// Returns a [`RenderError`] when tree resolution hits a cycle or the
/// depth limit, when sorting hits a non-numeric value under an
/// integer-typed key, or when a store backend fails.
pub fn build_page_data<L, T>(
    ticket: &Ticket,
    config: &SubticketsConfig,
    links: &L,
    tickets: &T,
    limits: &ResolveLimits,
) -> Result<TicketPageData, RenderError>
where
    L: LinkStore + ?Sized,
    T: TicketStore + ?Sized,
{
    let parent_links = build_parent_links(ticket, tickets)?;
    let tree = resolve_children(links, ticket.id(), limits)?;
    let children = build_child_rows(&tree, config, tickets)?;
    let accumulations = if tree.is_empty() {
        Vec::new()
    } else {
        accumulation_rows(&tree, config.show_accumulations(), tickets)?
    };
    Ok(TicketPageData {
        parent_links,
        tree,
        children,
        accumulations,
        can_add_subticket: !ticket.is_closed(),
    })
}

/// Builds parent links for the viewed ticket, ascending by id, skipping
/// parents that no longer exist.
///
/// # Errors
///
/// Returns a [`RenderError`] when the ticket backend fails.
pub fn build_parent_links<T>(
    ticket: &Ticket,
    tickets: &T,
) -> Result<Vec<ParentLink>, RenderError>
where
    T: TicketStore + ?Sized,
{
    let mut out = Vec::new();
    for id in ticket.parent_ids() {
        match tickets.ticket(id) {
            Ok(parent) => out.push(ParentLink {
                id,
                status: parent.status().unwrap_or_default().to_string(),
                summary: parent.field("summary").unwrap_or_default().to_string(),
            }),
            Err(err) if err.is_not_found() => {
                debug!(%id, "skipping missing parent ticket in links");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(out)
}

fn build_child_rows<T>(
    tree: &Subtree,
    config: &SubticketsConfig,
    tickets: &T,
) -> Result<Vec<ChildRow>, RenderError>
where
    T: TicketStore + ?Sized,
{
    let mut rows = Vec::new();
    push_rows(tree, 0, config, tickets, &mut rows)?;
    Ok(rows)
}

fn push_rows<T>(
    tree: &Subtree,
    depth: usize,
    config: &SubticketsConfig,
    tickets: &T,
    rows: &mut Vec<ChildRow>,
) -> Result<(), RenderError>
where
    T: TicketStore + ?Sized,
{
    let ids: Vec<TicketId> = tree.children().map(|(id, _)| id).collect();
    let ordered = sort_siblings(&ids, config.sort_children(), |id| tickets.ticket(id).ok())?;

    for id in ordered {
        let Some(subtree) = tree.get(id) else {
            continue;
        };
        match tickets.ticket(id) {
            Ok(child) => {
                rows.push(ChildRow {
                    id,
                    summary: child.field("summary").unwrap_or_default().to_string(),
                    depth,
                    closed: child.is_closed(),
                    fields: config
                        .show_fields()
                        .iter()
                        .map(|field| child.field(field).unwrap_or_default().to_string())
                        .collect(),
                });
                push_rows(subtree, depth + 1, config, tickets, rows)?;
            }
            Err(err) if err.is_not_found() => {
                debug!(%id, "skipping missing subticket row");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::MemoryLinkStore;
    use crate::ticket::MemoryTicketStore;

    fn id(n: u32) -> TicketId {
        TicketId::new(n)
    }

    fn fixture() -> (MemoryTicketStore, MemoryLinkStore) {
        let mut tickets = MemoryTicketStore::new();
        tickets.insert(Ticket::with_fields(
            id(1),
            [
                ("summary", "epic"),
                ("status", "new"),
                ("parents", "8, 99"),
            ],
        ));
        tickets.insert(Ticket::with_fields(
            id(2),
            [
                ("summary", "late child"),
                ("status", "new"),
                ("type", "task"),
                ("estimate", "2"),
            ],
        ));
        tickets.insert(Ticket::with_fields(
            id(3),
            [
                ("summary", "early child"),
                ("status", STATUS_CLOSED),
                ("type", "defect"),
                ("estimate", "3"),
            ],
        ));
        tickets.insert(Ticket::with_fields(
            id(4),
            [("summary", "grandchild"), ("status", "new"), ("estimate", "5")],
        ));
        tickets.insert(Ticket::with_fields(
            id(8),
            [("summary", "roadmap"), ("status", STATUS_CLOSED)],
        ));

        let mut links = MemoryLinkStore::new();
        links.link(id(1), id(2));
        links.link(id(1), id(3));
        links.link(id(3), id(4));
        (tickets, links)
    }

    fn config(toml: &str) -> SubticketsConfig {
        SubticketsConfig::from_toml(toml).unwrap()
    }

    #[test]
    fn test_page_data_for_open_ticket() {
        let (tickets, links) = fixture();
        let config = config(
            r#"
            [subtickets]
            show_fields = "['type', 'status']"
            show_accumulations = "[['estimate', 'Total estimate', 'sum']]"
        "#,
        );

        let viewed = tickets.ticket(id(1)).unwrap();
        let page = build_page_data(
            &viewed,
            &config,
            &links,
            &tickets,
            &ResolveLimits::default(),
        )
        .unwrap();

        // Parent 99 does not exist and is skipped; parent 8 renders.
        assert_eq!(page.parent_links.len(), 1);
        assert_eq!(page.parent_links[0].id, id(8));
        assert_eq!(page.parent_links[0].summary, "roadmap");
        assert!(page.parent_links[0].is_closed());

        // Default sort is numeric id; the grandchild follows its parent.
        let order: Vec<(u32, usize)> = page
            .children
            .iter()
            .map(|row| (row.id.value(), row.depth))
            .collect();
        assert_eq!(order, vec![(2, 0), (3, 0), (4, 1)]);

        assert_eq!(page.children[0].fields, vec!["task", "new"]);
        assert_eq!(page.children[1].fields, vec!["defect", "closed"]);
        assert!(page.children[1].closed);
        // The grandchild has no type field; it renders empty.
        assert_eq!(page.children[2].fields, vec!["", "new"]);

        assert_eq!(page.accumulations.len(), 1);
        assert_eq!(page.accumulations[0].label, "Total estimate");
        assert_eq!(page.accumulations[0].value, 10);

        assert!(page.can_add_subticket);
        assert_eq!(page.tree.node_count(), 3);
    }

    #[test]
    fn test_configured_sort_orders_siblings() {
        let (tickets, links) = fixture();
        let config = config(
            r#"
            [subtickets]
            sort_children = "['summary']"
        "#,
        );

        let viewed = tickets.ticket(id(1)).unwrap();
        let page = build_page_data(
            &viewed,
            &config,
            &links,
            &tickets,
            &ResolveLimits::default(),
        )
        .unwrap();

        let order: Vec<u32> = page.children.iter().map(|row| row.id.value()).collect();
        // "early child" before "late child"; the grandchild stays under 3.
        assert_eq!(order, vec![3, 4, 2]);
    }

    #[test]
    fn test_closed_ticket_hides_add_affordance() {
        let (mut tickets, links) = fixture();
        tickets.insert(Ticket::with_fields(
            id(1),
            [("summary", "epic"), ("status", STATUS_CLOSED)],
        ));

        let viewed = tickets.ticket(id(1)).unwrap();
        let page = build_page_data(
            &viewed,
            &SubticketsConfig::default(),
            &links,
            &tickets,
            &ResolveLimits::default(),
        )
        .unwrap();
        assert!(!page.can_add_subticket);
    }

    #[test]
    fn test_missing_child_row_is_skipped_with_its_subtree() {
        let (_, links) = fixture();
        let mut tickets = MemoryTicketStore::new();
        tickets.insert(Ticket::with_fields(
            id(1),
            [("summary", "epic"), ("status", "new")],
        ));
        tickets.insert(Ticket::with_fields(
            id(2),
            [("summary", "late child"), ("status", "new")],
        ));

        let viewed = tickets.ticket(id(1)).unwrap();
        let page = build_page_data(
            &viewed,
            &SubticketsConfig::default(),
            &links,
            &tickets,
            &ResolveLimits::default(),
        )
        .unwrap();

        // Ticket 3 is gone: its row and its grandchild row both drop, but
        // the resolved tree still records the link structure.
        let order: Vec<u32> = page.children.iter().map(|row| row.id.value()).collect();
        assert_eq!(order, vec![2]);
        assert_eq!(page.tree.node_count(), 3);
    }

    #[test]
    fn test_no_accumulations_without_children() {
        let mut tickets = MemoryTicketStore::new();
        tickets.insert(Ticket::with_fields(
            id(1),
            [("summary", "leaf"), ("status", "new")],
        ));

        let config = config(
            r#"
            [subtickets]
            show_accumulations = "[['estimate', 'Total estimate', 'sum']]"
        "#,
        );
        let viewed = tickets.ticket(id(1)).unwrap();
        let page = build_page_data(
            &viewed,
            &config,
            &MemoryLinkStore::new(),
            &tickets,
            &ResolveLimits::default(),
        )
        .unwrap();
        assert!(page.accumulations.is_empty());
    }

    #[test]
    fn test_page_data_serializes_for_the_host() {
        let (tickets, links) = fixture();
        let viewed = tickets.ticket(id(1)).unwrap();
        let page = build_page_data(
            &viewed,
            &SubticketsConfig::default(),
            &links,
            &tickets,
            &ResolveLimits::default(),
        )
        .unwrap();

        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["can_add_subticket"], serde_json::json!(true));
        assert_eq!(value["children"][0]["id"], serde_json::json!(2));
        assert_eq!(value["parent_links"][0]["status"], serde_json::json!("closed"));
        assert!(value["tree"]["2"].is_object());
    }
}
