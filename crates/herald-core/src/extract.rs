//! Ticket extraction from a commit range.

use crate::error::Result;
use crate::systems::{TicketSystem, VersionControlSystem};
use crate::ticket::TicketInfo;
use regex::Regex;
use std::collections::HashSet;

/// All pattern matches in the changelog, deduplicated preserving first-seen
/// order.
pub fn extract_ticket_ids(changelog: &str, pattern: &Regex) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for m in pattern.find_iter(changelog) {
        let id = m.as_str().to_string();
        if seen.insert(id.clone()) {
            ids.push(id);
        }
    }
    ids
}

/// Extracts the ticket ids for a commit range and fetches their infos.
///
/// A failing changelog read is fatal. A failing per-ticket info fetch only
/// drops that ticket: a warning naming it is logged and the remaining
/// tickets are processed.
pub fn extract_tickets(
    vcs: &dyn VersionControlSystem,
    tickets: &dyn TicketSystem,
    commit_range: &str,
) -> Result<Vec<TicketInfo>> {
    let ids = vcs.ticket_ids_from_commit_range(commit_range, tickets.ticket_id_pattern())?;

    let mut infos = Vec::new();
    for id in &ids {
        match tickets.ticket_info(id) {
            Ok(info) => infos.push(info),
            Err(error) => tracing::warn!(
                ticket = %id,
                %error,
                "could not fetch ticket info, skipping ticket. Typo or permissions problem?"
            ),
        }
    }
    Ok(infos)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
