use serde::{Deserialize, Serialize};

/// Immutable ticket value fetched from the ticket system. One instance per
/// unique ticket per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketInfo {
    pub id: String,
    pub title: String,
    pub url: String,
}

impl TicketInfo {
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
        }
    }
}
