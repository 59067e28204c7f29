//! Chat message composition.
//!
//! Turns the ticket set plus run metadata into a thread of size-bounded
//! messages: ticket lines are truncated to the per-block character cap,
//! greedily packed into blocks, and the blocks paginated into messages that
//! stay under the per-message block cap.

use crate::ticket::TicketInfo;

/// Character cap for a single section block's rendered text.
pub const BLOCK_TEXT_LIMIT: usize = 3000;

/// Ticket blocks per message (header and divider blocks not counted) before
/// the thread continues in a new message.
pub const TICKET_BLOCKS_PER_MESSAGE: usize = 50;

pub const EMPTY_PLACEHOLDER: &str = "No ticket information available";
pub const CONTINUATION_HEADER: &str = "The following tickets were also deployed:";

// ---------------------------------------------------------------------------
// Blocks and messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBlock {
    /// A mrkdwn text segment, at most [`BLOCK_TEXT_LIMIT`] characters.
    Section { text: String },
    Divider,
    /// A link button to one deployed target URL.
    Actions { url: String },
}

impl MessageBlock {
    pub fn section(text: impl Into<String>) -> Self {
        MessageBlock::Section { text: text.into() }
    }
}

/// One chat payload. Non-root messages carry the server-assigned id of the
/// thread root, set by the dispatcher after the root is acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub blocks: Vec<MessageBlock>,
    pub thread_root: Option<String>,
}

impl ChatMessage {
    pub fn new(blocks: Vec<MessageBlock>) -> Self {
        Self {
            blocks,
            thread_root: None,
        }
    }

    /// Ticket/content section blocks, without header, divider and actions.
    fn ticket_block_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, MessageBlock::Section { .. }))
            .count()
            .saturating_sub(1)
    }
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// One list-entry line per ticket: `• <url|id> title`, truncated to the
/// block cap with a trailing ellipsis marker.
pub fn render_ticket_line(ticket: &TicketInfo) -> String {
    truncate_line(format!(
        "• <{}|{}> {}",
        ticket.url, ticket.id, ticket.title
    ))
}

fn truncate_line(line: String) -> String {
    if line.chars().count() <= BLOCK_TEXT_LIMIT {
        return line;
    }
    let mut truncated: String = line.chars().take(BLOCK_TEXT_LIMIT - 3).collect();
    truncated.push_str("...");
    truncated
}

/// Greedily pack lines into block texts of at most [`BLOCK_TEXT_LIMIT`]
/// characters, joining with newlines.
pub fn pack_lines(lines: &[String]) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_chars = 0usize;

    for line in lines {
        let line_chars = line.chars().count();
        if buffer.is_empty() {
            buffer = line.clone();
            buffer_chars = line_chars;
            continue;
        }
        if buffer_chars + 1 + line_chars <= BLOCK_TEXT_LIMIT {
            buffer.push('\n');
            buffer.push_str(line);
            buffer_chars += 1 + line_chars;
        } else {
            blocks.push(std::mem::take(&mut buffer));
            buffer = line.clone();
            buffer_chars = line_chars;
        }
    }

    if !buffer.is_empty() {
        blocks.push(buffer);
    }
    blocks
}

fn header_text(project: &str, environment: &str, mentions: &[String]) -> String {
    let summary = format!("`{project}` has been deployed to `{environment}`.");
    if mentions.is_empty() {
        summary
    } else {
        format!("{} {summary}", mentions.join(" "))
    }
}

/// Compose the full message thread, root first.
pub fn compose_thread(
    tickets: &[TicketInfo],
    environment: &str,
    project: &str,
    mentions: &[String],
    urls: &[String],
) -> Vec<ChatMessage> {
    let lines: Vec<String> = if tickets.is_empty() {
        vec![EMPTY_PLACEHOLDER.to_string()]
    } else {
        tickets.iter().map(render_ticket_line).collect()
    };

    let mut messages = Vec::new();
    let mut blocks = vec![MessageBlock::section(header_text(
        project,
        environment,
        mentions,
    ))];
    let mut ticket_blocks = 0usize;

    for text in pack_lines(&lines) {
        if ticket_blocks == TICKET_BLOCKS_PER_MESSAGE {
            blocks.push(MessageBlock::Divider);
            messages.push(ChatMessage::new(std::mem::take(&mut blocks)));
            blocks.push(MessageBlock::section(CONTINUATION_HEADER));
            ticket_blocks = 0;
        }
        blocks.push(MessageBlock::Section { text });
        ticket_blocks += 1;
    }

    blocks.push(MessageBlock::Divider);
    for url in urls {
        blocks.push(MessageBlock::Actions { url: url.clone() });
    }
    messages.push(ChatMessage::new(blocks));

    messages
}

/// The copy/paste markdown equivalent of the thread content, used by the
/// clipboard path and the chat-delivery fallback.
pub fn markdown_message(
    tickets: &[TicketInfo],
    environment: &str,
    project: &str,
    urls: &[String],
) -> String {
    let mut message = format!("`{project}` has been deployed to `{environment}`.\n");

    for ticket in tickets {
        message.push_str(&format!(
            " - [{}]({}) {}\n",
            ticket.id, ticket.url, ticket.title
        ));
    }

    if tickets.is_empty() {
        message.push_str(EMPTY_PLACEHOLDER);
        message.push('\n');
    }

    for url in urls {
        message.push_str(&format!(" - <{url}>\n"));
    }

    message
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
