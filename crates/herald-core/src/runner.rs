//! The deployment orchestration workflow.
//!
//! Fixed, single-threaded order: resolve environment → extract tickets and
//! confirm → update ticket statuses → compose the message thread → deliver
//! (chat or clipboard) → publish deployment records. Remote errors are
//! handled at each step's boundary; only environment/changelog/credential
//! problems and an explicit user decline abort the run.

use crate::clipboard;
use crate::config::Config;
use crate::context::RunContext;
use crate::deploy::{self, PublishResult};
use crate::error::{HeraldError, Result};
use crate::extract;
use crate::message::{self, ChatMessage};
use crate::prompt::Prompter;
use crate::systems::{ChatSystem, TicketSystem, VersionControlSystem};
use crate::ticket::TicketInfo;

// ---------------------------------------------------------------------------
// Delivery decision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Chat,
    Clipboard,
}

/// Pure decision from the three flags. `None` means the user must be asked.
///
/// With neither flag set, a non-interactive run takes the clipboard path:
/// the safe default is to not post anywhere.
pub fn delivery_decision(
    send_message: bool,
    copy_message: bool,
    non_interactive: bool,
) -> Option<Delivery> {
    if send_message {
        Some(Delivery::Chat)
    } else if copy_message {
        Some(Delivery::Clipboard)
    } else if non_interactive {
        Some(Delivery::Clipboard)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
pub fn run(
    config: &Config,
    ctx: &RunContext,
    vcs: &dyn VersionControlSystem,
    tickets: &dyn TicketSystem,
    chat: &dyn ChatSystem,
    prompter: &mut dyn Prompter,
    environment_input: &str,
    commit_range: &str,
) -> Result<()> {
    let environments = config.environment_table();
    let environment = environments.resolve_or_err(environment_input)?;

    println!("Extracting tickets from commit range {commit_range}");
    let infos = extract::extract_tickets(vcs, tickets, commit_range)?;

    println!();
    println!("Found {} tickets:", infos.len());
    for info in &infos {
        println!("  · {}: {} ({})", info.id, info.title, info.url);
    }

    if !ctx.non_interactive {
        println!();
        let question = format!("Continue deployment to {environment}?");
        if !prompter.confirm(&question, true)? {
            return Err(HeraldError::Aborted);
        }
    }

    crate::status::update_all(tickets, &infos, &environment, &environments)?;

    let urls = config.urls_for(&environment);
    let mentions = config.mentions_with(&ctx.mentions);
    let thread = message::compose_thread(&infos, &environment, &config.name, &mentions, &urls);

    let delivery = match delivery_decision(ctx.send_message, ctx.copy_message, ctx.non_interactive)
    {
        Some(delivery) => delivery,
        None => {
            let question = format!(
                "Should the deployment message be sent using {}?",
                chat.name()
            );
            if prompter.confirm(&question, false)? {
                Delivery::Chat
            } else {
                Delivery::Clipboard
            }
        }
    };

    match delivery {
        Delivery::Chat => {
            if let Err(error) = send_thread(chat, &thread) {
                tracing::error!(
                    %error,
                    "could not send the deploy message, generating it for copy/paste instead"
                );
                copy_paste_path(&infos, &config.name, &environment, &urls);
            }
        }
        Delivery::Clipboard => copy_paste_path(&infos, &config.name, &environment, &urls),
    }

    let issue_keys: Vec<String> = infos.iter().map(|info| info.id.clone()).collect();
    match deploy::publish(tickets, ctx, &environment, &issue_keys, &urls, commit_range) {
        PublishResult::Success => {
            println!("Deployment recorded in {}", tickets.name());
        }
        PublishResult::Failure(errors) => {
            for error in errors {
                tracing::warn!(%error, "deployment record was not accepted");
            }
        }
    }

    Ok(())
}

/// Sends the thread strictly in order: the root first, then each reply
/// carrying the root's acknowledged id.
fn send_thread(chat: &dyn ChatSystem, thread: &[ChatMessage]) -> Result<()> {
    let mut root_id: Option<String> = None;

    for message in thread {
        let mut message = message.clone();
        message.thread_root = root_id.clone();
        let sent = chat.send(&message)?;
        if root_id.is_none() {
            root_id = Some(sent.id);
        }
    }
    Ok(())
}

/// The manual path: print the markdown message and try the clipboard once.
fn copy_paste_path(infos: &[TicketInfo], project: &str, environment: &str, urls: &[String]) {
    let markdown = message::markdown_message(infos, environment, project, urls);

    println!("Copying the following markdown message:");
    println!("{markdown}");

    match clipboard::copy(&markdown) {
        Ok(()) => println!("Copied markdown message to clipboard"),
        Err(error) => tracing::warn!(
            %error,
            "could not copy the deployment message to the clipboard, copy the markdown above yourself"
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
