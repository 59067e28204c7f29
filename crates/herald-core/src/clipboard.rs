//! Clipboard copy via the platform's clipboard utility.

use crate::error::{HeraldError, Result};
use std::io::Write;
use std::process::{Command, Stdio};

fn clipboard_executable() -> Result<&'static str> {
    match std::env::consts::OS {
        "macos" => Ok("pbcopy"),
        "windows" => Ok("clip"),
        "linux" | "freebsd" | "openbsd" | "netbsd" | "solaris" => Ok("xclip"),
        other => Err(HeraldError::Clipboard(format!(
            "no clipboard integration for platform '{other}'"
        ))),
    }
}

/// Pipes `text` into the platform clipboard utility. Callers treat a failure
/// as non-fatal, since the message was already printed for manual copying.
pub fn copy(text: &str) -> Result<()> {
    let executable = clipboard_executable()?;

    let mut child = Command::new(executable)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| HeraldError::Clipboard(format!("failed to start {executable}: {e}")))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .map_err(|e| HeraldError::Clipboard(format!("failed to write to {executable}: {e}")))?;
    }

    let status = child
        .wait()
        .map_err(|e| HeraldError::Clipboard(format!("failed to wait for {executable}: {e}")))?;

    if !status.success() {
        return Err(HeraldError::Clipboard(format!(
            "{executable} exited with {status}"
        )));
    }
    Ok(())
}
