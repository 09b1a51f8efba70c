//! Process spawning utilities.
//!
//! Children launched here are deliberately never waited on; the binary sets
//! SIGCHLD to SIG_IGN so they do not linger as zombies.
use crate::Result;
use std::{
    io::Read,
    process::{Command, Stdio},
};
use tracing::debug;

/// Spawn an external command, splitting the string on whitespace.
///
/// Stdout and stderr are redirected to /dev/null and the child is left to
/// run detached.
pub fn spawn<S: Into<String>>(cmd: S) -> Result<()> {
    let s = cmd.into();
    debug!(cmd = %s, "spawning subprocess");

    let parts: Vec<&str> = s.split_whitespace().collect();
    let (head, rest) = match parts.split_first() {
        Some(split) => split,
        None => return Ok(()),
    };

    Command::new(head)
        .args(rest)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    Ok(())
}

/// Spawn an external command and block for its stdout.
pub fn spawn_for_output<S: Into<String>>(cmd: S) -> Result<String> {
    let s = cmd.into();
    debug!(cmd = %s, "spawning subprocess for output");

    let parts: Vec<&str> = s.split_whitespace().collect();
    let (head, rest) = match parts.split_first() {
        Some(split) => split,
        None => return Ok(String::new()),
    };

    let mut child = Command::new(head)
        .args(rest)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    let mut buf = String::new();
    if let Some(mut stdout) = child.stdout.take() {
        stdout.read_to_string(&mut buf)?;
    }

    Ok(buf)
}

/// Surface a message to the user via `notify-send`.
pub fn notify(msg: &str) -> Result<()> {
    Command::new("notify-send")
        .arg("escher")
        .arg(msg)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    Ok(())
}
