use std::io::Write;
use std::process::{Command, Stdio};

use log::debug;

use crate::error::{Error, Result};

/// Wayland clipboard helper, used unless the config names another command
pub const DEFAULT_COMMAND: &str = "wl-copy";

/// Pipe `content` into a clipboard command such as `wl-copy` or `xclip -selection clipboard`
pub fn copy(command: &[String], content: &str) -> Result<()> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| Error::ClipboardUnavailable("empty clipboard command".to_string()))?;

    debug!("Copying {} bytes via {program}", content.len());

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                Error::ClipboardUnavailable(format!("{program} not found; install it to use --clipboard"))
            }
            _ => Error::ClipboardUnavailable(format!("failed to run {program}: {e}")),
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(content.as_bytes())
            .map_err(|e| Error::ClipboardUnavailable(format!("failed to write to {program}: {e}")))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| Error::ClipboardUnavailable(format!("failed to wait for {program}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::ClipboardUnavailable(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(())
}
