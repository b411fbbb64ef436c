//! Host shell command execution.
//!
//! `system` mirrors C's `system(3)` contract as seen by callers: the command
//! string goes to the shell untouched and the status comes back as a plain
//! integer. Nothing is validated, captured or timed out.

use std::process::Command;

use tracing::debug;

use crate::error::CommandError;

/// Status returned when the shell could not be spawned or exited without a code.
pub const SPAWN_FAILED: i32 = -1;

/// Run `cmd` through the host shell and return its raw status.
///
/// A command exiting with `S` returns `S`. Spawn failures and signal deaths
/// return [`SPAWN_FAILED`] rather than an error.
pub fn system(cmd: &str) -> i32 {
    let status = match shell(cmd).status() {
        Ok(status) => status.code().unwrap_or(SPAWN_FAILED),
        Err(e) => {
            debug!(command = %cmd, error = %e, "failed to spawn shell");
            SPAWN_FAILED
        }
    };
    debug!(command = %cmd, status, "system command finished");
    status
}

/// Like [`system`], but a negative status is reported as
/// [`CommandError::Failed`]. Non-zero exit codes are still `Ok`.
pub fn system_checked(cmd: &str) -> Result<i32, CommandError> {
    match system(cmd) {
        status if status < 0 => Err(CommandError::Failed {
            command: cmd.to_owned(),
            status,
        }),
        status => Ok(status),
    }
}

#[cfg(unix)]
fn shell(cmd: &str) -> Command {
    let mut command = Command::new("/bin/sh");
    command.arg("-c").arg(cmd);
    command
}

#[cfg(windows)]
fn shell(cmd: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(cmd);
    command
}
