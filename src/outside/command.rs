use std::process::{Child, Command, Output, Stdio};

use bitflags::bitflags;
use tracing::{debug, trace, Level};

use crate::result::{bail, Result};

pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";
pub const FFXXX_DEFAULT_ARGS: [&str; 3] = ["-hide_banner", "-loglevel", "error"];

bitflags! {
    /// Standard handles of a child process to pipe back to us
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capture: u8 {
        const STDIN = 0b0000001;
        const STDOUT = 0b0000010;
        const STDERR = 0b0000100;
    }
}

impl Capture {
    fn stdio(self, handle: Capture) -> Stdio {
        if self.contains(handle) {
            Stdio::piped()
        } else {
            Stdio::null()
        }
    }

    /// Pipe the captured handles of `cmd`, discard the others
    fn apply(self, cmd: &mut Command) -> &mut Command {
        cmd.stdin(self.stdio(Capture::STDIN))
            .stdout(self.stdio(Capture::STDOUT))
            .stderr(self.stdio(Capture::STDERR))
    }
}

/// Render a command the way it would be typed in a shell, for logs and events.
pub fn command_line(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|s| s.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run a command to completion and return its output.
///
/// At the debug level both output streams are captured and logged,
/// whatever `capture` asks for.
///
/// Only a command that could not be executed is an error,
/// a non-0 exit status is left to the caller.
pub fn run_command<F: FnOnce(&mut Command) -> &mut Command>(
    program: &str,
    f: F,
    capture: Capture,
) -> Result<Output> {
    let is_debug = tracing::enabled!(Level::DEBUG);
    let capture = if is_debug {
        capture | Capture::STDOUT | Capture::STDERR
    } else {
        capture
    };

    let mut cmd = Command::new(program);
    let cmd = capture.apply(f(&mut cmd));

    debug!("Executing command: {}", command_line(cmd));
    let res = cmd.output()?;

    if is_debug {
        debug!(
            "{program} exited with {}, {} bytes on stdout, {} bytes on stderr",
            res.status,
            res.stdout.len(),
            res.stderr.len()
        );
        trace!("stdout: {:?}", String::from_utf8_lossy(&res.stdout));
        trace!("stderr: {:?}", String::from_utf8_lossy(&res.stderr));
    }

    Ok(res)
}

/// Start a command without waiting for it, with the requested handles piped.
pub fn spawn_command(cmd: &mut Command, capture: Capture) -> Result<Child> {
    let cmd = capture.apply(cmd);

    debug!("Spawning command: {}", command_line(cmd));
    Ok(cmd.spawn()?)
}

/// Run the command and verify that it has returned a success status code.
pub fn assert_success_command<F: FnOnce(&mut Command) -> &mut Command>(
    program: &str,
    f: F,
) -> Result<()> {
    let res = run_command(program, f, Capture::empty())?;
    if !res.status.success() {
        bail(format!("{program} ran but exited with {}", res.status))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_command_line() {
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-i", "in.mp4", "out.m3u8"]);
        assert_eq!(command_line(&cmd), "ffmpeg -i in.mp4 out.m3u8");
    }

    #[test]
    fn missing_program_is_an_error() {
        let res = run_command(
            "nonexistent_program_xyz_12345",
            |cmd| cmd.arg("-version"),
            Capture::empty(),
        );
        assert!(res.is_err());
    }

    #[test]
    fn failing_program_is_not_a_success() {
        // `false` is available on every unix test host
        if cfg!(unix) {
            assert!(assert_success_command("false", |cmd| cmd).is_err());
            assert!(assert_success_command("true", |cmd| cmd).is_ok());
        }
    }
}
