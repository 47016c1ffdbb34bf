use std::{
    ffi::OsStr,
    fmt::Debug,
    io::{BufRead, BufReader, Read},
    path::Path,
    process::Command,
};

use crossbeam_channel::Sender;
use tracing::{debug, trace};

use crate::result::Result;

use super::{
    command::{assert_success_command, command_line, spawn_command, Capture, FFXXX_DEFAULT_ARGS},
    progress::{ProgressParser, RawProgress},
};

/// What a transcoder is asked to do
#[derive(Debug, Clone, Copy)]
pub struct TranscodeJob<'a> {
    /// Local path or URI of the source
    pub input: &'a str,
    /// Options placed before the input
    pub input_options: &'a [String],
    /// Options placed between the input and the output
    pub output_options: &'a [String],
    /// Path of the manifest to write
    pub output: &'a Path,
}

/// Events reported by a transcoder.
///
/// A run reports at most one `Start`, then any number of `Progress`,
/// then exactly one of `End` or `Error`. Nothing follows the terminal event.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscodeEvent {
    Start { command_line: String },
    Progress(RawProgress),
    End,
    Error {
        message: String,
        stdout: String,
        stderr: String,
    },
}

pub trait Transcoder: Sync + Debug {
    /// Run the job to completion, reporting every step on `events`.
    ///
    /// Failures are reported as a terminal [`TranscodeEvent::Error`],
    /// never returned.
    fn transcode(&self, job: &TranscodeJob<'_>, events: &Sender<TranscodeEvent>);
}

/// Interface for the [ffmpeg](https://ffmpeg.org) program
#[derive(Debug)]
pub struct Ffmpeg {
    program: String,
}

impl Ffmpeg {
    /// Verify that the `ffmpeg` binary is reachable
    pub fn new<S: Into<String>>(program: S) -> Result<Self> {
        let program = program.into();
        assert_success_command(&program, |cmd| cmd.arg("-version"))?;

        Ok(Self { program })
    }

    fn build_command(&self, job: &TranscodeJob<'_>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(FFXXX_DEFAULT_ARGS)
            .arg("-y")
            .args(["-progress", "pipe:1", "-nostats"])
            .args(job.input_options)
            .args([OsStr::new("-i"), OsStr::new(job.input)])
            .args(job.output_options)
            .arg(job.output);
        cmd
    }
}

/// Send an event, ignoring a receiver that went away
fn emit(events: &Sender<TranscodeEvent>, event: TranscodeEvent) {
    if events.send(event).is_err() {
        trace!("Transcode event dropped, nobody is listening anymore");
    }
}

/// Read a whole stream, replacing invalid UTF-8 instead of dropping everything
fn read_lossy<R: Read>(mut reader: R) -> String {
    let mut buf = Vec::new();
    if let Err(err) = reader.read_to_end(&mut buf) {
        debug!("Could not read the whole transcoder stream: {err}");
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Report the progress blocks of `reader` until it closes, and return
/// everything it wrote.
fn relay_progress<R: BufRead>(reader: R, events: &Sender<TranscodeEvent>) -> String {
    let mut parser = ProgressParser::new();
    let mut log = String::new();
    for line in reader.split(b'\n') {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                debug!("Transcoder stdout closed early: {err}");
                break;
            }
        };
        let line = String::from_utf8_lossy(&line);
        let line = line.trim_end_matches('\r');
        trace!("ffmpeg: {line}");
        if let Some(progress) = parser.feed(line) {
            emit(events, TranscodeEvent::Progress(progress));
        }
        log.push_str(line);
        log.push('\n');
    }
    log
}

fn failure(message: String, stdout: String, stderr: String) -> TranscodeEvent {
    TranscodeEvent::Error {
        message,
        stdout,
        stderr,
    }
}

impl Transcoder for Ffmpeg {
    fn transcode(&self, job: &TranscodeJob<'_>, events: &Sender<TranscodeEvent>) {
        let mut cmd = self.build_command(job);
        let cmd_line = command_line(&cmd);

        let mut child = match spawn_command(&mut cmd, Capture::STDOUT | Capture::STDERR) {
            Ok(child) => child,
            Err(err) => {
                let message = format!("Could not start {}: {err}", self.program);
                return emit(events, failure(message, String::new(), String::new()));
            }
        };
        emit(
            events,
            TranscodeEvent::Start {
                command_line: cmd_line,
            },
        );

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Drain stderr on its own thread so a chatty process never blocks on a full pipe
        let (stdout_log, stderr_log) = std::thread::scope(|scope| {
            let stderr_reader = scope.spawn(move || stderr.map(read_lossy).unwrap_or_default());

            let stdout_log = stdout
                .map(|stdout| relay_progress(BufReader::new(stdout), events))
                .unwrap_or_default();

            (stdout_log, stderr_reader.join().unwrap_or_default())
        });

        let event = match child.wait() {
            Ok(status) if status.success() => {
                debug!("ffmpeg finished with {status}");
                TranscodeEvent::End
            }
            Ok(status) => failure(
                format!("ffmpeg exited with {status}"),
                stdout_log,
                stderr_log,
            ),
            Err(err) => failure(
                format!("Could not wait for ffmpeg: {err}"),
                stdout_log,
                stderr_log,
            ),
        };
        emit(events, event);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn options_surround_the_input() {
        let ffmpeg = Ffmpeg {
            program: "ffmpeg".into(),
        };
        let input_options = vec!["-re".to_string()];
        let output_options = vec!["-f".to_string(), "hls".to_string()];
        let output = PathBuf::from("/tmp/out.m3u8");
        let job = TranscodeJob {
            input: "in.mkv",
            input_options: &input_options,
            output_options: &output_options,
            output: &output,
        };

        assert_eq!(
            command_line(&ffmpeg.build_command(&job)),
            "ffmpeg -hide_banner -loglevel error -y -progress pipe:1 -nostats \
             -re -i in.mkv -f hls /tmp/out.m3u8"
        );
    }

    #[test]
    fn invalid_utf8_keeps_the_rest_of_stderr() {
        let stderr: &[u8] = b"Error opening input \xff\xfe clip.mp4: No such file\n";
        let text = read_lossy(stderr);
        assert!(text.starts_with("Error opening input "));
        assert!(text.ends_with(" clip.mp4: No such file\n"));
    }

    #[test]
    fn invalid_utf8_does_not_stop_the_progress_relay() {
        let stdout: &[u8] = b"frame=10\nbitrate=\xff\nprogress=continue\r\n\
                              frame=20\nout_time_us=1500000\nprogress=end\n";
        let (send, receive) = crossbeam_channel::unbounded();

        let log = relay_progress(stdout, &send);
        drop(send);

        let frames: Vec<u64> = receive
            .iter()
            .map(|event| match event {
                TranscodeEvent::Progress(progress) => progress.frames,
                other => panic!("unexpected event: {other:?}"),
            })
            .collect();
        assert_eq!(frames, [10, 20]);
        assert_eq!(log.lines().count(), 6);
        assert!(log.ends_with("progress=end\n"));
    }

    #[test]
    fn missing_binary_reports_a_terminal_error() {
        let ffmpeg = Ffmpeg {
            program: "nonexistent_ffmpeg_xyz_12345".into(),
        };
        let output = PathBuf::from("out.m3u8");
        let job = TranscodeJob {
            input: "in.mp4",
            input_options: &[],
            output_options: &[],
            output: &output,
        };
        let (send, receive) = crossbeam_channel::unbounded();
        ffmpeg.transcode(&job, &send);
        drop(send);

        let events: Vec<_> = receive.iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], TranscodeEvent::Error { .. }));
    }
}
