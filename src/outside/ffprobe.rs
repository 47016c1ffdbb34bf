use std::{fmt::Debug, time::Duration};

use miette::{miette, Context, IntoDiagnostic};
use serde::Deserialize;

use crate::result::{Error, Result};

use super::command::{assert_success_command, run_command, Capture};

/// Interface for reading media properties of a source
pub trait MediaProber: Sync + Debug {
    /// Return the duration of the source.
    /// A source that reports no duration (e.g. a live stream) gives zero.
    fn probe_duration(&self, input: &str) -> Result<Duration>;
}

/// Interface for the [ffprobe](https://ffmpeg.org) program
#[derive(Debug)]
pub struct Ffprobe {
    program: String,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

impl Ffprobe {
    /// Verify that the `ffprobe` binary is reachable
    pub fn new<S: Into<String>>(program: S) -> Result<Self> {
        let program = program.into();
        assert_success_command(&program, |cmd| cmd.arg("-version"))?;

        Ok(Self { program })
    }
}

/// Read the duration out of `ffprobe -show_format -of json` output
fn parse_duration(json: &str) -> Result<Duration> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .into_diagnostic()
        .wrap_err("Could not parse ffprobe JSON output")?;

    let secs = output
        .format
        .duration
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);

    Ok(Duration::from_millis((secs * 1000.0).round() as u64))
}

impl MediaProber for Ffprobe {
    fn probe_duration(&self, input: &str) -> Result<Duration> {
        let probe_failed = |report: miette::Report| Error::ProbeFailed {
            input: input.to_string(),
            report,
        };

        let res = run_command(
            &self.program,
            |cmd| {
                cmd.args(["-v", "quiet"])
                    .args(["-print_format", "json"])
                    .arg("-show_format")
                    .arg(input)
            },
            Capture::STDOUT,
        )
        .map_err(|err| probe_failed(err.into()))?;

        if !res.status.success() {
            return Err(probe_failed(miette!("ffprobe exited with {}", res.status)));
        }

        parse_duration(&String::from_utf8_lossy(&res.stdout)).map_err(|err| match err {
            Error::Miette(report) => probe_failed(report),
            err => err,
        })
    }
}
