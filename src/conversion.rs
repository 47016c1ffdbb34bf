//! Conversion of a source into an HLS manifest, live chunk appends, and
//! manifest insertion.

use std::path::{Path, PathBuf};

use crossbeam_channel::unbounded;
use tracing::{debug, error, info};

use crate::{
    manifest,
    options::{self, SegmentingParams},
    outside::{MediaProber, RawProgress, TranscodeEvent, TranscodeJob, Transcoder},
    profile,
    result::{Error, Result},
    source::SourceDescriptor,
    splice::{self, SpliceRequest},
    types::{ms_to_time_mark, time_mark_to_ms},
};

/// Progress of a running conversion
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Share of the expected output already produced, from 0 to 100.
    /// Stays at 0 when the expected duration is unknown.
    pub percent: f64,
    /// Media time processed so far, as `HH:MM:SS.ss`
    pub time_mark: String,
    pub frames: u64,
    pub fps: f64,
    pub bitrate_kbps: f64,
    pub input: String,
    pub output: PathBuf,
}

impl Progress {
    fn new(raw: RawProgress, expected_ms: u64, input: &str, output: &Path) -> Self {
        let percent = if expected_ms > 0 {
            (raw.out_time_ms as f64 * 100.0 / expected_ms as f64).clamp(0.0, 100.0)
        } else {
            0.0
        };

        Self {
            percent,
            time_mark: ms_to_time_mark(raw.out_time_ms),
            frames: raw.frames,
            fps: raw.fps,
            bitrate_kbps: raw.bitrate_kbps,
            input: input.to_string(),
            output: output.to_path_buf(),
        }
    }
}

/// Everything needed to run one conversion
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    source: SourceDescriptor,
    params: SegmentingParams,
    output: Option<PathBuf>,
    input_options: Vec<String>,
    custom_output_options: Option<Vec<String>>,
}

impl ConversionRequest {
    pub fn new(source: SourceDescriptor, params: SegmentingParams) -> Self {
        Self {
            source,
            params,
            output: None,
            input_options: Vec::new(),
            custom_output_options: None,
        }
    }

    /// Write the manifest there instead of next to the source
    #[must_use]
    pub fn output<P: Into<PathBuf>>(mut self, output: P) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Extra options placed before the input
    #[must_use]
    pub fn input_options(mut self, options: Vec<String>) -> Self {
        self.input_options = options;
        self
    }

    /// Use these output options verbatim instead of deriving them from the
    /// source container and the segmenting parameters.
    #[must_use]
    pub fn custom_output_options(mut self, options: Vec<String>) -> Self {
        self.custom_output_options = Some(options);
        self
    }

    pub fn source(&self) -> &SourceDescriptor {
        &self.source
    }

    pub fn params(&self) -> &SegmentingParams {
        &self.params
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.source.input().default_manifest_path())
    }

    /// The output option list handed to the transcoder.
    ///
    /// Fails with [`Error::UnsupportedFormat`] when the options have to be
    /// derived from a container that has no profile.
    pub fn prepare_options(&self) -> Result<Vec<String>> {
        if let Some(custom) = &self.custom_output_options {
            return Ok(custom.clone());
        }

        let container = profile::resolve(self.source.content_type())?;
        Ok(options::build(container, &self.params).to_args())
    }

    /// Media time the conversion is expected to produce, in milliseconds
    pub fn expected_duration_ms(&self) -> u64 {
        let total = self.source.duration_ms();
        match (&self.custom_output_options, &self.params.clip) {
            (None, Some(clip)) => {
                let remaining = total.saturating_sub(time_mark_to_ms(&clip.start));
                clip.duration
                    .as_deref()
                    .map(time_mark_to_ms)
                    .filter(|&ms| ms > 0)
                    .map_or(remaining, |ms| ms.min(remaining))
            }
            _ => total,
        }
    }
}

/// Result of a finished conversion
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOutput {
    pub input: String,
    pub output: PathBuf,
    /// Last progress reported before the end, if any
    pub last_progress: Option<Progress>,
}

/// Runs conversions with the given external collaborators
#[derive(Debug, Clone, Copy)]
pub struct Converter<'a> {
    transcoder: &'a dyn Transcoder,
    prober: &'a dyn MediaProber,
}

impl<'a> Converter<'a> {
    pub fn new(transcoder: &'a dyn Transcoder, prober: &'a dyn MediaProber) -> Self {
        Self { transcoder, prober }
    }

    /// Locate, classify and probe a source
    pub fn source(&self, input: &str) -> Result<SourceDescriptor> {
        SourceDescriptor::create(input, self.prober)
    }

    /// Convert the source of the request into an HLS manifest.
    ///
    /// `on_progress` is called for every progress report, in order. The options
    /// are prepared before the transcoder starts, so an unsupported container
    /// fails without running anything.
    pub fn convert<F>(&self, request: &ConversionRequest, mut on_progress: F) -> Result<ConversionOutput>
    where
        F: FnMut(&Progress),
    {
        let output_options = request.prepare_options()?;
        let output = request.output_path();
        let input = request.source().input().as_str().into_owned();
        let expected_ms = request.expected_duration_ms();

        let job = TranscodeJob {
            input: &input,
            input_options: &request.input_options,
            output_options: &output_options,
            output: &output,
        };

        info!("Converting {input} into {}", output.display());

        let (send, receive) = unbounded();
        let transcoder = self.transcoder;

        let (outcome, last_progress) = std::thread::scope(|scope| {
            scope.spawn(move || transcoder.transcode(&job, &send));

            let mut last_progress = None;
            for event in receive.iter() {
                match event {
                    TranscodeEvent::Start { command_line } => {
                        debug!("Transcoder command: {command_line}");
                    }
                    TranscodeEvent::Progress(raw) => {
                        let progress = Progress::new(raw, expected_ms, &input, &output);
                        on_progress(&progress);
                        last_progress = Some(progress);
                    }
                    TranscodeEvent::End => return (Ok(()), last_progress),
                    TranscodeEvent::Error {
                        message,
                        stdout,
                        stderr,
                    } => {
                        error!("Error: {message}");
                        error!("Transcoder stdout: {stdout}");
                        error!("Transcoder stderr: {stderr}");
                        let err = Error::TranscodeFailed {
                            message,
                            stdout,
                            stderr,
                        };
                        return (Err(err), last_progress);
                    }
                }
            }

            let err = Error::TranscodeFailed {
                message: "Transcoder stopped without reporting an outcome".to_string(),
                stdout: String::new(),
                stderr: String::new(),
            };
            (Err(err), last_progress)
        });

        outcome?;
        info!("Conversion ended {input}");

        Ok(ConversionOutput {
            input,
            output,
            last_progress,
        })
    }

    /// Append the source as a new chunk of an existing manifest.
    ///
    /// `params` are used as given, except that appending is forced and the
    /// manifest stays open for more chunks unless this is the last one.
    pub fn concat<F>(
        &self,
        manifest: &Path,
        input: &str,
        params: SegmentingParams,
        is_last_chunk: bool,
        on_progress: F,
    ) -> Result<ConversionOutput>
    where
        F: FnMut(&Progress),
    {
        let params = params.append(true).endless(!is_last_chunk);
        let request = ConversionRequest::new(self.source(input)?, params).output(manifest);

        self.convert(&request, on_progress)
    }
}

/// Splice the segments of the `source` manifest into the `destination`
/// manifest, and write the destination back in place.
///
/// Both manifests are read before anything is written: if either cannot be
/// read, the destination is left as it was.
pub fn insert_manifest(
    destination: &Path,
    source: &Path,
    request: &SpliceRequest,
    mark_discontinuities: bool,
) -> Result<()> {
    let mut playlist = manifest::read(destination)?;
    let source_playlist = manifest::read(source)?;

    let mut spliced = splice::splice(&playlist.segments, &source_playlist.segments, request);
    if mark_discontinuities {
        spliced.mark_discontinuities();
    }

    info!(
        "Inserting {} segments of {} into {} at position {}",
        source_playlist.segments.len(),
        source.display(),
        destination.display(),
        spliced.inserted.start
    );

    playlist.segments = spliced.segments;
    manifest::write(destination, &playlist)
}
