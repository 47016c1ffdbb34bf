mod command;
mod ffmpeg;
mod ffprobe;
mod progress;

pub use command::{FFMPEG, FFPROBE};
pub use ffmpeg::{Ffmpeg, TranscodeEvent, TranscodeJob, Transcoder};
pub use ffprobe::{Ffprobe, MediaProber};
pub use progress::{ProgressParser, RawProgress};
