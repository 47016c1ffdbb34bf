use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

macro_rules! arg_env {
    ($v:literal) => {
        concat!("SEGMUX_", $v)
    };
}

/// Build HLS outputs from source media.
/// Convert a source into a segmented playlist, append live chunks to a playlist,
/// or splice the segments of a playlist into another one.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// The path to a TOML configuration file.
    /// Defaults to `segmux.toml` in the working directory, if it exists.
    #[arg(long, global = true, env = arg_env!("CONFIG"))]
    pub config: Option<PathBuf>,

    /// Override the configured log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<tracing::Level>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a source file or URI into an HLS playlist
    Convert(ConvertArgs),

    /// Append a source as a new chunk of an existing playlist
    Concat(ConcatArgs),

    /// Insert the segments of a playlist into another playlist, in place
    Insert(InsertArgs),

    /// Convert a `HH:MM:SS.ss` time mark to milliseconds
    ToMs {
        /// The time mark. Unparseable components count as 0
        time_mark: String,
    },

    /// Convert milliseconds to a `HH:MM:SS.ss` time mark
    ToTimemark {
        /// The number of milliseconds
        ms: u64,
    },
}

#[derive(ClapArgs, Debug)]
pub struct ConvertArgs {
    /// The source file path or URI
    pub input: String,

    /// The path of the playlist to write.
    /// Defaults to the source name with the `.m3u8` extension, next to the source
    #[arg(long, short, env = arg_env!("OUTPUT"))]
    pub output: Option<PathBuf>,

    /// Where to start converting, as a time mark understood by ffmpeg
    #[arg(long)]
    pub start: Option<String>,

    /// How much to convert after the start point, as a time mark understood by ffmpeg
    #[arg(long, requires = "start")]
    pub duration: Option<String>,

    /// The target duration of each segment, in seconds.
    /// Defaults to the configured value
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub segment_duration: Option<u32>,

    /// The maximum number of playlist entries, 0 keeps all of them.
    /// Defaults to the configured value
    #[arg(long)]
    pub list_size: Option<u32>,

    /// Append to an existing playlist instead of replacing it
    #[arg(long)]
    pub append: bool,

    /// Leave the playlist open for more chunks
    #[arg(long)]
    pub endless: bool,

    /// An extra ffmpeg option placed before the input. Can be set multiple times
    #[arg(long = "input-option", allow_hyphen_values = true)]
    pub input_options: Vec<String>,

    /// An ffmpeg output option replacing the derived ones. Can be set multiple times.
    ///
    /// If at least one is given, the options are not derived from the source
    /// container and the segmenting parameters at all.
    #[arg(long = "output-option", allow_hyphen_values = true)]
    pub output_options: Vec<String>,
}

#[derive(ClapArgs, Debug)]
pub struct ConcatArgs {
    /// The playlist to extend
    pub manifest: PathBuf,

    /// The source file path or URI of the new chunk
    pub input: String,

    /// This is the last chunk: close the playlist
    #[arg(long)]
    pub last: bool,
}

#[derive(ClapArgs, Debug)]
pub struct InsertArgs {
    /// The playlist to insert into. It is rewritten in place
    pub manifest: PathBuf,

    /// The playlist whose segments are inserted
    pub source: PathBuf,

    /// Insertion index. Negative values count from the end: -1 inserts before the last segment
    #[arg(long, allow_hyphen_values = true)]
    pub index: Option<isize>,

    /// Insertion position as a percentage of the playlist length.
    /// Takes precedence over the index when it lands strictly inside the playlist
    #[arg(long)]
    pub percent: Option<f64>,

    /// Mark discontinuities around the inserted segments
    #[arg(long)]
    pub discontinuity: bool,
}
