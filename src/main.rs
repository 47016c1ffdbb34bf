mod cli;

use clap::Parser;
use miette::{miette, Result};
use segmux::{
    insert_manifest, logging,
    outside::{Ffmpeg, Ffprobe},
    settings::Settings,
    ClipWindow, ConversionRequest, Converter, Progress, SegmentingParams, SpliceRequest,
};
use tracing::info;

use crate::cli::{Args, Command, ConcatArgs, ConvertArgs, InsertArgs};

fn main() -> Result<()> {
    // Initialize the configuration, the CLI & the logging
    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;
    let level = match args.log_level {
        Some(level) => level,
        None => settings.log_level()?,
    };
    logging::init_logging(level)?;

    match args.command {
        Command::Convert(convert) => run_convert(&settings, convert),
        Command::Concat(concat) => run_concat(&settings, concat),
        Command::Insert(insert) => run_insert(insert),
        Command::ToMs { time_mark } => {
            println!("{}", segmux::time_mark_to_ms(&time_mark));
            Ok(())
        }
        Command::ToTimemark { ms } => {
            println!("{}", segmux::ms_to_time_mark(ms));
            Ok(())
        }
    }
}

/// Load the external components
fn load_external_components(settings: &Settings) -> Result<(Ffmpeg, Ffprobe)> {
    // Construct the handles concurrently as executing an external program
    // is not instantaneous. That way we can avoid adding the costs
    let (ffmpeg, ffprobe) = std::thread::scope(|scope| {
        let ffmpeg_thread = scope.spawn(|| Ffmpeg::new(settings.ffmpeg.as_str()));
        let ffprobe_thread = scope.spawn(|| Ffprobe::new(settings.ffprobe.as_str()));
        (ffmpeg_thread.join(), ffprobe_thread.join())
    });

    let ffmpeg = ffmpeg
        .map_err(|_| miette!("Could not join thread"))?
        .map_err(|err| miette::Report::from(err).wrap_err("ffmpeg is not available"))?;
    let ffprobe = ffprobe
        .map_err(|_| miette!("Could not join thread"))?
        .map_err(|err| miette::Report::from(err).wrap_err("ffprobe is not available"))?;

    Ok((ffmpeg, ffprobe))
}

fn log_progress(progress: &Progress) {
    info!(
        "Conversion processing {}: {:.1}% ({}, {} frames, {:.1} fps, {:.1} kbit/s)",
        progress.input,
        progress.percent,
        progress.time_mark,
        progress.frames,
        progress.fps,
        progress.bitrate_kbps
    );
}

fn run_convert(settings: &Settings, args: ConvertArgs) -> Result<()> {
    let (ffmpeg, ffprobe) = load_external_components(settings)?;
    let converter = Converter::new(&ffmpeg, &ffprobe);

    let mut params = SegmentingParams::default()
        .segment_duration(args.segment_duration.unwrap_or(settings.segment_duration))
        .list_size(args.list_size.unwrap_or(settings.list_size))
        .append(args.append)
        .endless(args.endless);
    if let Some(start) = args.start {
        let mut clip = ClipWindow::starting_at(start);
        if let Some(duration) = args.duration {
            clip = clip.lasting(duration);
        }
        params = params.clip(clip);
    }

    let source = converter.source(&args.input)?;
    let mut request = ConversionRequest::new(source, params).input_options(args.input_options);
    if let Some(output) = args.output {
        request = request.output(output);
    }
    if !args.output_options.is_empty() {
        request = request.custom_output_options(args.output_options);
    }

    let output = converter.convert(&request, log_progress)?;
    info!("Playlist written to {}", output.output.display());
    Ok(())
}

fn run_concat(settings: &Settings, args: ConcatArgs) -> Result<()> {
    let (ffmpeg, ffprobe) = load_external_components(settings)?;
    let converter = Converter::new(&ffmpeg, &ffprobe);

    let params = SegmentingParams::default()
        .segment_duration(settings.segment_duration)
        .list_size(settings.list_size);
    let output = converter.concat(&args.manifest, &args.input, params, args.last, log_progress)?;
    info!(
        "Chunk {} appended to {}",
        output.input,
        output.output.display()
    );
    Ok(())
}

fn run_insert(args: InsertArgs) -> Result<()> {
    if let Some(percent) = args.percent {
        if !(0.0..=100.0).contains(&percent) {
            return Err(miette!("Percent must be between 0 and 100, got {percent}"));
        }
    }

    let request = SpliceRequest {
        index: args.index,
        percent: args.percent,
    };
    insert_manifest(&args.manifest, &args.source, &request, args.discontinuity)?;
    info!("Playlist {} updated", args.manifest.display());
    Ok(())
}
