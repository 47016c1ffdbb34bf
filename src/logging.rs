use miette::{Context, IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use time::{
    format_description::{self, FormatItem},
    OffsetDateTime, UtcOffset,
};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{format, FmtContext, FormatEvent, FormatFields},
    registry::LookupSpan,
    FmtSubscriber,
};

/// Initialize the logging system. Logs go to stderr, stdout is left to the commands output.
pub fn init_logging(level: tracing::Level) -> Result<()> {
    // The local offset cannot be read once other threads run, fall back on UTC then
    let (offset, offset_known) = match UtcOffset::current_local_offset() {
        Ok(offset) => (offset, true),
        Err(_) => (UtcOffset::UTC, false),
    };

    let subscriber = FmtSubscriber::builder()
        .event_format(PrettyLogger::new(offset)?)
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .into_diagnostic()
        .wrap_err("Setting default subscriber failed")?;

    if !offset_known {
        tracing::warn!("Could not get the local time offset, logging in UTC");
    }
    Ok(())
}

/// Compact logger: local time, level, thread, module, then the fields
struct PrettyLogger {
    offset: UtcOffset,
    time_format: Vec<FormatItem<'static>>,
}

impl PrettyLogger {
    fn new(offset: UtcOffset) -> Result<Self> {
        Ok(Self {
            offset,
            time_format: format_description::parse("[hour]:[minute]:[second]")
                .into_diagnostic()
                .wrap_err("Invalid log time format")?,
        })
    }
}

/// Last segment of a module path: `segmux::outside::ffmpeg` gives `ffmpeg`
fn short_target(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

impl<S, N> FormatEvent<S, N> for PrettyLogger
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let now = OffsetDateTime::now_utc()
            .to_offset(self.offset)
            .format(&self.time_format)
            .map_err(|_| std::fmt::Error)?;
        let thread = std::thread::current();
        // Transcoder workers run on unnamed scoped threads
        let thread_name = thread.name().unwrap_or("worker");
        let target = short_target(metadata.target());

        // Pad before colouring, escape codes would count towards the width
        let level = format!("{:>5}", metadata.level());

        if writer.has_ansi_escapes() {
            let level = match *metadata.level() {
                Level::ERROR => level.red().to_string(),
                Level::WARN => level.yellow().to_string(),
                Level::DEBUG => level.blue().to_string(),
                Level::TRACE => level.purple().to_string(),
                _ => level.green().to_string(),
            };
            write!(
                &mut writer,
                "{now} {level} {} {} ",
                thread_name.yellow(),
                target.dimmed()
            )?;
        } else {
            write!(&mut writer, "{now} {level} {thread_name} {target} ")?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::Write,
        sync::{Arc, Mutex},
    };

    use super::*;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture(ansi: bool, log: impl FnOnce()) -> String {
        let buffer = Buffer::default();
        let make_writer = {
            let buffer = buffer.clone();
            move || buffer.clone()
        };
        let subscriber = FmtSubscriber::builder()
            .with_ansi(ansi)
            .event_format(PrettyLogger::new(UtcOffset::UTC).unwrap())
            .with_writer(make_writer)
            .with_max_level(Level::INFO)
            .finish();

        tracing::subscriber::with_default(subscriber, log);

        let output = buffer.0.lock().unwrap().clone();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn coloured_levels_are_padded() {
        let output = capture(true, || tracing::info!("Converting a.mp4"));
        let line = output.lines().next().unwrap();
        // Escape code right after the time, the padding is inside the colour
        assert_eq!(&line[8..9], " ");
        assert!(line[9..].starts_with(" INFO".green().to_string().as_str()));
    }

    #[test]
    fn shortens_module_paths() {
        assert_eq!(short_target("segmux::outside::ffmpeg"), "ffmpeg");
        assert_eq!(short_target("segmux"), "segmux");
    }

    #[test]
    fn formats_level_thread_and_module() {
        let output = capture(false, || {
            tracing::info!(target: "segmux::conversion", "Converting a.mp4");
            tracing::debug!("filtered out");
        });

        assert_eq!(output.lines().count(), 1);
        let line = output.lines().next().unwrap();
        // HH:MM:SS, the level, the test thread name, the module
        assert_eq!(&line[8..15], "  INFO ");
        assert!(line.ends_with(" conversion Converting a.mp4"));
    }
}
