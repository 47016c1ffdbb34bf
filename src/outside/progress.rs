//! Parser for the `key=value` blocks written by `ffmpeg -progress`.

/// One progress report from the transcoder. Missing values are 0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawProgress {
    pub frames: u64,
    pub fps: f64,
    pub bitrate_kbps: f64,
    /// Position of the output, in milliseconds of media time
    pub out_time_ms: u64,
}

/// Accumulates progress lines until a block is complete.
#[derive(Debug, Default)]
pub struct ProgressParser {
    current: RawProgress,
}

/// Parse the leading number of a value such as `1234.5kbits/s`.
/// `N/A` and other non-numeric values give `None`.
fn leading_number(value: &str) -> Option<f64> {
    let end = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(value.len());
    value[..end].parse().ok().filter(|n: &f64| n.is_finite())
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line. Return the finished report when the line closes a block.
    pub fn feed(&mut self, line: &str) -> Option<RawProgress> {
        let (key, value) = line.trim().split_once('=')?;
        let value = value.trim();

        match key {
            "frame" => self.current.frames = value.parse().unwrap_or(0),
            "fps" => self.current.fps = leading_number(value).unwrap_or(0.0),
            "bitrate" => self.current.bitrate_kbps = leading_number(value).unwrap_or(0.0),
            // Both keys hold microseconds, `out_time_ms` is misnamed by ffmpeg
            "out_time_us" | "out_time_ms" => {
                self.current.out_time_ms = value.parse::<u64>().map_or(0, |us| us / 1000)
            }
            "progress" => return Some(std::mem::take(&mut self.current)),
            _ => {}
        }

        None
    }
}
