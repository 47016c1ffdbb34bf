use std::fmt::Display;

/// A bitrate in kbit/s, written the way ffmpeg reads it (`128k`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bitrate(u16);

impl Bitrate {
    pub const fn kbps(value: u16) -> Self {
        Self(value)
    }
}

impl Display for Bitrate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}k", self.0)
    }
}
