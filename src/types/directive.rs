use std::fmt::Display;

use bitflags::bitflags;

use super::Bitrate;

bitflags! {
    /// Values of the segmenter `-hls_flags` option.
    ///
    /// Declaration order is the emission order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HlsFlags: u8 {
        const APPEND_LIST = 0b0000001;
        const DISCONT_START = 0b0000010;
        const OMIT_ENDLIST = 0b0000100;
    }
}

impl Display for HlsFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self
            .iter()
            .map(|flag| {
                if flag == HlsFlags::APPEND_LIST {
                    "append_list"
                } else if flag == HlsFlags::DISCONT_START {
                    "discont_start"
                } else {
                    "omit_endlist"
                }
            })
            .collect();
        write!(f, "{}", names.join("+"))
    }
}

/// One encoder flag with its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    VideoProfile(&'static str),
    Level(&'static str),
    VideoCodec(&'static str),
    AudioCodec(&'static str),
    AudioBitrate(Bitrate),
    FrameRate(u32),
    StartNumber(u32),
    SegmentDuration(u32),
    ListSize(u32),
    Format(&'static str),
    Seek(String),
    DurationLimit(String),
    Flags(HlsFlags),
}

impl Directive {
    /// The command-line flag of the directive
    pub fn flag(&self) -> &'static str {
        match self {
            Directive::VideoProfile(_) => "-profile:v",
            Directive::Level(_) => "-level",
            Directive::VideoCodec(_) => "-c:v",
            Directive::AudioCodec(_) => "-c:a",
            Directive::AudioBitrate(_) => "-b:a",
            Directive::FrameRate(_) => "-r",
            Directive::StartNumber(_) => "-start_number",
            Directive::SegmentDuration(_) => "-hls_time",
            Directive::ListSize(_) => "-hls_list_size",
            Directive::Format(_) => "-f",
            Directive::Seek(_) => "-ss",
            Directive::DurationLimit(_) => "-t",
            Directive::Flags(_) => "-hls_flags",
        }
    }

    pub fn value(&self) -> String {
        match self {
            Directive::VideoProfile(s)
            | Directive::Level(s)
            | Directive::VideoCodec(s)
            | Directive::AudioCodec(s)
            | Directive::Format(s) => s.to_string(),
            Directive::AudioBitrate(bitrate) => bitrate.to_string(),
            Directive::FrameRate(n)
            | Directive::StartNumber(n)
            | Directive::SegmentDuration(n)
            | Directive::ListSize(n) => n.to_string(),
            Directive::Seek(s) | Directive::DurationLimit(s) => s.clone(),
            Directive::Flags(flags) => flags.to_string(),
        }
    }
}

/// Ordered, append-only list of encoder directives.
///
/// Every step consumes the set and returns the extended one, so a set
/// handed out is never changed behind the holder's back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncoderDirectiveSet(Vec<Directive>);

impl EncoderDirectiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, directive: Directive) -> Self {
        self.0.push(directive);
        self
    }

    #[must_use]
    pub fn with_all<I: IntoIterator<Item = Directive>>(mut self, directives: I) -> Self {
        self.0.extend(directives);
        self
    }

    /// The flags of all directives, in order
    pub fn flags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(Directive::flag)
    }

    /// Return the value of the first directive with this flag
    pub fn value_of(&self, flag: &str) -> Option<String> {
        self.0
            .iter()
            .find(|d| d.flag() == flag)
            .map(Directive::value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flatten into the argument list given to the transcoder
    pub fn to_args(&self) -> Vec<String> {
        self.0
            .iter()
            .flat_map(|d| [d.flag().to_string(), d.value()])
            .collect()
    }
}
