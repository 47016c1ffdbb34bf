//! Segmenting parameters and the full output option list.

use std::num::NonZeroU32;

use crate::types::{Directive, EncoderDirectiveSet, HlsFlags};

pub const DEFAULT_SEGMENT_DURATION: NonZeroU32 = match NonZeroU32::new(2) {
    Some(n) => n,
    None => unreachable!(),
};

/// Output frame rate forced on every conversion
pub const FRAME_RATE: u32 = 30;

/// Index of the first segment file
pub const START_NUMBER: u32 = 0;

/// Part of the source to convert. Time marks are passed to the transcoder as-is.
///
/// A duration only makes sense after a start point, so it can only be given
/// together with one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipWindow {
    pub start: String,
    pub duration: Option<String>,
}

impl ClipWindow {
    pub fn starting_at<S: Into<String>>(start: S) -> Self {
        Self {
            start: start.into(),
            duration: None,
        }
    }

    #[must_use]
    pub fn lasting<S: Into<String>>(mut self, duration: S) -> Self {
        self.duration = Some(duration.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentingParams {
    pub clip: Option<ClipWindow>,
    /// Target duration of each segment, in seconds
    pub segment_duration: NonZeroU32,
    /// Maximum number of playlist entries, 0 keeps them all
    pub list_size: u32,
    /// Extend an existing playlist instead of replacing it
    pub append: bool,
    /// Leave the playlist open for further chunks
    pub endless: bool,
}

impl Default for SegmentingParams {
    fn default() -> Self {
        Self {
            clip: None,
            segment_duration: DEFAULT_SEGMENT_DURATION,
            list_size: 0,
            append: false,
            endless: false,
        }
    }
}

impl SegmentingParams {
    /// Set the segment duration. 0 falls back to the default.
    #[must_use]
    pub fn segment_duration(mut self, secs: u32) -> Self {
        self.segment_duration = NonZeroU32::new(secs).unwrap_or(DEFAULT_SEGMENT_DURATION);
        self
    }

    #[must_use]
    pub fn list_size(mut self, size: u32) -> Self {
        self.list_size = size;
        self
    }

    #[must_use]
    pub fn clip(mut self, clip: ClipWindow) -> Self {
        self.clip = Some(clip);
        self
    }

    #[must_use]
    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    #[must_use]
    pub fn endless(mut self, endless: bool) -> Self {
        self.endless = endless;
        self
    }

    /// Union of the continuity flags requested by the modes
    pub fn hls_flags(&self) -> HlsFlags {
        let mut flags = HlsFlags::empty();
        if self.append {
            flags |= HlsFlags::APPEND_LIST | HlsFlags::DISCONT_START;
        }
        if self.endless {
            flags |= HlsFlags::OMIT_ENDLIST;
        }
        flags
    }
}

/// Extend the container directives into the complete output option list.
///
/// The order is fixed as the transcoder reads its options positionally:
/// container directives, segmenter settings, seek and duration limit,
/// then the continuity flags (only if there is any).
pub fn build(container: EncoderDirectiveSet, params: &SegmentingParams) -> EncoderDirectiveSet {
    let mut set = container.with_all([
        Directive::FrameRate(FRAME_RATE),
        Directive::StartNumber(START_NUMBER),
        Directive::SegmentDuration(params.segment_duration.get()),
        Directive::ListSize(params.list_size),
        Directive::Format("hls"),
    ]);

    if let Some(clip) = &params.clip {
        set = set.with(Directive::Seek(clip.start.clone()));
        if let Some(duration) = &clip.duration {
            set = set.with(Directive::DurationLimit(duration.clone()));
        }
    }

    let flags = params.hls_flags();
    if !flags.is_empty() {
        set = set.with(Directive::Flags(flags));
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{profile, types::ContentType};

    fn mp4_options(params: &SegmentingParams) -> EncoderDirectiveSet {
        build(profile::resolve(&ContentType::Mp4).unwrap(), params)
    }

    #[test]
    fn default_params() {
        let set = mp4_options(&SegmentingParams::default());
        assert_eq!(
            set.to_args(),
            [
                "-profile:v",
                "baseline",
                "-level",
                "3.0",
                "-r",
                "30",
                "-start_number",
                "0",
                "-hls_time",
                "2",
                "-hls_list_size",
                "0",
                "-f",
                "hls",
            ]
        );
    }

    #[test]
    fn zero_segment_duration_uses_default() {
        let params = SegmentingParams::default().segment_duration(0).list_size(5);
        let set = mp4_options(&params);
        assert_eq!(set.value_of("-hls_time").as_deref(), Some("2"));
        assert_eq!(set.value_of("-hls_list_size").as_deref(), Some("5"));
    }

    #[test]
    fn seek_then_duration_limit() {
        let params = SegmentingParams::default()
            .clip(ClipWindow::starting_at("00:00:10").lasting("00:00:30"));
        let args = mp4_options(&params).to_args();
        let tail: Vec<&str> = args.iter().rev().take(4).rev().map(String::as_str).collect();
        assert_eq!(tail, ["-ss", "00:00:10", "-t", "00:00:30"]);
    }

    #[test]
    fn seek_without_duration() {
        let params = SegmentingParams::default().clip(ClipWindow::starting_at("00:01:00"));
        let set = mp4_options(&params);
        assert_eq!(set.value_of("-ss").as_deref(), Some("00:01:00"));
        assert_eq!(set.value_of("-t"), None);
    }

    #[test]
    fn append_flags() {
        let params = SegmentingParams::default().append(true);
        let set = mp4_options(&params);
        assert_eq!(
            set.value_of("-hls_flags").as_deref(),
            Some("append_list+discont_start")
        );
    }

    #[test]
    fn append_and_endless_flags() {
        let params = SegmentingParams::default().append(true).endless(true);
        let set = mp4_options(&params);
        assert_eq!(
            set.value_of("-hls_flags").as_deref(),
            Some("append_list+discont_start+omit_endlist")
        );
        assert_eq!(set.flags().last(), Some("-hls_flags"));
    }

    #[test]
    fn endless_only() {
        let params = SegmentingParams::default().endless(true);
        let set = mp4_options(&params);
        assert_eq!(set.value_of("-hls_flags").as_deref(), Some("omit_endlist"));
    }

    #[test]
    fn no_flags_no_directive() {
        let set = mp4_options(&SegmentingParams::default());
        assert!(set.flags().all(|flag| flag != "-hls_flags"));
    }
}
