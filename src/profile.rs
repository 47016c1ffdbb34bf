//! Container-specific encoder directives.

use crate::{
    result::{Error, Result},
    types::{Bitrate, ContentType, Directive, EncoderDirectiveSet},
};

/// Audio bitrate used when the audio track is normalized to AAC
pub const AAC_BITRATE: Bitrate = Bitrate::kbps(128);

/// Return the directives needed to segment a source of the given container.
///
/// - MP4 sources are re-encoded to baseline H.264, which segments cleanly
///   on keyframe boundaries in every player.
/// - QuickTime and Matroska sources keep their video stream but get their
///   audio normalized to AAC, as their native audio codecs are often not
///   segment friendly.
///
/// Any other container fails with [`Error::UnsupportedFormat`].
pub fn resolve(content_type: &ContentType) -> Result<EncoderDirectiveSet> {
    let set = EncoderDirectiveSet::new();
    match content_type {
        ContentType::Mp4 => Ok(set
            .with(Directive::VideoProfile("baseline"))
            .with(Directive::Level("3.0"))),
        ContentType::QuickTime | ContentType::Matroska => Ok(set
            .with(Directive::VideoCodec("copy"))
            .with(Directive::AudioCodec("aac"))
            .with(Directive::AudioBitrate(AAC_BITRATE))),
        ContentType::Other(extension) => Err(Error::UnsupportedFormat {
            extension: extension.clone(),
        }),
    }
}
