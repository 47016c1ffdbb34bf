mod bitrate;
mod content_type;
mod directive;
mod timemark;

pub use bitrate::Bitrate;
pub use content_type::ContentType;
pub use directive::{Directive, EncoderDirectiveSet, HlsFlags};
pub use timemark::{ms_to_time_mark, time_mark_to_ms};
