//! Compose HLS outputs from source media.
//!
//! - [`profile`] and [`options`] derive the segmenter arguments from the source container.
//! - [`splice`] inserts one segment sequence into another.
//! - [`conversion`] drives the external transcoder and rewrites manifests.
//! - [`time_mark_to_ms`] and [`ms_to_time_mark`] convert time marks.

pub mod conversion;
pub mod logging;
pub mod manifest;
pub mod options;
pub mod outside;
pub mod profile;
pub mod result;
pub mod settings;
pub mod source;
pub mod splice;
pub mod types;

pub use conversion::{insert_manifest, ConversionOutput, ConversionRequest, Converter, Progress};
pub use options::{ClipWindow, SegmentingParams};
pub use result::{Error, Result};
pub use source::{SourceDescriptor, SourceInput};
pub use splice::{splice, SpliceRequest, Spliced};
pub use types::{ms_to_time_mark, time_mark_to_ms};
