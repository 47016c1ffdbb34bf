//! Source media location, classification and duration.

use std::{
    borrow::Cow,
    fmt::Display,
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::debug;
use url::Url;

use crate::{
    outside::MediaProber,
    result::{Error, Result},
    types::ContentType,
};

/// Parse the input as an absolute URI.
///
/// Single letter schemes are Windows drive letters (`C:\media\a.mp4`), not URIs.
fn parse_uri(input: &str) -> Option<Url> {
    Url::parse(input).ok().filter(|url| url.scheme().len() > 1)
}

/// Where the source media is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceInput {
    Path(PathBuf),
    Uri(Url),
}

impl SourceInput {
    /// Interpret the input as a URI or a local path.
    ///
    /// Local paths must exist. URIs are not checked.
    pub fn locate(input: &str) -> Result<Self> {
        if let Some(url) = parse_uri(input) {
            return Ok(Self::Uri(url));
        }

        let path = PathBuf::from(input);
        if !path.exists() {
            return Err(Error::InputNotFound(path));
        }
        Ok(Self::Path(path))
    }

    /// The file name of the source: the last path segment of a URI,
    /// without its query or fragment.
    fn file_name(&self) -> &Path {
        match self {
            Self::Path(path) => path.file_name().map_or(Path::new(""), Path::new),
            Self::Uri(url) => Path::new(
                url.path_segments()
                    .and_then(|mut segments| segments.next_back())
                    .unwrap_or(""),
            ),
        }
    }

    pub fn content_type(&self) -> ContentType {
        ContentType::from_path(self.file_name())
    }

    /// Manifest written next to a local source, or in the working directory
    /// for a URI: `<stem>.m3u8`.
    pub fn default_manifest_path(&self) -> PathBuf {
        let stem = self
            .file_name()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index".to_string());
        let file_name = format!("{stem}.m3u8");

        match self {
            Self::Path(path) => path
                .parent()
                .map_or_else(|| PathBuf::from(&file_name), |dir| dir.join(&file_name)),
            Self::Uri(_) => PathBuf::from(file_name),
        }
    }

    /// The input as given to the transcoder
    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            Self::Path(path) => path.to_string_lossy(),
            Self::Uri(url) => url.as_str().into(),
        }
    }
}

impl Display for SourceInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A located, classified and probed source.
///
/// Only [`SourceDescriptor::create`] builds one, so the duration is always known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    input: SourceInput,
    content_type: ContentType,
    duration: Duration,
}

impl SourceDescriptor {
    /// Locate the input, classify its container, then wait for the duration probe.
    pub fn create(input: &str, prober: &dyn MediaProber) -> Result<Self> {
        let input = SourceInput::locate(input)?;
        let content_type = input.content_type();
        let duration = prober.probe_duration(&input.as_str())?;

        debug!("Source {input}: {content_type}, {duration:?} long");

        Ok(Self {
            input,
            content_type,
            duration,
        })
    }

    pub fn input(&self) -> &SourceInput {
        &self.input
    }

    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }
}
