use std::{fmt::Display, path::Path};

/// Coarse container family of a source, derived from its extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentType {
    /// `video/mp4`
    Mp4,
    /// `video/quicktime`
    QuickTime,
    /// `video/x-matroska`
    Matroska,
    /// Anything else. Holds the detected extension, lowercased and without
    /// the leading dot (empty if there was none).
    Other(String),
}

impl ContentType {
    /// Classify a file extension, with or without the leading dot.
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_lowercase();
        match ext.as_str() {
            "mp4" | "m4v" | "mp4v" | "mpg4" => Self::Mp4,
            "mov" | "qt" => Self::QuickTime,
            "mkv" | "mk3d" | "mks" => Self::Matroska,
            _ => Self::Other(ext),
        }
    }

    /// Classify the extension of a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(ext)
    }

    /// Return the MIME type, if the container is a known one.
    pub fn mime(&self) -> Option<&'static str> {
        match self {
            Self::Mp4 => Some("video/mp4"),
            Self::QuickTime => Some("video/quicktime"),
            Self::Matroska => Some("video/x-matroska"),
            Self::Other(_) => None,
        }
    }

    /// Return the canonical extension without the dot.
    pub fn extension(&self) -> &str {
        match self {
            Self::Mp4 => "mp4",
            Self::QuickTime => "mov",
            Self::Matroska => "mkv",
            Self::Other(ext) => ext,
        }
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.mime() {
            Some(mime) => write!(f, "{mime}"),
            None => write!(f, "unknown (.{})", self.extension()),
        }
    }
}
