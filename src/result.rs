use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use miette::miette;

#[derive(Debug)]
pub enum Error {
    /// A local source path does not exist (URIs are never checked)
    InputNotFound(PathBuf),

    /// The source container has no entry in the profile table
    UnsupportedFormat { extension: String },

    /// The source duration could not be probed
    ProbeFailed { input: String, report: miette::Report },

    /// The transcoder reported a failure. Its diagnostic streams are kept as-is.
    TranscodeFailed {
        message: String,
        stdout: String,
        stderr: String,
    },

    /// Reading, decoding, encoding or writing a manifest failed
    ManifestIo { path: PathBuf, report: miette::Report },

    Miette(miette::Report),
}

impl From<miette::Report> for Error {
    fn from(err: miette::Report) -> Self {
        Error::Miette(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Miette(miette!("{err}"))
    }
}

impl From<Error> for miette::Report {
    fn from(err: Error) -> Self {
        match err {
            Error::InputNotFound(path) => {
                miette!("Input path does not exist: {}", path.display())
            }
            Error::UnsupportedFormat { extension } => {
                miette!("Format '{extension}' is not supported")
            }
            Error::ProbeFailed { input, report } => {
                report.wrap_err(format!("Could not probe the duration of {input}"))
            }
            Error::TranscodeFailed {
                message, stderr, ..
            } => miette!(
                help = stderr.trim().to_string(),
                "Transcoding failed: {message}"
            ),
            Error::ManifestIo { path, report } => {
                report.wrap_err(format!("Manifest I/O failed on {}", path.display()))
            }
            Error::Miette(err) => err,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InputNotFound(path) => {
                write!(f, "input path does not exist: {}", path.display())
            }
            Error::UnsupportedFormat { extension } => {
                write!(f, "format '{extension}' is not supported")
            }
            Error::ProbeFailed { input, report } => write!(f, "could not probe {input}: {report}"),
            Error::TranscodeFailed { message, .. } => write!(f, "transcoding failed: {message}"),
            Error::ManifestIo { path, report } => {
                write!(f, "manifest I/O failed on {}: {report}", path.display())
            }
            Error::Miette(report) => write!(f, "{report}"),
        }
    }
}

impl Error {
    /// Turn any failure into a [`Error::ManifestIo`] on the given path,
    /// keeping the original message as the cause.
    pub fn into_manifest_io(self, path: &Path) -> Error {
        match self {
            err @ Error::ManifestIo { .. } => err,
            err => Error::ManifestIo {
                path: path.to_path_buf(),
                report: miette::Report::from(err),
            },
        }
    }
}

pub fn err_msg<D: Display>(msg: D) -> Error {
    Error::Miette(miette!("{msg}"))
}

pub fn bail<T, D: Display>(msg: D) -> Result<T> {
    Err(err_msg(msg))
}

pub type Result<T> = std::result::Result<T, Error>;
