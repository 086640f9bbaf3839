//! Absolute, UTF-8 system paths for the jest builder.
//!
//! Builder options arrive as strings that may be relative to the invocation
//! directory, while every comparison the builder makes (project membership,
//! relative paths handed to Jest) must happen between absolute, lexically
//! cleaned paths. [`AbsoluteSystemPath`] and [`AbsoluteSystemPathBuf`] encode
//! that requirement in the type system, the same way `Path`/`PathBuf` split
//! borrowed and owned data.

mod absolute_system_path;
mod absolute_system_path_buf;

use std::io;

pub use absolute_system_path::AbsoluteSystemPath;
pub use absolute_system_path_buf::AbsoluteSystemPathBuf;

/// Placeholder Jest substitutes with the project root at run time.
pub const ROOT_DIR_TOKEN: &str = "<rootDir>";

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("Path is non-UTF-8: {0}")]
    InvalidUnicode(String),
    #[error("Failed to convert path")]
    FromPathBufError(#[from] camino::FromPathBufError),
    #[error("Path is not absolute: {0}")]
    NotAbsolute(String),
    #[error("IO Error {0}")]
    IO(#[from] io::Error),
}

/// Joins a relative path onto [`ROOT_DIR_TOKEN`] using forward slashes, which
/// is the form Jest expects regardless of platform.
///
/// An empty relative path yields the bare token.
pub fn root_dir_relative(relative: &camino::Utf8Path) -> String {
    let unix = relative
        .components()
        .map(|component| component.as_str())
        .collect::<Vec<_>>()
        .join("/");
    if unix.is_empty() {
        ROOT_DIR_TOKEN.to_string()
    } else {
        format!("{ROOT_DIR_TOKEN}/{unix}")
    }
}
