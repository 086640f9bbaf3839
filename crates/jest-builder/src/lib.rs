//! Runs Jest on behalf of a workspace build tool.
//!
//! A builder invocation consists of the root of the project being tested and
//! the options configured for its test target. [`JestBuilder`] turns those
//! into a [`RunnerConfig`], hands it to a [`JestRunner`] and reports the
//! outcome as a [`BuildEvent`]. When a single test file is requested the
//! builder first consults the workspace manifest and skips projects that do
//! not own the file.

mod builder;
pub mod config;
pub mod env_file;
pub mod options;
pub mod runner;
mod runner_config;
pub mod workspace;

use std::io;

pub use builder::{BuildEvent, BuilderContext, JestBuilder, RunPlan};
pub use config::BuilderConfig;
use jest_builder_paths::{AbsoluteSystemPathBuf, PathError};
use miette::Diagnostic;
pub use options::JestBuilderOptions;
pub use runner::{JestRunner, ProcessRunner, RunCliOutput, RunnerError};
pub use runner_config::RunnerConfig;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("unable to read workspace manifest {path}: {source}")]
    #[diagnostic(code(workspace_manifest_read_error))]
    ManifestRead {
        path: AbsoluteSystemPathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Cannot parse {path}: {source}")]
    #[diagnostic(
        code(workspace_manifest_parse_error),
        help("workspace manifests must be JSON objects with a `projects` map")
    )]
    ManifestParse {
        path: AbsoluteSystemPathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unable to encode ts-jest globals: {0}")]
    Globals(#[source] serde_json::Error),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Runner(#[from] RunnerError),
    #[error("{0} is not UTF8.")]
    Encoding(String),
    #[error("JEST_BUILDER_TRANSFORM_HTML should be one of: true, false, 1, 0.")]
    #[diagnostic(code(invalid_transform_html))]
    InvalidTransformHtml,
    #[error("unable to read env file {path}: {source}")]
    #[diagnostic(code(env_file_read_error))]
    EnvFile {
        path: AbsoluteSystemPathBuf,
        #[source]
        source: io::Error,
    },
}
