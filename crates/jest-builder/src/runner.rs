//! The Jest entry point.
//!
//! [`JestRunner`] is the seam between the builder and Jest itself. The
//! builder only needs one operation, run the CLI with a configuration and a
//! list of projects, and only one piece of its result, whether the run
//! succeeded.

use std::{io, path::PathBuf};

use async_trait::async_trait;
use camino::Utf8PathBuf;
use jest_builder_paths::AbsoluteSystemPathBuf;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::RunnerConfig;

#[cfg(windows)]
const LOCAL_JEST_BIN: &str = "jest.cmd";
#[cfg(not(windows))]
const LOCAL_JEST_BIN: &str = "jest";

#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    #[error("unable to find a jest executable")]
    #[diagnostic(
        code(jest_binary_not_found),
        help("install jest in the workspace or pass --jest-bin")
    )]
    BinaryNotFound,
    #[error("unable to spawn {binary}: {source}")]
    #[diagnostic(code(jest_spawn_error))]
    Spawn {
        binary: String,
        #[source]
        source: io::Error,
    },
}

/// Aggregated result of a Jest run. Only `success` is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct AggregatedResult {
    pub success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RunCliOutput {
    pub results: AggregatedResult,
}

impl RunCliOutput {
    pub fn new(success: bool) -> Self {
        Self {
            results: AggregatedResult { success },
        }
    }
}

#[async_trait]
pub trait JestRunner: Send + Sync {
    async fn run_cli(
        &self,
        config: &RunnerConfig,
        projects: &[Utf8PathBuf],
    ) -> Result<RunCliOutput, RunnerError>;
}

/// Runs the Jest CLI as a child process that shares this process's stdio.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    cwd: AbsoluteSystemPathBuf,
    jest_binary: Option<Utf8PathBuf>,
}

impl ProcessRunner {
    pub fn new(cwd: AbsoluteSystemPathBuf, jest_binary: Option<Utf8PathBuf>) -> Self {
        Self { cwd, jest_binary }
    }

    /// The configured binary, then the workspace's `node_modules/.bin`, then
    /// `PATH`.
    fn resolve_binary(&self) -> Result<PathBuf, RunnerError> {
        if let Some(jest_binary) = &self.jest_binary {
            return Ok(self.cwd.join_unknown(jest_binary).into_std_path_buf());
        }
        let local = self
            .cwd
            .join_components(&["node_modules", ".bin", LOCAL_JEST_BIN]);
        if local.exists() {
            return Ok(local.into_std_path_buf());
        }
        which::which("jest").map_err(|_| RunnerError::BinaryNotFound)
    }
}

#[async_trait]
impl JestRunner for ProcessRunner {
    async fn run_cli(
        &self,
        config: &RunnerConfig,
        projects: &[Utf8PathBuf],
    ) -> Result<RunCliOutput, RunnerError> {
        let binary = self.resolve_binary()?;
        let args = config.to_args(projects);
        debug!("({}) {} {}", self.cwd, binary.display(), args.join(" "));

        let status = Command::new(&binary)
            .args(&args)
            .current_dir(self.cwd.as_std_path())
            .status()
            .await
            .map_err(|source| RunnerError::Spawn {
                binary: binary.display().to_string(),
                source,
            })?;
        debug!("jest exited with {status}");

        Ok(RunCliOutput::new(status.success()))
    }
}
