use camino::Utf8PathBuf;
use jest_builder_paths::{AbsoluteSystemPath, AbsoluteSystemPathBuf};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    workspace::{self, WorkspaceProject},
    BuilderConfig, Error, JestBuilderOptions, JestRunner, RunnerConfig,
};

/// Where a builder invocation happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderContext {
    /// Root of the project whose tests are being run.
    pub root: AbsoluteSystemPathBuf,
    /// Directory relative option paths are resolved against.
    pub cwd: AbsoluteSystemPathBuf,
}

impl BuilderContext {
    pub fn new(root: AbsoluteSystemPathBuf, cwd: AbsoluteSystemPathBuf) -> Self {
        Self { root, cwd }
    }
}

/// The event reported back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildEvent {
    pub success: bool,
}

/// What an invocation will do, decided before anything is run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RunPlan {
    /// The target file belongs to another project.
    #[serde(rename_all = "camelCase")]
    Skip { test_file: String, project: String },
    #[serde(rename_all = "camelCase")]
    Run {
        runner_config: RunnerConfig,
        projects: Vec<Utf8PathBuf>,
    },
}

pub struct JestBuilder<R> {
    runner: R,
    config: BuilderConfig,
}

impl<R: JestRunner> JestBuilder<R> {
    pub fn new(runner: R, config: BuilderConfig) -> Self {
        Self { runner, config }
    }

    pub fn plan(
        &self,
        context: &BuilderContext,
        options: &JestBuilderOptions,
    ) -> Result<RunPlan, Error> {
        let target = options.test_file.as_deref().filter(|file| !file.is_empty());
        let test_file = match target {
            Some(test_file) => match resolve_test_file(context, options, test_file) {
                Some(resolved) => {
                    if let Some(project) = workspace::project_for_file(&resolved)? {
                        if !owns(context, &project) {
                            info!(
                                "skipping {test_file}: it belongs to project {} at {}",
                                project.name, project.resolved_root
                            );
                            return Ok(RunPlan::Skip {
                                test_file: test_file.to_string(),
                                project: project.name,
                            });
                        }
                    }
                    Some(test_file)
                }
                None => None,
            },
            None => None,
        };

        let runner_config = RunnerConfig::from_options(context, options, &self.config, test_file)?;
        Ok(RunPlan::Run {
            runner_config,
            projects: vec![options.jest_config.clone()],
        })
    }

    pub async fn run(
        &self,
        context: &BuilderContext,
        options: &JestBuilderOptions,
    ) -> Result<BuildEvent, Error> {
        match self.plan(context, options)? {
            RunPlan::Skip { .. } => Ok(BuildEvent { success: true }),
            RunPlan::Run {
                runner_config,
                projects,
            } => {
                let output = self.runner.run_cli(&runner_config, &projects).await?;
                Ok(BuildEvent {
                    success: output.results.success,
                })
            }
        }
    }
}

/// With a test directory the target is resolved lexically, otherwise it must
/// exist so its real path can be taken.
fn resolve_test_file(
    context: &BuilderContext,
    options: &JestBuilderOptions,
    test_file: &str,
) -> Option<AbsoluteSystemPathBuf> {
    match &options.test_directory {
        Some(test_directory) => Some(
            context
                .cwd
                .join_unknown(test_directory)
                .join_unknown(test_file),
        ),
        None => match context.cwd.join_unknown(test_file).to_realpath() {
            Ok(resolved) => Some(resolved),
            Err(err) => {
                debug!("unable to resolve {test_file}, running every test: {err}");
                None
            }
        },
    }
}

/// Project roots found from a real file path are real paths themselves, so
/// both sides are compared after resolving symlinks.
fn owns(context: &BuilderContext, project: &WorkspaceProject) -> bool {
    canonical(&project.resolved_root) == canonical(&context.root)
}

fn canonical(path: &AbsoluteSystemPath) -> AbsoluteSystemPathBuf {
    path.to_realpath().unwrap_or_else(|_| path.collapse())
}
