use std::{collections::HashMap, env, io};

use camino::Utf8PathBuf;
use clap::{ArgGroup, Parser};
use jest_builder::{
    env_file, BuilderConfig, BuilderContext, JestBuilder, JestBuilderOptions, ProcessRunner,
};
use jest_builder_paths::{AbsoluteSystemPathBuf, PathError};
use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("invalid builder options: {0}")]
    #[diagnostic(
        code(invalid_builder_options),
        help("options must be a JSON object with at least `jestConfig` and `tsConfig`")
    )]
    Options(#[source] serde_json::Error),
    #[error("unable to read builder options from {path}: {source}")]
    #[diagnostic(code(options_file_read_error))]
    OptionsFile {
        path: AbsoluteSystemPathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Builder(#[from] jest_builder::Error),
}

#[derive(Debug, Parser, Clone, Copy, PartialEq, Eq, Default)]
pub struct Verbosity {
    #[clap(long = "verbosity", conflicts_with = "v", value_name = "COUNT")]
    /// Verbosity level
    pub verbosity: Option<u8>,
    #[clap(
        short = 'v',
        action = clap::ArgAction::Count,
        hide = true,
        conflicts_with = "verbosity"
    )]
    pub v: u8,
}

impl From<Verbosity> for u8 {
    fn from(val: Verbosity) -> Self {
        let Verbosity { verbosity, v } = val;
        verbosity.unwrap_or(v)
    }
}

/// Runs Jest for one project of a workspace and prints the build event.
#[derive(Debug, Parser)]
#[command(name = "jest-builder", version)]
#[command(groups = [
    ArgGroup::new("options-source").args(["options", "options_file"]).required(true),
])]
pub struct Args {
    /// Root of the project whose tests are run
    #[clap(long)]
    pub root: Utf8PathBuf,
    /// Directory relative paths are resolved against. Defaults to the
    /// current directory
    #[clap(long)]
    pub cwd: Option<Utf8PathBuf>,
    /// Builder options as a JSON object
    #[clap(long)]
    pub options: Option<String>,
    /// File containing the builder options as a JSON object
    #[clap(long)]
    pub options_file: Option<Utf8PathBuf>,
    /// Jest executable to run
    #[clap(long)]
    pub jest_bin: Option<Utf8PathBuf>,
    /// Enable the Angular template integration for ts-jest
    #[clap(long)]
    pub transform_html: bool,
    /// Environment file loaded before reading configuration
    #[clap(long, default_value = ".env", conflicts_with = "no_env_file")]
    pub env_file: Utf8PathBuf,
    #[clap(long)]
    pub no_env_file: bool,
    /// Print what would be run instead of running it
    #[clap(long)]
    pub dry_run: bool,
    #[clap(flatten)]
    pub verbosity: Verbosity,
}

struct Invocation {
    builder: JestBuilder<ProcessRunner>,
    context: BuilderContext,
    options: JestBuilderOptions,
}

pub fn run() -> anyhow::Result<i32> {
    let args = Args::parse();
    crate::tracing::init(args.verbosity.into());

    // Environment loading happens here, before any runtime threads exist.
    let Invocation {
        builder,
        context,
        options,
    } = match prepare(&args) {
        Ok(invocation) => invocation,
        Err(err) => return Ok(report(err)),
    };

    if args.dry_run {
        return match builder.plan(&context, &options) {
            Ok(plan) => {
                println!("{}", serde_json::to_string_pretty(&plan)?);
                Ok(0)
            }
            Err(err) => Ok(report(err.into())),
        };
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    match runtime.block_on(builder.run(&context, &options)) {
        Ok(event) => {
            println!("{}", serde_json::to_string(&event)?);
            Ok(if event.success { 0 } else { 1 })
        }
        Err(err) => Ok(report(err.into())),
    }
}

fn prepare(args: &Args) -> Result<Invocation, Error> {
    let cwd = match &args.cwd {
        Some(cwd) => AbsoluteSystemPathBuf::from_cwd(cwd)?,
        None => AbsoluteSystemPathBuf::cwd()?,
    };

    if !args.no_env_file {
        let env_file = cwd.join_unknown(&args.env_file);
        let loaded = env_file::load_env_file(&env_file)?;
        debug!("loaded {loaded:?} from {env_file}");
    }

    let environment: HashMap<_, _> = env::vars_os().collect();
    let config = BuilderConfig::from_env(&environment)?
        .with_jest_binary(args.jest_bin.clone())
        .with_transform_html(args.transform_html);
    debug!("builder config: {config:?}");

    let options = read_options(args, &cwd)?;
    let context = BuilderContext::new(cwd.join_unknown(&args.root), cwd.clone());
    let runner = ProcessRunner::new(cwd, config.jest_binary.clone());

    Ok(Invocation {
        builder: JestBuilder::new(runner, config),
        context,
        options,
    })
}

fn read_options(args: &Args, cwd: &AbsoluteSystemPathBuf) -> Result<JestBuilderOptions, Error> {
    let contents = match (&args.options, &args.options_file) {
        (Some(options), _) => options.clone(),
        (None, Some(options_file)) => {
            let path = cwd.join_unknown(options_file);
            path.read_to_string()
                .map_err(|source| Error::OptionsFile { path, source })?
        }
        // guaranteed by the required `options-source` group
        (None, None) => unreachable!(),
    };
    serde_json::from_str(&contents).map_err(Error::Options)
}

fn report(err: Error) -> i32 {
    eprintln!("{:?}", miette::Report::new(err));
    1
}
