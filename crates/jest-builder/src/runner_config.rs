use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use jest_builder_paths::root_dir_relative;
use serde::Serialize;

use crate::{options::OptionValue, BuilderConfig, BuilderContext, Error, JestBuilderOptions};

const TEMPLATE_PATH_REGEX: &str = "\\.(html|svg)$";
const INLINE_HTML_TRANSFORMER: &str = "jest-preset-angular/InlineHtmlStripStylesTransformer";

/// The parameter record handed to the Jest CLI.
///
/// Serializes to the same shape Jest's programmatic entry point receives:
/// forwarded options under their runner keys, `globals` as a JSON string and
/// the positional test files under `_`. Options that were not supplied are
/// absent rather than null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerConfig {
    #[serde(flatten)]
    pub options: IndexMap<&'static str, OptionValue>,
    pub globals: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_files_after_env: Option<Vec<String>>,
    #[serde(rename = "_", skip_serializing_if = "Option::is_none")]
    pub test_files: Option<Vec<String>>,
}

#[derive(Serialize)]
struct Globals {
    #[serde(rename = "ts-jest")]
    ts_jest: TsJestGlobals,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TsJestGlobals {
    ts_config: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stringify_content_path_regex: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ast_transformers: Option<[&'static str; 1]>,
}

impl RunnerConfig {
    /// Builds the runner configuration for one invocation. `test_file` is the
    /// raw target file string, passed only once it resolved to a real path.
    pub fn from_options(
        context: &BuilderContext,
        options: &JestBuilderOptions,
        config: &BuilderConfig,
        test_file: Option<&str>,
    ) -> Result<Self, Error> {
        let forwarded = options
            .forwarded()
            .map(|(spec, value)| (spec.runner_key, value))
            .collect();

        let globals = Globals {
            ts_jest: TsJestGlobals {
                ts_config: relative_to_root(context, &options.ts_config),
                stringify_content_path_regex: config.transform_html.then_some(TEMPLATE_PATH_REGEX),
                ast_transformers: config.transform_html.then_some([INLINE_HTML_TRANSFORMER]),
            },
        };
        let globals = serde_json::to_string(&globals).map_err(Error::Globals)?;

        let setup_files_after_env = options
            .setup_file
            .as_deref()
            .map(|setup_file| vec![relative_to_root(context, setup_file)]);

        Ok(Self {
            options: forwarded,
            globals,
            setup_files_after_env,
            test_files: test_file.map(|test_file| vec![test_file.to_string()]),
        })
    }

    /// Renders the configuration as Jest CLI arguments. A single project is
    /// passed as `--config`, several as repeated `--projects`. Positional test
    /// files come last.
    pub fn to_args(&self, projects: &[Utf8PathBuf]) -> Vec<String> {
        let mut args = Vec::new();
        match projects {
            [config] => args.push(format!("--config={config}")),
            projects => {
                args.extend(projects.iter().map(|project| format!("--projects={project}")))
            }
        }

        for (key, value) in &self.options {
            match value {
                OptionValue::Bool(true) => args.push(format!("--{key}")),
                OptionValue::Bool(false) => args.push(format!("--{key}=false")),
                OptionValue::Number(number) => args.push(format!("--{key}={number}")),
                OptionValue::Text(text) => args.push(format!("--{key}={text}")),
                OptionValue::List(items) => {
                    args.extend(items.iter().map(|item| format!("--{key}={item}")))
                }
            }
        }

        args.push(format!("--globals={}", self.globals));
        if let Some(setup_files) = &self.setup_files_after_env {
            args.extend(
                setup_files
                    .iter()
                    .map(|setup_file| format!("--setupFilesAfterEnv={setup_file}")),
            );
        }
        if let Some(test_files) = &self.test_files {
            args.extend(test_files.iter().cloned());
        }
        args
    }
}

// Option paths are relative to the invocation directory, Jest wants them
// relative to the project root.
fn relative_to_root(context: &BuilderContext, path: &Utf8Path) -> String {
    let absolute = context.cwd.join_unknown(path);
    root_dir_relative(&absolute.relative_to(&context.root))
}

#[cfg(test)]
mod test {
    use jest_builder_paths::AbsoluteSystemPathBuf;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::options::{Bail, MaxWorkers};

    fn workspace_root() -> AbsoluteSystemPathBuf {
        let root = if cfg!(windows) { "C:\\root" } else { "/root" };
        AbsoluteSystemPathBuf::new(root).unwrap()
    }

    fn context() -> BuilderContext {
        BuilderContext::new(workspace_root(), workspace_root())
    }

    fn options() -> JestBuilderOptions {
        JestBuilderOptions {
            jest_config: "./jest.config.js".into(),
            ts_config: "./tsconfig.test.json".into(),
            ..Default::default()
        }
    }

    fn globals(config: &RunnerConfig) -> serde_json::Value {
        serde_json::from_str(&config.globals).unwrap()
    }

    #[test]
    fn test_minimal_config() {
        let config =
            RunnerConfig::from_options(&context(), &options(), &BuilderConfig::default(), None)
                .unwrap();

        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({ "globals": r#"{"ts-jest":{"tsConfig":"<rootDir>/tsconfig.test.json"}}"# })
        );
    }

    #[test]
    fn test_present_options_are_renamed_and_absent_are_omitted() {
        let options = JestBuilderOptions {
            code_coverage: Some(true),
            bail: Some(Bail::AfterFailures(1)),
            watch: Some(false),
            max_workers: Some(MaxWorkers::Relative("50%".to_string())),
            test_name_pattern: Some("renders".to_string()),
            coverage_reporters: Some(vec!["lcov".to_string(), "text".to_string()]),
            ..options()
        };
        let config =
            RunnerConfig::from_options(&context(), &options, &BuilderConfig::default(), None)
                .unwrap();
        let value = serde_json::to_value(&config).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object["coverage"], json!(true));
        assert_eq!(object["bail"], json!(1));
        assert_eq!(object["watch"], json!(false));
        assert_eq!(object["maxWorkers"], json!("50%"));
        assert_eq!(object["testNamePattern"], json!("renders"));
        assert_eq!(object["coverageReporters"], json!(["lcov", "text"]));
        for absent in [
            "codeCoverage",
            "ci",
            "watchAll",
            "jestConfig",
            "tsConfig",
            "setupFilesAfterEnv",
            "_",
        ] {
            assert!(!object.contains_key(absent), "{absent} should be absent");
        }
    }

    #[test]
    fn test_ts_config_outside_root() {
        let context = BuilderContext::new(
            workspace_root().join_components(&["apps", "web"]),
            workspace_root(),
        );
        let options = JestBuilderOptions {
            ts_config: "libs/shared/tsconfig.spec.json".into(),
            ..options()
        };
        let config =
            RunnerConfig::from_options(&context, &options, &BuilderConfig::default(), None)
                .unwrap();

        assert_eq!(
            globals(&config)["ts-jest"]["tsConfig"],
            json!("<rootDir>/../../libs/shared/tsconfig.spec.json")
        );
    }

    #[test]
    fn test_template_integration() {
        let builder_config = BuilderConfig {
            transform_html: true,
            ..Default::default()
        };
        let config =
            RunnerConfig::from_options(&context(), &options(), &builder_config, None).unwrap();

        assert_eq!(
            globals(&config),
            json!({
                "ts-jest": {
                    "tsConfig": "<rootDir>/tsconfig.test.json",
                    "stringifyContentPathRegex": "\\.(html|svg)$",
                    "astTransformers": ["jest-preset-angular/InlineHtmlStripStylesTransformer"],
                }
            })
        );
    }

    #[test]
    fn test_setup_file() {
        let options = JestBuilderOptions {
            setup_file: Some("./test.ts".into()),
            ..options()
        };
        let config =
            RunnerConfig::from_options(&context(), &options, &BuilderConfig::default(), None)
                .unwrap();

        assert_eq!(
            config.setup_files_after_env,
            Some(vec!["<rootDir>/test.ts".to_string()])
        );
    }

    #[test]
    fn test_positional_test_file_is_raw() {
        let config = RunnerConfig::from_options(
            &context(),
            &options(),
            &BuilderConfig::default(),
            Some("lib.spec.ts"),
        )
        .unwrap();

        assert_eq!(config.test_files, Some(vec!["lib.spec.ts".to_string()]));
    }

    #[test]
    fn test_to_args() {
        let options = JestBuilderOptions {
            setup_file: Some("src/test-setup.ts".into()),
            code_coverage: Some(true),
            color: Some(false),
            bail: Some(Bail::AfterFailures(3)),
            collect_coverage_from: Some(vec!["src/**/*.ts".to_string(), "!**/*.d.ts".to_string()]),
            ..options()
        };
        let config = RunnerConfig::from_options(
            &context(),
            &options,
            &BuilderConfig::default(),
            Some("app.spec.ts"),
        )
        .unwrap();

        assert_eq!(
            config.to_args(&[Utf8PathBuf::from("jest.config.js")]),
            vec![
                "--config=jest.config.js",
                "--coverage",
                "--bail=3",
                "--color=false",
                "--collectCoverageFrom=src/**/*.ts",
                "--collectCoverageFrom=!**/*.d.ts",
                r#"--globals={"ts-jest":{"tsConfig":"<rootDir>/tsconfig.test.json"}}"#,
                "--setupFilesAfterEnv=<rootDir>/src/test-setup.ts",
                "app.spec.ts",
            ]
        );
    }

    #[test]
    fn test_to_args_with_several_projects() {
        let config =
            RunnerConfig::from_options(&context(), &options(), &BuilderConfig::default(), None)
                .unwrap();
        let args = config.to_args(&[
            Utf8PathBuf::from("apps/web/jest.config.js"),
            Utf8PathBuf::from("libs/util/jest.config.js"),
        ]);

        assert_eq!(
            &args[..2],
            [
                "--projects=apps/web/jest.config.js",
                "--projects=libs/util/jest.config.js"
            ]
        );
    }
}
