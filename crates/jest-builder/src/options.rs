//! Builder options and the table that maps them onto Jest's CLI arguments.
//!
//! Options arrive from the workspace configuration as camelCase JSON. Every
//! option that is forwarded to Jest has exactly one entry in
//! [`OPTION_REGISTRY`], and [`JestBuilderOptions::value`] connects each
//! entry to its typed field with an exhaustive match, so adding an option
//! without wiring it up is a compile error rather than a silently dropped
//! key.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Options accepted by the jest builder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JestBuilderOptions {
    /// Path to the Jest configuration file, passed as the runner's project.
    pub jest_config: Utf8PathBuf,
    /// Path to the TypeScript configuration used by `ts-jest`.
    pub ts_config: Utf8PathBuf,
    /// Restrict the run to a single test file.
    #[serde(alias = "fileToTest", skip_serializing_if = "Option::is_none")]
    pub test_file: Option<String>,
    /// Directory `test_file` is resolved against.
    #[serde(alias = "pathToFileToTest", skip_serializing_if = "Option::is_none")]
    pub test_directory: Option<Utf8PathBuf>,
    /// Script run after the test framework is installed in the environment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_file: Option<Utf8PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_coverage: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bail: Option<Bail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<MaxWorkers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_changed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_with_no_tests: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_in_band: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub silent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_name_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_snapshot: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_stderr: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_all: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clear_cache: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collect_coverage_from: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_reporters: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub find_related_tests: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_exit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_heap_usage: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_stack_trace: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_path_pattern: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

/// `bail` accepts either a flag or the number of failing suites to stop
/// after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Bail {
    Enabled(bool),
    AfterFailures(u32),
}

/// `maxWorkers` accepts a worker count or a percentage of the available
/// cores such as `"50%"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MaxWorkers {
    Count(u32),
    Relative(String),
}

/// A value forwarded to Jest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Number(u32),
    Text(String),
    List(Vec<String>),
}

impl From<Bail> for OptionValue {
    fn from(bail: Bail) -> Self {
        match bail {
            Bail::Enabled(enabled) => OptionValue::Bool(enabled),
            Bail::AfterFailures(count) => OptionValue::Number(count),
        }
    }
}

impl From<MaxWorkers> for OptionValue {
    fn from(max_workers: MaxWorkers) -> Self {
        match max_workers {
            MaxWorkers::Count(count) => OptionValue::Number(count),
            MaxWorkers::Relative(relative) => OptionValue::Text(relative),
        }
    }
}

/// Canonical identifier for each option forwarded to Jest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionId {
    CodeCoverage,
    Bail,
    Ci,
    Color,
    Json,
    MaxWorkers,
    OnlyChanged,
    OutputFile,
    PassWithNoTests,
    RunInBand,
    Silent,
    TestNamePattern,
    UpdateSnapshot,
    UseStderr,
    Watch,
    WatchAll,
    Cache,
    ChangedSince,
    ClearCache,
    CollectCoverageFrom,
    CoverageDirectory,
    CoverageReporters,
    FindRelatedTests,
    ForceExit,
    LastCommit,
    LogHeapUsage,
    NoStackTrace,
    TestPathPattern,
    Verbose,
}

/// Metadata for a forwarded option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub id: OptionId,
    /// Key in the builder options JSON.
    pub option_key: &'static str,
    /// Key in the runner configuration, also the Jest CLI flag name.
    pub runner_key: &'static str,
}

const fn spec(id: OptionId, option_key: &'static str, runner_key: &'static str) -> OptionSpec {
    OptionSpec {
        id,
        option_key,
        runner_key,
    }
}

pub static OPTION_REGISTRY: [OptionSpec; 29] = [
    spec(OptionId::CodeCoverage, "codeCoverage", "coverage"),
    spec(OptionId::Bail, "bail", "bail"),
    spec(OptionId::Ci, "ci", "ci"),
    spec(OptionId::Color, "color", "color"),
    spec(OptionId::Json, "json", "json"),
    spec(OptionId::MaxWorkers, "maxWorkers", "maxWorkers"),
    spec(OptionId::OnlyChanged, "onlyChanged", "onlyChanged"),
    spec(OptionId::OutputFile, "outputFile", "outputFile"),
    spec(OptionId::PassWithNoTests, "passWithNoTests", "passWithNoTests"),
    spec(OptionId::RunInBand, "runInBand", "runInBand"),
    spec(OptionId::Silent, "silent", "silent"),
    spec(OptionId::TestNamePattern, "testNamePattern", "testNamePattern"),
    spec(OptionId::UpdateSnapshot, "updateSnapshot", "updateSnapshot"),
    spec(OptionId::UseStderr, "useStderr", "useStderr"),
    spec(OptionId::Watch, "watch", "watch"),
    spec(OptionId::WatchAll, "watchAll", "watchAll"),
    spec(OptionId::Cache, "cache", "cache"),
    spec(OptionId::ChangedSince, "changedSince", "changedSince"),
    spec(OptionId::ClearCache, "clearCache", "clearCache"),
    spec(
        OptionId::CollectCoverageFrom,
        "collectCoverageFrom",
        "collectCoverageFrom",
    ),
    spec(
        OptionId::CoverageDirectory,
        "coverageDirectory",
        "coverageDirectory",
    ),
    spec(
        OptionId::CoverageReporters,
        "coverageReporters",
        "coverageReporters",
    ),
    spec(
        OptionId::FindRelatedTests,
        "findRelatedTests",
        "findRelatedTests",
    ),
    spec(OptionId::ForceExit, "forceExit", "forceExit"),
    spec(OptionId::LastCommit, "lastCommit", "lastCommit"),
    spec(OptionId::LogHeapUsage, "logHeapUsage", "logHeapUsage"),
    spec(OptionId::NoStackTrace, "noStackTrace", "noStackTrace"),
    spec(OptionId::TestPathPattern, "testPathPattern", "testPathPattern"),
    spec(OptionId::Verbose, "verbose", "verbose"),
];

impl JestBuilderOptions {
    /// The value of a forwarded option, or `None` when it was not supplied.
    pub fn value(&self, id: OptionId) -> Option<OptionValue> {
        let flag = |value: Option<bool>| value.map(OptionValue::Bool);
        let text = |value: &Option<String>| value.clone().map(OptionValue::Text);
        let list = |value: &Option<Vec<String>>| value.clone().map(OptionValue::List);

        match id {
            OptionId::CodeCoverage => flag(self.code_coverage),
            OptionId::Bail => self.bail.map(OptionValue::from),
            OptionId::Ci => flag(self.ci),
            OptionId::Color => flag(self.color),
            OptionId::Json => flag(self.json),
            OptionId::MaxWorkers => self.max_workers.clone().map(OptionValue::from),
            OptionId::OnlyChanged => flag(self.only_changed),
            OptionId::OutputFile => text(&self.output_file),
            OptionId::PassWithNoTests => flag(self.pass_with_no_tests),
            OptionId::RunInBand => flag(self.run_in_band),
            OptionId::Silent => flag(self.silent),
            OptionId::TestNamePattern => text(&self.test_name_pattern),
            OptionId::UpdateSnapshot => flag(self.update_snapshot),
            OptionId::UseStderr => flag(self.use_stderr),
            OptionId::Watch => flag(self.watch),
            OptionId::WatchAll => flag(self.watch_all),
            OptionId::Cache => flag(self.cache),
            OptionId::ChangedSince => text(&self.changed_since),
            OptionId::ClearCache => flag(self.clear_cache),
            OptionId::CollectCoverageFrom => list(&self.collect_coverage_from),
            OptionId::CoverageDirectory => text(&self.coverage_directory),
            OptionId::CoverageReporters => list(&self.coverage_reporters),
            OptionId::FindRelatedTests => flag(self.find_related_tests),
            OptionId::ForceExit => flag(self.force_exit),
            OptionId::LastCommit => flag(self.last_commit),
            OptionId::LogHeapUsage => flag(self.log_heap_usage),
            OptionId::NoStackTrace => flag(self.no_stack_trace),
            OptionId::TestPathPattern => list(&self.test_path_pattern),
            OptionId::Verbose => flag(self.verbose),
        }
    }

    /// Every supplied forwarded option, in registry order, paired with its
    /// registry entry.
    pub fn forwarded(&self) -> impl Iterator<Item = (&'static OptionSpec, OptionValue)> + '_ {
        OPTION_REGISTRY
            .iter()
            .filter_map(|spec| self.value(spec.id).map(|value| (spec, value)))
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn every_option() -> serde_json::Value {
        json!({
            "jestConfig": "apps/web/jest.config.js",
            "tsConfig": "apps/web/tsconfig.spec.json",
            "testFile": "app.spec.ts",
            "testDirectory": "apps/web/src",
            "setupFile": "apps/web/src/test-setup.ts",
            "codeCoverage": true,
            "bail": 2,
            "ci": true,
            "color": false,
            "json": true,
            "maxWorkers": "50%",
            "onlyChanged": true,
            "outputFile": "results.json",
            "passWithNoTests": true,
            "runInBand": true,
            "silent": true,
            "testNamePattern": "renders",
            "updateSnapshot": true,
            "useStderr": true,
            "watch": false,
            "watchAll": false,
            "cache": false,
            "changedSince": "main",
            "clearCache": true,
            "collectCoverageFrom": ["src/**/*.ts"],
            "coverageDirectory": "coverage/apps/web",
            "coverageReporters": ["lcov", "text"],
            "findRelatedTests": true,
            "forceExit": true,
            "lastCommit": true,
            "logHeapUsage": true,
            "noStackTrace": true,
            "testPathPattern": ["app"],
            "verbose": true,
        })
    }

    #[test]
    fn test_registry_covers_every_forwarded_field() {
        let options: JestBuilderOptions = serde_json::from_value(every_option()).unwrap();
        let serialized = serde_json::to_value(&options).unwrap();
        let serialized_keys: BTreeSet<_> = serialized
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .filter(|key| {
                !matches!(
                    *key,
                    "jestConfig" | "tsConfig" | "testFile" | "testDirectory" | "setupFile"
                )
            })
            .collect();
        let registry_keys: BTreeSet<_> = OPTION_REGISTRY
            .iter()
            .map(|spec| spec.option_key)
            .collect();

        assert_eq!(serialized_keys, registry_keys);
        assert_eq!(options.forwarded().count(), OPTION_REGISTRY.len());
    }

    #[test]
    fn test_registry_ids_are_unique() {
        let ids: BTreeSet<_> = OPTION_REGISTRY.iter().map(|spec| spec.id).collect();
        assert_eq!(ids.len(), OPTION_REGISTRY.len());
    }

    #[test]
    fn test_legacy_test_file_keys() {
        let options: JestBuilderOptions = serde_json::from_value(json!({
            "jestConfig": "jest.config.js",
            "tsConfig": "tsconfig.spec.json",
            "fileToTest": "lib.spec.ts",
            "pathToFileToTest": "libs/util",
        }))
        .unwrap();

        assert_eq!(options.test_file.as_deref(), Some("lib.spec.ts"));
        assert_eq!(options.test_directory, Some(Utf8PathBuf::from("libs/util")));
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let err = serde_json::from_value::<JestBuilderOptions>(json!({
            "jestConfig": "jest.config.js",
            "tsConfig": "tsconfig.spec.json",
            "codeCoverge": true,
        }))
        .unwrap_err();

        assert!(err.to_string().contains("codeCoverge"));
    }

    #[test]
    fn test_required_paths() {
        let err = serde_json::from_value::<JestBuilderOptions>(json!({
            "jestConfig": "jest.config.js",
        }))
        .unwrap_err();

        assert!(err.to_string().contains("tsConfig"));
    }

    #[test]
    fn test_absent_options_are_not_forwarded() {
        let options: JestBuilderOptions = serde_json::from_value(json!({
            "jestConfig": "jest.config.js",
            "tsConfig": "tsconfig.spec.json",
            "watch": false,
        }))
        .unwrap();

        let forwarded: Vec<_> = options
            .forwarded()
            .map(|(spec, value)| (spec.runner_key, value))
            .collect();
        assert_eq!(forwarded, vec![("watch", OptionValue::Bool(false))]);
    }

    #[test]
    fn test_bail_and_max_workers_shapes() {
        let options: JestBuilderOptions = serde_json::from_value(json!({
            "jestConfig": "jest.config.js",
            "tsConfig": "tsconfig.spec.json",
            "bail": true,
            "maxWorkers": 2,
        }))
        .unwrap();

        assert_eq!(
            options.value(OptionId::Bail),
            Some(OptionValue::Bool(true))
        );
        assert_eq!(
            options.value(OptionId::MaxWorkers),
            Some(OptionValue::Number(2))
        );
    }
}
