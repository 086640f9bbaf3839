//! Host-side configuration of the builder.
//!
//! These settings describe the environment the builder runs in rather than
//! the project under test, so they come from environment variables and CLI
//! flags instead of the workspace options.

use std::{
    collections::HashMap,
    ffi::{OsStr, OsString},
};

use camino::Utf8PathBuf;

use crate::Error;

const ENV_MAPPING: &[(&str, &str)] = [
    ("JEST_BUILDER_JEST_BIN", "jest_binary"),
    ("JEST_BUILDER_TRANSFORM_HTML", "transform_html"),
]
.as_slice();

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Jest executable to run instead of the one found in `node_modules` or
    /// on `PATH`.
    pub jest_binary: Option<Utf8PathBuf>,
    /// Whether the Angular template integration for `ts-jest` is available:
    /// inline templates are stringified and their styles stripped.
    pub transform_html: bool,
}

impl BuilderConfig {
    pub fn from_env(environment: &HashMap<OsString, OsString>) -> Result<Self, Error> {
        let output_map = map_environment(environment)?;

        let jest_binary = output_map.get("jest_binary").map(Utf8PathBuf::from);
        let transform_html = output_map
            .get("transform_html")
            .map(|value| truth_env_var(value).ok_or(Error::InvalidTransformHtml))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            jest_binary,
            transform_html,
        })
    }

    /// Overrides the Jest executable when `jest_binary` is set.
    pub fn with_jest_binary(mut self, jest_binary: Option<Utf8PathBuf>) -> Self {
        if jest_binary.is_some() {
            self.jest_binary = jest_binary;
        }
        self
    }

    /// Enables the template integration when `transform_html` is set. A flag
    /// can only turn the integration on.
    pub fn with_transform_html(mut self, transform_html: bool) -> Self {
        self.transform_html |= transform_html;
        self
    }
}

pub fn truth_env_var(s: &str) -> Option<bool> {
    match s {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

// Empty values are treated as unset.
fn map_environment(
    environment: &HashMap<OsString, OsString>,
) -> Result<HashMap<&'static str, String>, Error> {
    let mut output_map = HashMap::new();
    for (var, property) in ENV_MAPPING {
        if let Some(value) = environment.get(OsStr::new(var)) {
            let converted = value
                .to_str()
                .ok_or_else(|| Error::Encoding(var.to_string()))?;
            if !converted.is_empty() {
                output_map.insert(*property, converted.to_owned());
            }
        }
    }
    Ok(output_map)
}

#[cfg(test)]
mod test {
    use test_case::test_case;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> HashMap<OsString, OsString> {
        vars.iter()
            .map(|(key, value)| (OsString::from(key), OsString::from(value)))
            .collect()
    }

    #[test]
    fn test_env_setting() {
        let config = BuilderConfig::from_env(&env(&[
            ("JEST_BUILDER_JEST_BIN", "/opt/jest/bin/jest"),
            ("JEST_BUILDER_TRANSFORM_HTML", "true"),
        ]))
        .unwrap();

        assert_eq!(
            config,
            BuilderConfig {
                jest_binary: Some(Utf8PathBuf::from("/opt/jest/bin/jest")),
                transform_html: true,
            }
        );
    }

    #[test]
    fn test_empty_env_setting() {
        let config = BuilderConfig::from_env(&env(&[
            ("JEST_BUILDER_JEST_BIN", ""),
            ("JEST_BUILDER_TRANSFORM_HTML", ""),
        ]))
        .unwrap();

        assert_eq!(config, BuilderConfig::default());
    }

    #[test_case("1", true ; "one")]
    #[test_case("true", true ; "true")]
    #[test_case("0", false ; "zero")]
    #[test_case("false", false ; "false")]
    fn test_transform_html_values(value: &str, expected: bool) {
        let config =
            BuilderConfig::from_env(&env(&[("JEST_BUILDER_TRANSFORM_HTML", value)])).unwrap();
        assert_eq!(config.transform_html, expected);
    }

    #[test]
    fn test_invalid_transform_html() {
        let err =
            BuilderConfig::from_env(&env(&[("JEST_BUILDER_TRANSFORM_HTML", "yes")])).unwrap_err();
        assert!(matches!(err, Error::InvalidTransformHtml));
    }

    #[test]
    fn test_flags_override_environment() {
        let config = BuilderConfig::from_env(&env(&[("JEST_BUILDER_JEST_BIN", "/env/jest")]))
            .unwrap()
            .with_jest_binary(Some(Utf8PathBuf::from("/flag/jest")))
            .with_transform_html(true);

        assert_eq!(config.jest_binary, Some(Utf8PathBuf::from("/flag/jest")));
        assert!(config.transform_html);

        let config = config.with_jest_binary(None).with_transform_html(false);
        assert_eq!(config.jest_binary, Some(Utf8PathBuf::from("/flag/jest")));
        assert!(config.transform_html);
    }
}
