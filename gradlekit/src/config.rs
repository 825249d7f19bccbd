//! Environment-driven runner configuration.
//!
//! Test suites often want one ambient switch (say, in CI) to turn on
//! stacktraces or verbose logging for every build a harness runs. A
//! [`RunnerConfig`] captures those knobs as an explicit value, parsed from
//! the process environment or any other [`PropertySource`], and applies them
//! to a [`GradleRunner`] idempotently.

use crate::cli;
use crate::runner::GradleRunner;
use std::str::FromStr;

/// Environment variable selecting the stacktrace flag to enable.
pub const STACKTRACE_VAR: &str = "GRADLEKIT_STACKTRACE";

/// Environment variable selecting the log level flag to enable.
pub const LOG_LEVEL_VAR: &str = "GRADLEKIT_LOG_LEVEL";

/// A source of string-valued configuration properties.
pub trait PropertySource {
    /// The value for `key`, or `None` if the source has no entry for it.
    fn property(&self, key: &str) -> Option<String>;
}

/// The process environment as a [`PropertySource`].
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvPropertySource;

impl PropertySource for EnvPropertySource {
    fn property(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Stacktrace verbosity choices.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString,
)]
#[strum(serialize_all = "kebab-case")]
pub enum StacktraceOption {
    /// The `--stacktrace` flag.
    Stacktrace,
    /// The `--full-stacktrace` flag.
    FullStacktrace,
}

impl StacktraceOption {
    const fn flag(self) -> &'static str {
        match self {
            Self::Stacktrace => "--stacktrace",
            Self::FullStacktrace => "--full-stacktrace",
        }
    }
}

/// Log level choices.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString,
)]
#[strum(serialize_all = "kebab-case")]
pub enum LogLevelOption {
    /// The `--quiet` flag.
    Quiet,
    /// The `--warn` flag.
    Warn,
    /// The `--info` flag.
    Info,
    /// The `--debug` flag.
    Debug,
}

impl LogLevelOption {
    const fn flag(self) -> &'static str {
        match self {
            Self::Quiet => "--quiet",
            Self::Warn => "--warn",
            Self::Info => "--info",
            Self::Debug => "--debug",
        }
    }
}

/// Ambient configuration applied to a runner before execution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Stacktrace flag to enable, if any.
    pub stacktrace: Option<StacktraceOption>,
    /// Log level flag to enable, if any.
    pub log_level: Option<LogLevelOption>,
}

impl RunnerConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_source(&EnvPropertySource)
    }

    /// Reads the configuration from the provided source.
    pub fn from_source(source: &impl PropertySource) -> Self {
        Self {
            stacktrace: parse_property(source, STACKTRACE_VAR),
            log_level: parse_property(source, LOG_LEVEL_VAR),
        }
    }

    /// Enables the configured flags on the runner's argument list.
    ///
    /// Flags already present are left alone, so applying a configuration
    /// twice is a no-op.
    pub fn apply(&self, runner: &mut GradleRunner) {
        let mut updated = runner.arguments().to_vec();
        if let Some(stacktrace) = self.stacktrace {
            updated = cli::set_flag(&updated, stacktrace.flag(), true);
        }
        if let Some(log_level) = self.log_level {
            updated = cli::set_flag(&updated, log_level.flag(), true);
        }

        if updated.as_slice() == runner.arguments() {
            tracing::debug!("no argument updates needed");
        } else {
            tracing::debug!(arguments = ?updated, "updating runner arguments");
            runner.set_arguments(updated);
        }
    }
}

fn parse_property<T: FromStr>(source: &impl PropertySource, key: &str) -> Option<T> {
    let raw = source.property(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = raw.as_str(), "ignoring unrecognized value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    struct MapSource(HashMap<String, String>);

    impl MapSource {
        fn new(entries: &[(&str, &str)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                    .collect(),
            )
        }
    }

    impl PropertySource for MapSource {
        fn property(&self, key: &str) -> Option<String> {
            self.0.get(key).cloned()
        }
    }

    #[test]
    fn test_from_source() {
        let source = MapSource::new(&[
            (STACKTRACE_VAR, "full-stacktrace"),
            (LOG_LEVEL_VAR, "info"),
        ]);
        let config = RunnerConfig::from_source(&source);
        assert_eq!(config.stacktrace, Some(StacktraceOption::FullStacktrace));
        assert_eq!(config.log_level, Some(LogLevelOption::Info));
    }

    #[test]
    fn test_from_source_ignores_unrecognized_values() {
        let source = MapSource::new(&[(STACKTRACE_VAR, "everything"), (LOG_LEVEL_VAR, "loud")]);
        let config = RunnerConfig::from_source(&source);
        assert_eq!(config, RunnerConfig::default());
    }

    #[test]
    fn test_apply_is_idempotent() {
        let config = RunnerConfig {
            stacktrace: Some(StacktraceOption::Stacktrace),
            log_level: Some(LogLevelOption::Quiet),
        };

        let mut runner = GradleRunner::new().with_arguments(["build"]);
        config.apply(&mut runner);
        config.apply(&mut runner);
        assert_eq!(
            runner.arguments(),
            ["build".to_owned(), "--stacktrace".to_owned(), "--quiet".to_owned()]
        );
    }

    #[test]
    fn test_apply_with_empty_config_changes_nothing() {
        let mut runner = GradleRunner::new().with_arguments(["build"]);
        RunnerConfig::default().apply(&mut runner);
        assert_eq!(runner.arguments(), ["build".to_owned()]);
    }
}
