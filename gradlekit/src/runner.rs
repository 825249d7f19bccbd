//! Configuration and invocation of a Gradle build subprocess.

use crate::error::Error;
use crate::fs::DirectoryContext;
use crate::result::BuildResult;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default timeout for a build invocation, in seconds.
pub const DEFAULT_TIMEOUT_IN_SECONDS: u64 = 60;

/// Configures and executes Gradle builds.
///
/// A runner is an owned value holding the program to invoke, the project
/// directory, the current argument list, and environment/timeout settings.
/// It is not synchronized; sharing one runner across threads must be
/// serialized by the caller. The typed per-option accessors over the
/// argument list live in [`crate::cli`].
#[derive(Clone, Debug)]
pub struct GradleRunner {
    gradle_path: PathBuf,
    project_dir: Option<PathBuf>,
    arguments: Vec<String>,
    environment: Option<Vec<(String, String)>>,
    extra_env: Vec<(String, String)>,
    forward_output: bool,
    timeout: Option<Duration>,
}

impl Default for GradleRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl GradleRunner {
    /// Creates a runner that invokes `gradle` from the search path.
    pub fn new() -> Self {
        Self {
            gradle_path: PathBuf::from("gradle"),
            project_dir: None,
            arguments: Vec::new(),
            environment: None,
            extra_env: Vec::new(),
            forward_output: false,
            timeout: None,
        }
    }

    /// Sets the program to invoke (a `gradle` binary, a `gradlew` wrapper
    /// script, or any stand-in program).
    #[must_use]
    pub fn with_gradle_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.gradle_path = path.into();
        self
    }

    /// Sets the project directory the build runs in.
    #[must_use]
    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = Some(dir.into());
        self
    }

    /// Sets the argument list passed to the build.
    #[must_use]
    pub fn with_arguments<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = args.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the build's environment wholesale: the child process sees
    /// exactly the provided variables and nothing inherited.
    #[must_use]
    pub fn with_environment<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Adds a single environment variable on top of whatever environment the
    /// build otherwise sees.
    #[must_use]
    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_env.push((key.into(), value.into()));
        self
    }

    /// Echoes the build's captured output to this process's stdout after the
    /// run.
    #[must_use]
    pub const fn with_forward_output(mut self, forward: bool) -> Self {
        self.forward_output = forward;
        self
    }

    /// Bounds the build's run time. Defaults to
    /// [`DEFAULT_TIMEOUT_IN_SECONDS`].
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The current argument list.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Replaces the argument list.
    pub fn set_arguments(&mut self, args: Vec<String>) {
        self.arguments = args;
    }

    /// Appends the provided arguments to the current argument list.
    pub fn push_arguments<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments.extend(args.into_iter().map(Into::into));
    }

    /// The configured project directory, if any.
    pub fn project_dir(&self) -> Option<&Path> {
        self.project_dir.as_deref()
    }

    /// Sets the project directory the build runs in.
    pub fn set_project_dir(&mut self, dir: impl Into<PathBuf>) {
        self.project_dir = Some(dir.into());
    }

    /// Resolves a relative path against the project directory.
    pub fn resolve_from_project_dir(&self, other: &Path) -> Result<PathBuf, Error> {
        if other.is_absolute() {
            return Err(Error::InvalidArgument(format!(
                "path {} must not be absolute",
                other.display()
            )));
        }
        let project_dir = self.project_dir.as_ref().ok_or(Error::MissingProjectDir)?;
        Ok(project_dir.join(other))
    }

    /// Runs a scaffolding block against the project directory, which must
    /// already exist as a directory.
    pub fn setup_project_dir(
        &self,
        configure: impl FnOnce(&DirectoryContext) -> Result<(), Error>,
    ) -> Result<&Self, Error> {
        let project_dir = self.project_dir.as_ref().ok_or(Error::MissingProjectDir)?;
        let context = DirectoryContext::new(project_dir)?;
        configure(&context)?;
        Ok(self)
    }

    /// Executes the build, expecting it to succeed.
    pub fn build(&self) -> Result<BuildResult, Error> {
        let result = self.run()?;
        if !result.succeeded() {
            return Err(Error::UnexpectedBuildFailure(Box::new(result)));
        }
        Ok(result)
    }

    /// Executes the build, expecting it to fail.
    pub fn build_and_fail(&self) -> Result<BuildResult, Error> {
        let result = self.run()?;
        if result.succeeded() {
            return Err(Error::UnexpectedBuildSuccess(Box::new(result)));
        }
        Ok(result)
    }

    fn run(&self) -> Result<BuildResult, Error> {
        let project_dir = self.project_dir.clone().ok_or(Error::MissingProjectDir)?;

        let mut cmd = std::process::Command::new(&self.gradle_path);
        cmd.args(&self.arguments);
        cmd.current_dir(&project_dir);

        if let Some(environment) = &self.environment {
            cmd.env_clear();
            for (key, value) in environment {
                cmd.env(key, value);
            }
        }
        for (key, value) in &self.extra_env {
            cmd.env(key, value);
        }

        tracing::debug!(
            program = %self.gradle_path.display(),
            arguments = ?self.arguments,
            project_dir = %project_dir.display(),
            "invoking build"
        );

        let mut cmd = assert_cmd::Command::from_std(cmd);
        cmd.timeout(
            self.timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_IN_SECONDS)),
        );

        let start_time = std::time::Instant::now();
        let output = cmd.output()?;
        let duration = start_time.elapsed();

        tracing::debug!(?duration, status = ?output.status, "build finished");

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if self.forward_output {
            print!("{combined}");
        }

        Ok(BuildResult::from_output(
            project_dir,
            combined,
            output.status.success(),
        ))
    }
}
