//! Inspection of a finished build: per-task outcomes and captured output.

use indexmap::IndexMap;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// How a single task concluded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString)]
pub enum TaskOutcome {
    /// The task executed and succeeded.
    #[strum(serialize = "SUCCESS")]
    Success,
    /// The task executed and failed.
    #[strum(serialize = "FAILED")]
    Failed,
    /// The task's outputs were already up to date.
    #[strum(serialize = "UP-TO-DATE")]
    UpToDate,
    /// The task was skipped.
    #[strum(serialize = "SKIPPED")]
    Skipped,
    /// The task had no source to operate on.
    #[strum(serialize = "NO-SOURCE")]
    NoSource,
    /// The task's outputs were loaded from the build cache.
    #[strum(serialize = "FROM-CACHE")]
    FromCache,
}

/// The result of a single task in a build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildTask {
    path: String,
    outcome: TaskOutcome,
}

impl BuildTask {
    /// The task's path (e.g. `:app:compileJava`).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The task's outcome.
    pub const fn outcome(&self) -> TaskOutcome {
        self.outcome
    }

    /// Whether the outcome is [`TaskOutcome::Success`].
    pub fn is_success(&self) -> bool {
        self.outcome == TaskOutcome::Success
    }

    /// Whether the outcome is [`TaskOutcome::Failed`].
    pub fn is_failed(&self) -> bool {
        self.outcome == TaskOutcome::Failed
    }

    /// Whether the outcome is [`TaskOutcome::UpToDate`].
    pub fn is_up_to_date(&self) -> bool {
        self.outcome == TaskOutcome::UpToDate
    }

    /// Whether the outcome is [`TaskOutcome::Skipped`].
    pub fn is_skipped(&self) -> bool {
        self.outcome == TaskOutcome::Skipped
    }

    /// Whether the outcome is [`TaskOutcome::NoSource`].
    pub fn is_no_source(&self) -> bool {
        self.outcome == TaskOutcome::NoSource
    }

    /// Whether the outcome is [`TaskOutcome::FromCache`].
    pub fn is_from_cache(&self) -> bool {
        self.outcome == TaskOutcome::FromCache
    }
}

impl std::fmt::Display for BuildTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.path, self.outcome)
    }
}

/// The result of a build invocation.
#[derive(Clone, Debug)]
pub struct BuildResult {
    project_dir: PathBuf,
    output: String,
    tasks: Vec<BuildTask>,
    success: bool,
}

static TASK_LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^> Task (?<path>:\S+)(?: (?<outcome>[A-Z-]+))?\s*$")
        .expect("task line pattern compiles")
});

impl BuildResult {
    pub(crate) fn from_output(project_dir: PathBuf, output: String, success: bool) -> Self {
        let tasks = parse_task_lines(&output);
        Self {
            project_dir,
            output,
            tasks,
            success,
        }
    }

    /// The project directory the build ran in.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// The combined captured output of the build.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Whether the build process exited successfully.
    pub const fn succeeded(&self) -> bool {
        self.success
    }

    /// All reported tasks, in the order the build reported them.
    pub fn tasks(&self) -> &[BuildTask] {
        &self.tasks
    }

    /// The result for the task at `task_path`, or `None` if it was not part
    /// of the build.
    pub fn task(&self, task_path: &str) -> Option<&BuildTask> {
        self.tasks.iter().find(|task| task.path == task_path)
    }

    /// The subset of tasks that concluded with `outcome`, in order.
    pub fn tasks_with_outcome(&self, outcome: TaskOutcome) -> Vec<&BuildTask> {
        self.tasks
            .iter()
            .filter(|task| task.outcome == outcome)
            .collect()
    }

    /// The paths of the tasks that concluded with `outcome`, in order.
    pub fn task_paths(&self, outcome: TaskOutcome) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|task| task.outcome == outcome)
            .map(|task| task.path.clone())
            .collect()
    }
}

/// Collects per-task outcomes from the build's console output.
///
/// Task report lines have the shape `> Task :path [OUTCOME]`, with a missing
/// outcome suffix meaning the task executed successfully. A task re-reported
/// later in the output keeps its first-seen position but takes the last
/// reported outcome.
fn parse_task_lines(output: &str) -> Vec<BuildTask> {
    let mut outcomes: IndexMap<String, TaskOutcome> = IndexMap::new();
    for line in output.lines() {
        let Some(captures) = TASK_LINE_PATTERN.captures(line) else {
            continue;
        };
        let Some(path) = captures.name("path") else {
            continue;
        };

        let outcome = match captures.name("outcome") {
            Some(suffix) => match suffix.as_str().parse() {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!(line, "ignoring task line with unrecognized outcome");
                    continue;
                }
            },
            None => TaskOutcome::Success,
        };

        outcomes.insert(path.as_str().to_owned(), outcome);
    }

    outcomes
        .into_iter()
        .map(|(path, outcome)| BuildTask { path, outcome })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE_OUTPUT: &str = "\
> Task :compileJava
> Task :processResources NO-SOURCE
> Task :classes UP-TO-DATE
> Task :jar FROM-CACHE
> Task :javadoc SKIPPED
> Task :check FAILED

BUILD FAILED in 2s
";

    #[test]
    fn test_outcome_vocabulary_round_trips() {
        for (text, outcome) in [
            ("SUCCESS", TaskOutcome::Success),
            ("FAILED", TaskOutcome::Failed),
            ("UP-TO-DATE", TaskOutcome::UpToDate),
            ("SKIPPED", TaskOutcome::Skipped),
            ("NO-SOURCE", TaskOutcome::NoSource),
            ("FROM-CACHE", TaskOutcome::FromCache),
        ] {
            assert_eq!(outcome.to_string(), text);
            assert_eq!(text.parse::<TaskOutcome>().unwrap(), outcome);
        }
    }

    #[test]
    fn test_parse_task_lines() {
        let tasks = parse_task_lines(SAMPLE_OUTPUT);
        let reported: Vec<(&str, TaskOutcome)> = tasks
            .iter()
            .map(|task| (task.path(), task.outcome()))
            .collect();
        assert_eq!(
            reported,
            vec![
                (":compileJava", TaskOutcome::Success),
                (":processResources", TaskOutcome::NoSource),
                (":classes", TaskOutcome::UpToDate),
                (":jar", TaskOutcome::FromCache),
                (":javadoc", TaskOutcome::Skipped),
                (":check", TaskOutcome::Failed),
            ]
        );
    }

    #[test]
    fn test_parse_task_lines_deduplicates_last_wins() {
        let output = "> Task :a\n> Task :b\n> Task :a UP-TO-DATE\n";
        let tasks = parse_task_lines(output);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].path(), ":a");
        assert_eq!(tasks[0].outcome(), TaskOutcome::UpToDate);
        assert_eq!(tasks[1].path(), ":b");
    }

    #[test]
    fn test_parse_ignores_non_task_lines() {
        let output = "Starting a Gradle Daemon\n> Task :a\nSome > Task :b noise\n";
        let tasks = parse_task_lines(output);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].path(), ":a");
    }

    #[test]
    fn test_build_result_queries() {
        let result = BuildResult::from_output(
            PathBuf::from("/tmp/project"),
            SAMPLE_OUTPUT.to_owned(),
            false,
        );

        assert!(!result.succeeded());
        assert_eq!(result.tasks().len(), 6);
        assert!(result.task(":compileJava").unwrap().is_success());
        assert!(result.task(":jar").unwrap().is_from_cache());
        assert!(result.task(":missing").is_none());
        assert_eq!(
            result.task_paths(TaskOutcome::Failed),
            vec![":check".to_owned()]
        );
        assert_eq!(result.tasks_with_outcome(TaskOutcome::UpToDate).len(), 1);
        assert_eq!(
            result.task(":check").unwrap().to_string(),
            ":check (FAILED)"
        );
    }
}
