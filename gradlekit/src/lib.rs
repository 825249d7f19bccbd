//! Test harness library for driving Gradle builds from Rust integration
//! tests.
//!
//! The harness has three parts that compose into one workflow:
//!
//! 1. **Argument editing** ([`cli`]): pure helpers over an ordered token
//!    list, surfaced as typed per-option accessors on [`GradleRunner`]
//!    (flags, single-valued options, repeatable options, map-shaped
//!    properties).
//! 2. **Project scaffolding** ([`fs`]): a declarative builder for the
//!    temporary project tree — nested files and directories, content,
//!    permissions, timestamps — resolved through get/maybe-create/create
//!    policies.
//! 3. **Execution and inspection** ([`GradleRunner`], [`BuildResult`]): the
//!    runner spawns the build with the assembled arguments in the scaffolded
//!    directory and surfaces per-task outcomes from the captured output.

mod config;
mod error;
mod result;
mod runner;

pub mod cli;
pub mod fs;

pub use config::{
    EnvPropertySource, LOG_LEVEL_VAR, LogLevelOption, PropertySource, RunnerConfig,
    STACKTRACE_VAR, StacktraceOption,
};
pub use error::Error;
pub use fs::{
    DirectoryContext, FileAction, FileAttrs, FileContent, FileContext, LineEdit,
    RegularFileContext,
};
pub use result::{BuildResult, BuildTask, TaskOutcome};
pub use runner::{DEFAULT_TIMEOUT_IN_SECONDS, GradleRunner};
