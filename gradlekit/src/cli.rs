//! Editing helpers for a build's command-line argument list, along with typed
//! option accessors for [`GradleRunner`].
//!
//! The argument list is an ordered sequence of string tokens. Three token
//! conventions are supported: bare flags (`--build-cache`), single-valued
//! options (`--max-workers 4`), and repeatable key/value options
//! (`--init-script a.gradle --init-script b.gradle`). All editing functions
//! are pure: they take a slice and return a new vector, leaving the relative
//! order and content of unrelated tokens untouched.

use crate::runner::GradleRunner;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Whether `flag` occurs in `args`.
pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}

/// Ensures the presence or absence of a bare flag token.
///
/// Enabling is idempotent: the flag is appended only when not already
/// present. Disabling removes every occurrence equal to the token.
pub fn set_flag(args: &[String], flag: &str, enabled: bool) -> Vec<String> {
    if enabled {
        let mut updated = args.to_vec();
        if !has_flag(args, flag) {
            updated.push(flag.to_owned());
        }
        updated
    } else {
        args.iter()
            .filter(|arg| arg.as_str() != flag)
            .cloned()
            .collect()
    }
}

/// The value token immediately following the first occurrence of `option`,
/// or `None` if the option is absent.
///
/// An option name appearing as the final token with no value after it is
/// treated as absent.
pub fn single_value_option<'a>(args: &'a [String], option: &str) -> Option<&'a str> {
    let position = args.iter().position(|arg| arg == option)?;
    args.get(position + 1).map(String::as_str)
}

/// Sets, replaces, or removes a single-valued option.
///
/// A single left-to-right scan finds the first occurrence of `option`; that
/// occurrence and its value token are removed as a unit (stray later
/// occurrences are left untouched). When `value` is `Some`, the new
/// `[option, value]` pair is appended at the end.
pub fn set_single_value_option(args: &[String], option: &str, value: Option<&str>) -> Vec<String> {
    let mut updated = args.to_vec();
    if let Some(position) = updated.iter().position(|arg| arg == option) {
        let end = (position + 2).min(updated.len());
        updated.drain(position..end);
    }
    if let Some(value) = value {
        updated.push(option.to_owned());
        updated.push(value.to_owned());
    }
    updated
}

/// All value tokens following occurrences of the repeatable `option`, in
/// order.
///
/// Pairs are consumed greedily two tokens at a time: a token equal to
/// `option` that was already consumed as a preceding occurrence's value is
/// not reinterpreted as a new key.
pub fn repeatable_option_values(args: &[String], option: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut tokens = args.iter();
    while let Some(token) = tokens.next() {
        if token == option {
            if let Some(value) = tokens.next() {
                values.push(value.clone());
            }
        }
    }
    values
}

/// Replaces the full set of occurrences of a repeatable option.
///
/// Every existing `[option, value]` pair is removed (greedy two-token
/// consumption, as in [`repeatable_option_values`]), then one pair per entry
/// of `values` is appended in order. An empty `values` clears the option.
pub fn set_repeatable_option(args: &[String], option: &str, values: &[String]) -> Vec<String> {
    let mut updated = Vec::with_capacity(args.len() + values.len() * 2);
    let mut tokens = args.iter();
    while let Some(token) = tokens.next() {
        if token == option {
            tokens.next();
        } else {
            updated.push(token.clone());
        }
    }
    for value in values {
        updated.push(option.to_owned());
        updated.push(value.clone());
    }
    updated
}

/// Assembles a map-shaped repeatable option.
///
/// Each value token is split on the first `=` only; a value with no `=` maps
/// to `None`. Duplicate keys are last-write-wins while keeping first-seen
/// insertion order.
pub fn map_option(args: &[String], option: &str) -> IndexMap<String, Option<String>> {
    let mut entries = IndexMap::new();
    for value in repeatable_option_values(args, option) {
        match value.split_once('=') {
            Some((key, value)) => entries.insert(key.to_owned(), Some(value.to_owned())),
            None => entries.insert(value, None),
        };
    }
    entries
}

/// Replaces the full set of occurrences of a map-shaped repeatable option.
///
/// Each `(key, None)` entry becomes the pair `[option, key]`; each
/// `(key, Some(value))` entry becomes `[option, key=value]`.
pub fn set_map_option(
    args: &[String],
    option: &str,
    entries: &IndexMap<String, Option<String>>,
) -> Vec<String> {
    let mut updated = set_repeatable_option(args, option, &[]);
    for (key, value) in entries {
        updated.push(option.to_owned());
        updated.push(match value {
            Some(value) => format!("{key}={value}"),
            None => key.clone(),
        });
    }
    updated
}

macro_rules! flag_property {
    ($getter:ident, $setter:ident, $token:literal) => {
        #[doc = concat!("Whether the `", $token, "` flag is present in the arguments.")]
        pub fn $getter(&self) -> bool {
            has_flag(self.arguments(), $token)
        }

        #[doc = concat!("Adds or removes the `", $token, "` flag.")]
        pub fn $setter(&mut self, enabled: bool) {
            let updated = set_flag(self.arguments(), $token, enabled);
            self.set_arguments(updated);
        }
    };
}

macro_rules! path_value_property {
    ($getter:ident, $setter:ident, $token:literal) => {
        #[doc = concat!("The value of the `", $token, "` option, if present.")]
        pub fn $getter(&self) -> Option<PathBuf> {
            single_value_option(self.arguments(), $token).map(PathBuf::from)
        }

        #[doc = concat!("Sets or clears the `", $token, "` option.")]
        pub fn $setter(&mut self, path: Option<&Path>) {
            let value = path.map(|p| p.to_string_lossy().into_owned());
            let updated = set_single_value_option(self.arguments(), $token, value.as_deref());
            self.set_arguments(updated);
        }
    };
}

macro_rules! repeatable_path_property {
    ($getter:ident, $setter:ident, $token:literal) => {
        #[doc = concat!("The values of the `", $token, "` options, in order.")]
        pub fn $getter(&self) -> Vec<PathBuf> {
            repeatable_option_values(self.arguments(), $token)
                .into_iter()
                .map(PathBuf::from)
                .collect()
        }

        #[doc = concat!("Replaces all `", $token, "` options with the provided paths.")]
        pub fn $setter(&mut self, paths: &[PathBuf]) {
            let values: Vec<String> = paths
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            let updated = set_repeatable_option(self.arguments(), $token, &values);
            self.set_arguments(updated);
        }
    };
}

macro_rules! map_property {
    ($getter:ident, $setter:ident, $token:literal) => {
        #[doc = concat!("The `", $token, "` properties as a key/value mapping.")]
        pub fn $getter(&self) -> IndexMap<String, Option<String>> {
            map_option(self.arguments(), $token)
        }

        #[doc = concat!("Replaces all `", $token, "` properties with the provided entries.")]
        pub fn $setter(&mut self, entries: &IndexMap<String, Option<String>>) {
            let updated = set_map_option(self.arguments(), $token, entries);
            self.set_arguments(updated);
        }
    };
}

impl GradleRunner {
    flag_property!(build_cache_enabled, set_build_cache_enabled, "--build-cache");
    flag_property!(
        build_cache_disabled,
        set_build_cache_disabled,
        "--no-build-cache"
    );
    flag_property!(
        configure_on_demand,
        set_configure_on_demand,
        "--configure-on-demand"
    );
    flag_property!(
        continue_after_failure,
        set_continue_after_failure,
        "--continue"
    );
    flag_property!(quiet, set_quiet, "--quiet");
    flag_property!(stacktrace, set_stacktrace, "--stacktrace");
    flag_property!(full_stacktrace, set_full_stacktrace, "--full-stacktrace");
    flag_property!(info, set_info, "--info");
    flag_property!(dry_run, set_dry_run, "--dry-run");
    flag_property!(debug, set_debug, "--debug");
    flag_property!(warn, set_warn, "--warn");
    flag_property!(build_scan_enabled, set_build_scan_enabled, "--scan");
    flag_property!(build_scan_disabled, set_build_scan_disabled, "--no-scan");
    flag_property!(offline, set_offline, "--offline");
    flag_property!(parallel, set_parallel, "--parallel");
    flag_property!(no_parallel, set_no_parallel, "--no-parallel");
    flag_property!(profile, set_profile, "--profile");
    flag_property!(
        refresh_dependencies,
        set_refresh_dependencies,
        "--refresh-dependencies"
    );
    flag_property!(rerun_tasks, set_rerun_tasks, "--rerun-tasks");

    path_value_property!(build_file, set_build_file, "--build-file");
    path_value_property!(
        project_cache_dir,
        set_project_cache_dir,
        "--project-cache-dir"
    );
    path_value_property!(settings_file, set_settings_file, "--settings-file");

    repeatable_path_property!(init_scripts, set_init_scripts, "--init-script");
    repeatable_path_property!(included_builds, set_included_builds, "--include-build");

    map_property!(system_properties, set_system_properties, "--system-prop");
    map_property!(project_properties, set_project_properties, "--project-prop");

    /// The value of the `--max-workers` option, if present and numeric.
    pub fn max_workers(&self) -> Option<u32> {
        single_value_option(self.arguments(), "--max-workers").and_then(|v| v.parse().ok())
    }

    /// Sets or clears the `--max-workers` option.
    pub fn set_max_workers(&mut self, count: Option<u32>) {
        let value = count.map(|c| c.to_string());
        let updated = set_single_value_option(self.arguments(), "--max-workers", value.as_deref());
        self.set_arguments(updated);
    }

    /// The values of the `--exclude-task` options, in order.
    pub fn excluded_tasks(&self) -> Vec<String> {
        repeatable_option_values(self.arguments(), "--exclude-task")
    }

    /// Replaces all `--exclude-task` options with the provided task names.
    pub fn set_excluded_tasks(&mut self, tasks: &[String]) {
        let updated = set_repeatable_option(self.arguments(), "--exclude-task", tasks);
        self.set_arguments(updated);
    }
}
