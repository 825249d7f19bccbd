//! Declarative scaffolding for project directory trees.
//!
//! A [`DirectoryContext`] anchors a directory on disk and hands out typed
//! child contexts for files and nested directories, each resolved through a
//! [`FileAction`] policy (get, maybe-create, create). Operations mutate the
//! filesystem directly and immediately; there is no buffering or rollback.
//!
//! Contexts are only ever constructed over a path that currently is the
//! expected kind of node; symlinks are never followed for that check.

use crate::error::Error;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Attributes applied to a file or directory when a resolution policy
/// creates it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileAttrs {
    /// POSIX permission bits to create the node with. Applied on Unix;
    /// ignored elsewhere.
    pub mode: Option<u32>,
}

impl FileAttrs {
    /// Attributes carrying the provided POSIX permission bits.
    #[must_use]
    pub const fn with_mode(mode: u32) -> Self {
        Self { mode: Some(mode) }
    }
}

/// How a file or directory request reconciles with what already exists on
/// disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileAction {
    /// The node must already exist as the expected kind.
    Get,
    /// Use the node if present (and of the expected kind), otherwise create
    /// it with the given attributes.
    MaybeCreate(FileAttrs),
    /// Create the node with the given attributes; any existing node at the
    /// path is an error.
    Create(FileAttrs),
}

impl FileAction {
    /// [`FileAction::MaybeCreate`] with no creation attributes.
    #[must_use]
    pub fn maybe_create() -> Self {
        Self::MaybeCreate(FileAttrs::default())
    }

    /// [`FileAction::Create`] with no creation attributes.
    #[must_use]
    pub fn create() -> Self {
        Self::Create(FileAttrs::default())
    }
}

impl Default for FileAction {
    fn default() -> Self {
        Self::maybe_create()
    }
}

/// The result of rewriting one line of a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineEdit {
    /// Keep the original line text.
    Keep,
    /// Replace the line with the provided text.
    Replace(String),
}

/// Content to seed a file with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileContent {
    /// Leave the file's existing content untouched.
    Original,
    /// Replace the content with the UTF-8 bytes of the text.
    Text(String),
    /// Replace the content with the raw bytes.
    Bytes(Vec<u8>),
}

impl From<&str> for FileContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for FileContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<u8>> for FileContent {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// Attribute operations shared by file and directory contexts.
pub trait FileContext {
    /// The location of this context.
    fn path(&self) -> &Path;

    /// The node's last modified time.
    fn modified(&self) -> Result<SystemTime, Error> {
        Ok(self.path().symlink_metadata()?.modified()?)
    }

    /// Sets the node's last modified time.
    fn set_modified(&self, time: SystemTime) -> Result<(), Error> {
        let file = std::fs::File::options().read(true).open(self.path())?;
        file.set_times(std::fs::FileTimes::new().set_modified(time))?;
        Ok(())
    }

    /// Whether the node is hidden by the dot-file convention.
    fn is_hidden(&self) -> bool {
        self.path()
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.'))
    }

    /// The name of the user principal owning the node.
    #[cfg(unix)]
    fn owner(&self) -> Result<String, Error> {
        use std::os::unix::fs::MetadataExt;

        let uid = self.path().symlink_metadata()?.uid();
        let user =
            uzers::get_user_by_uid(uid).ok_or_else(|| Error::UnknownUser(format!("uid {uid}")))?;
        Ok(user.name().to_string_lossy().into_owned())
    }

    /// Makes the named user principal the owner of the node.
    #[cfg(unix)]
    fn set_owner(&self, user: &str) -> Result<(), Error> {
        let principal =
            uzers::get_user_by_name(user).ok_or_else(|| Error::UnknownUser(user.to_owned()))?;
        nix::unistd::chown(
            self.path(),
            Some(nix::unistd::Uid::from_raw(principal.uid())),
            None,
        )
        .map_err(std::io::Error::from)?;
        Ok(())
    }

    /// The node's POSIX permissions. Reads the node itself, never a symlink
    /// target.
    #[cfg(unix)]
    fn permissions(&self) -> Result<std::fs::Permissions, Error> {
        Ok(self.path().symlink_metadata()?.permissions())
    }

    /// Sets the node's POSIX permissions.
    #[cfg(unix)]
    fn set_permissions(&self, permissions: std::fs::Permissions) -> Result<(), Error> {
        std::fs::set_permissions(self.path(), permissions)?;
        Ok(())
    }
}

/// A context for a regular file.
#[derive(Clone, Debug)]
pub struct RegularFileContext {
    path: PathBuf,
}

impl FileContext for RegularFileContext {
    fn path(&self) -> &Path {
        &self.path
    }
}

impl RegularFileContext {
    /// Wraps a path that currently is a regular file.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        if !is_regular_file(&path) {
            return Err(Error::TypeMismatch {
                path,
                expected: "regular file",
            });
        }
        Ok(Self { path })
    }

    /// The contents of the file.
    pub fn content(&self) -> Result<Vec<u8>, Error> {
        Ok(std::fs::read(&self.path)?)
    }

    /// Fully overwrites the contents of the file.
    pub fn set_content(&self, content: impl AsRef<[u8]>) -> Result<(), Error> {
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Size of the file in bytes.
    pub fn size(&self) -> Result<u64, Error> {
        Ok(self.path.symlink_metadata()?.len())
    }

    /// Appends the provided bytes to the file.
    pub fn append(&self, content: impl AsRef<[u8]>) -> Result<(), Error> {
        use std::io::Write;

        let mut file = std::fs::File::options().append(true).open(&self.path)?;
        file.write_all(content.as_ref())?;
        Ok(())
    }

    /// Appends the UTF-8 bytes of the provided text to the file.
    pub fn append_text(&self, content: &str) -> Result<(), Error> {
        self.append(content.as_bytes())
    }

    /// Appends a newline to the file.
    pub fn append_newline(&self) -> Result<(), Error> {
        self.append(b"\n")
    }

    /// Rewrites the file line by line.
    ///
    /// `rewrite` is invoked with each line's 1-based number and text and
    /// returns a [`LineEdit`]; [`LineEdit::Keep`] preserves the original
    /// line. The whole file is read, transformed, and written back: input
    /// lines are split on `\n` with a trailing `\r` stripped, and the output
    /// is joined with `\n` plus a single trailing newline when non-empty.
    pub fn replace_each_line(
        &self,
        mut rewrite: impl FnMut(usize, &str) -> LineEdit,
    ) -> Result<(), Error> {
        let text = std::fs::read_to_string(&self.path)?;
        let mut lines = Vec::new();
        for (index, line) in text.lines().enumerate() {
            match rewrite(index + 1, line) {
                LineEdit::Keep => lines.push(line.to_owned()),
                LineEdit::Replace(replacement) => lines.push(replacement),
            }
        }

        let mut updated = lines.join("\n");
        if !updated.is_empty() {
            updated.push('\n');
        }
        self.set_content(updated)
    }
}

/// A context for a directory.
#[derive(Clone, Debug)]
pub struct DirectoryContext {
    path: PathBuf,
}

impl FileContext for DirectoryContext {
    fn path(&self) -> &Path {
        &self.path
    }
}

impl DirectoryContext {
    /// Wraps a path that currently is a directory.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        if !is_directory(&path) {
            return Err(Error::TypeMismatch {
                path,
                expected: "directory",
            });
        }
        Ok(Self { path })
    }

    /// Resolves a regular file under this directory per the given policy.
    pub fn file(
        &self,
        name: impl AsRef<Path>,
        action: FileAction,
    ) -> Result<RegularFileContext, Error> {
        self.file_with(name, action, |_| Ok(()))
    }

    /// Resolves a regular file under this directory per the given policy,
    /// then runs `configure` against it.
    pub fn file_with(
        &self,
        name: impl AsRef<Path>,
        action: FileAction,
        configure: impl FnOnce(&RegularFileContext) -> Result<(), Error>,
    ) -> Result<RegularFileContext, Error> {
        let target = self.path.join(name.as_ref());
        let context = match action {
            FileAction::Get => {
                if !is_regular_file(&target) {
                    return Err(Error::NotFound {
                        path: target,
                        reason: "no regular file exists here".to_owned(),
                    });
                }
                RegularFileContext::new(target)?
            }
            FileAction::MaybeCreate(attrs) => {
                if exists_no_follow(&target) {
                    if !is_regular_file(&target) {
                        return Err(file_collision(target));
                    }
                    RegularFileContext::new(target)?
                } else {
                    create_regular_file(&target, &attrs)?;
                    RegularFileContext::new(target)?
                }
            }
            FileAction::Create(attrs) => {
                create_regular_file(&target, &attrs)?;
                RegularFileContext::new(target)?
            }
        };

        configure(&context)?;
        Ok(context)
    }

    /// Resolves a directory under this directory per the given policy.
    ///
    /// The creating policies create the full chain of missing intermediate
    /// directories; [`FileAction::Create`] still fails if the terminal path
    /// already exists as anything.
    pub fn directory(
        &self,
        path: impl AsRef<Path>,
        action: FileAction,
    ) -> Result<Self, Error> {
        self.directory_with(path, action, |_| Ok(()))
    }

    /// Resolves a directory under this directory per the given policy, then
    /// runs `configure` against it.
    pub fn directory_with(
        &self,
        path: impl AsRef<Path>,
        action: FileAction,
        configure: impl FnOnce(&Self) -> Result<(), Error>,
    ) -> Result<Self, Error> {
        let target = self.path.join(path.as_ref());
        let context = match action {
            FileAction::Get => {
                if !is_directory(&target) {
                    return Err(Error::NotFound {
                        path: target,
                        reason: "no directory exists here".to_owned(),
                    });
                }
                Self::new(target)?
            }
            FileAction::MaybeCreate(attrs) => {
                if exists_no_follow(&target) {
                    if !is_directory(&target) {
                        return Err(directory_collision(target));
                    }
                    Self::new(target)?
                } else {
                    create_directories(&target, &attrs)?;
                    Self::new(target)?
                }
            }
            FileAction::Create(attrs) => {
                if exists_no_follow(&target) {
                    return Err(directory_collision(target));
                }
                create_directories(&target, &attrs)?;
                Self::new(target)?
            }
        };

        configure(&context)?;
        Ok(context)
    }

    /// Descends into a child directory, creating it if absent.
    pub fn child(&self, path: impl AsRef<Path>) -> Result<Self, Error> {
        self.directory(path, FileAction::maybe_create())
    }

    /// Descends into a child directory, creating it if absent, and runs
    /// `configure` against it.
    pub fn child_with(
        &self,
        path: impl AsRef<Path>,
        configure: impl FnOnce(&Self) -> Result<(), Error>,
    ) -> Result<Self, Error> {
        self.directory_with(path, FileAction::maybe_create(), configure)
    }

    /// Runs `configure` against this context and returns it, for chaining
    /// sibling declarations under one block.
    pub fn apply(
        &self,
        configure: impl FnOnce(&Self) -> Result<(), Error>,
    ) -> Result<&Self, Error> {
        configure(self)?;
        Ok(self)
    }

    /// Resolves a regular file per the given policy and seeds its content.
    ///
    /// [`FileContent::Original`] leaves existing content untouched; the other
    /// variants fully overwrite the file.
    pub fn write_file(
        &self,
        name: impl AsRef<Path>,
        action: FileAction,
        content: impl Into<FileContent>,
    ) -> Result<RegularFileContext, Error> {
        let content = content.into();
        self.file_with(name, action, |file| match &content {
            FileContent::Original => Ok(()),
            FileContent::Text(text) => file.set_content(text.as_bytes()),
            FileContent::Bytes(bytes) => file.set_content(bytes),
        })
    }
}

fn is_regular_file(path: &Path) -> bool {
    path.symlink_metadata()
        .is_ok_and(|metadata| metadata.file_type().is_file())
}

fn is_directory(path: &Path) -> bool {
    path.symlink_metadata()
        .is_ok_and(|metadata| metadata.file_type().is_dir())
}

fn exists_no_follow(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

fn file_collision(path: PathBuf) -> Error {
    let reason = if is_regular_file(&path) {
        "a regular file is already present".to_owned()
    } else {
        "a different kind of node is already present".to_owned()
    };
    Error::AlreadyExists { path, reason }
}

fn directory_collision(path: PathBuf) -> Error {
    let reason = if is_directory(&path) {
        "a directory is already present".to_owned()
    } else {
        "a different kind of node is already present".to_owned()
    };
    Error::AlreadyExists { path, reason }
}

fn create_regular_file(path: &Path, attrs: &FileAttrs) -> Result<(), Error> {
    let mut options = std::fs::File::options();
    options.write(true).create_new(true);
    #[cfg(unix)]
    if let Some(mode) = attrs.mode {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }

    match options.open(path) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            Err(file_collision(path.to_path_buf()))
        }
        Err(err) => Err(err.into()),
    }
}

fn create_directories(path: &Path, attrs: &FileAttrs) -> Result<(), Error> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    if let Some(mode) = attrs.mode {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }

    builder.create(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    fn scratch_dir() -> (assert_fs::TempDir, DirectoryContext) {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let context = DirectoryContext::new(temp_dir.path()).unwrap();
        (temp_dir, context)
    }

    #[test]
    fn test_regular_file_context_requires_regular_file() {
        let (temp_dir, dir) = scratch_dir();
        assert!(matches!(
            RegularFileContext::new(temp_dir.path()),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            RegularFileContext::new(temp_dir.path().join("missing")),
            Err(Error::TypeMismatch { .. })
        ));

        let file = dir.file("a.txt", FileAction::create()).unwrap();
        assert!(RegularFileContext::new(file.path()).is_ok());
    }

    #[test]
    fn test_create_file_fails_on_second_create() {
        let (_temp_dir, dir) = scratch_dir();
        dir.file("a.txt", FileAction::create()).unwrap();

        let err = dir.file("a.txt", FileAction::create()).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));

        let retrieved = dir.file("a.txt", FileAction::Get).unwrap();
        assert_eq!(retrieved.path(), dir.path().join("a.txt"));
    }

    #[test]
    fn test_get_missing_file_is_not_found() {
        let (_temp_dir, dir) = scratch_dir();
        assert!(matches!(
            dir.file("missing.txt", FileAction::Get),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            dir.directory("missing", FileAction::Get),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_maybe_create_rejects_wrong_kind() {
        let (_temp_dir, dir) = scratch_dir();
        dir.child("node").unwrap();
        assert!(matches!(
            dir.file("node", FileAction::maybe_create()),
            Err(Error::AlreadyExists { .. })
        ));

        dir.file("leaf", FileAction::create()).unwrap();
        assert!(matches!(
            dir.directory("leaf", FileAction::maybe_create()),
            Err(Error::AlreadyExists { .. })
        ));
    }

    #[test]
    fn test_nested_directory_maybe_create_is_repeatable() {
        let (_temp_dir, dir) = scratch_dir();
        let nested = dir.directory("x/y/z", FileAction::maybe_create()).unwrap();
        assert_eq!(nested.path(), dir.path().join("x/y/z"));

        let again = dir.directory("x/y/z", FileAction::maybe_create()).unwrap();
        assert_eq!(again.path(), nested.path());
    }

    #[test]
    fn test_create_directory_fails_when_present() {
        let (_temp_dir, dir) = scratch_dir();
        dir.directory("x", FileAction::create()).unwrap();
        assert!(matches!(
            dir.directory("x", FileAction::create()),
            Err(Error::AlreadyExists { .. })
        ));
    }

    #[test]
    fn test_content_round_trip() {
        let (_temp_dir, dir) = scratch_dir();
        let file = dir.file("a.txt", FileAction::create()).unwrap();

        file.set_content(b"hello").unwrap();
        assert_eq!(file.content().unwrap(), b"hello");
        assert_eq!(file.size().unwrap(), 5);
    }

    #[test]
    fn test_append_preserves_existing_content() {
        let (_temp_dir, dir) = scratch_dir();
        let file = dir.file("a.txt", FileAction::create()).unwrap();

        file.set_content(b"ab").unwrap();
        file.append(b"cd").unwrap();
        file.append_text("ef").unwrap();
        file.append_newline().unwrap();
        assert_eq!(file.content().unwrap(), b"abcdef\n");
    }

    #[test]
    fn test_replace_each_line_keep_is_byte_identical() {
        let (_temp_dir, dir) = scratch_dir();
        let file = dir.file("a.txt", FileAction::create()).unwrap();
        file.set_content(b"first\nsecond\nthird\n").unwrap();

        file.replace_each_line(|_, _| LineEdit::Keep).unwrap();
        assert_eq!(file.content().unwrap(), b"first\nsecond\nthird\n");
    }

    #[test]
    fn test_replace_each_line_uses_one_based_numbering() {
        let (_temp_dir, dir) = scratch_dir();
        let file = dir.file("a.txt", FileAction::create()).unwrap();
        file.set_content(b"first\nsecond\nthird\n").unwrap();

        let mut seen = Vec::new();
        file.replace_each_line(|number, line| {
            seen.push((number, line.to_owned()));
            if number == 2 {
                LineEdit::Replace("changed".to_owned())
            } else {
                LineEdit::Keep
            }
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![
                (1, "first".to_owned()),
                (2, "second".to_owned()),
                (3, "third".to_owned())
            ]
        );
        assert_eq!(file.content().unwrap(), b"first\nchanged\nthird\n");
    }

    #[test]
    fn test_replace_each_line_normalizes_crlf() {
        let (_temp_dir, dir) = scratch_dir();
        let file = dir.file("a.txt", FileAction::create()).unwrap();
        file.set_content(b"first\r\nsecond").unwrap();

        file.replace_each_line(|_, _| LineEdit::Keep).unwrap();
        assert_eq!(file.content().unwrap(), b"first\nsecond\n");
    }

    #[test]
    fn test_write_file_content_variants() {
        let (_temp_dir, dir) = scratch_dir();
        dir.write_file("a.txt", FileAction::create(), "seeded")
            .unwrap();

        let unchanged = dir
            .write_file("a.txt", FileAction::maybe_create(), FileContent::Original)
            .unwrap();
        assert_eq!(unchanged.content().unwrap(), b"seeded");

        let replaced = dir
            .write_file("a.txt", FileAction::maybe_create(), vec![1u8, 2, 3])
            .unwrap();
        assert_eq!(replaced.content().unwrap(), [1, 2, 3]);
    }

    #[test]
    fn test_descend_and_apply_chaining() {
        let (_temp_dir, dir) = scratch_dir();
        dir.child_with("src", |src| {
            src.apply(|s| {
                s.write_file("main.rs", FileAction::create(), "fn main() {}\n")?;
                Ok(())
            })?;
            src.child("nested")?;
            Ok(())
        })
        .unwrap();

        let nested = dir.directory("src/nested", FileAction::Get).unwrap();
        assert_eq!(nested.path(), dir.path().join("src/nested"));
        let main = dir.child("src").unwrap().file("main.rs", FileAction::Get).unwrap();
        assert_eq!(main.content().unwrap(), b"fn main() {}\n");
    }

    #[test]
    fn test_is_hidden() {
        let (_temp_dir, dir) = scratch_dir();
        let hidden = dir.file(".hidden", FileAction::create()).unwrap();
        let visible = dir.file("visible", FileAction::create()).unwrap();
        assert!(hidden.is_hidden());
        assert!(!visible.is_hidden());
    }

    #[test]
    fn test_modified_round_trip() {
        let (_temp_dir, dir) = scratch_dir();
        let file = dir.file("a.txt", FileAction::create()).unwrap();

        let timestamp = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000_000);
        file.set_modified(timestamp).unwrap();
        assert_eq!(file.modified().unwrap(), timestamp);

        let timestamp = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_500_000_000);
        dir.set_modified(timestamp).unwrap();
        assert_eq!(dir.modified().unwrap(), timestamp);
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_round_trip() {
        use std::os::unix::fs::PermissionsExt;

        let (_temp_dir, dir) = scratch_dir();
        let file = dir.file("a.txt", FileAction::create()).unwrap();

        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .unwrap();
        assert_eq!(file.permissions().unwrap().mode() & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_create_with_mode() {
        use std::os::unix::fs::PermissionsExt;

        let (_temp_dir, dir) = scratch_dir();
        let file = dir
            .file("a.txt", FileAction::Create(FileAttrs::with_mode(0o600)))
            .unwrap();
        assert_eq!(file.permissions().unwrap().mode() & 0o777, 0o600);

        let nested = dir
            .directory("x/y", FileAction::MaybeCreate(FileAttrs::with_mode(0o700)))
            .unwrap();
        assert_eq!(nested.permissions().unwrap().mode() & 0o777, 0o700);
    }

    #[cfg(unix)]
    #[test]
    fn test_owner_lookup() {
        let (_temp_dir, dir) = scratch_dir();
        let file = dir.file("a.txt", FileAction::create()).unwrap();

        let current = uzers::get_user_by_uid(uzers::get_current_uid())
            .map(|user| user.name().to_string_lossy().into_owned())
            .unwrap();
        assert_eq!(file.owner().unwrap(), current);

        // Re-assigning the current owner needs no privileges.
        file.set_owner(&current).unwrap();
        assert_eq!(file.owner().unwrap(), current);

        assert!(matches!(
            file.set_owner("no-such-user-gradlekit"),
            Err(Error::UnknownUser(_))
        ));
    }
}
