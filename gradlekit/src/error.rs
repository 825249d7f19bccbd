use crate::result::BuildResult;
use std::path::PathBuf;

/// Monolithic error type for the harness.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A caller-supplied argument violated a precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A context was constructed for a path that is not the expected kind of
    /// node (or does not exist at all).
    #[error("expected a {expected} at {path}")]
    TypeMismatch {
        /// The offending path.
        path: PathBuf,
        /// The kind of node that was expected there.
        expected: &'static str,
    },

    /// An existing node was required but is absent or of the wrong kind.
    #[error("not found at {path}: {reason}")]
    NotFound {
        /// The offending path.
        path: PathBuf,
        /// Why resolution failed.
        reason: String,
    },

    /// A node was unexpectedly present at a path that was to be created.
    #[error("already exists at {path}: {reason}")]
    AlreadyExists {
        /// The offending path.
        path: PathBuf,
        /// Distinguishes a same-kind collision from a wrong-kind one.
        reason: String,
    },

    /// An operation needed the project directory but none was set.
    #[error("project directory must be set")]
    MissingProjectDir,

    /// A user principal could not be resolved.
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// A build that was expected to succeed exited with a failure.
    #[error("build failed unexpectedly; output:\n{}", .0.output())]
    UnexpectedBuildFailure(Box<BuildResult>),

    /// A build that was expected to fail exited successfully.
    #[error("build succeeded unexpectedly; output:\n{}", .0.output())]
    UnexpectedBuildSuccess(Box<BuildResult>),

    /// An I/O error occurred.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The build result carried by [`Error::UnexpectedBuildFailure`] and
    /// [`Error::UnexpectedBuildSuccess`], if any.
    pub fn build_result(&self) -> Option<&BuildResult> {
        match self {
            Self::UnexpectedBuildFailure(result) | Self::UnexpectedBuildSuccess(result) => {
                Some(result)
            }
            _ => None,
        }
    }
}
