use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use gitlab::api::ApiError;
use gitlab::{GitlabError, GroupId, RestError};
use thiserror::Error;

/// Errors that abort a mirror run.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("failed to connect to GitLab: {0}")]
    Connect(#[from] GitlabError),

    #[error("GitLab API request failed: {0}")]
    Api(#[from] ApiError<RestError>),

    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn git {command}: {source}")]
    GitSpawn {
        command: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("git {command} for {} failed ({status})", .path.display())]
    Git {
        command: &'static str,
        path: PathBuf,
        status: ExitStatus,
    },

    #[error("git {command} for {} timed out after {}s", .path.display(), .timeout.as_secs())]
    GitTimeout {
        command: &'static str,
        path: PathBuf,
        timeout: Duration,
    },
}

/// A subgroup names a parent that is not in the group listing.
///
/// Only the affected subgroup is skipped; the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parent group with ID {parent_id} not found.")]
pub struct ParentNotFound {
    pub parent_id: GroupId,
}
