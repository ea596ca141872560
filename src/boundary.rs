use std::fmt;

/// Non-fatal conditions met while reading or moving tags.
/// These are reported to the user but do not fail the command.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// No version tag exists yet; the configured default is used
    NoVersionTag { default_version: String },
    /// Tag looks like a version tag but cannot be parsed
    UnparsableTag { tag: String, reason: String },
    /// A movable tag was pointing somewhere else before this run
    TagMoved {
        tag: String,
        from_commit: String,
        to_commit: String,
    },
    /// Both stability tags now point at the same commit
    StabilityConflict {
        tag: String,
        other: String,
        commit: String,
    },
    /// Push skipped because the remote is not configured
    RemoteMissing { remote: String },
}

fn short(hash: &str) -> &str {
    if hash.len() > 7 {
        &hash[..7]
    } else {
        hash
    }
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NoVersionTag { default_version } => {
                write!(
                    f,
                    "No version tags found, starting from {}",
                    default_version
                )
            }
            BoundaryWarning::UnparsableTag { tag, reason } => {
                write!(f, "Ignoring tag '{}': {}", tag, reason)
            }
            BoundaryWarning::TagMoved {
                tag,
                from_commit,
                to_commit,
            } => {
                write!(
                    f,
                    "Tag '{}' moved from {} to {}",
                    tag,
                    short(from_commit),
                    short(to_commit)
                )
            }
            BoundaryWarning::StabilityConflict { tag, other, commit } => {
                write!(
                    f,
                    "Tags '{}' and '{}' both point at {}",
                    tag,
                    other,
                    short(commit)
                )
            }
            BoundaryWarning::RemoteMissing { remote } => {
                write!(f, "Remote '{}' is not configured, skipping push", remote)
            }
        }
    }
}
