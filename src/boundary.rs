use crate::domain::tag::{TagPattern, VersionTag};
use crate::domain::version::SemanticVersion;
use std::fmt;

/// Non-fatal issues found at the edges of a run: the tag range and its
/// boundaries. They are reported to the user but never stop the run.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// No tag in the range matches the pattern; everything is unreleased
    NoReleaseTags { project: String, pattern: String },
    /// Tag matches the pattern but is not a version; it sorts last
    UnparsableTag { tag: String, reason: String },
    /// `to` is a release that has no tag yet; its series was used instead
    UntaggedTarget { to: String },
    /// Every candidate change was filtered or skipped
    NoChanges { project: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NoReleaseTags { project, pattern } => write!(
                f,
                "No release tags matching '{}' in {}; all changes are unreleased",
                pattern, project
            ),
            BoundaryWarning::UnparsableTag { tag, reason } => {
                write!(f, "Cannot parse tag '{}': {}", tag, reason)
            }
            BoundaryWarning::UntaggedTarget { to } => write!(
                f,
                "'{}' is not tagged yet, using tags of the same series",
                to
            ),
            BoundaryWarning::NoChanges { project } => {
                write!(f, "No changes to report for {}", project)
            }
        }
    }
}

/// Check the selected release tags of a project.
///
/// # Arguments
/// * `project` - Name used in the warning text
/// * `tags` - Selected release tags
/// * `pattern` - Pattern the tags were selected with
pub fn check_release_tags(
    project: &str,
    tags: &[VersionTag],
    pattern: &TagPattern,
) -> Vec<BoundaryWarning> {
    if tags.is_empty() {
        return vec![BoundaryWarning::NoReleaseTags {
            project: project.to_string(),
            pattern: pattern.as_str().to_string(),
        }];
    }

    tags.iter()
        .filter_map(|tag| {
            SemanticVersion::parse(&pattern.mother_release(&tag.name))
                .err()
                .map(|e| BoundaryWarning::UnparsableTag {
                    tag: tag.name.clone(),
                    reason: e.to_string(),
                })
        })
        .collect()
}
