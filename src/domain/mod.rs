//! Domain logic - pure release and change rules independent of git operations

pub mod change;
pub mod source;
pub mod tag;
pub mod version;

pub use change::Change;
pub use source::{ChangeLink, ChangeSource, PullRequest, RawCommit};
pub use tag::{TagPattern, VersionTag};
pub use version::SemanticVersion;
