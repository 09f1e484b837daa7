//! Commit graph abstraction layer
//!
//! This module provides a trait-based abstraction over the commit history,
//! allowing the attribution engine to run against a real repository, an
//! in-memory fixture, or a precomputed index with the same interface.
//!
//! # Overview
//!
//! The primary abstraction is the [CommitGraph] trait. Implementations:
//!
//! - [repository::Git2Repository]: a real repository through the `git2` crate
//! - [graph::GenerationGraph]: wraps another graph and answers ancestry
//!   queries from precomputed generation numbers
//! - [mock::MockRepository]: an in-memory graph for tests
//!
//! # Usage
//!
//! Most code should depend on the [CommitGraph] trait rather than concrete
//! implementations.
//!
//! ```rust
//! # use git_changelog::git::CommitGraph;
//! # fn example<G: CommitGraph>(graph: &G) -> Result<(), Box<dyn std::error::Error>> {
//! let tip = graph.resolve("master")?;
//! let root = graph.oldest_commit()?;
//! assert!(graph.is_ancestor_of(root, tip)?);
//! # Ok(())
//! # }
//! ```

pub mod graph;
pub mod mock;
pub mod repository;

pub use graph::GenerationGraph;
pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use git2::Oid;

/// Commit details needed to describe a raw-commit change
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    /// The full commit hash
    pub hash: String,
    /// The commit message
    pub message: String,
    /// The commit author
    pub author: String,
    /// Commit time in seconds since the epoch
    pub time: i64,
}

/// A commit and its parents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitNode {
    pub id: Oid,
    pub parents: Vec<Oid>,
}

/// A tag name and the commit it peels to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    pub name: String,
    pub target: Oid,
}

/// Read-only view of a commit history
///
/// ## Thread Safety
///
/// All implementors must be `Send + Sync` so that attribution can query one
/// graph from many threads at once. No method mutates the graph.
///
/// ## Error Handling
///
/// Reference resolution reports [UnknownRef](crate::error::ChangelogError::UnknownRef)
/// or [AmbiguousRef](crate::error::ChangelogError::AmbiguousRef). An existing
/// commit that is simply not an ancestor is `Ok(false)`, never an error.
pub trait CommitGraph: Send + Sync {
    /// Resolve a branch, tag, or full/abbreviated hash to a commit
    fn resolve(&self, reference: &str) -> Result<Oid>;

    /// True iff `base` is reachable from `tip` through parent links.
    ///
    /// A commit is its own ancestor.
    fn is_ancestor_of(&self, base: Oid, tip: Oid) -> Result<bool>;

    /// The root commit of the current history.
    ///
    /// When several roots are reachable the earliest by commit time wins,
    /// with ties broken by id, so the answer is stable for a given state.
    fn oldest_commit(&self) -> Result<Oid>;

    /// All tags, peeled to the commits they point at
    fn tags(&self) -> Result<Vec<TagRef>>;

    /// Details of a single commit
    fn commit(&self, oid: Oid) -> Result<CommitInfo>;

    /// Every commit reachable from any reference, with its parents
    fn history(&self) -> Result<Vec<CommitNode>>;
}
