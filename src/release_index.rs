//! Release lookup: the earliest release that contains a commit
//!
//! A [ReleaseIndex] holds the release tags of one run in ascending version
//! order together with a borrowed [CommitGraph]. It is read-only once built
//! and can be queried from many threads at once.

use crate::domain::tag::{TagPattern, VersionTag};
use crate::domain::version::{release_order, SemanticVersion};
use crate::error::Result;
use crate::git::CommitGraph;
use git2::Oid;
use tracing::{debug, info, instrument};

/// Upper bound of the tag range
enum RangeEnd {
    /// Tags from which this commit is reachable
    Commit(Oid),
    /// `to` names a release that is not tagged yet; keep its `major.minor` series
    Series(String),
}

/// Ordered release tags over a commit graph
pub struct ReleaseIndex<'g, G: CommitGraph + ?Sized> {
    graph: &'g G,
    tags: Vec<VersionTag>,
}

impl<'g, G: CommitGraph + ?Sized> ReleaseIndex<'g, G> {
    /// Create an index, sorting `tags` in ascending release order
    pub fn new(graph: &'g G, mut tags: Vec<VersionTag>) -> Self {
        tags.sort_by(|a, b| a.release_cmp(b));
        ReleaseIndex { graph, tags }
    }

    /// Select the release tags between two references.
    ///
    /// Keeps tags whose name matches `pattern`, that contain `from`, and that
    /// are contained in `to`. `from` defaults to the oldest commit. When `to`
    /// does not resolve but is itself a version (the release being prepared),
    /// tags of the same `major.minor` series are kept instead.
    ///
    /// # Arguments
    /// * `graph` - Commit graph to query
    /// * `from` - Lower boundary reference, or `None` for the oldest commit
    /// * `to` - Upper boundary reference
    /// * `pattern` - Tag name filter
    ///
    /// # Returns
    /// * `Ok(ReleaseIndex)` - Tags ordered by the version their name maps to
    /// * `Err` - A boundary reference could not be resolved
    #[instrument(skip(graph, pattern), fields(pattern = pattern.as_str()))]
    pub fn discover(
        graph: &'g G,
        from: Option<&str>,
        to: &str,
        pattern: &TagPattern,
    ) -> Result<Self> {
        let start = match from.map(str::trim).filter(|f| !f.is_empty()) {
            Some(reference) => graph.resolve(reference)?,
            None => graph.oldest_commit()?,
        };

        let end = match graph.resolve(to) {
            Ok(oid) => RangeEnd::Commit(oid),
            Err(e) if e.is_resolution() && SemanticVersion::parse(to).is_ok() => {
                info!(to, "upper boundary is an untagged release, selecting its series");
                RangeEnd::Series(to.to_string())
            }
            Err(e) => return Err(e),
        };

        let mut tags = Vec::new();
        for tag in graph.tags()? {
            if !pattern.matches(&tag.name) {
                debug!(tag = %tag.name, "tag does not match pattern");
                continue;
            }
            if !graph.is_ancestor_of(start, tag.target)? {
                continue;
            }
            let in_range = match &end {
                RangeEnd::Commit(oid) => graph.is_ancestor_of(tag.target, *oid)?,
                RangeEnd::Series(series) => SemanticVersion::parse(&pattern.mother_release(&tag.name))
                    .map(|version| version.in_series(series))
                    .unwrap_or(false),
            };
            if in_range {
                tags.push(VersionTag::new(tag.name, tag.target));
            }
        }

        tags.sort_by(|a, b| {
            release_order(&pattern.mother_release(&a.name), &pattern.mother_release(&b.name))
                .then_with(|| a.name.cmp(&b.name))
        });
        info!(count = tags.len(), "selected release tags");

        Ok(ReleaseIndex { graph, tags })
    }

    /// Name of the earliest release whose tag contains `commit`, or `fallback`.
    pub fn first_release_containing(&self, commit: Oid, fallback: &str) -> Result<String> {
        for tag in &self.tags {
            if self.graph.is_ancestor_of(commit, tag.commit)? {
                return Ok(tag.name.clone());
            }
        }
        Ok(fallback.to_string())
    }

    /// Release tags in ascending order
    pub fn tags(&self) -> &[VersionTag] {
        &self.tags
    }

    /// Release names in ascending order
    pub fn release_labels(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// The graph this index queries
    pub fn graph(&self) -> &'g G {
        self.graph
    }
}
