//! Turning candidate changes into changelog entries
//!
//! For each [ChangeSource] the [Attributor] resolves its commit, finds the
//! first release containing it, reads the changelog directive from its body
//! and builds the [Change] to file. Sources are independent, so
//! [Attributor::attribute_all] runs them in parallel over the read-only
//! index and returns the results in input order.

use crate::annotation::{decorate, Annotation};
use crate::domain::change::Change;
use crate::domain::source::ChangeSource;
use crate::domain::tag::TagPattern;
use crate::domain::version::SemanticVersion;
use crate::error::Result;
use crate::git::CommitGraph;
use crate::labels::{LabelPolicy, LabelRejection};
use crate::release_index::ReleaseIndex;
use rayon::prelude::*;
use std::fmt;
use tracing::{debug, info, warn};

/// Per-run settings for attribution
#[derive(Debug, Clone)]
pub struct AttributionOptions {
    /// Release label for changes not contained in any release
    pub next_label: String,
    /// Append the author to pull request entries
    pub include_author: bool,
    /// Append the author to raw commit entries
    pub include_commit_author: bool,
    /// Applied to pull requests only
    pub label_policy: LabelPolicy,
    /// Maps a release name onto the parent project's release (subprojects)
    pub release_transform: Option<TagPattern>,
}

impl AttributionOptions {
    /// Options with the given next-release label and everything else off
    pub fn new(next_label: impl Into<String>) -> Self {
        AttributionOptions {
            next_label: next_label.into(),
            include_author: false,
            include_commit_author: false,
            label_policy: LabelPolicy::default(),
            release_transform: None,
        }
    }
}

/// Why a change was deliberately left out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterReason {
    Labels(LabelRejection),
    /// Attributed to `release`, which is outside every listed series
    ReleaseFilter { release: String, filter: Vec<String> },
}

impl fmt::Display for FilterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterReason::Labels(rejection) => write!(f, "{}", rejection),
            FilterReason::ReleaseFilter { release, filter } => write!(
                f,
                "release {} is not in {}",
                release,
                filter.join(", ")
            ),
        }
    }
}

/// Outcome for a single change
#[derive(Debug, Clone, PartialEq)]
pub enum Attribution {
    Included(Change),
    Filtered(FilterReason),
}

/// A change dropped because its commit could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedChange {
    pub id: String,
    pub reason: String,
}

/// Counts reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub considered: usize,
    pub attributed: usize,
    pub filtered: usize,
    pub skipped: Vec<SkippedChange>,
}

impl RunReport {
    /// Add another report's counts to this one
    pub fn merge(&mut self, other: RunReport) {
        self.considered += other.considered;
        self.attributed += other.attributed;
        self.filtered += other.filtered;
        self.skipped.extend(other.skipped);
    }
}

/// Attributes changes against one release index
pub struct Attributor<'a, G: CommitGraph + ?Sized> {
    index: &'a ReleaseIndex<'a, G>,
    options: &'a AttributionOptions,
}

impl<'a, G: CommitGraph + ?Sized> Attributor<'a, G> {
    pub fn new(index: &'a ReleaseIndex<'a, G>, options: &'a AttributionOptions) -> Self {
        Attributor { index, options }
    }

    /// Attribute a change to its release and build its entry.
    ///
    /// # Returns
    /// * `Ok(Attribution::Included)` - The entry to file
    /// * `Ok(Attribution::Filtered)` - The change is deliberately left out
    /// * `Err` - The change's commit could not be resolved or read
    pub fn attribute_and_annotate(&self, source: &ChangeSource) -> Result<Attribution> {
        let labels = source.labels();
        if let ChangeSource::PullRequest(_) = source {
            if let Err(rejection) = self.options.label_policy.check(&labels) {
                return Ok(Attribution::Filtered(FilterReason::Labels(rejection)));
            }
        }

        let commit = self.index.graph().resolve(source.commit_ref())?;
        let release = self.release_of(commit)?;

        let annotation = self.annotation_of(source);
        if let Some(reason) = release_filter_rejects(&release, &annotation.release_filter) {
            return Ok(Attribution::Filtered(reason));
        }

        let intrinsic = self.options.label_policy.map_categories(&labels);
        let categories = annotation.categories_or(&intrinsic);

        let with_author = match source {
            ChangeSource::PullRequest(_) => self.options.include_author,
            ChangeSource::Commit(_) => self.options.include_commit_author,
        };
        let author = if with_author { source.author() } else { None };
        let text = decorate(
            annotation.text_or(source.title()),
            &source.link(),
            author.as_deref(),
        );

        Ok(Attribution::Included(Change::new(
            release,
            categories,
            source.sort_key(),
            text,
        )))
    }

    /// Attribute every source in parallel.
    ///
    /// Changes whose commit cannot be resolved are skipped and listed in the
    /// report; any other error aborts the run.
    pub fn attribute_all(&self, sources: &[ChangeSource]) -> Result<(Vec<Change>, RunReport)> {
        let results: Vec<Result<Attribution>> = sources
            .par_iter()
            .map(|source| self.attribute_and_annotate(source))
            .collect();

        let mut changes = Vec::new();
        let mut report = RunReport {
            considered: sources.len(),
            ..RunReport::default()
        };

        for (source, result) in sources.iter().zip(results) {
            match result {
                Ok(Attribution::Included(change)) => {
                    report.attributed += 1;
                    changes.push(change);
                }
                Ok(Attribution::Filtered(reason)) => {
                    debug!(change = %source.id(), %reason, "change filtered");
                    report.filtered += 1;
                }
                Err(e) if e.is_resolution() => {
                    warn!(change = %source.id(), error = %e, "skipping change");
                    report.skipped.push(SkippedChange {
                        id: source.id(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            considered = report.considered,
            attributed = report.attributed,
            filtered = report.filtered,
            skipped = report.skipped.len(),
            "attribution finished"
        );
        Ok((changes, report))
    }

    fn release_of(&self, commit: git2::Oid) -> Result<String> {
        let next = &self.options.next_label;
        let release = self.index.first_release_containing(commit, next)?;

        Ok(match &self.options.release_transform {
            Some(pattern) if &release != next => pattern.mother_release(&release),
            _ => release,
        })
    }

    fn annotation_of(&self, source: &ChangeSource) -> Annotation {
        let mut annotation = Annotation::parse(source.body());

        if let ChangeSource::Commit(commit) = source {
            if !commit.text.trim().is_empty() {
                annotation.override_text = Some(commit.text.trim().to_string());
            }
            if !commit.category.trim().is_empty() {
                annotation.category_filter = vec![commit.category.trim().to_string()];
            }
            if !commit.version_filter.is_empty() {
                annotation.release_filter = commit.version_filter.clone();
            }
        }
        annotation
    }
}

/// A non-empty filter keeps only releases in one of its `major.minor` series.
/// Labels that are not versions (the next-release label) always pass.
fn release_filter_rejects(release: &str, filter: &[String]) -> Option<FilterReason> {
    if filter.is_empty() {
        return None;
    }
    let version = SemanticVersion::parse(release).ok()?;
    if filter.iter().any(|series| version.in_series(series)) {
        return None;
    }
    Some(FilterReason::ReleaseFilter {
        release: release.to_string(),
        filter: filter.to_vec(),
    })
}
