//! Main workflow orchestration logic
//!
//! Wires configuration, the repository, the change sources and the
//! changelog together. Kept apart from `main.rs` so that the workflow can
//! be run programmatically without depending on clap.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

use crate::attribution::{AttributionOptions, Attributor, RunReport, SkippedChange};
use crate::boundary::{check_release_tags, BoundaryWarning};
use crate::changelog::ChangeLog;
use crate::config::{load_commits_file, LabelsConfig, ProjectConfig};
use crate::domain::change::Change;
use crate::domain::source::{load_pull_requests, ChangeSource, RawCommit};
use crate::domain::tag::TagPattern;
use crate::domain::version::SemanticVersion;
use crate::git::{CommitGraph, GenerationGraph, Git2Repository};
use crate::labels::LabelPolicy;
use crate::release_index::ReleaseIndex;

/// Arguments for the changelog workflow
///
/// Mirrors the CLI Args in a form that does not depend on clap.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangelogWorkflowArgs {
    /// Output file, overriding the configured one
    pub output: Option<String>,

    /// Do not write a file; the caller prints the document
    pub stdout: bool,
}

/// Result of a successful changelog workflow
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowResult {
    /// The rendered document
    pub markdown: String,

    /// Where the document was written, if anywhere
    pub output_path: Option<PathBuf>,

    /// Release tags of the main project
    pub releases: Vec<String>,

    pub report: RunReport,

    pub warnings: Vec<BoundaryWarning>,
}

/// Changes gathered from one project and its subprojects
struct ProjectChanges {
    releases: Vec<String>,
    changes: Vec<Change>,
    report: RunReport,
    warnings: Vec<BoundaryWarning>,
}

/// Main changelog workflow
///
/// 1. Open the repository and index its history
/// 2. Select the release tags between `git.from` and `git.to`
/// 3. Load pull requests and listed commits
/// 4. Attribute every change to its first release, in parallel
/// 5. Repeat for each subproject, mapping its releases onto ours
/// 6. Render and write the changelog
///
/// # Arguments
///
/// * `args` - Workflow arguments (output override, stdout)
/// * `config` - Project configuration
///
/// # Returns
///
/// The rendered document and the run report, or the first fatal error
#[instrument(skip_all, fields(project = config.display_name()))]
pub fn run_changelog_workflow(
    args: &ChangelogWorkflowArgs,
    config: &ProjectConfig,
) -> Result<WorkflowResult> {
    let collected = collect_project(config, None, &config.next_header)?;

    let mut changelog = ChangeLog::new(collected.releases.clone(), config.categories.clone())
        .with_next_label(config.next_header.clone())
        .with_catch_all(config.catch_all.clone());
    changelog.aggregate(collected.changes)?;
    let markdown = changelog.render();

    let output_path = if args.stdout {
        None
    } else {
        let path = match &args.output {
            Some(path) => PathBuf::from(path),
            None => config.resolve_path(&config.output),
        };
        fs::write(&path, &markdown)
            .with_context(|| format!("Failed to write changelog to {}", path.display()))?;
        info!(path = %path.display(), "wrote changelog");
        Some(path)
    };

    Ok(WorkflowResult {
        markdown,
        output_path,
        releases: collected.releases,
        report: collected.report,
        warnings: collected.warnings,
    })
}

fn collect_project(
    config: &ProjectConfig,
    release_transform: Option<TagPattern>,
    next_label: &str,
) -> Result<ProjectChanges> {
    let repo_dir = config.resolve_path(&config.git.dir);
    let repo = Git2Repository::open(&repo_dir)
        .with_context(|| format!("Failed to open git repository at {}", repo_dir.display()))?;
    let graph = GenerationGraph::build(repo).context("Failed to index commit history")?;

    let pattern = TagPattern::new(&config.git.tag_pattern)
        .with_context(|| format!("Invalid tag pattern '{}'", config.git.tag_pattern))?;
    let index = ReleaseIndex::discover(&graph, Some(config.git.from.as_str()), &config.git.to, &pattern)
        .with_context(|| {
            format!(
                "Failed to select release tags between '{}' and '{}'",
                config.git.from, config.git.to
            )
        })?;

    let mut warnings = check_release_tags(config.display_name(), index.tags(), &pattern);
    if graph.resolve(&config.git.to).is_err() && SemanticVersion::parse(&config.git.to).is_ok() {
        warnings.push(BoundaryWarning::UntaggedTarget {
            to: config.git.to.clone(),
        });
    }

    let mut report = RunReport::default();
    let loaded = load_sources(config, &graph, &mut report)?;

    let options = AttributionOptions {
        next_label: next_label.to_string(),
        include_author: config.github.as_ref().map_or(false, |g| g.include_author),
        include_commit_author: loaded.include_commit_author,
        label_policy: config
            .github
            .as_ref()
            .map(|g| LabelPolicy::from(&g.labels))
            .unwrap_or_else(|| LabelPolicy::from(&LabelsConfig::default())),
        release_transform,
    };
    let attributor = Attributor::new(&index, &options);
    let (mut changes, attributed) = attributor.attribute_all(&loaded.sources)?;
    report.merge(attributed);

    for (key, sub) in &config.subprojects {
        let transform = TagPattern::new(&sub.git.tag_pattern)
            .with_context(|| format!("In [subprojects.{}]", key))?;
        let collected = collect_project(sub, Some(transform), next_label)
            .with_context(|| format!("In [subprojects.{}]", key))?;
        changes.extend(collected.changes);
        report.merge(collected.report);
        warnings.extend(collected.warnings);
    }

    if changes.is_empty() && report.considered > 0 {
        warnings.push(BoundaryWarning::NoChanges {
            project: config.display_name().to_string(),
        });
    }

    Ok(ProjectChanges {
        releases: index.release_labels(),
        changes,
        report,
        warnings,
    })
}

struct LoadedSources {
    sources: Vec<ChangeSource>,
    include_commit_author: bool,
}

/// Load pull requests and listed commits.
///
/// Listed commits that do not resolve are recorded in `report` as skipped.
fn load_sources<G: CommitGraph>(
    config: &ProjectConfig,
    graph: &G,
    report: &mut RunReport,
) -> Result<LoadedSources> {
    let mut sources = Vec::new();
    let mut include_commit_author = false;

    if let Some(path) = config.github.as_ref().and_then(|g| g.pull_requests.as_ref()) {
        let path = config.resolve_path(path);
        let prs = load_pull_requests(&path)
            .with_context(|| format!("Failed to load pull requests from {}", path.display()))?;
        info!(count = prs.len(), "loaded merged pull requests");
        sources.extend(prs.into_iter().map(ChangeSource::PullRequest));
    }

    if let Some(file) = &config.git.commits_file {
        let path = config.resolve_path(file);
        let commits = load_commits_file(&path)
            .with_context(|| format!("Failed to load commits from {}", path.display()))?;
        include_commit_author = commits.include_author;

        for entry in commits.commits {
            let oid = match graph.resolve(&entry.sha) {
                Ok(oid) => oid,
                Err(e) if e.is_resolution() => {
                    warn!(sha = %entry.sha, error = %e, "skipping listed commit");
                    report.considered += 1;
                    report.skipped.push(SkippedChange {
                        id: entry.sha.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let info = graph.commit(oid)?;
            let mut commit = RawCommit::new(oid.to_string(), info.message, info.author, info.time);
            commit.url = config
                .github
                .as_ref()
                .and_then(|g| g.commit_url(&commit.sha));
            commit.text = entry.text;
            commit.category = entry.category;
            commit.version_filter = entry.version_filter;
            sources.push(ChangeSource::Commit(commit));
        }
    }

    Ok(LoadedSources {
        sources,
        include_commit_author,
    })
}
