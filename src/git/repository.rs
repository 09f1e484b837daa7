use crate::error::{ChangelogError, Result};
use crate::git::{CommitGraph, CommitInfo, CommitNode, TagRef};
use git2::{ErrorCode, Oid, Repository as Git2Repo, Sort};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

/// Commit graph backed by a real repository through libgit2.
///
/// Ancestry queries walk the history on every call; wrap it in a
/// [GenerationGraph](crate::git::GenerationGraph) for large runs.
pub struct Git2Repository {
    repo: Mutex<Git2Repo>,
}

impl Git2Repository {
    /// Open or discover a git repository
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path> + std::fmt::Debug>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path.as_ref())?;
        info!(path = %repo.path().display(), "opened git repository");

        Ok(Git2Repository::from_git2(repo))
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository {
            repo: Mutex::new(repo),
        }
    }

    fn repo(&self) -> MutexGuard<'_, Git2Repo> {
        // A panic while holding the lock cannot leave the read-only handle inconsistent.
        self.repo.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CommitGraph for Git2Repository {
    fn resolve(&self, reference: &str) -> Result<Oid> {
        let repo = self.repo();
        let object = repo.revparse_single(reference).map_err(|e| match e.code() {
            ErrorCode::Ambiguous => ChangelogError::ambiguous_ref(reference),
            ErrorCode::NotFound | ErrorCode::InvalidSpec => ChangelogError::unknown_ref(reference),
            _ => ChangelogError::Git(e),
        })?;

        let commit = object
            .peel_to_commit()
            .map_err(|_| ChangelogError::unknown_ref(reference))?;
        Ok(commit.id())
    }

    fn is_ancestor_of(&self, base: Oid, tip: Oid) -> Result<bool> {
        if base == tip {
            return Ok(true);
        }
        Ok(self.repo().graph_descendant_of(tip, base)?)
    }

    fn oldest_commit(&self) -> Result<Oid> {
        let repo = self.repo();
        let mut revwalk = repo.revwalk()?;
        revwalk.push_head()?;

        let mut oldest: Option<(i64, Oid)> = None;
        for oid in revwalk {
            let oid = oid?;
            let commit = repo.find_commit(oid)?;
            if commit.parent_count() == 0 {
                let candidate = (commit.time().seconds(), oid);
                if oldest.map_or(true, |current| candidate < current) {
                    oldest = Some(candidate);
                }
            }
        }

        oldest
            .map(|(_, oid)| oid)
            .ok_or_else(|| ChangelogError::unknown_ref("HEAD"))
    }

    #[instrument(skip(self))]
    fn tags(&self) -> Result<Vec<TagRef>> {
        let repo = self.repo();
        let names = repo.tag_names(None)?;
        let mut tags = Vec::new();

        for name in names.iter().flatten() {
            let reference = repo.find_reference(&format!("refs/tags/{}", name))?;
            match reference.peel_to_commit() {
                Ok(commit) => tags.push(TagRef {
                    name: name.to_string(),
                    target: commit.id(),
                }),
                Err(e) => debug!(tag = name, error = %e, "skipping tag that does not point at a commit"),
            }
        }

        debug!(count = tags.len(), "listed tags");
        Ok(tags)
    }

    fn commit(&self, oid: Oid) -> Result<CommitInfo> {
        let repo = self.repo();
        let commit = repo.find_commit(oid).map_err(|e| match e.code() {
            ErrorCode::NotFound => ChangelogError::unknown_ref(oid.to_string()),
            _ => ChangelogError::Git(e),
        })?;

        let message = commit.message().unwrap_or("(empty message)").to_string();
        let author = commit.author().name().unwrap_or("unknown").to_string();

        Ok(CommitInfo {
            hash: oid.to_string(),
            message,
            author,
            time: commit.time().seconds(),
        })
    }

    #[instrument(skip(self))]
    fn history(&self) -> Result<Vec<CommitNode>> {
        let repo = self.repo();
        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;

        if let Err(e) = revwalk.push_head() {
            // Unborn or detached-without-target HEAD; refs below still count.
            debug!(error = %e, "HEAD not pushed to history walk");
        }
        revwalk.push_glob("refs/heads/*")?;
        revwalk.push_glob("refs/tags/*")?;
        revwalk.push_glob("refs/remotes/*")?;

        let mut nodes = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            let commit = repo.find_commit(oid)?;
            nodes.push(CommitNode {
                id: oid,
                parents: commit.parent_ids().collect(),
            });
        }

        debug!(count = nodes.len(), "loaded commit history");
        Ok(nodes)
    }
}
