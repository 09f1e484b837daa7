use crate::error::{ChangelogError, Result};
use crate::git::{CommitGraph, CommitInfo, CommitNode, TagRef};
use git2::Oid;
use std::collections::{HashMap, HashSet, VecDeque};

const MIN_PREFIX_LEN: usize = 4;

/// In-memory commit graph for testing without actual git operations
///
/// Ancestry is answered by a plain breadth-first walk over parent links,
/// which makes it a convenient reference for faster implementations.
pub struct MockRepository {
    commits: HashMap<Oid, (CommitInfo, Vec<Oid>)>,
    tags: HashMap<String, Oid>,
    branch_heads: HashMap<String, Oid>,
    head: Option<Oid>,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        MockRepository {
            commits: HashMap::new(),
            tags: HashMap::new(),
            branch_heads: HashMap::new(),
            head: None,
        }
    }

    /// Add a commit with its parents. The newest commit added becomes HEAD
    /// unless [set_head](Self::set_head) is called.
    pub fn add_commit(&mut self, oid: Oid, parents: &[Oid], info: CommitInfo) {
        self.commits.insert(oid, (info, parents.to_vec()));
        self.head = Some(oid);
    }

    /// Add a tag pointing to an OID
    pub fn add_tag(&mut self, name: impl Into<String>, oid: Oid) {
        self.tags.insert(name.into(), oid);
    }

    /// Set a branch head
    pub fn set_branch_head(&mut self, branch: impl Into<String>, oid: Oid) {
        self.branch_heads.insert(branch.into(), oid);
    }

    /// Point HEAD at a commit
    pub fn set_head(&mut self, oid: Oid) {
        self.head = Some(oid);
    }

    fn parents(&self, oid: Oid) -> &[Oid] {
        self.commits
            .get(&oid)
            .map(|(_, parents)| parents.as_slice())
            .unwrap_or(&[])
    }

    fn resolve_hex(&self, reference: &str) -> Result<Oid> {
        if reference.len() < MIN_PREFIX_LEN || !reference.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ChangelogError::unknown_ref(reference));
        }

        let needle = reference.to_ascii_lowercase();
        let matches: Vec<Oid> = self
            .commits
            .keys()
            .filter(|oid| oid.to_string().starts_with(&needle))
            .copied()
            .collect();

        match matches.as_slice() {
            [oid] => Ok(*oid),
            [] => Err(ChangelogError::unknown_ref(reference)),
            _ => Err(ChangelogError::ambiguous_ref(reference)),
        }
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitGraph for MockRepository {
    fn resolve(&self, reference: &str) -> Result<Oid> {
        if reference == "HEAD" {
            return self.head.ok_or_else(|| ChangelogError::unknown_ref(reference));
        }

        let symbolic = self
            .tags
            .get(reference)
            .or_else(|| self.branch_heads.get(reference))
            .or_else(|| reference.strip_prefix("refs/tags/").and_then(|t| self.tags.get(t)))
            .or_else(|| {
                reference
                    .strip_prefix("refs/heads/")
                    .and_then(|b| self.branch_heads.get(b))
            });
        if let Some(oid) = symbolic {
            return Ok(*oid);
        }

        self.resolve_hex(reference)
    }

    fn is_ancestor_of(&self, base: Oid, tip: Oid) -> Result<bool> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([tip]);

        while let Some(current) = queue.pop_front() {
            if current == base {
                return Ok(true);
            }
            if seen.insert(current) {
                queue.extend(self.parents(current).iter().copied());
            }
        }
        Ok(false)
    }

    fn oldest_commit(&self) -> Result<Oid> {
        let head = self.head.ok_or_else(|| ChangelogError::unknown_ref("HEAD"))?;
        let mut seen = HashSet::new();
        let mut stack = vec![head];
        let mut oldest: Option<(i64, Oid)> = None;

        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let parents = self.parents(current);
            if parents.is_empty() {
                let time = self.commits.get(&current).map_or(0, |(info, _)| info.time);
                if oldest.map_or(true, |best| (time, current) < best) {
                    oldest = Some((time, current));
                }
            }
            stack.extend(parents.iter().copied());
        }

        oldest
            .map(|(_, oid)| oid)
            .ok_or_else(|| ChangelogError::unknown_ref("HEAD"))
    }

    fn tags(&self) -> Result<Vec<TagRef>> {
        let mut tags: Vec<TagRef> = self
            .tags
            .iter()
            .map(|(name, target)| TagRef {
                name: name.clone(),
                target: *target,
            })
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    fn commit(&self, oid: Oid) -> Result<CommitInfo> {
        self.commits
            .get(&oid)
            .map(|(info, _)| info.clone())
            .ok_or_else(|| ChangelogError::unknown_ref(oid.to_string()))
    }

    fn history(&self) -> Result<Vec<CommitNode>> {
        let mut nodes: Vec<CommitNode> = self
            .commits
            .iter()
            .map(|(id, (_, parents))| CommitNode {
                id: *id,
                parents: parents.clone(),
            })
            .collect();
        nodes.sort_by_key(|node| node.id);
        Ok(nodes)
    }
}
