use crate::error::Result;
use crate::git::{CommitGraph, CommitInfo, CommitNode, TagRef};
use git2::Oid;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

struct Node {
    parents: Vec<usize>,
    generation: u32,
}

/// Commit graph decorator that answers ancestry from precomputed
/// generation numbers.
///
/// Every root has generation 1 and every other commit is one more than its
/// highest parent, so an ancestor always has a strictly lower generation
/// than its descendants. Queries whose generations rule reachability out
/// return immediately; the rest walk parent links, never descending below
/// the generation of `base`.
///
/// Commits missing from the loaded history (e.g. created after the index
/// was built) are delegated to the wrapped graph.
pub struct GenerationGraph<G: CommitGraph> {
    inner: G,
    index: HashMap<Oid, usize>,
    nodes: Vec<Node>,
}

impl<G: CommitGraph> GenerationGraph<G> {
    /// Load the full history of `inner` and number every commit
    #[instrument(skip(inner))]
    pub fn build(inner: G) -> Result<Self> {
        let history = inner.history()?;
        let graph = Self::from_history(inner, history);
        debug!(commits = graph.nodes.len(), "built generation index");
        Ok(graph)
    }

    fn from_history(inner: G, history: Vec<CommitNode>) -> Self {
        let index: HashMap<Oid, usize> = history
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id, idx))
            .collect();

        let mut nodes: Vec<Node> = history
            .iter()
            .map(|node| Node {
                // Parents outside the loaded history (shallow clones) are dropped
                parents: node
                    .parents
                    .iter()
                    .filter_map(|p| index.get(p).copied())
                    .collect(),
                generation: 0,
            })
            .collect();

        assign_generations(&mut nodes);

        GenerationGraph {
            inner,
            index,
            nodes,
        }
    }

    /// The wrapped graph
    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Generation number of a commit, if it is part of the loaded history
    pub fn generation(&self, oid: Oid) -> Option<u32> {
        self.index.get(&oid).map(|&idx| self.nodes[idx].generation)
    }

    fn reaches(&self, base: usize, tip: usize) -> bool {
        self.walk(base, tip).0
    }

    /// Pruned walk from `tip` towards `base`; also returns how many commits
    /// were visited.
    fn walk(&self, base: usize, tip: usize) -> (bool, usize) {
        let floor = self.nodes[base].generation;
        // Only nodes at or above the floor are touched
        let mut visited = HashSet::new();
        let mut stack = vec![tip];

        while let Some(current) = stack.pop() {
            if current == base {
                return (true, visited.len());
            }
            if !visited.insert(current) {
                continue;
            }
            stack.extend(
                self.nodes[current]
                    .parents
                    .iter()
                    .copied()
                    .filter(|&p| self.nodes[p].generation >= floor),
            );
        }
        (false, visited.len())
    }
}

/// Iterative post-order numbering; histories can be far deeper than the stack.
fn assign_generations(nodes: &mut [Node]) {
    for start in 0..nodes.len() {
        if nodes[start].generation != 0 {
            continue;
        }

        let mut stack = vec![start];
        while let Some(&current) = stack.last() {
            let pending: Vec<usize> = nodes[current]
                .parents
                .iter()
                .copied()
                .filter(|&p| nodes[p].generation == 0)
                .collect();

            if pending.is_empty() {
                let highest = nodes[current]
                    .parents
                    .iter()
                    .map(|&p| nodes[p].generation)
                    .max()
                    .unwrap_or(0);
                nodes[current].generation = highest + 1;
                stack.pop();
            } else {
                stack.extend(pending);
            }
        }
    }
}

impl<G: CommitGraph> CommitGraph for GenerationGraph<G> {
    fn resolve(&self, reference: &str) -> Result<Oid> {
        self.inner.resolve(reference)
    }

    fn is_ancestor_of(&self, base: Oid, tip: Oid) -> Result<bool> {
        if base == tip {
            return Ok(true);
        }

        match (self.index.get(&base), self.index.get(&tip)) {
            (Some(&b), Some(&t)) => {
                if self.nodes[b].generation >= self.nodes[t].generation {
                    return Ok(false);
                }
                Ok(self.reaches(b, t))
            }
            _ => self.inner.is_ancestor_of(base, tip),
        }
    }

    fn oldest_commit(&self) -> Result<Oid> {
        self.inner.oldest_commit()
    }

    fn tags(&self) -> Result<Vec<TagRef>> {
        self.inner.tags()
    }

    fn commit(&self, oid: Oid) -> Result<CommitInfo> {
        self.inner.commit(oid)
    }

    fn history(&self) -> Result<Vec<CommitNode>> {
        self.inner.history()
    }
}
