//! Aggregation of attributed changes into a Markdown document
//!
//! A [ChangeLog] files every [Change] under its release and the first
//! configured category it carries, then renders:
//!
//! ```text
//!
//! ### 3.1.0
//!
//! #### Kernel
//!
//! - Fixed the page cache [#12](https://github.com/org/repo/pull/12)
//! ```
//!
//! Releases and categories without changes produce no heading.

use crate::domain::change::Change;
use crate::domain::version::{release_order, SemanticVersion};
use crate::error::{ChangelogError, Result};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Category for changes that match no configured category
pub const DEFAULT_CATCH_ALL: &str = "Misc";

/// Lifecycle of a [ChangeLog]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeLogState {
    Empty,
    Accumulating,
    /// Terminal: no more changes are accepted
    Rendered,
}

/// Changes grouped by release and category
#[derive(Debug, Clone)]
pub struct ChangeLog {
    releases: Vec<String>,
    categories: Vec<String>,
    catch_all: String,
    next_label: Option<String>,
    document: BTreeMap<String, BTreeMap<String, Vec<Change>>>,
    state: ChangeLogState,
}

impl ChangeLog {
    /// Create an empty changelog
    ///
    /// # Arguments
    /// * `releases` - Known release labels, in any order
    /// * `categories` - Category names in the order they are rendered
    pub fn new(releases: Vec<String>, categories: Vec<String>) -> Self {
        ChangeLog {
            releases,
            categories,
            catch_all: DEFAULT_CATCH_ALL.to_string(),
            next_label: None,
            document: BTreeMap::new(),
            state: ChangeLogState::Empty,
        }
    }

    /// Render this label above every release, whatever its version
    pub fn with_next_label(mut self, label: impl Into<String>) -> Self {
        self.next_label = Some(label.into());
        self
    }

    /// Rename the catch-all category
    pub fn with_catch_all(mut self, name: impl Into<String>) -> Self {
        self.catch_all = name.into();
        self
    }

    pub fn state(&self) -> ChangeLogState {
        self.state
    }

    /// Number of changes filed so far
    pub fn len(&self) -> usize {
        self.document
            .values()
            .flat_map(|categories| categories.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Categories in render order: configured ones, then the catch-all
    /// unless it was configured explicitly.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self.categories.iter().map(String::as_str).collect();
        if !self.catch_all_configured() {
            categories.push(&self.catch_all);
        }
        categories
    }

    /// The catch-all name as it is rendered; a configured spelling wins.
    fn catch_all_name(&self) -> &str {
        self.categories
            .iter()
            .find(|c| c.eq_ignore_ascii_case(&self.catch_all))
            .unwrap_or(&self.catch_all)
    }

    fn catch_all_configured(&self) -> bool {
        self.categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&self.catch_all))
    }

    /// The category a change is filed under
    pub fn category_of(&self, change: &Change) -> String {
        self.categories
            .iter()
            .find(|category| change.has_label(category))
            .map(String::as_str)
            .unwrap_or_else(|| self.catch_all_name())
            .to_string()
    }

    /// File a change. Release labels are not validated; unknown ones get
    /// their own heading.
    ///
    /// # Returns
    /// * `Err(ChangelogError::Aggregation)` - The changelog was already rendered
    pub fn add_change(&mut self, change: Change) -> Result<()> {
        if self.state == ChangeLogState::Rendered {
            return Err(ChangelogError::aggregation(format!(
                "cannot add change '{}' after the changelog was rendered",
                change.display_text
            )));
        }

        let category = self.category_of(&change);
        self.document
            .entry(change.release_label.clone())
            .or_default()
            .entry(category)
            .or_default()
            .push(change);
        self.state = ChangeLogState::Accumulating;
        Ok(())
    }

    /// File every change from an iterator
    pub fn aggregate<I>(&mut self, changes: I) -> Result<()>
    where
        I: IntoIterator<Item = Change>,
    {
        changes.into_iter().try_for_each(|change| self.add_change(change))
    }

    /// Release labels in render order: the next label, then versions from
    /// newest to oldest, then labels that are not versions alphabetically.
    pub fn release_order(&self) -> Vec<String> {
        let labels: BTreeSet<&str> = self
            .releases
            .iter()
            .map(String::as_str)
            .chain(self.document.keys().map(String::as_str))
            .filter(|label| Some(*label) != self.next_label.as_deref())
            .collect();

        let (mut versions, others): (Vec<&str>, Vec<&str>) = labels
            .into_iter()
            .partition(|label| SemanticVersion::parse(label).is_ok());
        versions.sort_by(|a, b| release_order(b, a));

        self.next_label
            .iter()
            .map(String::as_str)
            .chain(versions)
            .chain(others)
            .map(str::to_string)
            .collect()
    }

    /// Render the document as Markdown.
    ///
    /// Changes within a category are ordered by sort key; equal keys keep
    /// insertion order. After the first call no more changes are accepted,
    /// and later calls return the same text.
    pub fn render(&mut self) -> String {
        for categories in self.document.values_mut() {
            for changes in categories.values_mut() {
                changes.sort_by_key(|change| change.sort_key);
            }
        }
        self.state = ChangeLogState::Rendered;

        let categories = self.categories();
        let mut out = String::new();

        for release in self.release_order() {
            let Some(filed) = self.document.get(&release) else {
                continue;
            };
            if filed.values().all(Vec::is_empty) {
                continue;
            }

            push_heading(&mut out, &format!("### {}", release));
            for category in &categories {
                let Some(changes) = filed.get(*category).filter(|c| !c.is_empty()) else {
                    continue;
                };
                push_heading(&mut out, &format!("#### {}", category));
                for change in changes {
                    out.push_str(&format!("- {}\n", change.display_text));
                }
            }
        }

        debug!(changes = self.len(), bytes = out.len(), "rendered changelog");
        out
    }
}

/// Headings are preceded and followed by a blank line
fn push_heading(out: &mut String, heading: &str) {
    if !out.ends_with("\n\n") {
        out.push('\n');
    }
    out.push_str(heading);
    out.push_str("\n\n");
}
