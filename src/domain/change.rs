/// A single changelog entry, ready to be filed under a release and category.
///
/// Created once per attributed change and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Release heading this change belongs under
    pub release_label: String,
    /// Labels used to pick a category, in priority order
    pub category_labels: Vec<String>,
    /// Ordering key within a category (PR number or commit timestamp)
    pub sort_key: i64,
    /// Rendered list-item text
    pub display_text: String,
}

impl Change {
    /// Create a new change
    pub fn new(
        release_label: impl Into<String>,
        category_labels: Vec<String>,
        sort_key: i64,
        display_text: impl Into<String>,
    ) -> Self {
        Change {
            release_label: release_label.into(),
            category_labels,
            sort_key,
            display_text: display_text.into(),
        }
    }

    /// Case-insensitive label membership
    pub fn has_label(&self, label: &str) -> bool {
        self.category_labels
            .iter()
            .any(|l| l.eq_ignore_ascii_case(label))
    }
}
