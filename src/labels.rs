use crate::config::LabelsConfig;
use std::collections::BTreeMap;
use std::fmt;

/// Reason a pull request is left out by its labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelRejection {
    MissingRequired(String),
    Excluded(String),
    NotIncluded,
    Unlabeled,
}

impl fmt::Display for LabelRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelRejection::MissingRequired(label) => {
                write!(f, "missing required label '{}'", label)
            }
            LabelRejection::Excluded(label) => write!(f, "excluded by label '{}'", label),
            LabelRejection::NotIncluded => write!(f, "no included label"),
            LabelRejection::Unlabeled => write!(f, "unlabeled"),
        }
    }
}

/// Label-based selection and renaming of pull requests.
///
/// All comparisons ignore ASCII case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelPolicy {
    /// A label every change must carry
    pub required: Option<String>,
    /// When non-empty, a change must carry one of these
    pub include: Vec<String>,
    /// A change carrying any of these is left out
    pub exclude: Vec<String>,
    pub exclude_unlabeled: bool,
    /// Label renames applied before category matching (e.g., bug -> Bug fixes)
    pub category_map: BTreeMap<String, String>,
}

impl LabelPolicy {
    /// Check a label set against the policy
    ///
    /// # Returns
    /// * `Ok(())` - The change is kept
    /// * `Err(LabelRejection)` - The first rule that rejects it
    pub fn check(&self, labels: &[String]) -> Result<(), LabelRejection> {
        let has = |wanted: &str| labels.iter().any(|l| l.eq_ignore_ascii_case(wanted));

        if let Some(required) = &self.required {
            if !has(required) {
                return Err(LabelRejection::MissingRequired(required.clone()));
            }
        }
        if let Some(excluded) = self.exclude.iter().find(|e| has(e)) {
            return Err(LabelRejection::Excluded(excluded.clone()));
        }
        if !self.include.is_empty() && !self.include.iter().any(|i| has(i)) {
            return Err(LabelRejection::NotIncluded);
        }
        if self.exclude_unlabeled && labels.is_empty() {
            return Err(LabelRejection::Unlabeled);
        }
        Ok(())
    }

    /// Apply the category map, keeping each original label after its rename
    pub fn map_categories(&self, labels: &[String]) -> Vec<String> {
        let mut mapped = Vec::with_capacity(labels.len());
        for label in labels {
            let rename = self
                .category_map
                .iter()
                .find(|(from, _)| from.eq_ignore_ascii_case(label))
                .map(|(_, to)| to);
            if let Some(to) = rename {
                mapped.push(to.clone());
            }
            mapped.push(label.clone());
        }
        mapped
    }
}

impl From<&LabelsConfig> for LabelPolicy {
    fn from(config: &LabelsConfig) -> Self {
        let required = config.required.trim();
        LabelPolicy {
            required: (!required.is_empty()).then(|| required.to_string()),
            include: config.include.clone(),
            exclude: config.exclude.clone(),
            exclude_unlabeled: config.exclude_unlabeled,
            category_map: config.category_map.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_policy_accepts_everything() {
        let policy = LabelPolicy::default();
        assert_eq!(policy.check(&[]), Ok(()));
        assert_eq!(policy.check(&labels(&["anything"])), Ok(()));
    }

    #[test]
    fn test_required_label() {
        let policy = LabelPolicy {
            required: Some("changelog".to_string()),
            ..LabelPolicy::default()
        };
        assert_eq!(policy.check(&labels(&["Changelog", "bug"])), Ok(()));
        assert_eq!(
            policy.check(&labels(&["bug"])),
            Err(LabelRejection::MissingRequired("changelog".to_string()))
        );
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let policy = LabelPolicy {
            include: labels(&["bug"]),
            exclude: labels(&["wontfix"]),
            ..LabelPolicy::default()
        };
        assert_eq!(
            policy.check(&labels(&["bug", "WONTFIX"])),
            Err(LabelRejection::Excluded("wontfix".to_string()))
        );
        assert_eq!(policy.check(&labels(&["Bug"])), Ok(()));
        assert_eq!(
            policy.check(&labels(&["docs"])),
            Err(LabelRejection::NotIncluded)
        );
    }

    #[test]
    fn test_exclude_unlabeled() {
        let policy = LabelPolicy {
            exclude_unlabeled: true,
            ..LabelPolicy::default()
        };
        assert_eq!(policy.check(&[]), Err(LabelRejection::Unlabeled));
        assert_eq!(policy.check(&labels(&["x"])), Ok(()));
    }

    #[test]
    fn test_map_categories_keeps_original() {
        let mut policy = LabelPolicy::default();
        policy
            .category_map
            .insert("bug".to_string(), "Bug fixes".to_string());

        assert_eq!(
            policy.map_categories(&labels(&["BUG", "kernel"])),
            labels(&["Bug fixes", "BUG", "kernel"])
        );
    }

    #[test]
    fn test_rejection_display() {
        assert_eq!(
            LabelRejection::Excluded("invalid".to_string()).to_string(),
            "excluded by label 'invalid'"
        );
        assert_eq!(LabelRejection::Unlabeled.to_string(), "unlabeled");
    }
}
