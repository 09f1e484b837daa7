//! Release version parsing and ordering
//!
//! Versions are up to five components split on `.` and `-`:
//! `major.minor.patch-label.number`. A leading `v`/`V` is ignored and
//! anything after `+` (build metadata) is dropped. Components missing from
//! a shorter version sort below present ones, except the label: a version
//! without a label sorts after the same version with one, so
//! `1.0.0-beta < 1.0.0`.

use crate::error::{ChangelogError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

const MAX_COMPONENTS: usize = 5;

/// Parsed release version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: Option<u64>,
    pub patch: Option<u64>,
    pub label: Option<String>,
    pub label_number: Option<u64>,
}

impl SemanticVersion {
    /// Create a plain `major.minor.patch` version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemanticVersion {
            major,
            minor: Some(minor),
            patch: Some(patch),
            label: None,
            label_number: None,
        }
    }

    /// Parse a version string (e.g., "v1.2.3-M01.5+build" -> 1, 2, 3, "M01", 5)
    pub fn parse(version: &str) -> Result<Self> {
        let trimmed = version.trim();
        let without_prefix = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        let core = match without_prefix.find('+') {
            Some(idx) => &without_prefix[..idx],
            None => without_prefix,
        };

        let parts: Vec<&str> = core.split(['.', '-']).collect();
        if core.is_empty() || parts.len() > MAX_COMPONENTS {
            return Err(ChangelogError::version(format!(
                "Invalid version format: '{}' - expected 1 to {} components",
                version, MAX_COMPONENTS
            )));
        }

        let number = |idx: usize, what: &str| -> Result<Option<u64>> {
            match parts.get(idx) {
                None => Ok(None),
                Some(part) => part.parse::<u64>().map(Some).map_err(|_| {
                    ChangelogError::version(format!(
                        "Invalid {} in '{}': '{}'",
                        what, version, part
                    ))
                }),
            }
        };

        let major = number(0, "major version")?.unwrap_or_default();
        let minor = number(1, "minor version")?;
        let patch = number(2, "patch version")?;
        let label = match parts.get(3) {
            Some(label) if label.is_empty() => {
                return Err(ChangelogError::version(format!(
                    "Empty label in '{}'",
                    version
                )))
            }
            Some(label) => Some((*label).to_string()),
            None => None,
        };
        let label_number = number(4, "label number")?;

        Ok(SemanticVersion {
            major,
            minor,
            patch,
            label,
            label_number,
        })
    }

    /// Number of components present
    pub fn depth(&self) -> usize {
        1 + [
            self.minor.is_some(),
            self.patch.is_some(),
            self.label.is_some(),
            self.label_number.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }

    /// True if this version belongs to the `major.minor` series named by `series`.
    ///
    /// Returns false when `series` is not itself a version.
    pub fn in_series(&self, series: &str) -> bool {
        match SemanticVersion::parse(series) {
            Ok(other) => self.major == other.major && self.minor == other.minor,
            Err(_) => false,
        }
    }
}

/// Label ordering key: any label sorts before no label.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum LabelKey<'a> {
    Present(&'a str),
    Absent,
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        fn label(v: &SemanticVersion) -> LabelKey<'_> {
            match v.label.as_deref() {
                Some(label) => LabelKey::Present(label),
                None => LabelKey::Absent,
            }
        }

        self.major
            .cmp(&other.major)
            .then_with(|| self.minor.cmp(&other.minor))
            .then_with(|| self.patch.cmp(&other.patch))
            .then_with(|| label(self).cmp(&label(other)))
            .then_with(|| self.label_number.cmp(&other.label_number))
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for SemanticVersion {
    type Err = ChangelogError;

    fn from_str(s: &str) -> Result<Self> {
        SemanticVersion::parse(s)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.major)?;
        if let Some(minor) = self.minor {
            write!(f, ".{}", minor)?;
        }
        if let Some(patch) = self.patch {
            write!(f, ".{}", patch)?;
        }
        if let Some(label) = &self.label {
            write!(f, "-{}", label)?;
        }
        if let Some(number) = self.label_number {
            write!(f, ".{}", number)?;
        }
        Ok(())
    }
}

/// Compare two version strings that must both parse.
pub fn compare(a: &str, b: &str) -> Result<Ordering> {
    Ok(SemanticVersion::parse(a)?.cmp(&SemanticVersion::parse(b)?))
}

/// Compare two version strings where either may fail to parse.
///
/// A string that does not parse sorts after any that does. If neither
/// parses there is no defined order and an error is returned.
pub fn compare_lenient(a: &str, b: &str) -> Result<Ordering> {
    match (SemanticVersion::parse(a), SemanticVersion::parse(b)) {
        (Ok(va), Ok(vb)) => Ok(va.cmp(&vb)),
        (Ok(_), Err(_)) => Ok(Ordering::Less),
        (Err(_), Ok(_)) => Ok(Ordering::Greater),
        (Err(_), Err(_)) => Err(ChangelogError::version(format!(
            "Cannot order '{}' and '{}': neither is a version",
            a, b
        ))),
    }
}

/// Total order over release labels for sorting.
///
/// Same as [`compare_lenient`], with ties and pairs of non-versions broken
/// by plain string comparison so that sorting is deterministic.
pub fn release_order(a: &str, b: &str) -> Ordering {
    compare_lenient(a, b)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(a: &str, b: &str) -> Ordering {
        compare(a, b).unwrap()
    }

    #[test]
    fn test_version_parse() {
        let v = SemanticVersion::parse("v1.2.3").unwrap();
        assert_eq!(v, SemanticVersion::new(1, 2, 3));
    }

    #[test]
    fn test_version_parse_uppercase_v() {
        let v = SemanticVersion::parse("V1.2.3").unwrap();
        assert_eq!(v, SemanticVersion::new(1, 2, 3));
    }

    #[test]
    fn test_version_parse_all_components() {
        let v = SemanticVersion::parse("1.2.3-M01.5").unwrap();
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, Some(2));
        assert_eq!(v.patch, Some(3));
        assert_eq!(v.label.as_deref(), Some("M01"));
        assert_eq!(v.label_number, Some(5));
        assert_eq!(v.depth(), 5);
    }

    #[test]
    fn test_version_parse_short_forms() {
        assert_eq!(SemanticVersion::parse("1").unwrap().depth(), 1);
        assert_eq!(SemanticVersion::parse("1.2").unwrap().depth(), 2);
        assert_eq!(SemanticVersion::parse("3.1").unwrap().minor, Some(1));
    }

    #[test]
    fn test_version_parse_drops_build_metadata() {
        let v = SemanticVersion::parse("1.0.0+20130313144700").unwrap();
        assert_eq!(v, SemanticVersion::new(1, 0, 0));
    }

    #[test]
    fn test_version_parse_invalid() {
        assert!(SemanticVersion::parse("1.2.3-M01.5.6").is_err());
        assert!(SemanticVersion::parse("Bob").is_err());
        assert!(SemanticVersion::parse("").is_err());
        assert!(SemanticVersion::parse("v").is_err());
        assert!(SemanticVersion::parse("1.x").is_err());
        assert!(SemanticVersion::parse("1.0.0-").is_err());
        assert!(SemanticVersion::parse("Unreleased").is_err());
    }

    #[test]
    fn test_prefix_is_ignored() {
        assert_eq!(cmp("v1.0.0", "1.0.0"), Ordering::Equal);
        assert_eq!(cmp("V2.1", "2.1"), Ordering::Equal);
    }

    #[test]
    fn test_prerelease_sorts_before_release() {
        assert_eq!(cmp("1.0.0-alpha", "1.0.0"), Ordering::Less);
        assert_eq!(cmp("1.0.0", "1.0.0-beta"), Ordering::Greater);
    }

    #[test]
    fn test_label_number_ordering() {
        assert_eq!(cmp("1.0.0-alpha", "1.0.0-alpha.1"), Ordering::Less);
        assert_eq!(cmp("1.0.0-alpha.2", "1.0.0-alpha.10"), Ordering::Less);
        assert_eq!(cmp("1.0.0-alpha.3", "1.0.0-beta.1"), Ordering::Less);
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        assert_eq!(cmp("9.8.7", "10.0.0"), Ordering::Less);
        assert_eq!(cmp("1.10", "1.9"), Ordering::Greater);
    }

    #[test]
    fn test_shorter_version_is_older() {
        assert_eq!(cmp("1", "1.0"), Ordering::Less);
        assert_eq!(cmp("1.1", "1.1.0"), Ordering::Less);
        assert_eq!(cmp("1.1", "1.1.0-alpha"), Ordering::Less);
        assert_eq!(cmp("2", "1.9.9"), Ordering::Greater);
    }

    #[test]
    fn test_compare_lenient() {
        assert_eq!(compare_lenient("1.0", "next").unwrap(), Ordering::Less);
        assert_eq!(compare_lenient("next", "1.0").unwrap(), Ordering::Greater);
        assert_eq!(compare_lenient("1.0", "v1.0").unwrap(), Ordering::Equal);
        assert!(compare_lenient("next", "Unreleased").is_err());
    }

    #[test]
    fn test_release_order_is_total() {
        assert_eq!(release_order("next", "Unreleased"), Ordering::Greater);
        assert_eq!(release_order("0.0.3", "v0.0.3"), Ordering::Less);
        assert_eq!(release_order("0.0.3", "0.0.3"), Ordering::Equal);
    }

    #[test]
    fn test_in_series() {
        let v = SemanticVersion::parse("3.1.4").unwrap();
        assert!(v.in_series("3.1"));
        assert!(!v.in_series("3.2"));
        assert!(!v.in_series("Unreleased"));
    }

    #[test]
    fn test_version_display() {
        assert_eq!(SemanticVersion::new(1, 2, 3).to_string(), "1.2.3");
        assert_eq!(
            SemanticVersion::parse("v1.2.3-rc.2").unwrap().to_string(),
            "1.2.3-rc.2"
        );
        assert_eq!(SemanticVersion::parse("4").unwrap().to_string(), "4");
    }

    #[test]
    fn test_sorting_a_release_list() {
        let mut versions = vec!["1.0.0", "0.9", "1.0.0-rc.1", "1.0.0-beta", "0.10.1", "v0.9.0"];
        versions.sort_by(|a, b| cmp(a, b));
        assert_eq!(
            versions,
            vec!["0.9", "v0.9.0", "0.10.1", "1.0.0-beta", "1.0.0-rc.1", "1.0.0"]
        );
    }
}
