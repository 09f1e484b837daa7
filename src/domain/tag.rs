use crate::domain::version::release_order;
use crate::error::Result;
use git2::Oid;
use regex::Regex;
use std::cmp::Ordering;

/// Default pattern for release tags; the capture group is the version part.
pub const DEFAULT_TAG_PATTERN: &str = r"(\d+\.\d+.*)";

/// A release tag and the commit it points to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTag {
    pub name: String,
    pub commit: Oid,
}

impl VersionTag {
    /// Create a new version tag
    pub fn new(name: impl Into<String>, commit: Oid) -> Self {
        VersionTag {
            name: name.into(),
            commit,
        }
    }

    /// Ascending release order of two tags by name
    pub fn release_cmp(&self, other: &VersionTag) -> Ordering {
        release_order(&self.name, &other.name)
    }
}

/// Tag selection pattern (e.g., `(\d+\.\d+.*)`, `browser-(\d+\.\d+\.\d+)`)
#[derive(Debug, Clone)]
pub struct TagPattern {
    regex: Regex,
}

impl TagPattern {
    /// Compile a tag pattern
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(TagPattern {
            regex: Regex::new(pattern)?,
        })
    }

    /// The source pattern
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Check whether a tag name is selected by this pattern
    pub fn matches(&self, tag: &str) -> bool {
        self.regex.is_match(tag)
    }

    /// Map a tag name onto the release it belongs to in a parent project.
    ///
    /// Uses the first capture group when the pattern has one and it
    /// participates in the match; otherwise the tag name itself.
    /// Example: pattern=`browser-(\d+\.\d+\.\d+)`, tag="browser-3.1.0" -> "3.1.0"
    pub fn mother_release(&self, tag: &str) -> String {
        self.regex
            .captures(tag)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| tag.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_new() {
        let oid = Oid::from_bytes(&[1; 20]).unwrap();
        let tag = VersionTag::new("v1.2.3", oid);
        assert_eq!(tag.name, "v1.2.3");
        assert_eq!(tag.commit, oid);
    }

    #[test]
    fn test_tag_release_cmp() {
        let oid = Oid::from_bytes(&[1; 20]).unwrap();
        let a = VersionTag::new("0.0.9", oid);
        let b = VersionTag::new("0.0.10", oid);
        assert_eq!(a.release_cmp(&b), Ordering::Less);
    }

    #[test]
    fn test_default_pattern_matches() {
        let pattern = TagPattern::new(DEFAULT_TAG_PATTERN).unwrap();
        assert!(pattern.matches("1.2.3"));
        assert!(pattern.matches("v0.0.3"));
        assert!(pattern.matches("3.1"));
        assert!(!pattern.matches("test-C"));
        assert!(!pattern.matches("release"));
    }

    #[test]
    fn test_custom_pattern() {
        let pattern = TagPattern::new(r"^browser-(\d+\.\d+\.\d+)$").unwrap();
        assert!(pattern.matches("browser-1.2.3"));
        assert!(!pattern.matches("1.2.3"));
        assert_eq!(pattern.as_str(), r"^browser-(\d+\.\d+\.\d+)$");
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(TagPattern::new("(unclosed").is_err());
    }

    #[test]
    fn test_mother_release_uses_capture_group() {
        let pattern = TagPattern::new(r"browser-(\d+\.\d+\.\d+)").unwrap();
        assert_eq!(pattern.mother_release("browser-3.1.0"), "3.1.0");

        let default = TagPattern::new(DEFAULT_TAG_PATTERN).unwrap();
        assert_eq!(default.mother_release("v3.1.0"), "3.1.0");
    }

    #[test]
    fn test_mother_release_without_group() {
        let pattern = TagPattern::new(r"^\d+\.\d+").unwrap();
        assert_eq!(pattern.mother_release("3.1.0"), "3.1.0");
    }
}
