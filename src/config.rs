use crate::domain::tag::DEFAULT_TAG_PATTERN;
use crate::error::{ChangelogError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use tracing::debug;

const CONFIG_FILE_NAME: &str = "changelog.toml";
const CONFIG_DIR_NAME: &str = "git-changelog";

const PROJECT_KEYS: &[&str] = &[
    "name",
    "output",
    "next_header",
    "categories",
    "catch_all",
    "git",
    "github",
    "subprojects",
];
const GIT_KEYS: &[&str] = &["dir", "from", "to", "tag_pattern", "commits_file"];
const GITHUB_KEYS: &[&str] = &["user", "repo", "pull_requests", "include_author", "labels"];
const LABELS_KEYS: &[&str] = &[
    "required",
    "include",
    "exclude",
    "exclude_unlabeled",
    "category_map",
];
const COMMITS_FILE_KEYS: &[&str] = &["include_author", "commits"];
const COMMIT_KEYS: &[&str] = &["sha", "text", "category", "version_filter"];

/// Configuration of one project and, recursively, its subprojects.
///
/// Holds the changelog layout, where the history and the tags come from,
/// and where the changes come from.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProjectConfig {
    /// Display name, used in log output
    #[serde(default)]
    pub name: String,

    #[serde(default = "default_output")]
    pub output: String,

    /// Heading for changes not contained in any release
    #[serde(default = "default_next_header")]
    pub next_header: String,

    #[serde(default)]
    pub categories: Vec<String>,

    #[serde(default = "default_catch_all")]
    pub catch_all: String,

    pub git: GitConfig,

    #[serde(default)]
    pub github: Option<GithubConfig>,

    #[serde(default)]
    pub subprojects: BTreeMap<String, ProjectConfig>,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

fn default_output() -> String {
    "CHANGELOG.md".to_string()
}

fn default_next_header() -> String {
    "Unreleased".to_string()
}

fn default_catch_all() -> String {
    crate::changelog::DEFAULT_CATCH_ALL.to_string()
}

/// Where the history and the release tags come from
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GitConfig {
    #[serde(default = "default_dir")]
    pub dir: String,

    /// Lower boundary; empty means the oldest commit
    #[serde(default)]
    pub from: String,

    /// Upper boundary: a branch, tag, hash or the version being prepared
    pub to: String,

    #[serde(default = "default_tag_pattern")]
    pub tag_pattern: String,

    /// TOML file listing raw commits to include
    #[serde(default)]
    pub commits_file: Option<String>,
}

fn default_dir() -> String {
    "./".to_string()
}

fn default_tag_pattern() -> String {
    DEFAULT_TAG_PATTERN.to_string()
}

/// Hosting project and its exported pull requests
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct GithubConfig {
    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub repo: String,

    /// JSON export of the pull request list
    #[serde(default)]
    pub pull_requests: Option<String>,

    #[serde(default)]
    pub include_author: bool,

    #[serde(default)]
    pub labels: LabelsConfig,
}

impl GithubConfig {
    /// Web URL of a commit, when the hosting project is known
    pub fn commit_url(&self, sha: &str) -> Option<String> {
        if self.user.is_empty() || self.repo.is_empty() {
            return None;
        }
        Some(format!(
            "https://github.com/{}/{}/commit/{}",
            self.user, self.repo, sha
        ))
    }
}

/// Returns the labels excluded by default.
fn default_exclude() -> Vec<String> {
    vec![
        "question".to_string(),
        "duplicate".to_string(),
        "invalid".to_string(),
        "wontfix".to_string(),
    ]
}

/// Returns the default label renames.
fn default_category_map() -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert("bug".to_string(), "Bug fixes".to_string());
    map.insert("enhancement".to_string(), "Enhancements".to_string());
    map
}

/// Label filtering for pull requests
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LabelsConfig {
    #[serde(default)]
    pub required: String,

    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub exclude_unlabeled: bool,

    #[serde(default = "default_category_map")]
    pub category_map: BTreeMap<String, String>,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        LabelsConfig {
            required: String::new(),
            include: Vec::new(),
            exclude: default_exclude(),
            exclude_unlabeled: false,
            category_map: default_category_map(),
        }
    }
}

/// Raw commits listed as changes
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct CommitsConfig {
    #[serde(default)]
    pub include_author: bool,

    #[serde(default)]
    pub commits: Vec<CommitEntry>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CommitEntry {
    pub sha: String,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub version_filter: Vec<String>,
}

impl ProjectConfig {
    /// Parse a configuration document.
    ///
    /// Unknown keys and missing required keys are reported with their full
    /// key path (e.g., `subprojects.browser.git.to`).
    ///
    /// # Arguments
    /// * `text` - TOML source
    /// * `base_dir` - Directory relative paths are resolved against
    pub fn parse(text: &str, base_dir: &Path) -> Result<Self> {
        let table: Table = toml::from_str(text)?;
        validate_project(&table, "")?;

        let mut config: ProjectConfig = toml::from_str(text)?;
        config.set_base_dir(base_dir);
        Ok(config)
    }

    fn set_base_dir(&mut self, base_dir: &Path) {
        self.base_dir = base_dir.to_path_buf();
        for sub in self.subprojects.values_mut() {
            sub.set_base_dir(base_dir);
        }
    }

    /// Resolve a configured path: `~` is the home directory and relative
    /// paths are taken from the configuration file's directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix('~') {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest.trim_start_matches(['/', '\\']));
            }
        }
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Name used in messages; the repository directory when unnamed
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.git.dir
        } else {
            &self.name
        }
    }
}

impl CommitsConfig {
    /// Parse a commits file, reporting bad entries by index (`commits[2].sha`)
    pub fn parse(text: &str) -> Result<Self> {
        let table: Table = toml::from_str(text)?;
        check_keys(&table, COMMITS_FILE_KEYS, "")?;

        if let Some(commits) = table.get("commits") {
            let entries = commits
                .as_array()
                .ok_or_else(|| ChangelogError::config("commits", "expected an array of tables"))?;
            for (idx, entry) in entries.iter().enumerate() {
                let path = format!("commits[{}]", idx);
                let entry = entry
                    .as_table()
                    .ok_or_else(|| ChangelogError::config(&path, "expected a table"))?;
                check_keys(entry, COMMIT_KEYS, &path)?;
                require_string(entry, "sha", &path)?;
            }
        }

        Ok(toml::from_str(text)?)
    }
}

/// Load the commits file at `path`
pub fn load_commits_file(path: &Path) -> Result<CommitsConfig> {
    let text = fs::read_to_string(path)?;
    CommitsConfig::parse(&text)
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn check_keys(table: &Table, allowed: &[&str], prefix: &str) -> Result<()> {
    match table.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(unknown) => Err(ChangelogError::config(
            join(prefix, unknown),
            "unknown configuration key",
        )),
        None => Ok(()),
    }
}

fn section<'a>(table: &'a Table, key: &str, prefix: &str) -> Result<Option<&'a Table>> {
    match table.get(key) {
        None => Ok(None),
        Some(Value::Table(inner)) => Ok(Some(inner)),
        Some(_) => Err(ChangelogError::config(join(prefix, key), "expected a table")),
    }
}

fn require_string(table: &Table, key: &str, prefix: &str) -> Result<()> {
    match table.get(key) {
        Some(Value::String(value)) if !value.trim().is_empty() => Ok(()),
        Some(Value::String(_)) => Err(ChangelogError::config(join(prefix, key), "must not be empty")),
        Some(_) => Err(ChangelogError::config(join(prefix, key), "expected a string")),
        None => Err(ChangelogError::config(join(prefix, key), "missing required key")),
    }
}

fn validate_project(table: &Table, prefix: &str) -> Result<()> {
    check_keys(table, PROJECT_KEYS, prefix)?;

    let git_path = join(prefix, "git");
    let git = section(table, "git", prefix)?
        .ok_or_else(|| ChangelogError::config(&git_path, "missing required section"))?;
    check_keys(git, GIT_KEYS, &git_path)?;
    require_string(git, "to", &git_path)?;

    let github_path = join(prefix, "github");
    if let Some(github) = section(table, "github", prefix)? {
        check_keys(github, GITHUB_KEYS, &github_path)?;
        if let Some(labels) = section(github, "labels", &github_path)? {
            check_keys(labels, LABELS_KEYS, &join(&github_path, "labels"))?;
        }
    }

    let subprojects_path = join(prefix, "subprojects");
    if let Some(subprojects) = section(table, "subprojects", prefix)? {
        for (key, value) in subprojects {
            let path = join(&subprojects_path, key);
            let sub = value
                .as_table()
                .ok_or_else(|| ChangelogError::config(&path, "expected a table"))?;
            validate_project(sub, &path)?;
        }
    }
    Ok(())
}

/// Loads the project configuration.
///
/// Looks for the configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `changelog.toml` in current directory
/// 3. `git-changelog/changelog.toml` in the user config directory
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(ProjectConfig)` - Parsed configuration
/// * `Err` - No file was found, or it cannot be read or is invalid
pub fn load_config(config_path: Option<&str>) -> Result<ProjectConfig> {
    let path = match config_path {
        Some(path) => PathBuf::from(path),
        None => find_config().ok_or_else(|| {
            ChangelogError::config(
                CONFIG_FILE_NAME,
                "no configuration file found; pass one with --config",
            )
        })?,
    };
    debug!(path = %path.display(), "loading configuration");

    let text = fs::read_to_string(&path)?;
    let base_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    ProjectConfig::parse(&text, &base_dir)
}

fn find_config() -> Option<PathBuf> {
    let local = Path::new(".").join(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    let user = dirs::config_dir()?.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
    user.exists().then_some(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [git]
        to = "master"
    "#;

    fn parse(text: &str) -> Result<ProjectConfig> {
        ProjectConfig::parse(text, Path::new("/work"))
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = parse(MINIMAL).unwrap();
        assert_eq!(config.output, "CHANGELOG.md");
        assert_eq!(config.next_header, "Unreleased");
        assert_eq!(config.catch_all, "Misc");
        assert_eq!(config.git.dir, "./");
        assert_eq!(config.git.from, "");
        assert_eq!(config.git.tag_pattern, DEFAULT_TAG_PATTERN);
        assert!(config.github.is_none());
        assert!(config.subprojects.is_empty());
        assert_eq!(config.base_dir, PathBuf::from("/work"));
    }

    #[test]
    fn test_missing_to_reports_path() {
        let err = parse("[git]\ndir = \".\"\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error in git.to: missing required key"
        );
    }

    #[test]
    fn test_missing_git_section() {
        let err = parse("name = \"x\"\n").unwrap_err();
        assert!(err.to_string().contains("in git:"));
    }

    #[test]
    fn test_unknown_key_in_labels() {
        let err = parse(
            r#"
            [git]
            to = "master"
            [github.labels]
            exclud = []
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("github.labels.exclud"));
    }

    #[test]
    fn test_subproject_error_path() {
        let err = parse(
            r#"
            [git]
            to = "master"
            [subprojects.browser.git]
            from = "1.0"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("subprojects.browser.git.to"));
    }

    #[test]
    fn test_label_defaults() {
        let labels = LabelsConfig::default();
        assert_eq!(labels.exclude.len(), 4);
        assert_eq!(labels.category_map.get("bug").map(String::as_str), Some("Bug fixes"));
    }

    #[test]
    fn test_resolve_path() {
        let config = parse(MINIMAL).unwrap();
        assert_eq!(config.resolve_path("prs.json"), PathBuf::from("/work/prs.json"));
        assert_eq!(config.resolve_path("/abs/prs.json"), PathBuf::from("/abs/prs.json"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.resolve_path("~/repo"), home.join("repo"));
        }
    }

    #[test]
    fn test_commit_url() {
        let github = GithubConfig {
            user: "org".to_string(),
            repo: "project".to_string(),
            ..GithubConfig::default()
        };
        assert_eq!(
            github.commit_url("abc").as_deref(),
            Some("https://github.com/org/project/commit/abc")
        );
        assert_eq!(GithubConfig::default().commit_url("abc"), None);
    }

    #[test]
    fn test_commits_file_missing_sha() {
        let err = CommitsConfig::parse(
            r#"
            [[commits]]
            sha = "abc1234"
            [[commits]]
            text = "no sha"
            "#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error in commits[1].sha: missing required key"
        );
    }
}
