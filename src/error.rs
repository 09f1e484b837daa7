use thiserror::Error;

/// Unified error type for changelog operations
#[derive(Error, Debug)]
pub enum ChangelogError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Unknown reference '{0}'")]
    UnknownRef(String),

    #[error("Ambiguous reference '{0}'")]
    AmbiguousRef(String),

    #[error("Configuration error in {path}: {message}")]
    Config { path: String, message: String },

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Aggregation error: {0}")]
    Aggregation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results in git-changelog
pub type Result<T> = std::result::Result<T, ChangelogError>;

impl ChangelogError {
    /// Create a configuration error for the given key path
    pub fn config(path: impl Into<String>, msg: impl Into<String>) -> Self {
        ChangelogError::Config {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ChangelogError::Version(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        ChangelogError::Tag(msg.into())
    }

    /// Create an unknown-reference error
    pub fn unknown_ref(reference: impl Into<String>) -> Self {
        ChangelogError::UnknownRef(reference.into())
    }

    /// Create an ambiguous-reference error
    pub fn ambiguous_ref(reference: impl Into<String>) -> Self {
        ChangelogError::AmbiguousRef(reference.into())
    }

    /// Create an aggregation error with context
    pub fn aggregation(msg: impl Into<String>) -> Self {
        ChangelogError::Aggregation(msg.into())
    }

    /// True for errors raised while resolving a reference to a commit.
    ///
    /// These are fatal to a single change but not to a run, unless the
    /// reference is one of the run's own boundaries.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            ChangelogError::UnknownRef(_) | ChangelogError::AmbiguousRef(_)
        )
    }
}
