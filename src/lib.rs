pub mod annotation;
pub mod attribution;
pub mod boundary;
pub mod changelog;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod labels;
pub mod release_index;
pub mod ui;

pub use error::{ChangelogError, Result};
