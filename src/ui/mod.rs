//! User interface module - terminal output.
//!
//! All output goes to stderr so that the rendered changelog can be piped
//! from stdout.

pub mod formatter;

pub use formatter::{
    display_boundary_warning, display_error, display_run_report, display_status,
    display_success, format_run_report,
};
