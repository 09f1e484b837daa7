//! Pure formatting functions for UI output.
//!
//! `format_*` functions build text and are testable; `display_*` functions
//! print it.

use crate::attribution::RunReport;
use crate::boundary::BoundaryWarning;
use console::style;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    eprintln!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    eprintln!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
///
/// # Arguments
/// * `warning` - The boundary warning to display
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Build the end-of-run summary.
///
/// Lists every skipped change so that none disappears silently.
pub fn format_run_report(report: &RunReport) -> String {
    let mut out = format!(
        "{} considered, {} attributed, {} filtered, {} skipped",
        report.considered,
        report.attributed,
        report.filtered,
        report.skipped.len()
    );
    for skipped in &report.skipped {
        out.push_str(&format!("\n  skipped {}: {}", skipped.id, skipped.reason));
    }
    out
}

/// Display the end-of-run summary
pub fn display_run_report(report: &RunReport) {
    eprintln!("\n{}", style("Changes:").bold());
    for line in format_run_report(report).lines() {
        eprintln!("  {}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribution::SkippedChange;

    #[test]
    fn test_display_functions_do_not_panic() {
        display_error("test error");
        display_success("test success");
        display_status("test status");
        display_boundary_warning(&BoundaryWarning::UntaggedTarget {
            to: "3.2".to_string(),
        });
        display_run_report(&RunReport::default());
    }

    #[test]
    fn test_format_run_report() {
        let report = RunReport {
            considered: 5,
            attributed: 3,
            filtered: 1,
            skipped: vec![SkippedChange {
                id: "#7".to_string(),
                reason: "Unknown reference 'abc'".to_string(),
            }],
        };
        assert_eq!(
            format_run_report(&report),
            "5 considered, 3 attributed, 1 filtered, 1 skipped\n  skipped #7: Unknown reference 'abc'"
        );
    }
}
