//! Pure formatting functions for UI output.

use crate::domain::ReleaseVersion;
use crate::release::ReleasePlan;
use console::style;

/// Prefix an error message with a red `ERROR:` label.
pub fn format_error(message: &str) -> String {
    format!("{} {}", style("ERROR:").red().bold(), message)
}

/// Print an error message to stderr.
pub fn display_error(message: &str) {
    eprintln!("{}", format_error(message));
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Render the steps of a release plan, one per line.
pub fn format_plan(plan: &ReleasePlan) -> String {
    let mut steps = Vec::new();
    if let Some(branch) = &plan.branch {
        steps.push(format!("create and checkout branch {}", branch));
    }
    steps.push(format!("store version {}", plan.version));
    steps.push(format!("commit \"{}\"", plan.message));
    steps.push(format!("create tag {}", plan.tag));
    steps.push(format!("push tag {}", plan.tag));
    steps.push(format!(
        "push branch {}",
        plan.branch.as_deref().unwrap_or(&plan.source_branch)
    ));

    let mut out = format!(
        "{} release {} -> {} from '{}'",
        plan.kind, plan.previous, plan.version, plan.source_branch
    );
    for (i, step) in steps.iter().enumerate() {
        out.push_str(&format!("\n  {}. {}", i + 1, step));
    }
    out
}

/// Display a dry-run plan.
pub fn display_plan(plan: &ReleasePlan) {
    println!("{}", style("Dry run:").bold());
    println!("{}", format_plan(plan));
}

/// Display the version whose branch was checked out by `latest`.
pub fn display_latest(version: Option<&ReleaseVersion>) {
    match version {
        Some(version) => display_success(&format!("Checked out latest release {}", version)),
        None => display_status("There are no versions yet."),
    }
}
