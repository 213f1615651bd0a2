//! Terminal styling for the merge summary.

use console::Style;

use commute_core::SessionState;

/// A path that ends the merge staged, with how it got there.
pub fn staged(path: &str, how: &str) -> String {
    format!("{} {path}: {how}", Style::new().green().apply_to("✓"))
}

/// Top-level failure printed to stderr.
pub fn failure(msg: &str) -> String {
    format!("{} {msg}", Style::new().red().apply_to("✗"))
}

pub fn unresolved_count(count: usize) -> String {
    let msg = format!("{count} file(s) left unresolved");
    format!("{} {msg}", Style::new().yellow().apply_to("⚠"))
}

/// "Merging <source> into <target>", with both refs emphasized.
pub fn merge_heading(source: &str, target: &str) -> String {
    let bold = Style::new().bold();
    format!("Merging {} into {}", bold.apply_to(source), bold.apply_to(target))
}

pub fn label(msg: &str) -> String {
    Style::new().dim().apply_to(msg).to_string()
}

/// Merge session state, colored by outcome.
pub fn state(state: SessionState) -> String {
    let style = match state {
        SessionState::Committed => Style::new().green().bold(),
        SessionState::Aborted => Style::new().red().bold(),
        SessionState::MergeInProgress => Style::new().yellow().bold(),
        SessionState::Idle => Style::new().dim(),
    };
    style.apply_to(state.to_string()).to_string()
}
