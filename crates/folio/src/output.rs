//! Build progress on stderr.

use std::fmt::Display;

use console::{Style, Term};
use folio_graph::LoadSummary;

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
    label: Style,
    green: Style,
    yellow: Style,
    red: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            label: Style::new().cyan().bold(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
        }
    }

    /// Print a `label: value` line with a highlighted label.
    pub(crate) fn field(&self, label: &str, value: impl Display) {
        let label = self.label.apply_to(format!("{label}:"));
        let _ = self.term.write_line(&format!("{label} {value}"));
    }

    /// Print what one source directory contributed.
    pub(crate) fn sourced(&self, name: &str, summary: LoadSummary) {
        self.field(
            &format!("Sourced {name}"),
            format_args!("{} files, {} documents", summary.files, summary.documents),
        );
    }

    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&self.green.apply_to(msg).to_string());
    }

    pub(crate) fn warning(&self, msg: &str) {
        let _ = self.term.write_line(&self.yellow.apply_to(msg).to_string());
    }

    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }
}
