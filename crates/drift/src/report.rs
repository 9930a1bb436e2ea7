//! Human-readable reports.
//!
//! Rendering only produces text. Where it goes is decided by a [`ReportSink`]:
//! [`TracingSink`] logs it, closures can collect it or send it anywhere else.

use crate::{Namespace, TableCheck, TableName};
use std::fmt;

/// Render a table check for operators.
///
/// Returns an empty string if the table has no issues.
pub fn render_report(check: &TableCheck<'_>) -> String {
    check.to_string()
}

impl fmt::Display for TableCheck<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_issues() {
            return Ok(());
        }

        writeln!(
            f,
            "Issues in table {}.{}:",
            self.namespace(),
            self.table().name()
        )?;
        for discrepancy in self.discrepancies() {
            writeln!(f, "  {}", discrepancy)?;
        }
        Ok(())
    }
}

/// Destination for rendered reports.
pub trait ReportSink {
    /// Receive the rendered report of a table that has issues.
    fn emit(&self, namespace: &Namespace, table: &TableName, rendered: &str);
}

impl<F> ReportSink for F
where
    F: Fn(&Namespace, &TableName, &str),
{
    fn emit(&self, namespace: &Namespace, table: &TableName, rendered: &str) {
        self(namespace, table, rendered)
    }
}

/// Logs reports as `tracing` warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn emit(&self, namespace: &Namespace, table: &TableName, rendered: &str) {
        tracing::warn!(
            namespace = %namespace,
            table = %table,
            "schema drift detected\n{}",
            rendered
        );
    }
}

impl TableCheck<'_> {
    /// Send this check's report to `sink`. Does nothing if there are no issues.
    pub fn report_to(&self, sink: &impl ReportSink) {
        if self.has_issues() {
            sink.emit(self.namespace(), self.table().name(), &render_report(self));
        }
    }
}
