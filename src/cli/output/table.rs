//! Table output for reconciliation results, using comfy-table.

use std::env;

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};

use crate::domain::models::{ProjectLayout, Violation};
use crate::services::{ReconcileOutcome, ReconcileReport, SweepFailure};

use super::truncate;

/// One row of `check` output.
pub struct CheckRow<'a> {
    /// Record node id.
    pub record_id: &'a str,
    /// Record title.
    pub title: &'a str,
    /// First violation, if any.
    pub violation: Option<&'a Violation>,
}

/// Table formatter for CLI output
pub struct TableFormatter {
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    /// Formatter with colors on and no width limit.
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Formatter with explicit color and width settings.
    pub fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// One row per checked record.
    pub fn format_checks(&self, rows: &[CheckRow<'_>]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Record", "Title", "Violation"]));

        for row in rows {
            let violation = match row.violation {
                Some(v) => self.colored(v.kind(), Color::Yellow),
                None => self.colored("ok", Color::Green),
            };
            table.add_row(vec![
                Cell::new(row.record_id),
                Cell::new(truncate(row.title, 48)),
                violation,
            ]);
        }
        table.to_string()
    }

    /// One row per reconciled record.
    pub fn format_reports(&self, reports: &[ReconcileReport]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Record", "Outcome", "Passes", "Repairs"]));

        for report in reports {
            let outcome = match report.outcome {
                ReconcileOutcome::Consistent if report.repairs.is_empty() => {
                    self.colored("consistent", Color::Green)
                }
                ReconcileOutcome::Consistent => self.colored("repaired", Color::Cyan),
                ReconcileOutcome::Removed => self.colored("removed", Color::Magenta),
                ReconcileOutcome::Planned => self.colored("planned", Color::Yellow),
            };
            let repairs = if report.repairs.is_empty() {
                "-".to_string()
            } else {
                report
                    .repairs
                    .iter()
                    .map(|r| r.repair.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            table.add_row(vec![
                Cell::new(&report.record_id),
                outcome,
                Cell::new(report.passes),
                Cell::new(repairs),
            ]);
        }
        table.to_string()
    }

    /// One row per failed record.
    pub fn format_failures(&self, failures: &[SweepFailure]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Record", "Error"]));
        for failure in failures {
            table.add_row(vec![
                Cell::new(&failure.record_id),
                self.colored(&failure.error, Color::Red),
            ]);
        }
        table.to_string()
    }

    /// Ids of the resolved layout.
    pub fn format_layout(&self, layout: &ProjectLayout) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Key", "Id"]));
        let rows = [
            ("project", &layout.project_id),
            ("field: Status", &layout.fields.status),
            ("field: Cycle", &layout.fields.cycle),
            ("field: Stale", &layout.fields.stale),
            ("field: Rollovers", &layout.fields.rollovers),
            ("status: triage", &layout.statuses.triage),
            ("status: backlog", &layout.statuses.backlog),
            ("status: todo", &layout.statuses.todo),
            ("status: in progress", &layout.statuses.in_progress),
            ("current cycle", &layout.current_cycle_id),
            ("stale option", &layout.stale_option_id),
        ];
        for (key, id) in rows {
            table.add_row(vec![Cell::new(key), Cell::new(id)]);
        }
        table.to_string()
    }

    fn colored(&self, text: &str, color: Color) -> Cell {
        if self.use_colors {
            Cell::new(text).fg(color)
        } else {
            Cell::new(text)
        }
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if let Some(width) = self.max_width {
            table.set_width(width);
        }
        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|n| Cell::new(n).add_attribute(Attribute::Bold))
        .collect()
}

fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::RecordSummary;
    use crate::services::{Repair, RepairRecord};

    fn plain() -> TableFormatter {
        TableFormatter::with_config(false, Some(120))
    }

    #[test]
    fn test_format_checks() {
        let violation = Violation::Stray(RecordSummary {
            id: "I_1".into(),
            title: "Crash".into(),
            url: "https://github.com/o/r/issues/1".into(),
        });
        let rows = [
            CheckRow {
                record_id: "I_1",
                title: "Crash",
                violation: Some(&violation),
            },
            CheckRow {
                record_id: "I_2",
                title: "Fine",
                violation: None,
            },
        ];
        let out = plain().format_checks(&rows);
        assert!(out.contains("stray"));
        assert!(out.contains("ok"));
    }

    #[test]
    fn test_format_reports() {
        let summary = RecordSummary {
            id: "I_1".into(),
            title: "Crash".into(),
            url: "https://github.com/o/r/issues/1".into(),
        };
        let reports = [ReconcileReport {
            record_id: "I_1".into(),
            outcome: ReconcileOutcome::Consistent,
            passes: 2,
            repairs: vec![RepairRecord {
                violation: Violation::Stray(summary),
                repair: Repair::AddToProject {
                    record_id: "I_1".into(),
                },
            }],
        }];
        let out = plain().format_reports(&reports);
        assert!(out.contains("repaired"));
        assert!(out.contains("add_to_project"));
    }

    #[test]
    fn test_format_layout() {
        let layout = crate::domain::models::layout::fixtures::layout();
        let out = plain().format_layout(&layout);
        assert!(out.contains("it_current"));
        assert!(out.contains("F_rollovers"));
    }
}
