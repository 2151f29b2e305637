//! Table output formatting for CLI commands
//!
//! Provides formatted table output for dependency surveys and deploy
//! step summaries using comfy-table. Supports color-coded cells,
//! automatic column sizing, and accessibility features.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use crate::cli::output::truncate;
use crate::domain::models::report::{StepRecord, StepStatus};
use crate::services::dependencies::DependencyStatus;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<usize>,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Create a new table formatter with custom settings
    pub fn with_config(use_colors: bool, max_width: Option<usize>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Format a dependency survey as a table
    pub fn format_dependencies(&self, statuses: &[DependencyStatus]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("Tool").add_attribute(Attribute::Bold),
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("Required").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

        for status in statuses {
            let label = if status.present { "present" } else { "missing" };
            let status_cell = if self.use_colors {
                Cell::new(label).fg(dependency_color(status))
            } else {
                Cell::new(format!("{} {}", dependency_icon(status), label))
            };

            table.add_row(vec![
                Cell::new(&status.dependency.name),
                Cell::new(&status.dependency.package),
                Cell::new(if status.dependency.required { "yes" } else { "no" }),
                status_cell,
            ]);
        }

        table.to_string()
    }

    /// Format the steps of a deploy run as a table
    pub fn format_steps(&self, steps: &[StepRecord]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("Step").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Duration").add_attribute(Attribute::Bold),
            Cell::new("Detail").add_attribute(Attribute::Bold),
        ]);

        for record in steps {
            let status_cell = if self.use_colors {
                Cell::new(record.status.as_str()).fg(step_color(record.status))
            } else {
                Cell::new(format!("{} {}", step_icon(record.status), record.status.as_str()))
            };

            let duration = record.duration_ms.map_or_else(|| "-".to_string(), format_duration);
            let detail = record.message.as_deref().unwrap_or("");

            table.add_row(vec![
                Cell::new(record.step.display_name()),
                status_cell,
                Cell::new(duration),
                Cell::new(truncate(detail, 60)),
            ]);
        }

        table.to_string()
    }

    /// Create a base table with common settings
    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        table.load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width as u16);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if color output is supported
fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}

fn dependency_color(status: &DependencyStatus) -> Color {
    if status.present {
        Color::Green
    } else if status.dependency.required {
        Color::Red
    } else {
        Color::Yellow
    }
}

fn dependency_icon(status: &DependencyStatus) -> &'static str {
    if status.present {
        "✓"
    } else if status.dependency.required {
        "✗"
    } else {
        "!"
    }
}

fn step_color(status: StepStatus) -> Color {
    match status {
        StepStatus::Succeeded => Color::Green,
        StepStatus::Failed => Color::Red,
        StepStatus::Running => Color::Cyan,
        StepStatus::Skipped => Color::DarkGrey,
        StepStatus::Pending => Color::White,
    }
}

fn step_icon(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Succeeded => "✓",
        StepStatus::Failed => "✗",
        StepStatus::Running => "⟳",
        StepStatus::Skipped => "-",
        StepStatus::Pending => "○",
    }
}

/// Render a millisecond duration as "850ms" or "2.3s".
fn format_duration(ms: i64) -> String {
    if ms >= 1000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{ms}ms")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::dependency::host_dependencies;
    use crate::domain::models::report::DeployStep;

    #[test]
    fn test_table_formatter_new() {
        let formatter = TableFormatter::new();
        assert_eq!(formatter.max_width, None);
    }

    #[test]
    fn test_table_formatter_with_config() {
        let formatter = TableFormatter::with_config(false, Some(120));
        assert!(!formatter.use_colors);
        assert_eq!(formatter.max_width, Some(120));
    }

    #[test]
    fn test_format_dependencies() {
        let statuses: Vec<DependencyStatus> = host_dependencies(false)
            .into_iter()
            .enumerate()
            .map(|(i, dependency)| DependencyStatus {
                dependency,
                present: i != 2,
            })
            .collect();

        let formatter = TableFormatter::with_config(false, None);
        let output = formatter.format_dependencies(&statuses);

        assert!(output.contains("nginx"));
        assert!(output.contains("✓ present"));
        assert!(output.contains("! missing"), "optional tool gets a warning icon");
    }

    #[test]
    fn test_format_steps() {
        let mut succeeded = StepRecord::new(DeployStep::Rendering);
        succeeded.start();
        succeeded.finish(true, Some("3 artifacts".to_string()));

        let mut failed = StepRecord::new(DeployStep::Installing);
        failed.start();
        failed.finish(false, Some("permission denied".to_string()));

        let mut skipped = StepRecord::new(DeployStep::Activating);
        skipped.skip();

        let formatter = TableFormatter::with_config(false, None);
        let output = formatter.format_steps(&[succeeded, failed, skipped]);

        assert!(output.contains("Rendering artifacts"));
        assert!(output.contains("✓ succeeded"));
        assert!(output.contains("✗ failed"));
        assert!(output.contains("- skipped"));
        assert!(output.contains("permission denied"));
    }

    #[test]
    fn test_step_icon_mapping() {
        assert_eq!(step_icon(StepStatus::Succeeded), "✓");
        assert_eq!(step_icon(StepStatus::Failed), "✗");
        assert_eq!(step_icon(StepStatus::Skipped), "-");
    }

    #[test]
    fn test_step_color_mapping() {
        assert_eq!(step_color(StepStatus::Succeeded), Color::Green);
        assert_eq!(step_color(StepStatus::Failed), Color::Red);
        assert_eq!(step_color(StepStatus::Skipped), Color::DarkGrey);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(850), "850ms");
        assert_eq!(format_duration(2300), "2.3s");
        assert_eq!(format_duration(60_000), "60.0s");
    }
}
