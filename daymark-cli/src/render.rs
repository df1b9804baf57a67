//! Terminal rendering for daymark types.
//!
//! Extension traits adding colored output to daymark-core types using
//! owo_colors.

use daymark_core::grid::weekday_labels;
use daymark_core::live::ChannelState;
use daymark_core::sync_status::{SourceProgress, SourceStatus};
use daymark_core::{DayCell, MonthKey, NamespaceKey, SyncSnapshot, SyncStatus, WeekStart};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for SourceStatus {
    fn render(&self) -> String {
        match self {
            SourceStatus::NotStarted => "not started".dimmed().to_string(),
            SourceStatus::InProgress => "in progress".yellow().to_string(),
            SourceStatus::Completed => "completed".green().to_string(),
            SourceStatus::Failed => "failed".red().to_string(),
            SourceStatus::Skipped => "skipped".dimmed().to_string(),
        }
    }
}

impl Render for SourceProgress {
    fn render(&self) -> String {
        let mut line = format!("{} {:>5.1}%", self.status.render(), self.percent_complete);
        if let Some(error) = &self.error {
            line.push_str(&format!("  {}", error.red()));
        }
        line
    }
}

impl Render for SyncSnapshot {
    fn render(&self) -> String {
        let headline = if self.overall_complete {
            "Ingestion complete".green().to_string()
        } else if self.overall_in_progress {
            format!("Ingesting… {:.0}%", self.overall_percent)
                .yellow()
                .to_string()
        } else {
            "Ingestion idle".dimmed().to_string()
        };

        let mut lines = vec![format!(
            "{}  {}",
            headline,
            format!(
                "({}/{} done, {} failed)",
                self.completed_count, self.total_count, self.failed_count
            )
            .dimmed()
        )];

        let width = self.sources.keys().map(|k| k.as_str().len()).max().unwrap_or(0);
        for (namespace, progress) in &self.sources {
            lines.push(format!(
                "   {:<width$}  {}",
                namespace.as_str(),
                progress.render()
            ));
        }
        lines.join("\n")
    }
}

impl Render for SyncStatus {
    fn render(&self) -> String {
        match self {
            SyncStatus::Unknown => "Sync status unknown".dimmed().to_string(),
            SyncStatus::Untracked => "Sync not tracked by server".dimmed().to_string(),
            SyncStatus::Reported(snapshot) => snapshot.render(),
        }
    }
}

impl Render for ChannelState {
    fn render(&self) -> String {
        match self {
            ChannelState::Connected => "● live".green().to_string(),
            ChannelState::Connecting => "○ connecting".yellow().to_string(),
            ChannelState::Disconnected => "○ disconnected".red().to_string(),
            ChannelState::Closed => "○ idle".dimmed().to_string(),
        }
    }
}

impl Render for DayCell {
    fn render(&self) -> String {
        let number = format!("{:>2}", self.day_number);
        let number = if !self.is_current_month {
            number.dimmed().to_string()
        } else if self.has_data {
            number.green().bold().to_string()
        } else {
            number
        };
        let number = if self.is_today {
            number.underline().to_string()
        } else {
            number
        };

        let badge = if self.has_data { "•".green().to_string() } else { " ".to_string() };
        format!("{number}{badge}")
    }
}

/// Month title, weekday header and six rows of cells, followed by one
/// line per namespace listing its days.
pub fn render_month(
    month: MonthKey,
    cells: &[DayCell],
    week_start: WeekStart,
    namespaces: &[NamespaceKey],
) -> String {
    let title = month.first_day().format("%B %Y").to_string();
    let mut lines = vec![format!("{:^27}", title).bold().to_string()];

    let header: Vec<String> = weekday_labels(week_start)
        .iter()
        .map(|label| format!("{label:>2} "))
        .collect();
    lines.push(header.join(" ").dimmed().to_string());

    for week in cells.chunks(7) {
        let row: Vec<String> = week.iter().map(Render::render).collect();
        lines.push(row.join(" "));
    }

    let width = namespaces.iter().map(|k| k.as_str().len()).max().unwrap_or(0);
    for namespace in namespaces {
        let days: Vec<String> = cells
            .iter()
            .filter(|cell| cell.has_data_in(namespace))
            .map(|cell| cell.day_number.to_string())
            .collect();
        let days = if days.is_empty() {
            "-".dimmed().to_string()
        } else {
            days.join(", ")
        };
        lines.push(format!("   {:<width$}  {}", namespace.as_str().cyan(), days));
    }

    lines.join("\n")
}

/// Simple pluralization helper
pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 { word.to_string() } else { format!("{word}s") }
}
