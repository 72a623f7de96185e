//! Logs panel component
//!
//! Shows the tail of the in-memory log buffer, newest at the bottom, with
//! colour-coded levels. The panel follows the buffer; there is no scrollback.

use crate::logging::{LogEntry, LogLevel};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Render the newest entries that fit in `area`
pub fn render(f: &mut Frame, area: Rect, entries: &[LogEntry]) {
    let items: Vec<ListItem> = entries
        .iter()
        .map(|entry| ListItem::new(format_log_entry(entry)).style(log_level_style(&entry.level)))
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" System Logs "),
    );

    f.render_widget(list, area);
}

/// Rows available for entries inside the panel border
pub fn capacity(area: Rect) -> usize {
    area.height.saturating_sub(2) as usize
}

/// Format a log entry for display
fn format_log_entry(entry: &LogEntry) -> String {
    // Module path without the crate prefix, e.g. "readings::supervisor"
    let target = entry
        .target
        .strip_prefix("eldash::")
        .unwrap_or(&entry.target);
    format!(
        "[{}] {:5} {}: {}",
        entry.timestamp.format("%H:%M:%S"),
        entry.level.as_str(),
        target,
        entry.message
    )
}

fn log_level_style(level: &LogLevel) -> Style {
    match level {
        LogLevel::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        LogLevel::Warn => Style::default().fg(Color::Yellow),
        LogLevel::Info => Style::default().fg(Color::Green),
        LogLevel::Debug | LogLevel::Trace => Style::default().fg(Color::DarkGray),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    #[test]
    fn test_format_strips_crate_prefix() {
        let entry = LogEntry {
            timestamp: Local::now(),
            level: LogLevel::Warn,
            target: "eldash::readings::supervisor".to_string(),
            message: "Readings fetch failed".to_string(),
        };
        let line = format_log_entry(&entry);
        assert!(line.contains("WARN  readings::supervisor: Readings fetch failed"));
    }
}
