use std::cmp::min;

use chrono::{DateTime, Local, Utc};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::model::{Priority, Task};

pub const BG_BASE: Color = Color::Rgb(14, 17, 23);
pub const BG_PANEL: Color = Color::Rgb(22, 26, 34);
pub const BG_ACCENT: Color = Color::Rgb(32, 37, 47);
pub const FG_ACCENT: Color = Color::Rgb(120, 161, 255);

pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = min(width, area.width);
    let h = min(height, area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(w)) / 2,
        y: area.y + (area.height.saturating_sub(h)) / 2,
        width: w,
        height: h,
    }
}

pub fn inset_rect(area: Rect, padding: u16) -> Rect {
    if area.width == 0 || area.height == 0 {
        return area;
    }
    let px = padding.min(area.width / 2);
    let py = padding.min(area.height / 2);
    Rect {
        x: area.x + px,
        y: area.y + py,
        width: area.width.saturating_sub(px * 2),
        height: area.height.saturating_sub(py * 2),
    }
}

/// Trailing characters of a server id; the leading bytes of object ids are mostly timestamp.
pub fn short_id(id: &str) -> String {
    let count = id.chars().count();
    if count <= 8 {
        id.to_string()
    } else {
        id.chars().skip(count - 8).collect()
    }
}

pub fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::High => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        Priority::Medium => Style::default().fg(Color::Yellow),
        Priority::Low => Style::default().fg(Color::Cyan),
        Priority::None => Style::default().fg(Color::DarkGray),
    }
}

pub fn masked(secret: &str) -> String {
    "•".repeat(secret.chars().count())
}

pub fn format_task_detail_entries(task: &Task) -> Vec<(String, String)> {
    let mut entries = vec![
        (String::from("Task"), task.text.clone()),
        (
            String::from("Status"),
            String::from(if task.completed { "Completed" } else { "Open" }),
        ),
        (String::from("Priority"), task.priority.label().to_string()),
    ];
    if let Some(deadline) = task.formatted_deadline() {
        entries.push((String::from("Deadline"), deadline));
    } else if !task.deadline.is_empty() {
        let raw = format!(
            "{}/{}/{} (not a valid date)",
            task.deadline.day, task.deadline.month, task.deadline.year
        );
        entries.push((String::from("Deadline"), raw));
    }
    entries.push((String::from("View"), task.view.title().to_string()));
    entries.push((String::from("Created"), format_datetime(&task.date)));
    entries.push((String::from("ID"), task.id.clone()));
    entries
}

pub fn build_help_lines() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Tab / Shift+Tab", "Switch views"),
        ("1 / 2 / 3", "Jump to Inbox, Today, Upcoming"),
        ("j / k or ↓ / ↑", "Move selection"),
        ("Enter", "Task detail overlay"),
        ("a", "Add a task to the current view"),
        ("Space / d", "Toggle completion"),
        ("x / Delete", "Delete task (with confirmation)"),
        ("s", "Cycle sort: default, priority, deadline"),
        ("r", "Refresh from the server"),
        ("L", "Sign out"),
        ("h / ?", "Toggle this help overlay"),
        ("q", "Quit"),
        ("Esc", "Cancel/close overlays"),
    ]
}

pub fn accent_title(text: &str) -> Line<'static> {
    Line::from(vec![Span::styled(
        text.to_owned(),
        Style::default().fg(FG_ACCENT).add_modifier(Modifier::BOLD),
    )])
}

pub fn format_datetime(value: &DateTime<Utc>) -> String {
    let local: DateTime<Local> = (*value).into();
    local.format("%Y-%m-%d %H:%M").to_string()
}
