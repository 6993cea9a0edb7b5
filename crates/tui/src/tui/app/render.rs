use std::cmp::min;

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};
use ratatui::Frame;

use crate::core::AuthMode;
use crate::model::View;
use crate::tui::constants::{APP_VERSION, STATUS_CONNECTING};
use crate::tui::helpers::{
    accent_title, build_help_lines, centered_rect, format_task_detail_entries, inset_rect, masked,
    priority_style, short_id, BG_ACCENT, BG_BASE, BG_PANEL, FG_ACCENT,
};

use super::{AddField, App, AuthField, ConfirmChoice, InputMode};

const LABEL_WIDTH: u16 = 10;

fn field_label_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(FG_ACCENT)
    }
}

fn field_marker(focused: bool) -> &'static str {
    if focused {
        "▶ "
    } else {
        "  "
    }
}

impl App {
    pub(crate) fn draw(&mut self, f: &mut Frame<'_>) {
        let size = f.size();
        f.render_widget(Clear, size);
        f.render_widget(Block::default().style(Style::default().bg(BG_BASE)), size);

        if matches!(self.input_mode, InputMode::Connecting | InputMode::Auth) {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(1),
                    Constraint::Min(5),
                    Constraint::Length(2),
                ])
                .split(size);
            self.draw_header(f, chunks[0]);
            self.draw_auth_screen(f, chunks[1]);
            self.draw_footer(f, chunks[2]);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(2),
            ])
            .split(size);

        self.draw_header(f, chunks[0]);
        self.draw_tabs(f, chunks[1]);
        self.draw_tasks(f, chunks[2]);
        self.draw_footer(f, chunks[3]);

        match self.input_mode {
            InputMode::Add => self.draw_add_overlay(f, size),
            InputMode::Inspect => self.draw_detail_overlay(f, size),
            InputMode::Help => self.draw_help_overlay(f, size),
            InputMode::ConfirmDelete => self.draw_confirm_overlay(f, size),
            InputMode::Normal | InputMode::Connecting | InputMode::Auth => {}
        }
    }

    fn draw_header(&self, f: &mut Frame<'_>, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);

        let host = self.config.api_url().host_str().unwrap_or("api").to_string();
        let mut left_spans = vec![Span::styled(
            format!(" tick v{} ✅ ", APP_VERSION),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )];
        if self.store.user().is_some() {
            left_spans.push(Span::raw(format!("— {}", self.store.view().title())));
            left_spans.push(Span::raw("  "));
        }
        left_spans.push(Span::styled(
            format!("🌐 {}", host),
            Style::default().fg(Color::DarkGray),
        ));
        f.render_widget(
            Paragraph::new(Line::from(left_spans)).style(Style::default().bg(BG_BASE)),
            cols[0],
        );

        let mut right_spans = Vec::new();
        if let Some(user) = self.store.user() {
            right_spans.push(Span::styled(
                format!("⇅ {}", self.store.sort_mode().label()),
                Style::default().fg(Color::DarkGray),
            ));
            right_spans.push(Span::raw("  "));
            right_spans.push(Span::styled(
                format!("👤 {} ", user.display_name()),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ));
        }
        f.render_widget(
            Paragraph::new(Line::from(right_spans))
                .alignment(Alignment::Right)
                .style(Style::default().bg(BG_BASE)),
            cols[1],
        );
    }

    fn draw_tabs(&self, f: &mut Frame<'_>, area: Rect) {
        let counts = self.store.view_counts();
        let titles: Vec<Line> = View::ALL
            .iter()
            .map(|view| Line::from(format!("{} ({})", view.title(), counts.get(*view))))
            .collect();
        let tabs = Tabs::new(titles)
            .select(self.store.view().index())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(accent_title("Views"))
                    .border_style(Style::default().fg(Color::DarkGray))
                    .style(Style::default().bg(BG_PANEL)),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Green)
                    .bg(BG_ACCENT)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_widget(tabs, area);
    }

    fn draw_tasks(&mut self, f: &mut Frame<'_>, area: Rect) {
        let rows: Vec<Row> = self
            .store
            .visible_tasks()
            .into_iter()
            .map(|task| {
                let deadline = task.formatted_deadline().unwrap_or_else(|| String::from("—"));
                let row = Row::new(vec![
                    Cell::from(if task.completed { "✓" } else { " " }),
                    Cell::from(task.text.clone()),
                    Cell::from(task.priority.label()).style(priority_style(task.priority)),
                    Cell::from(deadline),
                    Cell::from(short_id(&task.id)),
                ]);
                if task.completed {
                    row.style(
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::CROSSED_OUT),
                    )
                } else {
                    row
                }
            })
            .collect();

        if rows.is_empty() {
            self.draw_empty_state(f, area);
            return;
        }

        let header = Row::new(vec![
            Cell::from("✓"),
            Cell::from("📝 Task"),
            Cell::from("⭐ Priority"),
            Cell::from("⏰ Deadline"),
            Cell::from("# ID"),
        ])
        .style(Style::default().add_modifier(Modifier::BOLD));

        let widths = [
            Constraint::Length(2),
            Constraint::Min(20),
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(9),
        ];

        let title = format!(
            "{} • {} completed",
            self.store.view().title(),
            self.store.completed_count()
        );
        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(accent_title(&title))
                    .border_style(Style::default().fg(Color::DarkGray))
                    .style(Style::default().bg(BG_PANEL)),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .bg(BG_ACCENT)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_empty_state(&self, f: &mut Frame<'_>, area: Rect) {
        let lines = self.empty_task_state();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .style(Style::default().bg(BG_PANEL));
        let inner = block.inner(area);
        f.render_widget(Clear, area);
        f.render_widget(block, area);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let width = inner.width.min(80).max(1);
        let mut height = (lines.len() as u16).saturating_add(2).min(inner.height);
        if height < 3 && inner.height >= 3 {
            height = 3;
        }
        let content_area = centered_rect(width, height, inner);
        f.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .alignment(Alignment::Center)
                .style(Style::default().bg(BG_PANEL)),
            content_area,
        );
    }

    fn empty_task_state(&self) -> Vec<Line<'static>> {
        let (heading, view_hint) = match self.store.view() {
            View::Inbox => ("Inbox is quiet 📥", None),
            View::Today => (
                "Nothing added today 📅",
                Some("Today lists every task created since midnight."),
            ),
            View::Upcoming => (
                "Nothing upcoming 🌱",
                Some("Add tasks from this tab to plan ahead."),
            ),
        };
        let hint_style = Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD);

        let mut lines: Vec<Line<'static>> = vec![
            Line::from(vec![Span::styled(
                heading,
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )]),
            Line::default(),
            Line::from(vec![Span::styled("Press 'a' to add a task.", hint_style)]),
            Line::from(vec![Span::styled(
                "Press 'r' to refresh from the server.",
                hint_style,
            )]),
        ];
        if let Some(hint) = view_hint {
            lines.push(Line::from(vec![Span::styled(hint, hint_style)]));
        }

        lines.push(Line::default());
        lines.push(Line::from(vec![Span::styled(
            format!(
                "Your session lives in `{}` (adjust with `--data-dir` or `TICK_DATA_DIR`).",
                self.config.data_dir().display()
            ),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
        )]));
        lines
    }

    fn draw_auth_screen(&self, f: &mut Frame<'_>, area: Rect) {
        let form = self.store.auth_form();
        let fields = AuthField::order(form.mode);
        let width = min(area.width.saturating_sub(4), 64);
        let height = fields.len() as u16 + 8;
        let popup_area = centered_rect(width, height, area);
        f.render_widget(Clear, popup_area);

        let title = match self.input_mode {
            InputMode::Connecting => "🔐 tick",
            _ => match form.mode {
                AuthMode::Login => "🔐 Log in",
                AuthMode::Signup => "🔐 Sign up",
            },
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(accent_title(title))
            .border_style(Style::default().fg(Color::DarkGray))
            .style(Style::default().bg(BG_PANEL));
        let content = inset_rect(block.inner(popup_area), 1);
        f.render_widget(block, popup_area);

        if self.input_mode == InputMode::Connecting {
            f.render_widget(
                Paragraph::new(STATUS_CONNECTING)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::Gray).bg(BG_PANEL)),
                content,
            );
            return;
        }

        let mut lines: Vec<Line> = fields
            .iter()
            .map(|field| {
                let focused = self.auth.focus == *field;
                let buffer = self.auth.buffer(*field);
                let value = if *field == AuthField::Password {
                    masked(buffer.as_str())
                } else {
                    buffer.as_str().to_string()
                };
                Line::from(vec![
                    Span::styled(
                        format!("{}{:<8}", field_marker(focused), field.label()),
                        field_label_style(focused),
                    ),
                    Span::raw(value),
                ])
            })
            .collect();

        lines.push(Line::default());
        if let Some(error) = &form.error {
            lines.push(Line::from(vec![Span::styled(
                format!("⚠️  {}", error),
                Style::default().fg(Color::Red),
            )]));
        } else {
            lines.push(Line::default());
        }
        let switch_hint = match form.mode {
            AuthMode::Login => "Ctrl+T: create an account instead",
            AuthMode::Signup => "Ctrl+T: log in to an existing account",
        };
        lines.push(Line::from(vec![Span::styled(
            switch_hint,
            Style::default().fg(Color::DarkGray),
        )]));

        f.render_widget(
            Paragraph::new(lines).style(Style::default().bg(BG_PANEL)),
            content,
        );

        if let Some(row) = fields.iter().position(|field| *field == self.auth.focus) {
            let col = self.auth.buffer(self.auth.focus).cursor_col() as u16;
            f.set_cursor(
                (content.x + LABEL_WIDTH + col).min(content.right().saturating_sub(1)),
                content.y + row as u16,
            );
        }
    }

    fn draw_add_overlay(&self, f: &mut Frame<'_>, area: Rect) {
        let width = min(area.width.saturating_sub(10), 72);
        let height = AddField::ORDER.len() as u16 + 6;
        let popup_area = centered_rect(width, height, area);
        f.render_widget(Clear, popup_area);

        let title = format!("➕ Add Task to {}", self.store.view().title());
        let block = Block::default()
            .borders(Borders::ALL)
            .title(accent_title(&title))
            .border_style(Style::default().fg(Color::DarkGray))
            .style(Style::default().bg(BG_PANEL));
        let content = inset_rect(block.inner(popup_area), 1);
        f.render_widget(block, popup_area);

        let mut lines: Vec<Line> = AddField::ORDER
            .iter()
            .map(|field| {
                let focused = self.add.focus == *field;
                let label = Span::styled(
                    format!("{}{:<8}", field_marker(focused), field.label()),
                    field_label_style(focused),
                );
                let value = match self.add.buffer(*field) {
                    Some(buffer) => Span::raw(buffer.as_str().to_string()),
                    None => Span::styled(
                        format!("◀ {} ▶", self.add.priority.label()),
                        priority_style(self.add.priority),
                    ),
                };
                Line::from(vec![label, value])
            })
            .collect();

        let deadline = self.add.deadline();
        let preview = if deadline.is_empty() {
            Span::styled("No deadline", Style::default().fg(Color::DarkGray))
        } else {
            match deadline.formatted() {
                Some(formatted) => Span::styled(formatted, Style::default().fg(Color::Green)),
                None => Span::styled("Not a valid date", Style::default().fg(Color::Yellow)),
            }
        };
        lines.push(Line::default());
        lines.push(Line::from(vec![
            Span::styled("  Due     ", Style::default().fg(Color::DarkGray)),
            preview,
        ]));

        f.render_widget(
            Paragraph::new(lines).style(Style::default().bg(BG_PANEL)),
            content,
        );

        if let Some(buffer) = self.add.buffer(self.add.focus) {
            if let Some(row) = AddField::ORDER.iter().position(|field| *field == self.add.focus) {
                let col = buffer.cursor_col() as u16;
                f.set_cursor(
                    (content.x + LABEL_WIDTH + col).min(content.right().saturating_sub(1)),
                    content.y + row as u16,
                );
            }
        }
    }

    fn draw_footer(&self, f: &mut Frame<'_>, area: Rect) {
        let lines = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.style())])
        } else {
            Line::from(vec![Span::raw("Ready")])
        };
        f.render_widget(Paragraph::new(status_line), lines[0]);

        let help = match self.input_mode {
            InputMode::Connecting => "Ctrl+C to quit",
            InputMode::Auth => {
                "Tab/↓ next field • Shift+Tab/↑ previous • Enter submit • Ctrl+T switch • Esc quit"
            }
            InputMode::Normal => {
                "nav: tab/shift+tab or 1-3 views | j/k move | q quit | overlays: enter details ℹ️ | h help ❔ | actions: a add ✚ | space toggle ✅ | x delete 🗑️ | s sort ⇅ | r refresh 🔄 | L sign out"
            }
            InputMode::Add => {
                "Tab/↓ next field • ←/→ priority • digits for the date • Enter add ✍️ • Esc cancel"
            }
            InputMode::Inspect => "Enter/Esc to close ℹ️",
            InputMode::Help => "Enter/Esc to close ❔",
            InputMode::ConfirmDelete => "←/→ choose • Space toggle • Enter confirm • Esc cancel",
        };
        let help_line = Line::from(vec![Span::styled(help, Style::default().fg(Color::DarkGray))]);
        f.render_widget(Paragraph::new(help_line), lines[1]);
    }

    fn draw_detail_overlay(&self, f: &mut Frame<'_>, area: Rect) {
        let Some(task) = self.inspect_task.as_ref() else {
            return;
        };

        let detail_entries = format_task_detail_entries(task);
        let width = min(area.width.saturating_sub(20), 90).max(40);
        let content_height = detail_entries.len() as u16 + 2;
        let popup_height = content_height
            .saturating_add(4)
            .min(area.height.saturating_sub(2))
            .max(6);
        let popup_area = centered_rect(width, popup_height, area);
        f.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(accent_title("🗒 Task Details"))
            .border_style(Style::default().fg(Color::DarkGray))
            .style(Style::default().bg(BG_PANEL));
        let inner = block.inner(popup_area);
        f.render_widget(block, popup_area);

        let rows: Vec<Row> = detail_entries
            .into_iter()
            .map(|(key, value)| {
                Row::new(vec![
                    Cell::from(key)
                        .style(Style::default().fg(FG_ACCENT).add_modifier(Modifier::BOLD)),
                    Cell::from(value),
                ])
            })
            .collect();

        let table = Table::new(rows, [Constraint::Length(14), Constraint::Min(20)])
            .block(Block::default().style(Style::default().bg(BG_PANEL)))
            .column_spacing(2);
        f.render_widget(table, inset_rect(inner, 1));
    }

    fn draw_help_overlay(&self, f: &mut Frame<'_>, area: Rect) {
        let lines = build_help_lines();
        let width = min(area.width.saturating_sub(10), 100);
        let height = min(lines.len() as u16 + 4, area.height.saturating_sub(2)).max(10);
        let popup_area = centered_rect(width, height, area);
        f.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(accent_title("⌨️ Keyboard Reference"))
            .border_style(Style::default().fg(Color::DarkGray))
            .style(Style::default().bg(BG_PANEL));
        let inner = block.inner(popup_area);
        f.render_widget(block, popup_area);

        if inner.width < 3 || inner.height < 3 {
            return;
        }

        let help_lines: Vec<Line> = lines
            .into_iter()
            .map(|(combo, desc)| {
                Line::from(vec![
                    Span::styled(format!("{:<18}", combo), Style::default().fg(Color::Cyan)),
                    Span::raw(desc),
                ])
            })
            .collect();

        f.render_widget(
            Paragraph::new(help_lines)
                .wrap(Wrap { trim: true })
                .style(Style::default().bg(BG_PANEL)),
            inset_rect(inner, 1),
        );
    }

    fn draw_confirm_overlay(&self, f: &mut Frame<'_>, area: Rect) {
        let width = min(area.width.saturating_sub(20), 60).max(40);
        let popup_area = centered_rect(width, 8, area);
        f.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(accent_title("🗑 Confirm Deletion"))
            .border_style(Style::default().fg(Color::Red))
            .style(Style::default().bg(BG_PANEL));
        let inner = block.inner(popup_area);
        f.render_widget(block, popup_area);

        let task_text = self
            .selected_task()
            .map(|task| task.text.as_str())
            .unwrap_or("selected task");

        let yes_style = if self.confirm_choice == ConfirmChoice::Yes {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Red)
        };
        let no_style = if self.confirm_choice == ConfirmChoice::No {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Gray)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };

        let lines = vec![
            Line::from(vec![Span::styled(
                "This action cannot be undone.",
                Style::default().fg(Color::Red),
            )]),
            Line::from(vec![Span::styled(
                format!("Delete '{}'?", task_text),
                Style::default().fg(Color::White),
            )]),
            Line::default(),
            Line::from(vec![
                Span::styled("  Yes  ", yes_style),
                Span::raw("    "),
                Span::styled("  No  ", no_style),
            ]),
        ];

        f.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .alignment(Alignment::Center)
                .style(Style::default().bg(BG_PANEL)),
            inset_rect(inner, 1),
        );
    }
}
