use std::time::Instant;

use ratatui::style::{Color, Style};
use ratatui::widgets::TableState;
use tokio::runtime::Runtime;
use tracing::info;

use super::buffer::TextBuffer;
use super::constants::*;
use crate::config::AppConfig;
use crate::core::{AuthMode, Deadline};
use crate::model::{Priority, Task, View};
use crate::store::TaskStore;

mod input;
mod render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Connecting,
    Auth,
    Normal,
    Add,
    Inspect,
    Help,
    ConfirmDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthField {
    Email,
    Password,
    Name,
}

impl AuthField {
    fn order(mode: AuthMode) -> &'static [AuthField] {
        match mode {
            AuthMode::Login => &[AuthField::Email, AuthField::Password],
            AuthMode::Signup => &[AuthField::Name, AuthField::Email, AuthField::Password],
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AuthField::Email => "Email",
            AuthField::Password => "Password",
            AuthField::Name => "Name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddField {
    Text,
    Priority,
    Day,
    Month,
    Year,
}

impl AddField {
    const ORDER: [AddField; 5] = [
        AddField::Text,
        AddField::Priority,
        AddField::Day,
        AddField::Month,
        AddField::Year,
    ];

    fn label(&self) -> &'static str {
        match self {
            AddField::Text => "Task",
            AddField::Priority => "Priority",
            AddField::Day => "Day",
            AddField::Month => "Month",
            AddField::Year => "Year",
        }
    }
}

/// Cycle through `order`, wrapping at either end.
fn step<T: Copy + PartialEq>(order: &[T], current: T, forward: bool) -> T {
    let idx = order.iter().position(|item| *item == current).unwrap_or(0);
    let len = order.len();
    let next = if forward {
        (idx + 1) % len
    } else {
        (idx + len - 1) % len
    };
    order[next]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfirmChoice {
    Yes,
    No,
}

impl ConfirmChoice {
    fn toggle(self) -> Self {
        match self {
            ConfirmChoice::Yes => ConfirmChoice::No,
            ConfirmChoice::No => ConfirmChoice::Yes,
        }
    }
}

#[derive(Debug, Clone)]
struct StatusMessage {
    text: String,
    kind: StatusKind,
    created_at: Instant,
}

impl StatusMessage {
    fn new<T: Into<String>>(text: T, kind: StatusKind) -> Self {
        Self {
            text: text.into(),
            kind,
            created_at: Instant::now(),
        }
    }

    fn style(&self) -> Style {
        match self.kind {
            StatusKind::Info => Style::default().fg(Color::Cyan),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum StatusKind {
    Info,
    Error,
}

struct AuthInputs {
    focus: AuthField,
    email: TextBuffer,
    password: TextBuffer,
    name: TextBuffer,
}

impl AuthInputs {
    fn new() -> Self {
        Self {
            focus: AuthField::Email,
            email: TextBuffer::new(),
            password: TextBuffer::new(),
            name: TextBuffer::new(),
        }
    }

    fn buffer(&self, field: AuthField) -> &TextBuffer {
        match field {
            AuthField::Email => &self.email,
            AuthField::Password => &self.password,
            AuthField::Name => &self.name,
        }
    }

    fn focused_mut(&mut self) -> &mut TextBuffer {
        match self.focus {
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
            AuthField::Name => &mut self.name,
        }
    }

    fn clear(&mut self) {
        self.email.clear();
        self.password.clear();
        self.name.clear();
    }
}

struct AddInputs {
    focus: AddField,
    text: TextBuffer,
    priority: Priority,
    day: TextBuffer,
    month: TextBuffer,
    year: TextBuffer,
}

impl AddInputs {
    fn new() -> Self {
        Self {
            focus: AddField::Text,
            text: TextBuffer::new(),
            priority: Priority::None,
            day: TextBuffer::with_limit(DAY_DIGITS),
            month: TextBuffer::with_limit(MONTH_DIGITS),
            year: TextBuffer::with_limit(YEAR_DIGITS),
        }
    }

    fn buffer(&self, field: AddField) -> Option<&TextBuffer> {
        match field {
            AddField::Text => Some(&self.text),
            AddField::Priority => None,
            AddField::Day => Some(&self.day),
            AddField::Month => Some(&self.month),
            AddField::Year => Some(&self.year),
        }
    }

    fn focused_mut(&mut self) -> Option<&mut TextBuffer> {
        match self.focus {
            AddField::Text => Some(&mut self.text),
            AddField::Priority => None,
            AddField::Day => Some(&mut self.day),
            AddField::Month => Some(&mut self.month),
            AddField::Year => Some(&mut self.year),
        }
    }

    fn deadline(&self) -> Deadline {
        Deadline::new(self.day.as_str(), self.month.as_str(), self.year.as_str())
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

pub(crate) struct App {
    config: AppConfig,
    runtime: Runtime,
    store: TaskStore,
    selected: usize,
    table_state: TableState,
    input_mode: InputMode,
    auth: AuthInputs,
    add: AddInputs,
    status: Option<StatusMessage>,
    inspect_task: Option<Task>,
    confirm_choice: ConfirmChoice,
    should_quit: bool,
}

impl App {
    pub(crate) fn new(config: AppConfig, runtime: Runtime, store: TaskStore) -> Self {
        Self {
            config,
            runtime,
            store,
            selected: 0,
            table_state: TableState::default(),
            input_mode: InputMode::Connecting,
            auth: AuthInputs::new(),
            add: AddInputs::new(),
            status: Some(StatusMessage::new(STATUS_CONNECTING, StatusKind::Info)),
            inspect_task: None,
            confirm_choice: ConfirmChoice::No,
            should_quit: false,
        }
    }

    /// Resolve the saved session. Runs once, after the first frame is on screen.
    pub(crate) fn start(&mut self) {
        if self.input_mode != InputMode::Connecting {
            return;
        }
        let authenticated = self
            .runtime
            .block_on(self.store.bootstrap())
            .is_authenticated();
        self.status = None;
        if authenticated {
            self.enter_task_list();
        } else {
            self.input_mode = InputMode::Auth;
        }
    }

    pub(crate) fn on_tick(&mut self) {
        if let Some(status) = &self.status {
            if status.created_at.elapsed() > STATUS_TTL {
                self.status = None;
            }
        }
    }

    pub(crate) fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn enter_task_list(&mut self) {
        self.input_mode = InputMode::Normal;
        self.selected = 0;
        self.sync_selection();
        if let Some(user) = self.store.user() {
            let message = format!("Signed in as {}", user.display_name());
            self.set_status_info(message);
        }
    }

    fn visible_len(&self) -> usize {
        self.store.visible_tasks().len()
    }

    fn selected_task(&self) -> Option<&Task> {
        self.store.visible_tasks().get(self.selected).copied()
    }

    /// Clamp the selection after the visible list changed shape.
    fn sync_selection(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            self.selected = 0;
            self.table_state.select(None);
        } else {
            self.selected = self.selected.min(len - 1);
            self.table_state.select(Some(self.selected));
        }
    }

    fn select_task_by_id(&mut self, id: &str) {
        let position = self
            .store
            .visible_tasks()
            .iter()
            .position(|task| task.id == id);
        if let Some(idx) = position {
            self.selected = idx;
        }
        self.sync_selection();
    }

    fn select_next(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        self.selected = (self.selected + 1).min(len - 1);
        self.table_state.select(Some(self.selected));
    }

    fn select_prev(&mut self) {
        if self.visible_len() == 0 {
            return;
        }
        self.selected = self.selected.saturating_sub(1);
        self.table_state.select(Some(self.selected));
    }

    fn select_first(&mut self) {
        self.selected = 0;
        self.sync_selection();
    }

    fn select_last(&mut self) {
        self.selected = self.visible_len().saturating_sub(1);
        self.sync_selection();
    }

    fn set_view(&mut self, view: View) {
        if self.store.view() == view {
            return;
        }
        self.store.set_view(view);
        self.selected = 0;
        self.sync_selection();
    }

    fn next_view(&mut self) {
        let next = step(&View::ALL, self.store.view(), true);
        self.set_view(next);
    }

    fn prev_view(&mut self) {
        let prev = step(&View::ALL, self.store.view(), false);
        self.set_view(prev);
    }

    fn cycle_sort(&mut self) {
        let selected_id = self.selected_task().map(|task| task.id.clone());
        let next = self.store.sort_mode().next();
        self.store.set_sort_mode(next);
        match selected_id {
            Some(id) => self.select_task_by_id(&id),
            None => self.sync_selection(),
        }
        self.set_status_info(format!("Sorted by {}", next.label()));
    }

    fn refresh(&mut self) {
        let selected_id = self.selected_task().map(|task| task.id.clone());
        match self.runtime.block_on(self.store.refresh()) {
            Ok(_) => self.set_status_info(STATUS_REFRESHED),
            Err(err) => {
                self.set_status_error(format!("Refresh failed: {}", err.display_message()))
            }
        }
        match selected_id {
            Some(id) => self.select_task_by_id(&id),
            None => self.sync_selection(),
        }
    }

    fn begin_add(&mut self) {
        self.add.reset();
        self.input_mode = InputMode::Add;
        self.set_status_info(STATUS_ENTER_ADD);
    }

    fn cancel_add(&mut self) {
        self.add.reset();
        self.store.draft_mut().reset();
        self.input_mode = InputMode::Normal;
        self.status = None;
    }

    fn submit_add(&mut self) {
        {
            let deadline = self.add.deadline();
            let draft = self.store.draft_mut();
            draft.text = self.add.text.as_str().to_string();
            draft.priority = self.add.priority;
            draft.deadline = deadline;
        }

        match self.runtime.block_on(self.store.add_task()) {
            Ok(Some(task)) => {
                self.add.reset();
                self.input_mode = InputMode::Normal;
                self.select_task_by_id(&task.id);
                self.set_status_info(format!("Added “{}” to {}", task.text, task.view.title()));
            }
            Ok(None) => self.set_status_error(STATUS_EMPTY_TEXT),
            Err(err) => {
                self.sync_selection();
                self.set_status_error(format!("Could not add task: {}", err.display_message()));
            }
        }
    }

    fn toggle_selected(&mut self) {
        let Some(id) = self.selected_task().map(|task| task.id.clone()) else {
            self.set_status_info("Nothing to toggle");
            return;
        };
        match self.runtime.block_on(self.store.toggle_task(&id)) {
            Ok(Some(task)) => {
                self.select_task_by_id(&task.id);
                let verb = if task.completed { "Completed" } else { "Reopened" };
                self.set_status_info(format!("{} “{}”", verb, task.text));
            }
            Ok(None) => self.set_status_error("Task not found"),
            Err(err) => {
                self.set_status_error(format!("Could not update task: {}", err.display_message()))
            }
        }
    }

    fn show_selected_details(&mut self) {
        let Some(task) = self.selected_task().cloned() else {
            self.set_status_info("Nothing to inspect");
            return;
        };
        self.inspect_task = Some(task);
        self.input_mode = InputMode::Inspect;
        self.set_status_info(STATUS_VIEW_DETAILS);
    }

    fn show_help_overlay(&mut self) {
        self.inspect_task = None;
        self.input_mode = InputMode::Help;
        self.set_status_info(STATUS_HELP);
    }

    fn prompt_delete(&mut self) {
        if self.selected_task().is_none() {
            self.set_status_info("Nothing to delete");
            return;
        }
        self.confirm_choice = ConfirmChoice::No;
        self.input_mode = InputMode::ConfirmDelete;
        self.set_status_info(STATUS_CONFIRM_DELETE);
    }

    fn perform_delete(&mut self) {
        let Some(id) = self.selected_task().map(|task| task.id.clone()) else {
            self.set_status_info("Nothing to delete");
            return;
        };
        match self.runtime.block_on(self.store.delete_task(&id)) {
            Ok(true) => self.set_status_info("Deleted task 🗑️"),
            Ok(false) => self.set_status_info("Task not found"),
            Err(err) => {
                self.set_status_error(format!("Could not delete task: {}", err.display_message()))
            }
        }
        self.sync_selection();
    }

    fn toggle_auth_mode(&mut self) {
        let mode = self.store.auth_form().mode.toggle();
        self.store.set_auth_mode(mode);
        self.auth.focus = AuthField::order(mode)[0];
        self.status = None;
    }

    fn focus_auth_field(&mut self, forward: bool) {
        let order = AuthField::order(self.store.auth_form().mode);
        self.auth.focus = step(order, self.auth.focus, forward);
    }

    fn submit_auth(&mut self) {
        {
            let form = self.store.auth_form_mut();
            form.email = self.auth.email.as_str().trim().to_string();
            form.password = self.auth.password.as_str().to_string();
            form.name = self.auth.name.as_str().trim().to_string();
        }
        if let Ok(user) = self.runtime.block_on(self.store.submit_auth()) {
            info!(user_id = user.id.as_str(), "signed in from terminal UI");
            self.auth.clear();
            self.enter_task_list();
        }
    }

    fn sign_out(&mut self) {
        self.store.logout();
        self.auth = AuthInputs::new();
        self.store.set_auth_mode(AuthMode::Login);
        self.input_mode = InputMode::Auth;
        self.sync_selection();
        self.set_status_info(STATUS_SIGNED_OUT);
    }

    pub(crate) fn set_status_info<T: Into<String>>(&mut self, message: T) {
        let mut text = String::from("ℹ️  ");
        text.push_str(&message.into());
        self.status = Some(StatusMessage::new(text, StatusKind::Info));
    }

    pub(crate) fn set_status_error<T: Into<String>>(&mut self, message: T) {
        let mut text = String::from("⚠️  ");
        text.push_str(&message.into());
        self.status = Some(StatusMessage::new(text, StatusKind::Error));
    }
}
