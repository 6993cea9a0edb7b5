use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::View;
use crate::tui::buffer::TextBuffer;

use super::{step, AddField, App, ConfirmChoice, InputMode};

#[derive(Debug, Clone, Copy)]
pub(crate) enum NormalAction {
    Quit,
    EnterAdd,
    ShowDetails,
    ShowHelp,
    Refresh,
    ToggleDone,
    Delete,
    CycleSort,
    SignOut,
    SelectNext,
    SelectPrev,
    PrevView,
    NextView,
    JumpTo(View),
    SelectFirst,
    SelectLast,
}

impl NormalAction {
    fn from_event(key: &KeyEvent) -> Option<Self> {
        match key.code {
            KeyCode::Char('q') => Some(Self::Quit),
            KeyCode::Char('a') => Some(Self::EnterAdd),
            KeyCode::Char('r') => Some(Self::Refresh),
            KeyCode::Char('h') | KeyCode::Char('?') => Some(Self::ShowHelp),
            KeyCode::Char(' ') | KeyCode::Char('d') => Some(Self::ToggleDone),
            KeyCode::Char('x') | KeyCode::Delete => Some(Self::Delete),
            KeyCode::Char('s') => Some(Self::CycleSort),
            KeyCode::Char('L') => Some(Self::SignOut),
            KeyCode::Char('1') => Some(Self::JumpTo(View::Inbox)),
            KeyCode::Char('2') => Some(Self::JumpTo(View::Today)),
            KeyCode::Char('3') => Some(Self::JumpTo(View::Upcoming)),
            KeyCode::Char('j') | KeyCode::Down => Some(Self::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => Some(Self::SelectPrev),
            KeyCode::Left | KeyCode::BackTab => Some(Self::PrevView),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => Some(Self::NextView),
            KeyCode::Enter => Some(Self::ShowDetails),
            KeyCode::Home => Some(Self::SelectFirst),
            KeyCode::End => Some(Self::SelectLast),
            _ => None,
        }
    }
}

fn is_interrupt(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('c')) && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Apply a line-editing key to `buffer`. Characters rejected by `accept` are dropped.
/// Returns false when the key is not an editing key.
fn edit_buffer(buffer: &mut TextBuffer, key: &KeyEvent, accept: impl Fn(char) -> bool) -> bool {
    match key.code {
        KeyCode::Char(c) => {
            if accept(c) {
                buffer.insert_char(c);
            }
        }
        KeyCode::Backspace => buffer.backspace(),
        KeyCode::Delete => buffer.delete_char(),
        KeyCode::Left => buffer.move_left(),
        KeyCode::Right => buffer.move_right(),
        KeyCode::Home => buffer.move_home(),
        KeyCode::End => buffer.move_end(),
        _ => return false,
    }
    true
}

impl App {
    pub(crate) fn on_key(&mut self, key: KeyEvent) {
        if is_interrupt(&key) {
            self.should_quit = true;
            return;
        }

        match self.input_mode {
            InputMode::Connecting => {}
            InputMode::Auth => self.handle_auth_mode(key),
            InputMode::Normal => self.handle_normal_mode(key),
            InputMode::Add => self.handle_add_mode(key),
            InputMode::Inspect | InputMode::Help => self.handle_overlay_mode(key),
            InputMode::ConfirmDelete => self.handle_confirm_delete_mode(key),
        }
    }

    fn handle_normal_mode(&mut self, key: KeyEvent) {
        if let Some(action) = NormalAction::from_event(&key) {
            self.execute_normal_action(action);
        }
    }

    fn execute_normal_action(&mut self, action: NormalAction) {
        match action {
            NormalAction::Quit => self.should_quit = true,
            NormalAction::EnterAdd => self.begin_add(),
            NormalAction::ShowDetails => self.show_selected_details(),
            NormalAction::ShowHelp => self.show_help_overlay(),
            NormalAction::Refresh => self.refresh(),
            NormalAction::ToggleDone => self.toggle_selected(),
            NormalAction::Delete => self.prompt_delete(),
            NormalAction::CycleSort => self.cycle_sort(),
            NormalAction::SignOut => self.sign_out(),
            NormalAction::SelectNext => self.select_next(),
            NormalAction::SelectPrev => self.select_prev(),
            NormalAction::PrevView => self.prev_view(),
            NormalAction::NextView => self.next_view(),
            NormalAction::JumpTo(view) => self.set_view(view),
            NormalAction::SelectFirst => self.select_first(),
            NormalAction::SelectLast => self.select_last(),
        }
    }

    fn handle_auth_mode(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Char('t')) && key.modifiers.contains(KeyModifiers::CONTROL)
        {
            self.toggle_auth_mode();
            return;
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => self.submit_auth(),
            KeyCode::Tab | KeyCode::Down => self.focus_auth_field(true),
            KeyCode::BackTab | KeyCode::Up => self.focus_auth_field(false),
            _ => {
                edit_buffer(self.auth.focused_mut(), &key, |_| true);
            }
        }
    }

    fn handle_add_mode(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.cancel_add(),
            KeyCode::Enter => self.submit_add(),
            KeyCode::Tab | KeyCode::Down => {
                self.add.focus = step(&AddField::ORDER, self.add.focus, true);
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.add.focus = step(&AddField::ORDER, self.add.focus, false);
            }
            _ => self.edit_add_field(key),
        }
    }

    fn edit_add_field(&mut self, key: KeyEvent) {
        match self.add.focus {
            AddField::Priority => match key.code {
                KeyCode::Left => self.add.priority = self.add.priority.prev(),
                KeyCode::Right | KeyCode::Char(' ') => self.add.priority = self.add.priority.next(),
                _ => {}
            },
            AddField::Text => {
                if let Some(buffer) = self.add.focused_mut() {
                    edit_buffer(buffer, &key, |_| true);
                }
            }
            AddField::Day | AddField::Month | AddField::Year => {
                if let Some(buffer) = self.add.focused_mut() {
                    edit_buffer(buffer, &key, |c| c.is_ascii_digit());
                }
            }
        }
    }

    fn handle_overlay_mode(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter)
            || (self.input_mode == InputMode::Help
                && matches!(key.code, KeyCode::Char('h') | KeyCode::Char('?')))
        {
            self.inspect_task = None;
            self.input_mode = InputMode::Normal;
            self.status = None;
        }
    }

    fn handle_confirm_delete_mode(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.set_status_info("Deletion cancelled");
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') => {
                self.confirm_choice = self.confirm_choice.toggle();
            }
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                if self.confirm_choice == ConfirmChoice::Yes {
                    self.perform_delete();
                } else {
                    self.set_status_info("Deletion cancelled");
                }
            }
            _ => {}
        }
    }
}
