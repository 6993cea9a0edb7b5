use crate::deadline::Deadline;
use crate::model::{NewTask, Priority, User, View};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Startup, before the stored credential has been checked.
    Unknown,
    Anonymous,
    Authenticated(User),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Login,
    Signup,
}

impl AuthMode {
    pub fn title(&self) -> &'static str {
        match self {
            AuthMode::Login => "Login",
            AuthMode::Signup => "Sign Up",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            AuthMode::Login => AuthMode::Signup,
            AuthMode::Signup => AuthMode::Login,
        }
    }
}

/// Contents of the login/signup form, including the last inline error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub email: String,
    pub password: String,
    pub name: String,
    pub error: Option<String>,
}

impl AuthForm {
    pub fn set_mode(&mut self, mode: AuthMode) {
        self.mode = mode;
        self.error = None;
    }

    pub fn clear_fields(&mut self) {
        self.email.clear();
        self.password.clear();
        self.name.clear();
    }
}

/// The in-progress "add task" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub text: String,
    pub priority: Priority,
    pub deadline: Deadline,
}

impl TaskDraft {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Request body for this draft in `view`, or `None` when the text is blank.
    pub fn to_new_task(&self, view: View) -> Option<NewTask> {
        if self.is_blank() {
            return None;
        }
        Some(NewTask::new(
            self.text.clone(),
            self.priority,
            self.deadline.clone(),
            view,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_draft_produces_no_request() {
        let draft = TaskDraft {
            text: "   ".into(),
            ..TaskDraft::default()
        };
        assert!(draft.to_new_task(View::Inbox).is_none());
    }

    #[test]
    fn draft_reset_restores_defaults() {
        let mut draft = TaskDraft {
            text: "Pay rent".into(),
            priority: Priority::High,
            deadline: Deadline::new("1", "4", "2025"),
        };
        let request = draft.to_new_task(View::Upcoming).unwrap();
        assert_eq!(request.formatted_deadline.as_deref(), Some("Apr 1, 2025"));
        assert_eq!(request.view, View::Upcoming);

        draft.reset();
        assert_eq!(draft, TaskDraft::default());
        assert_eq!(draft.priority, Priority::None);
    }

    #[test]
    fn switching_auth_mode_clears_error() {
        let mut form = AuthForm {
            error: Some("Invalid credentials".into()),
            ..AuthForm::default()
        };
        form.set_mode(form.mode.toggle());
        assert_eq!(form.mode, AuthMode::Signup);
        assert!(form.error.is_none());
    }
}
