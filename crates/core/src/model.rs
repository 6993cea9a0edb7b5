use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

use crate::deadline::Deadline;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    #[default]
    #[serde(other)]
    None,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::None,
        Priority::Low,
        Priority::Medium,
        Priority::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::None => "none",
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::None => "No Priority",
            Priority::Low => "Priority 1",
            Priority::Medium => "Priority 2",
            Priority::High => "Priority 3",
        }
    }

    /// Position when sorting by priority; lower ranks come first.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
            Priority::None => 3,
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Priority::None),
            "low" | "p1" | "1" => Ok(Priority::Low),
            "medium" | "med" | "p2" | "2" => Ok(Priority::Medium),
            "high" | "p3" | "3" => Ok(Priority::High),
            other => Err(anyhow!(
                "Unknown priority '{}': expected none|low|medium|high",
                other
            )),
        }
    }
}

impl ValueEnum for Priority {
    fn value_variants<'a>() -> &'a [Self] {
        &Self::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}

/// Navigation bucket a task list is shown in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Today,
    Upcoming,
    #[default]
    #[serde(other)]
    Inbox,
}

impl View {
    pub const ALL: [View; 3] = [View::Inbox, View::Today, View::Upcoming];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Inbox => "inbox",
            View::Today => "today",
            View::Upcoming => "upcoming",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::Inbox => "Inbox",
            View::Today => "Today",
            View::Upcoming => "Upcoming",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            View::Inbox => 0,
            View::Today => 1,
            View::Upcoming => 2,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for View {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inbox" => Ok(View::Inbox),
            "today" => Ok(View::Today),
            "upcoming" => Ok(View::Upcoming),
            other => Err(anyhow!(
                "Unknown view '{}': expected inbox|today|upcoming",
                other
            )),
        }
    }
}

impl ValueEnum for View {
    fn value_variants<'a>() -> &'a [Self] {
        &Self::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Default,
    Priority,
    Deadline,
}

impl SortMode {
    pub const ALL: [SortMode; 3] = [SortMode::Default, SortMode::Priority, SortMode::Deadline];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Default => "default",
            SortMode::Priority => "priority",
            SortMode::Deadline => "deadline",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortMode::Default => "Default",
            SortMode::Priority => "Priority",
            SortMode::Deadline => "Deadline",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SortMode::Default => SortMode::Priority,
            SortMode::Priority => SortMode::Deadline,
            SortMode::Deadline => SortMode::Default,
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" | "none" | "created" => Ok(SortMode::Default),
            "priority" => Ok(SortMode::Priority),
            "deadline" | "due" => Ok(SortMode::Deadline),
            other => Err(anyhow!(
                "Unknown sort mode '{}': expected default|priority|deadline",
                other
            )),
        }
    }
}

impl ValueEnum for SortMode {
    fn value_variants<'a>() -> &'a [Self] {
        &Self::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

/// A task as confirmed by the server.
///
/// The display form of the deadline is always derived from [`Task::deadline`]; any copy the
/// server echoes back is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(alias = "_id")]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "deserialize_deadline")]
    pub deadline: Deadline,
    #[serde(default)]
    pub view: View,
    pub date: DateTime<Utc>,
}

/// A `null` deadline is stored the same way as a missing one.
fn deserialize_deadline<'de, D>(deserializer: D) -> Result<Deadline, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Deadline>::deserialize(deserializer)?.unwrap_or_default())
}

impl Task {
    pub fn formatted_deadline(&self) -> Option<String> {
        self.deadline.formatted()
    }

    pub fn deadline_date(&self) -> Option<NaiveDate> {
        self.deadline.date()
    }
}

/// Body of a task creation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub text: String,
    pub priority: Priority,
    pub deadline: Deadline,
    pub formatted_deadline: Option<String>,
    pub view: View,
}

impl NewTask {
    pub fn new(
        text: impl Into<String>,
        priority: Priority,
        deadline: Deadline,
        view: View,
    ) -> Self {
        let formatted_deadline = deadline.formatted();
        Self {
            text: text.into(),
            priority,
            deadline,
            formatted_deadline,
            view,
        }
    }
}

/// Partial update sent to the server; only populated fields are serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Deadline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_deadline: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<View>,
}

impl TaskPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_view(mut self, view: View) -> Self {
        self.view = Some(view);
        self
    }

    /// Set the deadline together with its derived display form.
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.formatted_deadline = Some(deadline.formatted());
        self.deadline = Some(deadline);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.deadline.is_none()
            && self.view.is_none()
    }
}

/// Credential and user returned by login or signup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TasksEnvelope {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TaskEnvelope {
    pub task: Task,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// Per-view badge counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViewCounts {
    pub inbox: usize,
    pub today: usize,
    pub upcoming: usize,
}

impl ViewCounts {
    pub fn get(&self, view: View) -> usize {
        match view {
            View::Inbox => self.inbox,
            View::Today => self.today,
            View::Upcoming => self.upcoming,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResult {
    pub id: String,
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn task_deserializes_from_server_shape() {
        let task: Task = serde_json::from_value(json!({
            "_id": "665f1c",
            "text": "Buy milk",
            "completed": false,
            "priority": "high",
            "deadline": { "day": "05", "month": "03", "year": "2025" },
            "formattedDeadline": "stale value",
            "view": "upcoming",
            "date": "2025-03-01T09:30:00.000Z"
        }))
        .unwrap();

        assert_eq!(task.id, "665f1c");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.view, View::Upcoming);
        assert_eq!(task.formatted_deadline().as_deref(), Some("Mar 5, 2025"));
    }

    #[test]
    fn task_tolerates_missing_optional_fields() {
        let task: Task = serde_json::from_value(json!({
            "id": "1",
            "text": "Plain",
            "priority": "urgent",
            "date": "2025-03-01T09:30:00Z"
        }))
        .unwrap();

        assert!(!task.completed);
        assert_eq!(task.priority, Priority::None);
        assert_eq!(task.view, View::Inbox);
        assert!(task.deadline.is_empty());
        assert_eq!(task.formatted_deadline(), None);
    }

    #[test]
    fn task_list_accepts_null_deadline_and_unknown_enums() {
        let envelope: TasksEnvelope = serde_json::from_value(json!({
            "tasks": [
                {
                    "_id": "1",
                    "text": "No deadline object",
                    "deadline": null,
                    "view": "someday",
                    "date": "2025-03-01T09:30:00Z"
                },
                {
                    "_id": "2",
                    "text": "Dated",
                    "priority": "high",
                    "deadline": { "day": "05", "month": "03", "year": "2025" },
                    "view": "upcoming",
                    "date": "2025-03-01T09:30:00Z"
                }
            ]
        }))
        .unwrap();

        assert_eq!(envelope.tasks.len(), 2);
        assert!(envelope.tasks[0].deadline.is_empty());
        assert_eq!(envelope.tasks[0].view, View::Inbox);
        assert_eq!(envelope.tasks[1].priority, Priority::High);
        assert_eq!(envelope.tasks[1].view, View::Upcoming);
        assert_eq!(
            envelope.tasks[1].formatted_deadline().as_deref(),
            Some("Mar 5, 2025")
        );
        assert_eq!(
            serde_json::from_value::<Priority>(json!("urgent")).unwrap(),
            Priority::None
        );
    }

    #[test]
    fn new_task_serializes_derived_deadline() {
        let task = NewTask::new(
            "Ship release",
            Priority::Medium,
            Deadline::new("5", "3", "2025"),
            View::Today,
        );
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(
            value,
            json!({
                "text": "Ship release",
                "priority": "medium",
                "deadline": { "day": "5", "month": "3", "year": "2025" },
                "formattedDeadline": "Mar 5, 2025",
                "view": "today"
            })
        );
    }

    #[test]
    fn patch_serializes_only_populated_fields() {
        let value = serde_json::to_value(TaskPatch::completed(true)).unwrap();
        assert_eq!(value, json!({ "completed": true }));

        let cleared = TaskPatch::default().with_deadline(Deadline::default());
        let value = serde_json::to_value(cleared).unwrap();
        assert_eq!(
            value,
            json!({
                "deadline": { "day": "", "month": "", "year": "" },
                "formattedDeadline": null
            })
        );
    }

    #[test]
    fn priority_parses_aliases_and_cycles() {
        assert_eq!("MED".parse::<Priority>().unwrap(), Priority::Medium);
        assert_eq!("p3".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(Priority::High.next(), Priority::None);
        assert_eq!(Priority::None.prev(), Priority::High);
    }

    #[test]
    fn user_display_name_falls_back_to_email() {
        let user = User {
            id: "u1".into(),
            email: "ada@example.com".into(),
            name: Some("  ".into()),
        };
        assert_eq!(user.display_name(), "ada@example.com");
    }
}
