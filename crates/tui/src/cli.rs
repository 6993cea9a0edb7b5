use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::model::{Priority, SortMode, View};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tick",
    version,
    about = "A keyboard-first client for your hosted task list.",
    after_help = "Examples:\n  tick             Launch the TUI (same as `tick tui`)\n  tick login --email you@example.com\n  tick add Buy milk --priority high --deadline 2025-03-05\n  tick list --view today --sort deadline\n  tick delete 65f1c0ffee"
)]
pub struct Cli {
    /// Override the data directory (defaults to platform-specific app dir)
    #[arg(long, value_name = "PATH", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Override the API base URL (defaults to TICK_API_URL or the hosted service)
    #[arg(long, value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Override the tracing filter (e.g. "info", "debug", "tick_core=trace")
    #[arg(long = "log", value_name = "DIRECTIVE", global = true)]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Launch the keyboard-first terminal UI (default command)
    Tui,
    /// Log in and store the session credential
    Login(LoginArgs),
    /// Create an account and store the session credential
    Signup(SignupArgs),
    /// Forget the stored session credential
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Print tasks in a view
    List(ListArgs),
    /// Create a task in a view
    Add(AddArgs),
    /// Change the text, priority, deadline, or view of a task
    Edit(EditArgs),
    /// Flip completion of one or more tasks by id
    Toggle(IdsArgs),
    /// Delete one or more tasks by id
    Delete(IdsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    /// Password (prompted when omitted)
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SignupArgs {
    #[arg(long)]
    pub email: String,

    /// Display name
    #[arg(long)]
    pub name: String,

    /// Password (prompted when omitted)
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// View to show
    #[arg(long, value_enum, default_value_t = View::Inbox)]
    pub view: View,

    /// Display ordering
    #[arg(long, value_enum, default_value_t = SortMode::Default)]
    pub sort: SortMode,

    /// Emit JSON instead of a table
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Task text
    #[arg(value_name = "TEXT", required = true)]
    pub text: Vec<String>,

    /// Priority (none, low, medium, high)
    #[arg(long, value_enum, default_value_t = Priority::None)]
    pub priority: Priority,

    /// Deadline as an ISO date (e.g. 2025-03-05)
    #[arg(long, value_name = "DATE")]
    pub deadline: Option<String>,

    /// View to file the task under
    #[arg(long, value_enum, default_value_t = View::Inbox)]
    pub view: View,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Task id
    #[arg(value_name = "ID")]
    pub id: String,

    /// Replacement text
    #[arg(long)]
    pub text: Option<String>,

    #[arg(long, value_enum)]
    pub priority: Option<Priority>,

    /// New deadline as an ISO date (e.g. 2025-03-05)
    #[arg(long, value_name = "DATE", conflicts_with = "clear_deadline")]
    pub deadline: Option<String>,

    /// Remove the deadline
    #[arg(long, action = ArgAction::SetTrue)]
    pub clear_deadline: bool,

    /// Move the task to another view
    #[arg(long, value_enum)]
    pub view: Option<View>,
}

#[derive(Args, Debug, Clone)]
pub struct IdsArgs {
    /// One or more task ids (shown by `tick list` and the TUI detail overlay)
    #[arg(value_name = "ID", required = true)]
    pub ids: Vec<String>,
}

impl AddArgs {
    pub fn joined_text(&self) -> String {
        self.text.join(" ")
    }
}
