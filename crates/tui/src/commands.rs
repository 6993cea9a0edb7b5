use std::fmt;
use std::io::Write;

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;

use crate::cli::{AddArgs, CliCommand, EditArgs, IdsArgs, ListArgs, LoginArgs, SignupArgs};
use crate::config::AppConfig;
use crate::core::Deadline;
use crate::model::{DeleteResult, Priority, SortMode, Task, TaskPatch, View, ViewCounts};
use crate::store::TaskStore;

const NOT_LOGGED_IN: &str = "Not logged in. Run `tick login --email <EMAIL>` first";

/// Run a one-shot command on an internal Tokio runtime.
pub fn execute_blocking<W: Write>(
    config: &AppConfig,
    command: CliCommand,
    writer: W,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    runtime.block_on(execute(config, command, writer))
}

pub async fn execute<W: Write>(
    config: &AppConfig,
    command: CliCommand,
    mut writer: W,
) -> Result<()> {
    let mut store = TaskStore::from_config(config).context("failed to build API client")?;
    match command {
        CliCommand::Login(args) => handle_login(&mut store, args, &mut writer).await,
        CliCommand::Signup(args) => handle_signup(&mut store, args, &mut writer).await,
        CliCommand::Logout => {
            store.logout();
            writeln!(writer, "Logged out")?;
            Ok(())
        }
        CliCommand::Whoami => handle_whoami(&mut store, &mut writer).await,
        CliCommand::List(args) => handle_list(&mut store, &args, &mut writer).await,
        CliCommand::Add(args) => handle_add(&mut store, &args, &mut writer).await,
        CliCommand::Edit(args) => handle_edit(&mut store, &args, &mut writer).await,
        CliCommand::Toggle(args) => handle_toggle(&mut store, &args, &mut writer).await,
        CliCommand::Delete(args) => handle_delete(&mut store, &args, &mut writer).await,
        CliCommand::Tui => Err(anyhow!("launch interactive surfaces directly")),
    }
}

async fn handle_login<W: Write>(
    store: &mut TaskStore,
    args: LoginArgs,
    mut writer: W,
) -> Result<()> {
    let password = resolve_password(args.password)?;
    let user = store.login(&args.email, &password).await?;
    writeln!(writer, "Logged in as {} <{}>", user.display_name(), user.email)?;
    Ok(())
}

async fn handle_signup<W: Write>(
    store: &mut TaskStore,
    args: SignupArgs,
    mut writer: W,
) -> Result<()> {
    let password = resolve_password(args.password)?;
    let user = store.signup(&args.email, &password, &args.name).await?;
    writeln!(
        writer,
        "Created account for {} <{}>",
        user.display_name(),
        user.email
    )?;
    Ok(())
}

fn resolve_password(provided: Option<String>) -> Result<String> {
    match provided {
        Some(password) => Ok(password),
        None => rpassword::prompt_password("Password: ").context("failed to read password"),
    }
}

async fn handle_whoami<W: Write>(store: &mut TaskStore, mut writer: W) -> Result<()> {
    match store.bootstrap().await.user() {
        Some(user) => writeln!(
            writer,
            "{} <{}> ({})",
            user.display_name(),
            user.email,
            user.id
        )?,
        None => writeln!(writer, "Not logged in")?,
    }
    Ok(())
}

async fn require_session(store: &mut TaskStore) -> Result<()> {
    if !store.bootstrap().await.is_authenticated() {
        bail!(NOT_LOGGED_IN);
    }
    Ok(())
}

async fn handle_list<W: Write>(
    store: &mut TaskStore,
    args: &ListArgs,
    mut writer: W,
) -> Result<()> {
    require_session(store).await?;
    store.set_view(args.view);
    store.set_sort_mode(args.sort);

    let visible = store.visible_tasks();
    let counts = store.view_counts();
    let completed = store.completed_count();

    if args.json {
        let output = ListOutput {
            view: args.view,
            sort: args.sort,
            counts,
            completed,
            tasks: visible.iter().map(|task| TaskOutput::from(*task)).collect(),
        };
        serde_json::to_writer_pretty(&mut writer, &output)?;
        writeln!(writer)?;
        return Ok(());
    }

    writeln!(
        writer,
        "{} | {} | {} | {} completed",
        count_label(View::Inbox, &counts),
        count_label(View::Today, &counts),
        count_label(View::Upcoming, &counts),
        completed
    )?;
    if visible.is_empty() {
        writeln!(writer, "No tasks in {}", args.view.title())?;
        return Ok(());
    }
    for task in visible {
        write_task_line(&mut writer, task)?;
    }
    Ok(())
}

fn count_label(view: View, counts: &ViewCounts) -> String {
    format!("{} {}", view.title(), counts.get(view))
}

fn write_task_line<W: Write>(mut writer: W, task: &Task) -> Result<()> {
    let mark = if task.completed { "[x]" } else { "[ ]" };
    write!(writer, "{} {}  {}", mark, task.id, task.text)?;
    if task.priority != Priority::None {
        write!(writer, "  ({})", task.priority.label())?;
    }
    if let Some(deadline) = task.formatted_deadline() {
        write!(writer, "  due {}", deadline)?;
    }
    writeln!(writer)?;
    Ok(())
}

#[derive(Serialize)]
struct ListOutput<'a> {
    view: View,
    sort: SortMode,
    counts: ViewCounts,
    completed: usize,
    tasks: Vec<TaskOutput<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskOutput<'a> {
    #[serde(flatten)]
    task: &'a Task,
    formatted_deadline: Option<String>,
}

impl<'a> From<&'a Task> for TaskOutput<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            task,
            formatted_deadline: task.formatted_deadline(),
        }
    }
}

async fn handle_add<W: Write>(
    store: &mut TaskStore,
    args: &AddArgs,
    mut writer: W,
) -> Result<()> {
    require_session(store).await?;
    store.set_view(args.view);
    {
        let draft = store.draft_mut();
        draft.text = args.joined_text();
        draft.priority = args.priority;
        draft.deadline = args
            .deadline
            .as_deref()
            .map(Deadline::from_iso)
            .unwrap_or_default();
    }

    match store.add_task().await? {
        Some(task) => {
            write!(writer, "Added ")?;
            write_task_line(&mut writer, &task)?;
        }
        None => writeln!(writer, "Nothing to add: task text is blank")?,
    }
    Ok(())
}

fn edit_patch(args: &EditArgs) -> TaskPatch {
    let mut patch = TaskPatch::default();
    if let Some(text) = &args.text {
        patch = patch.with_text(text.trim());
    }
    if let Some(priority) = args.priority {
        patch = patch.with_priority(priority);
    }
    if args.clear_deadline {
        patch = patch.with_deadline(Deadline::default());
    } else if let Some(deadline) = args.deadline.as_deref() {
        patch = patch.with_deadline(Deadline::from_iso(deadline));
    }
    if let Some(view) = args.view {
        patch = patch.with_view(view);
    }
    patch
}

async fn handle_edit<W: Write>(
    store: &mut TaskStore,
    args: &EditArgs,
    mut writer: W,
) -> Result<()> {
    require_session(store).await?;
    if matches!(&args.text, Some(text) if text.trim().is_empty()) {
        bail!("Task text cannot be blank");
    }
    match store.update_task(&args.id, edit_patch(args)).await? {
        Some(task) => {
            write!(writer, "Updated ")?;
            write_task_line(&mut writer, &task)?;
        }
        None => writeln!(writer, "Not found: {}", args.id)?,
    }
    Ok(())
}

async fn handle_toggle<W: Write>(
    store: &mut TaskStore,
    args: &IdsArgs,
    mut writer: W,
) -> Result<()> {
    require_session(store).await?;
    let mut missing = Vec::new();
    for id in &args.ids {
        match store.toggle_task(id).await? {
            Some(task) if task.completed => {
                writeln!(writer, "Completed {}  {}", task.id, task.text)?
            }
            Some(task) => writeln!(writer, "Reopened {}  {}", task.id, task.text)?,
            None => missing.push(id.clone()),
        }
    }
    if !missing.is_empty() {
        writeln!(writer, "Not found: {}", missing.join(", "))?;
    }
    Ok(())
}

async fn handle_delete<W: Write>(
    store: &mut TaskStore,
    args: &IdsArgs,
    mut writer: W,
) -> Result<()> {
    require_session(store).await?;
    let mut results = Vec::with_capacity(args.ids.len());
    for id in &args.ids {
        let deleted = store.delete_task(id).await?;
        results.push(DeleteResult {
            id: id.clone(),
            deleted,
        });
    }
    let summary = DeleteSummary::from_results(&results);
    summary.write_to(&mut writer)?;
    Ok(())
}

struct DeleteSummary {
    deleted: usize,
    missing: Vec<String>,
}

impl DeleteSummary {
    fn from_results(results: &[DeleteResult]) -> Self {
        let mut deleted = 0usize;
        let mut missing = Vec::new();
        for result in results {
            if result.deleted {
                deleted += 1;
            } else {
                missing.push(result.id.clone());
            }
        }
        Self { deleted, missing }
    }

    fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "{}", SummaryLine::deleted(self.deleted))?;
        if !self.missing.is_empty() {
            writeln!(writer, "Not found: {}", self.missing.join(", "))?;
        }
        Ok(())
    }
}

enum SummaryLine {
    Deleted(usize),
    NoneDeleted,
}

impl SummaryLine {
    fn deleted(count: usize) -> Self {
        if count > 0 {
            SummaryLine::Deleted(count)
        } else {
            SummaryLine::NoneDeleted
        }
    }
}

impl fmt::Display for SummaryLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryLine::Deleted(count) => {
                write!(
                    f,
                    "Deleted {} task{}",
                    count,
                    if *count == 1 { "" } else { "s" }
                )
            }
            SummaryLine::NoneDeleted => write!(f, "No tasks deleted"),
        }
    }
}
