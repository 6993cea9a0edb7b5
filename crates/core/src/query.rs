//! Read-only projections of the task cache: view filtering, display ordering, badge counts.

use chrono::{Local, NaiveDate};

use crate::model::{SortMode, Task, View, ViewCounts};

/// Calendar day of the task's creation in local time.
pub fn created_on(task: &Task) -> NaiveDate {
    task.date.with_timezone(&Local).date_naive()
}

/// Whether `task` belongs to `view` on the given local calendar day.
pub fn in_view(task: &Task, view: View, today: NaiveDate) -> bool {
    match view {
        View::Today => created_on(task) == today,
        other => task.view == other,
    }
}

pub fn filter_tasks<'a>(tasks: &'a [Task], view: View, today: NaiveDate) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|task| in_view(task, view, today))
        .collect()
}

/// Stable in-place ordering of an already filtered list.
pub fn sort_tasks(tasks: &mut [&Task], mode: SortMode) {
    match mode {
        SortMode::Default => {}
        SortMode::Priority => tasks.sort_by_key(|task| task.priority.rank()),
        SortMode::Deadline => tasks.sort_by_key(|task| {
            let date = task.deadline_date();
            (date.is_none(), date)
        }),
    }
}

pub fn visible_tasks<'a>(
    tasks: &'a [Task],
    view: View,
    mode: SortMode,
    today: NaiveDate,
) -> Vec<&'a Task> {
    let mut visible = filter_tasks(tasks, view, today);
    sort_tasks(&mut visible, mode);
    visible
}

pub fn view_counts(tasks: &[Task], today: NaiveDate) -> ViewCounts {
    let count = |view| tasks.iter().filter(|task| in_view(task, view, today)).count();
    ViewCounts {
        inbox: count(View::Inbox),
        today: count(View::Today),
        upcoming: count(View::Upcoming),
    }
}

pub fn completed_count(tasks: &[Task]) -> usize {
    tasks.iter().filter(|task| task.completed).count()
}
