use std::time::Duration;

pub(crate) const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub(crate) const TICK_RATE: Duration = Duration::from_millis(200);
pub(crate) const STATUS_TTL: Duration = Duration::from_secs(5);

pub(crate) const DAY_DIGITS: usize = 2;
pub(crate) const MONTH_DIGITS: usize = 2;
pub(crate) const YEAR_DIGITS: usize = 4;

pub(crate) const STATUS_CONNECTING: &str = "Checking saved session…";
pub(crate) const STATUS_ENTER_ADD: &str =
    "Describe the task • Tab moves between fields • ←/→ change priority • Enter adds • Esc cancels";
pub(crate) const STATUS_EMPTY_TEXT: &str = "Enter some text before adding a task";
pub(crate) const STATUS_REFRESHED: &str = "Refreshed tasks";
pub(crate) const STATUS_SIGNED_OUT: &str = "Signed out";
pub(crate) const STATUS_VIEW_DETAILS: &str = "Viewing task details • Enter/Esc to close";
pub(crate) const STATUS_HELP: &str = "Keyboard reference — Enter/Esc to close";
pub(crate) const STATUS_CONFIRM_DELETE: &str =
    "Confirm deletion — arrows choose, Enter confirms, Esc cancels";
