//! Single source of truth for session and task state.
//!
//! [`TaskStore`] owns the authenticated user, the cached task list, the active view and sort
//! mode, and the add-task and auth forms. Front ends read derived projections from it and
//! change it only through its methods. Remote calls are awaited before the cache is touched, so
//! the cache only ever holds server-confirmed tasks.

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::model::{AuthSession, SortMode, Task, TaskPatch, User, View, ViewCounts};
use crate::query;
use crate::session::{AuthForm, AuthMode, SessionState, TaskDraft};

pub struct TaskStore {
    api: ApiClient,
    session: SessionState,
    tasks: Vec<Task>,
    view: View,
    sort: SortMode,
    draft: TaskDraft,
    auth_form: AuthForm,
}

impl TaskStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            session: SessionState::Unknown,
            tasks: Vec::new(),
            view: View::default(),
            sort: SortMode::default(),
            draft: TaskDraft::default(),
            auth_form: AuthForm::default(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        Ok(Self::new(ApiClient::from_config(config)?))
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn user(&self) -> Option<&User> {
        self.session.user()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.session, SessionState::Unknown)
    }

    /// Whether a credential is stored, independent of the session state and the network.
    pub fn is_logged_in(&self) -> bool {
        self.api.is_logged_in()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort
    }

    pub fn set_sort_mode(&mut self, sort: SortMode) {
        self.sort = sort;
    }

    pub fn draft(&self) -> &TaskDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut TaskDraft {
        &mut self.draft
    }

    pub fn auth_form(&self) -> &AuthForm {
        &self.auth_form
    }

    pub fn auth_form_mut(&mut self) -> &mut AuthForm {
        &mut self.auth_form
    }

    pub fn set_auth_mode(&mut self, mode: AuthMode) {
        self.auth_form.set_mode(mode);
    }

    /// Tasks for the active view in display order, relative to the local calendar day.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.visible_tasks_on(Local::now().date_naive())
    }

    pub fn visible_tasks_on(&self, today: NaiveDate) -> Vec<&Task> {
        query::visible_tasks(&self.tasks, self.view, self.sort, today)
    }

    pub fn view_counts(&self) -> ViewCounts {
        self.view_counts_on(Local::now().date_naive())
    }

    pub fn view_counts_on(&self, today: NaiveDate) -> ViewCounts {
        query::view_counts(&self.tasks, today)
    }

    pub fn completed_count(&self) -> usize {
        query::completed_count(&self.tasks)
    }

    /// Resolve the startup session from the stored credential.
    ///
    /// A credential the server does not accept is discarded.
    pub async fn bootstrap(&mut self) -> &SessionState {
        if !self.api.is_logged_in() {
            self.session = SessionState::Anonymous;
            return &self.session;
        }

        match self.api.current_user().await {
            Ok(user) => self.enter_authenticated(user).await,
            Err(err) => {
                warn!(error = %err, "stored credential not accepted; signing out");
                self.api.logout();
                self.session = SessionState::Anonymous;
            }
        }
        &self.session
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<User, ApiError> {
        let result = self.api.login(email, password).await;
        self.complete_auth(result).await
    }

    pub async fn signup(
        &mut self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, ApiError> {
        let result = self.api.signup(email, password, name).await;
        self.complete_auth(result).await
    }

    /// Submit the auth form in its current mode. Failures are also kept on the form for inline
    /// display.
    pub async fn submit_auth(&mut self) -> Result<User, ApiError> {
        self.auth_form.error = None;
        let form = self.auth_form.clone();
        let result = match form.mode {
            AuthMode::Login => self.login(&form.email, &form.password).await,
            AuthMode::Signup => self.signup(&form.email, &form.password, &form.name).await,
        };
        match result {
            Ok(user) => {
                self.auth_form.clear_fields();
                Ok(user)
            }
            Err(err) => {
                self.auth_form.error = Some(err.display_message());
                Err(err)
            }
        }
    }

    pub fn logout(&mut self) {
        self.api.logout();
        self.session = SessionState::Anonymous;
        self.tasks.clear();
        self.draft.reset();
        info!("signed out");
    }

    /// Replace the cache with the server's task list.
    pub async fn refresh(&mut self) -> Result<usize, ApiError> {
        match self.api.list_tasks().await {
            Ok(tasks) => {
                self.tasks = tasks;
                debug!(count = self.tasks.len(), "task cache refreshed");
                Ok(self.tasks.len())
            }
            Err(err) => {
                warn!(error = %err, "failed to load tasks");
                Err(err)
            }
        }
    }

    /// Create a task from the draft in the active view.
    ///
    /// A blank draft is ignored and yields `Ok(None)`. On failure the cache is reconciled with a
    /// full refresh and the draft is kept.
    pub async fn add_task(&mut self) -> Result<Option<Task>, ApiError> {
        let Some(request) = self.draft.to_new_task(self.view) else {
            return Ok(None);
        };

        match self.api.create_task(&request).await {
            Ok(task) => {
                debug!(task_id = task.id.as_str(), "task created");
                self.tasks.push(task.clone());
                self.draft.reset();
                Ok(Some(task))
            }
            Err(err) => {
                warn!(error = %err, "failed to add task");
                let _ = self.refresh().await;
                Err(err)
            }
        }
    }

    /// Flip completion of a cached task. Unknown ids are ignored and yield `Ok(None)`.
    pub async fn toggle_task(&mut self, id: &str) -> Result<Option<Task>, ApiError> {
        let Some(completed) = self.task(id).map(|task| task.completed) else {
            return Ok(None);
        };
        self.update_task(id, TaskPatch::completed(!completed)).await
    }

    /// Apply `patch` to a cached task, replacing the entry with the server's copy on success.
    pub async fn update_task(
        &mut self,
        id: &str,
        patch: TaskPatch,
    ) -> Result<Option<Task>, ApiError> {
        if self.task(id).is_none() {
            return Ok(None);
        }
        if patch.is_empty() {
            return Err(ApiError::Validation("Nothing to update".to_string()));
        }

        match self.api.update_task(id, &patch).await {
            Ok(updated) => {
                if let Some(slot) = self.tasks.iter_mut().find(|task| task.id == id) {
                    *slot = updated.clone();
                }
                Ok(Some(updated))
            }
            Err(err) => {
                warn!(task_id = id, error = %err, "failed to update task");
                Err(err)
            }
        }
    }

    /// Delete a cached task. Returns `Ok(false)` when the id is not cached.
    pub async fn delete_task(&mut self, id: &str) -> Result<bool, ApiError> {
        if self.task(id).is_none() {
            return Ok(false);
        }

        match self.api.delete_task(id).await {
            Ok(()) => {
                if let Some(idx) = self.tasks.iter().position(|task| task.id == id) {
                    self.tasks.remove(idx);
                }
                Ok(true)
            }
            Err(err) => {
                warn!(task_id = id, error = %err, "failed to delete task");
                Err(err)
            }
        }
    }

    async fn complete_auth(
        &mut self,
        result: Result<AuthSession, ApiError>,
    ) -> Result<User, ApiError> {
        let session = result?;
        self.enter_authenticated(session.user.clone()).await;
        Ok(session.user)
    }

    async fn enter_authenticated(&mut self, user: User) {
        info!(user_id = user.id.as_str(), "signed in");
        self.session = SessionState::Authenticated(user);
        // A failed initial load leaves an empty cache; the user can refresh later.
        let _ = self.refresh().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{CredentialStore, MemoryCredentialStore};
    use crate::deadline::Deadline;
    use crate::error::GENERIC_ERROR_MESSAGE;
    use crate::model::Priority;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use url::Url;

    fn store_for(server: &MockServer, credentials: &MemoryCredentialStore) -> TaskStore {
        let base: Url = server.url("/api").parse().expect("valid URL");
        let api = ApiClient::new(base, Arc::new(credentials.clone())).expect("client");
        TaskStore::new(api)
    }

    fn task_json(id: &str, text: &str, completed: bool) -> serde_json::Value {
        json!({
            "_id": id,
            "text": text,
            "completed": completed,
            "priority": "none",
            "deadline": { "day": "", "month": "", "year": "" },
            "formattedDeadline": null,
            "view": "inbox",
            "date": "2025-03-01T09:30:00Z"
        })
    }

    fn task(id: &str, text: &str, completed: bool) -> Task {
        serde_json::from_value(task_json(id, text, completed)).expect("task fixture")
    }

    fn ids(store: &TaskStore) -> Vec<&str> {
        store.tasks().iter().map(|task| task.id.as_str()).collect()
    }

    #[tokio::test]
    async fn add_appends_server_task_and_resets_draft() {
        let server = MockServer::start_async().await;
        let create = server.mock(|when, then| {
            when.method(POST).path("/api/tasks").json_body(json!({
                "text": "Buy milk",
                "priority": "none",
                "deadline": { "day": "", "month": "", "year": "" },
                "formattedDeadline": null,
                "view": "inbox"
            }));
            then.status(201)
                .json_body(json!({ "task": task_json("srv-1", "Buy milk", false) }));
        });

        let mut store = store_for(&server, &MemoryCredentialStore::with_token("tok"));
        store.draft_mut().text = "Buy milk".into();
        let created = store.add_task().await.expect("add succeeds").expect("created");

        create.assert();
        assert_eq!(created.id, "srv-1");
        assert_eq!(ids(&store), vec!["srv-1"]);
        assert!(!store.tasks()[0].completed);
        assert_eq!(store.tasks()[0].formatted_deadline(), None);
        assert_eq!(store.draft(), &TaskDraft::default());
    }

    #[tokio::test]
    async fn add_with_invalid_deadline_sends_no_formatted_value() {
        let server = MockServer::start_async().await;
        let create = server.mock(|when, then| {
            when.method(POST).path("/api/tasks").json_body(json!({
                "text": "File taxes",
                "priority": "high",
                "deadline": { "day": "05", "month": "13", "year": "2025" },
                "formattedDeadline": null,
                "view": "upcoming"
            }));
            let mut body = task_json("srv-2", "File taxes", false);
            body["priority"] = json!("high");
            body["view"] = json!("upcoming");
            body["deadline"] = json!({ "day": "05", "month": "13", "year": "2025" });
            then.status(201).json_body(json!({ "task": body }));
        });

        let mut store = store_for(&server, &MemoryCredentialStore::with_token("tok"));
        store.set_view(View::Upcoming);
        {
            let draft = store.draft_mut();
            draft.text = "File taxes".into();
            draft.priority = Priority::High;
            draft.deadline = Deadline::new("05", "13", "2025");
        }
        let created = store.add_task().await.expect("add succeeds").expect("created");

        create.assert();
        assert_eq!(created.priority, Priority::High);
        assert_eq!(created.formatted_deadline(), None);
    }

    #[tokio::test]
    async fn blank_draft_is_ignored() {
        let server = MockServer::start_async().await;
        let create = server.mock(|when, then| {
            when.method(POST).path("/api/tasks");
            then.status(201);
        });

        let mut store = store_for(&server, &MemoryCredentialStore::with_token("tok"));
        store.draft_mut().text = "   ".into();
        assert_eq!(store.add_task().await.expect("no-op"), None);
        assert_eq!(create.hits(), 0);
        assert!(store.tasks().is_empty());
    }

    #[tokio::test]
    async fn failed_add_refetches_and_keeps_draft() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/tasks");
            then.status(500).json_body(json!({ "error": "Database unavailable" }));
        });
        let list = server.mock(|when, then| {
            when.method(GET).path("/api/tasks");
            then.status(200)
                .json_body(json!({ "tasks": [task_json("t1", "Existing", false)] }));
        });

        let mut store = store_for(&server, &MemoryCredentialStore::with_token("tok"));
        store.draft_mut().text = "Buy milk".into();
        let err = store.add_task().await.expect_err("add fails");

        assert!(matches!(
            err,
            ApiError::Api { status: 500, ref message } if message == "Database unavailable"
        ));
        list.assert();
        assert_eq!(ids(&store), vec!["t1"]);
        assert_eq!(store.draft().text, "Buy milk");
    }

    #[tokio::test]
    async fn failed_add_with_failed_refetch_keeps_cache_and_draft() {
        let server = MockServer::start_async().await;
        let create = server.mock(|when, then| {
            when.method(POST).path("/api/tasks");
            then.status(422).json_body(json!({ "error": "Text too long" }));
        });
        let list = server.mock(|when, then| {
            when.method(GET).path("/api/tasks");
            then.status(503);
        });

        let mut store = store_for(&server, &MemoryCredentialStore::with_token("tok"));
        store.tasks = vec![task("t1", "Existing", false)];
        store.draft_mut().text = "Buy milk".into();
        store.draft_mut().priority = Priority::Low;
        let err = store.add_task().await.expect_err("add fails");

        assert!(matches!(
            err,
            ApiError::Api { status: 422, ref message } if message == "Text too long"
        ));
        create.assert();
        list.assert();
        assert_eq!(ids(&store), vec!["t1"]);
        assert_eq!(store.draft().text, "Buy milk");
        assert_eq!(store.draft().priority, Priority::Low);
    }

    #[tokio::test]
    async fn toggle_replaces_cached_task_with_server_copy() {
        let server = MockServer::start_async().await;
        let update = server.mock(|when, then| {
            when.method(PUT)
                .path("/api/tasks/t2")
                .json_body(json!({ "completed": true }));
            then.status(200)
                .json_body(json!({ "task": task_json("t2", "Walk dog", true) }));
        });

        let mut store = store_for(&server, &MemoryCredentialStore::with_token("tok"));
        store.tasks = vec![task("t1", "Buy milk", false), task("t2", "Walk dog", false)];

        let updated = store.toggle_task("t2").await.expect("toggle succeeds");

        update.assert();
        assert!(updated.expect("updated").completed);
        assert_eq!(ids(&store), vec!["t1", "t2"]);
        assert!(store.tasks()[1].completed);
        assert!(!store.tasks()[0].completed);
        assert_eq!(store.completed_count(), 1);
    }

    #[tokio::test]
    async fn toggle_of_unknown_id_makes_no_request() {
        let server = MockServer::start_async().await;
        let update = server.mock(|when, then| {
            when.method(PUT);
            then.status(200);
        });

        let mut store = store_for(&server, &MemoryCredentialStore::with_token("tok"));
        store.tasks = vec![task("t1", "Buy milk", false)];

        assert_eq!(store.toggle_task("ghost").await.expect("no-op"), None);
        assert_eq!(update.hits(), 0);
        assert!(!store.tasks()[0].completed);
    }

    #[tokio::test]
    async fn failed_toggle_leaves_cache_unchanged() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(PUT).path("/api/tasks/t1");
            then.status(404).json_body(json!({ "error": "Task not found" }));
        });

        let mut store = store_for(&server, &MemoryCredentialStore::with_token("tok"));
        store.tasks = vec![task("t1", "Buy milk", false)];

        let err = store.toggle_task("t1").await.expect_err("toggle fails");
        assert_eq!(err.display_message(), "Task not found");
        assert_eq!(store.tasks(), &[task("t1", "Buy milk", false)]);
    }

    #[tokio::test]
    async fn empty_patch_is_rejected_locally() {
        let server = MockServer::start_async().await;
        let mut store = store_for(&server, &MemoryCredentialStore::with_token("tok"));
        store.tasks = vec![task("t1", "Buy milk", false)];

        let err = store
            .update_task("t1", TaskPatch::default())
            .await
            .expect_err("empty patch");
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_entry() {
        let server = MockServer::start_async().await;
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/api/tasks/t2");
            then.status(200).json_body(json!({ "message": "Task deleted" }));
        });

        let mut store = store_for(&server, &MemoryCredentialStore::with_token("tok"));
        store.tasks = vec![
            task("t1", "Buy milk", false),
            task("t2", "Walk dog", false),
            task("t3", "Call mom", true),
        ];

        assert!(store.delete_task("t2").await.expect("delete succeeds"));
        delete.assert();
        assert_eq!(ids(&store), vec!["t1", "t3"]);

        assert!(!store.delete_task("t2").await.expect("already gone"));
        assert_eq!(delete.hits(), 1);
    }

    #[tokio::test]
    async fn failed_delete_keeps_task() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(DELETE).path("/api/tasks/t1");
            then.status(500);
        });

        let mut store = store_for(&server, &MemoryCredentialStore::with_token("tok"));
        store.tasks = vec![task("t1", "Buy milk", false)];

        let err = store.delete_task("t1").await.expect_err("delete fails");
        assert_eq!(err.display_message(), GENERIC_ERROR_MESSAGE);
        assert_eq!(ids(&store), vec!["t1"]);
    }

    #[tokio::test]
    async fn bootstrap_with_valid_credential_loads_tasks() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/auth/me")
                .header("authorization", "Bearer tok");
            then.status(200).json_body(json!({
                "user": { "_id": "u1", "email": "ada@example.com", "name": "Ada" }
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/tasks");
            then.status(200)
                .json_body(json!({ "tasks": [task_json("t1", "Buy milk", false)] }));
        });

        let mut store = store_for(&server, &MemoryCredentialStore::with_token("tok"));
        assert!(store.is_loading());

        let state = store.bootstrap().await;
        assert!(state.is_authenticated());
        assert_eq!(store.user().map(User::display_name), Some("Ada"));
        assert_eq!(ids(&store), vec!["t1"]);
    }

    #[tokio::test]
    async fn bootstrap_with_rejected_credential_signs_out() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/auth/me");
            then.status(401).json_body(json!({ "error": "Invalid token" }));
        });

        let credentials = MemoryCredentialStore::with_token("stale");
        let mut store = store_for(&server, &credentials);

        assert_eq!(store.bootstrap().await, &SessionState::Anonymous);
        assert_eq!(credentials.load().unwrap(), None);
        assert!(!store.is_logged_in());
    }

    #[tokio::test]
    async fn bootstrap_without_credential_stays_offline() {
        let server = MockServer::start_async().await;
        let me = server.mock(|when, then| {
            when.method(GET).path("/api/auth/me");
            then.status(200);
        });

        let mut store = store_for(&server, &MemoryCredentialStore::new());
        assert_eq!(store.bootstrap().await, &SessionState::Anonymous);
        assert_eq!(me.hits(), 0);
    }

    #[tokio::test]
    async fn failed_login_sets_form_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/auth/login");
            then.status(400).json_body(json!({ "error": "Invalid credentials" }));
        });

        let mut store = store_for(&server, &MemoryCredentialStore::new());
        {
            let form = store.auth_form_mut();
            form.email = "ada@example.com".into();
            form.password = "wrong".into();
        }

        let err = store.submit_auth().await.expect_err("login fails");
        assert!(err.is_auth());
        assert_eq!(
            store.auth_form().error.as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(store.auth_form().email, "ada@example.com");
        assert!(!store.session().is_authenticated());
    }

    #[tokio::test]
    async fn signup_then_logout_clears_session_and_cache() {
        let server = MockServer::start_async().await;
        let signup = server.mock(|when, then| {
            when.method(POST).path("/api/auth/signup").json_body(json!({
                "email": "ada@example.com",
                "password": "hunter2",
                "name": "Ada"
            }));
            then.status(201).json_body(json!({
                "user": { "id": "u1", "email": "ada@example.com", "name": "Ada" },
                "token": "tok-new"
            }));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/tasks")
                .header("authorization", "Bearer tok-new");
            then.status(200)
                .json_body(json!({ "tasks": [task_json("t1", "Welcome", false)] }));
        });

        let credentials = MemoryCredentialStore::new();
        let mut store = store_for(&server, &credentials);
        store.set_auth_mode(AuthMode::Signup);
        {
            let form = store.auth_form_mut();
            form.email = "ada@example.com".into();
            form.password = "hunter2".into();
            form.name = "Ada".into();
        }

        let user = store.submit_auth().await.expect("signup succeeds");
        signup.assert();
        assert_eq!(user.id, "u1");
        assert!(store.session().is_authenticated());
        assert_eq!(store.auth_form().email, "");
        assert_eq!(ids(&store), vec!["t1"]);
        assert_eq!(credentials.load().unwrap().as_deref(), Some("tok-new"));

        store.logout();
        assert_eq!(store.session(), &SessionState::Anonymous);
        assert!(store.tasks().is_empty());
        assert!(!store.is_logged_in());
    }

    #[test]
    fn projections_follow_view_and_sort() {
        let base: Url = "http://127.0.0.1:9/api".parse().unwrap();
        let api = ApiClient::new(base, Arc::new(MemoryCredentialStore::new())).unwrap();
        let mut store = TaskStore::new(api);

        let mut low = task("low", "Low", false);
        low.priority = Priority::Low;
        let mut high = task("high", "High", false);
        high.priority = Priority::High;
        let mut later = task("later", "Later", false);
        later.view = View::Upcoming;
        store.tasks = vec![low, high, later];

        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let visible: Vec<&str> = store
            .visible_tasks_on(today)
            .iter()
            .map(|task| task.id.as_str())
            .collect();
        assert_eq!(visible, vec!["low", "high"]);

        store.set_sort_mode(SortMode::Priority);
        let visible: Vec<&str> = store
            .visible_tasks_on(today)
            .iter()
            .map(|task| task.id.as_str())
            .collect();
        assert_eq!(visible, vec!["high", "low"]);

        store.set_view(View::Upcoming);
        assert_eq!(store.visible_tasks_on(today).len(), 1);
        assert_eq!(store.view_counts_on(today).inbox, 2);
    }
}
