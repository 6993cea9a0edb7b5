//! HTTP client for the remote task and auth service.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::AppConfig;
use crate::credentials::{CredentialStore, FileCredentialStore};
use crate::error::{ApiError, GENERIC_ERROR_MESSAGE};
use crate::model::{
    AuthSession, ErrorBody, NewTask, Task, TaskEnvelope, TaskPatch, TasksEnvelope, User,
    UserEnvelope,
};

const NO_STORE: &str = "no-cache, no-store, must-revalidate";
const CACHE_BUST_PARAM: &str = "_t";
const NOT_LOGGED_IN: &str = "Not logged in";

/// Which error family a non-success response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Auth,
    Resource,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignupRequest<'a> {
    email: &'a str,
    password: &'a str,
    name: &'a str,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialStore>,
}

impl ApiClient {
    pub fn new(base_url: Url, credentials: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        Self::build(base_url, credentials, None)
    }

    /// Client for the configured API URL that keeps its credential in the data directory.
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        let store = FileCredentialStore::new(config.credential_path());
        Self::build(config.api_url().clone(), Arc::new(store), config.timeout())
    }

    fn build(
        base_url: Url,
        credentials: Arc<dyn CredentialStore>,
        timeout: Option<std::time::Duration>,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ApiError::Network)?;

        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthSession, ApiError> {
        let url = self.endpoint(&["auth", "signup"]);
        let body = SignupRequest {
            email,
            password,
            name,
        };
        let request = self.http.post(url).json(&body);
        let session: AuthSession = self.fetch(request, Flow::Auth).await?;
        self.credentials.save(&session.token)?;
        Ok(session)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        let url = self.endpoint(&["auth", "login"]);
        let request = self.http.post(url).json(&LoginRequest { email, password });
        let session: AuthSession = self.fetch(request, Flow::Auth).await?;
        self.credentials.save(&session.token)?;
        Ok(session)
    }

    /// Forget the stored credential. Never touches the network.
    pub fn logout(&self) {
        if let Err(err) = self.credentials.clear() {
            warn!(error = %err, "failed to clear stored credential");
        }
    }

    /// Whether a credential is stored locally; the server is not consulted.
    pub fn is_logged_in(&self) -> bool {
        match self.credentials.load() {
            Ok(token) => token.is_some(),
            Err(err) => {
                warn!(error = %err, "failed to read stored credential");
                false
            }
        }
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        if self.credentials.load()?.is_none() {
            return Err(ApiError::Auth(NOT_LOGGED_IN.to_string()));
        }
        let request = self.authorized(Method::GET, self.endpoint(&["auth", "me"]))?;
        let envelope: UserEnvelope = self.fetch(request, Flow::Resource).await?;
        Ok(envelope.user)
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let mut url = self.endpoint(&["tasks"]);
        url.query_pairs_mut()
            .append_pair(CACHE_BUST_PARAM, &cache_buster().to_string());
        let request = self.authorized(Method::GET, url)?;
        let envelope: TasksEnvelope = self.fetch(request, Flow::Resource).await?;
        Ok(envelope.tasks)
    }

    pub async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        let request = self
            .authorized(Method::POST, self.endpoint(&["tasks"]))?
            .json(task);
        let envelope: TaskEnvelope = self.fetch(request, Flow::Resource).await?;
        Ok(envelope.task)
    }

    pub async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError> {
        let request = self
            .authorized(Method::PUT, self.endpoint(&["tasks", id]))?
            .json(patch);
        let envelope: TaskEnvelope = self.fetch(request, Flow::Resource).await?;
        Ok(envelope.task)
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        let request = self.authorized(Method::DELETE, self.endpoint(&["tasks", id]))?;
        self.send(request, Flow::Resource).await?;
        Ok(())
    }

    /// Base URL with `segments` appended, each percent-encoded as a single path segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, method: Method, url: Url) -> Result<RequestBuilder, ApiError> {
        let request = self.http.request(method, url);
        Ok(match self.credentials.load()? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        flow: Flow,
    ) -> Result<T, ApiError> {
        let response = self.send(request, flow).await?;
        let bytes = response.bytes().await.map_err(ApiError::Network)?;
        serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn send(&self, request: RequestBuilder, flow: Flow) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|err| {
            debug!(error = %err, "request failed before a response arrived");
            ApiError::Network(err)
        })?;
        let status = response.status();
        debug!(
            url = %response.url().path(),
            status = status.as_u16(),
            "api response"
        );
        if status.is_success() {
            return Ok(response);
        }
        let body = response.bytes().await.unwrap_or_default();
        Err(classify_failure(status, &body, flow))
    }
}

fn classify_failure(status: StatusCode, body: &[u8], flow: Flow) -> ApiError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());

    if flow == Flow::Auth || matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        ApiError::Auth(message)
    } else {
        ApiError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

fn cache_buster() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentialStore;
    use crate::deadline::Deadline;
    use crate::model::{Priority, View};
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer, store: &MemoryCredentialStore) -> ApiClient {
        let base: Url = server.url("/api").parse().expect("valid URL");
        ApiClient::new(base, Arc::new(store.clone())).expect("client")
    }

    fn task_json(id: &str, text: &str, completed: bool) -> serde_json::Value {
        json!({
            "id": id,
            "text": text,
            "completed": completed,
            "priority": "none",
            "deadline": { "day": "", "month": "", "year": "" },
            "formattedDeadline": null,
            "view": "inbox",
            "date": "2025-03-01T09:30:00Z"
        })
    }

    #[tokio::test]
    async fn login_persists_token() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/auth/login")
                .json_body(json!({ "email": "ada@example.com", "password": "hunter2" }));
            then.status(200).json_body(json!({
                "user": { "id": "u1", "email": "ada@example.com", "name": "Ada" },
                "token": "tok-1"
            }));
        });

        let store = MemoryCredentialStore::new();
        let client = client_for(&server, &store);
        assert!(!client.is_logged_in());

        let session = client
            .login("ada@example.com", "hunter2")
            .await
            .expect("login succeeds");

        mock.assert();
        assert_eq!(session.user.name.as_deref(), Some("Ada"));
        assert_eq!(store.load().unwrap().as_deref(), Some("tok-1"));
        assert!(client.is_logged_in());

        client.logout();
        assert!(!client.is_logged_in());
    }

    #[tokio::test]
    async fn signup_failure_surfaces_server_message_as_auth_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/auth/signup");
            then.status(400)
                .json_body(json!({ "error": "Email already registered" }));
        });

        let store = MemoryCredentialStore::new();
        let client = client_for(&server, &store);
        let err = client
            .signup("ada@example.com", "pw", "Ada")
            .await
            .expect_err("signup should fail");

        assert!(matches!(err, ApiError::Auth(ref message) if message == "Email already registered"));
        assert!(!client.is_logged_in());
    }

    #[tokio::test]
    async fn login_failure_without_body_uses_generic_message() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/auth/login");
            then.status(500).body("<html>oops</html>");
        });

        let client = client_for(&server, &MemoryCredentialStore::new());
        let err = client.login("a@b.c", "pw").await.expect_err("login fails");
        assert!(matches!(err, ApiError::Auth(ref message) if message == GENERIC_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn current_user_without_credential_skips_network() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/auth/me");
            then.status(200);
        });

        let client = client_for(&server, &MemoryCredentialStore::new());
        let err = client.current_user().await.expect_err("no credential");
        assert!(err.is_auth());
        assert_eq!(mock.hits(), 0);
    }

    #[tokio::test]
    async fn current_user_rejected_token_is_auth_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/auth/me")
                .header("authorization", "Bearer expired");
            then.status(401).json_body(json!({ "error": "Invalid token" }));
        });

        let client = client_for(&server, &MemoryCredentialStore::with_token("expired"));
        let err = client.current_user().await.expect_err("rejected");
        assert!(matches!(err, ApiError::Auth(ref message) if message == "Invalid token"));
    }

    #[tokio::test]
    async fn list_tasks_sends_bearer_and_no_store_headers() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/tasks")
                .header("authorization", "Bearer tok")
                .header("cache-control", NO_STORE)
                .header("pragma", "no-cache");
            then.status(200).json_body(json!({
                "tasks": [task_json("t1", "Buy milk", false), task_json("t2", "Walk dog", true)]
            }));
        });

        let client = client_for(&server, &MemoryCredentialStore::with_token("tok"));
        let tasks = client.list_tasks().await.expect("list succeeds");

        mock.assert();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].text, "Walk dog");
        assert!(tasks[1].completed);
    }

    #[tokio::test]
    async fn create_task_posts_fields_and_returns_server_task() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/tasks").json_body(json!({
                "text": "Buy milk",
                "priority": "high",
                "deadline": { "day": "05", "month": "13", "year": "2025" },
                "formattedDeadline": null,
                "view": "inbox"
            }));
            then.status(201)
                .json_body(json!({ "task": task_json("srv-1", "Buy milk", false) }));
        });

        let client = client_for(&server, &MemoryCredentialStore::with_token("tok"));
        let new_task = NewTask::new(
            "Buy milk",
            Priority::High,
            Deadline::new("05", "13", "2025"),
            View::Inbox,
        );
        let created = client.create_task(&new_task).await.expect("create succeeds");

        mock.assert();
        assert_eq!(created.id, "srv-1");
    }

    #[tokio::test]
    async fn update_and_delete_target_task_path() {
        let server = MockServer::start_async().await;
        let update = server.mock(|when, then| {
            when.method(PUT)
                .path("/api/tasks/t1")
                .json_body(json!({ "completed": true }));
            then.status(200)
                .json_body(json!({ "task": task_json("t1", "Buy milk", true) }));
        });
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/api/tasks/t1");
            then.status(200).json_body(json!({}));
        });

        let client = client_for(&server, &MemoryCredentialStore::with_token("tok"));
        let updated = client
            .update_task("t1", &TaskPatch::completed(true))
            .await
            .expect("update succeeds");
        client.delete_task("t1").await.expect("delete succeeds");

        update.assert();
        delete.assert();
        assert!(updated.completed);
    }

    #[tokio::test]
    async fn server_errors_on_tasks_are_api_errors() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(DELETE).path("/api/tasks/missing");
            then.status(404).json_body(json!({ "error": "Task not found" }));
        });

        let client = client_for(&server, &MemoryCredentialStore::with_token("tok"));
        let err = client.delete_task("missing").await.expect_err("404");
        assert!(matches!(
            err,
            ApiError::Api { status: 404, ref message } if message == "Task not found"
        ));
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        let base: Url = "http://127.0.0.1:9/api".parse().unwrap();
        let client = ApiClient::new(base, Arc::new(MemoryCredentialStore::with_token("tok")))
            .expect("client");
        let err = client.list_tasks().await.expect_err("no server");
        assert!(matches!(err, ApiError::Network(_)));
    }

    #[test]
    fn endpoint_appends_encoded_segments() {
        let base: Url = "https://example.com/api/".parse().unwrap();
        let client = ApiClient::new(base, Arc::new(MemoryCredentialStore::new())).unwrap();
        assert_eq!(
            client.endpoint(&["tasks", "a/b"]).as_str(),
            "https://example.com/api/tasks/a%2Fb"
        );
    }

    #[test]
    fn classify_failure_prefers_server_message() {
        let err = classify_failure(
            StatusCode::FORBIDDEN,
            br#"{"error":"Forbidden"}"#,
            Flow::Resource,
        );
        assert!(matches!(err, ApiError::Auth(ref message) if message == "Forbidden"));

        let err = classify_failure(StatusCode::BAD_GATEWAY, b"", Flow::Resource);
        assert!(matches!(
            err,
            ApiError::Api { status: 502, ref message } if message == GENERIC_ERROR_MESSAGE
        ));
    }
}
