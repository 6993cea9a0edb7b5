pub mod api;
pub mod config;
pub mod credentials;
pub mod deadline;
pub mod error;
pub mod model;
pub mod query;
pub mod session;
pub mod store;

pub use api::ApiClient;
pub use config::AppConfig;
pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use deadline::Deadline;
pub use error::{ApiError, GENERIC_ERROR_MESSAGE};
pub use model::*;
pub use session::{AuthForm, AuthMode, SessionState, TaskDraft};
pub use store::TaskStore;
