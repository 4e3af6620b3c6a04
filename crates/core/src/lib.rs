//! # nirmaan
//!
//! Client core for the Nirmaan construction-progress tracker.
//!
//! Everything with ordering or failure semantics lives here so it can be
//! unit-tested on the host; the browser app (`nirmaan_web`) and the terminal
//! client (`nirmaan-cli`) are thin shells over it.
//!
//! ## Quick Start
//!
//! ```
//! use nirmaan::prelude::*;
//!
//! let mut session = SessionStore::new(MemoryCredentials::default());
//! assert!(session.begin_restore().is_none());
//! assert_eq!(session.state(), &SessionState::Anonymous);
//!
//! let gate = AccessGate::any_authenticated();
//! assert_eq!(
//!     gate.decide(session.state(), "/dashboard"),
//!     GateDecision::RedirectToLogin { from: "/dashboard".to_string() },
//! );
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): builds the `nirmaan-cli` binary (tokio, tracing-subscriber, dirs)
//!
//! ## Modules
//!
//! - [`session`]: credential + identity lifecycle
//! - [`gate`]: role-gated route access
//! - [`dashboard`]: role to dashboard dispatch
//! - [`prediction`]: prediction form, validation and result rendering
//! - [`api`]: wire types and the HTTP client

pub mod api;
pub mod config;
pub mod error;
pub mod fmt;
pub mod prediction;
pub mod time;

#[path = "core/role.rs"]
pub mod role;

#[path = "core/session.rs"]
pub mod session;

#[path = "core/gate.rs"]
pub mod gate;

#[path = "core/dashboard.rs"]
pub mod dashboard;

#[path = "core/storage.rs"]
pub mod storage;

/// Prelude module for convenient imports.
///
/// ```
/// use nirmaan::prelude::*;
/// ```
pub mod prelude {
    pub use crate::api::{AuthApi, HttpClient, PredictionApi, ProjectApi};
    pub use crate::config::ClientConfig;
    pub use crate::dashboard::{Dashboard, DashboardView, RoleDispatcher};
    pub use crate::error::{ApiError, SessionError, StorageError};
    pub use crate::gate::{post_login_destination, AccessGate, AppRoute, GateDecision};
    pub use crate::prediction::{
        Field, ImageAttachment, PredictionForm, PredictionResult, SubmissionStatus, SubmitBlocked,
    };
    pub use crate::role::{Identity, Role};
    pub use crate::session::{SessionState, SessionStore};
    pub use crate::storage::{CredentialStore, MemoryCredentials};
}
