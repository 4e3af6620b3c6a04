//! Route access control.
//!
//! [`AccessGate::decide`] is a pure function of the session state; hosts re-run
//! it whenever the state changes, so a logout while a protected view is open
//! redirects immediately.

use crate::role::Role;
use crate::session::SessionState;

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
/// Where authenticated-but-unauthorized users are sent.
pub const LANDING_PATH: &str = "/dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Verification still pending: show a placeholder, commit to nothing.
    Loading,
    /// Not logged in; `from` is the path to come back to after login.
    RedirectToLogin { from: String },
    /// Logged in, wrong role.
    RedirectToLanding,
    Render,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessGate {
    allowed_roles: Option<Vec<Role>>,
}

impl AccessGate {
    pub fn any_authenticated() -> Self {
        Self {
            allowed_roles: None,
        }
    }

    pub fn only(roles: &[Role]) -> Self {
        Self {
            allowed_roles: Some(roles.to_vec()),
        }
    }

    pub fn allowed_roles(&self) -> Option<&[Role]> {
        self.allowed_roles.as_deref()
    }

    pub fn decide(&self, state: &SessionState, path: &str) -> GateDecision {
        match state {
            SessionState::Unresolved | SessionState::Resolving => GateDecision::Loading,
            SessionState::Anonymous => GateDecision::RedirectToLogin {
                from: path.to_string(),
            },
            SessionState::Authenticated(identity) => match &self.allowed_roles {
                Some(allowed) => {
                    let permitted = identity.role().is_some_and(|r| allowed.contains(&r));
                    if permitted {
                        GateDecision::Render
                    } else {
                        GateDecision::RedirectToLanding
                    }
                }
                None => GateDecision::Render,
            },
        }
    }
}

/// The application's route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppRoute {
    Home,
    Predict,
    About,
    Login,
    Register,
    Dashboard,
    Projects,
}

impl AppRoute {
    pub fn path(self) -> &'static str {
        match self {
            AppRoute::Home => "/",
            AppRoute::Predict => "/predict",
            AppRoute::About => "/about",
            AppRoute::Login => LOGIN_PATH,
            AppRoute::Register => REGISTER_PATH,
            AppRoute::Dashboard => LANDING_PATH,
            AppRoute::Projects => "/projects",
        }
    }

    /// Unknown paths fall back to home. Query strings and fragments are ignored.
    pub fn from_path(path: &str) -> AppRoute {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        AppRoute::all()
            .iter()
            .copied()
            .find(|r| r.path() == normalized)
            .unwrap_or(AppRoute::Home)
    }

    /// `None` for public routes.
    pub fn gate(self) -> Option<AccessGate> {
        match self {
            AppRoute::Home
            | AppRoute::Predict
            | AppRoute::About
            | AppRoute::Login
            | AppRoute::Register => None,
            AppRoute::Dashboard => Some(AccessGate::any_authenticated()),
            AppRoute::Projects => Some(AccessGate::only(&[Role::Official, Role::Admin])),
        }
    }

    /// Gate decision for navigating to this route; public routes always render.
    pub fn decide(self, state: &SessionState) -> GateDecision {
        match self.gate() {
            Some(gate) => gate.decide(state, self.path()),
            None => GateDecision::Render,
        }
    }

    pub fn all() -> &'static [AppRoute] {
        &[
            AppRoute::Home,
            AppRoute::Predict,
            AppRoute::About,
            AppRoute::Login,
            AppRoute::Register,
            AppRoute::Dashboard,
            AppRoute::Projects,
        ]
    }
}

/// Where the login flow sends the user afterwards.
///
/// Only same-origin absolute paths are honoured, and never the auth views
/// themselves; everything else lands on the dashboard.
pub fn post_login_destination(from: Option<&str>) -> String {
    let Some(from) = from.map(str::trim) else {
        return LANDING_PATH.to_string();
    };
    if !from.starts_with('/') || from.starts_with("//") || from.contains('\\') {
        return LANDING_PATH.to_string();
    }
    match AppRoute::from_path(from) {
        AppRoute::Login | AppRoute::Register => LANDING_PATH.to_string(),
        _ => from.to_string(),
    }
}
