//! UI models and metadata that should be available on both wasm and native.
//!
//! Keeping these out of the wasm-only `web` module allows us to unit-test the
//! navigation inventory on the host.

use nirmaan::gate::{AppRoute, GateDecision, LOGIN_PATH};
use nirmaan::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavItem {
    Home,
    Predict,
    About,
    Dashboard,
    Projects,
    Login,
    Register,
    Logout,
}

impl NavItem {
    pub fn label(self) -> &'static str {
        match self {
            NavItem::Home => "Home",
            NavItem::Predict => "Predict",
            NavItem::About => "About",
            NavItem::Dashboard => "Dashboard",
            NavItem::Projects => "Projects",
            NavItem::Login => "Login",
            NavItem::Register => "Register",
            NavItem::Logout => "Logout",
        }
    }

    /// `None` for actions that are not links.
    pub fn route(self) -> Option<AppRoute> {
        match self {
            NavItem::Home => Some(AppRoute::Home),
            NavItem::Predict => Some(AppRoute::Predict),
            NavItem::About => Some(AppRoute::About),
            NavItem::Dashboard => Some(AppRoute::Dashboard),
            NavItem::Projects => Some(AppRoute::Projects),
            NavItem::Login => Some(AppRoute::Login),
            NavItem::Register => Some(AppRoute::Register),
            NavItem::Logout => None,
        }
    }

    pub fn all() -> &'static [NavItem] {
        &[
            NavItem::Home,
            NavItem::Predict,
            NavItem::About,
            NavItem::Dashboard,
            NavItem::Projects,
            NavItem::Login,
            NavItem::Register,
            NavItem::Logout,
        ]
    }
}

/// Links shown in the navbar for the current session.
///
/// Nothing session-dependent is shown until verification finishes, so the bar
/// does not flash "Login" for a user who is about to be restored.
pub fn nav_items(state: &SessionState) -> Vec<NavItem> {
    let mut items = vec![NavItem::Home, NavItem::Predict, NavItem::About];
    match state {
        SessionState::Unresolved | SessionState::Resolving => {}
        SessionState::Anonymous => {
            items.push(NavItem::Login);
            items.push(NavItem::Register);
        }
        SessionState::Authenticated(_) => {
            items.push(NavItem::Dashboard);
            if AppRoute::Projects.decide(state) == GateDecision::Render {
                items.push(NavItem::Projects);
            }
            items.push(NavItem::Logout);
        }
    }
    items
}

/// Percent-encodes a query value, leaving path separators readable.
pub fn encode_query_value(v: &str) -> String {
    let mut out = String::with_capacity(v.len());
    for b in v.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Login link that remembers where the user was headed.
pub fn login_href(from: &str) -> String {
    format!("{}?from={}", LOGIN_PATH, encode_query_value(from))
}

pub fn page_title(route: AppRoute) -> &'static str {
    match route {
        AppRoute::Home => "Nirmaan.ai",
        AppRoute::Predict => "Construction Progress Prediction",
        AppRoute::About => "About",
        AppRoute::Login => "Login",
        AppRoute::Register => "Register",
        AppRoute::Dashboard => "Dashboard",
        AppRoute::Projects => "Project Management",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nirmaan::role::Identity;

    fn authed(role: &str) -> SessionState {
        SessionState::Authenticated(Identity {
            id: 1,
            username: "u".into(),
            email: "u@example.com".into(),
            role_name: role.into(),
        })
    }

    #[test]
    fn nav_inventory_is_stable() {
        let all = NavItem::all();
        let mut labels: Vec<&'static str> = all.iter().copied().map(NavItem::label).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), all.len());
        assert_eq!(
            all.iter().filter(|i| i.route().is_none()).count(),
            1,
            "only logout is an action"
        );
    }

    #[test]
    fn pending_session_shows_public_links_only() {
        for state in [SessionState::Unresolved, SessionState::Resolving] {
            assert_eq!(
                nav_items(&state),
                vec![NavItem::Home, NavItem::Predict, NavItem::About]
            );
        }
    }

    #[test]
    fn anonymous_gets_login_and_register() {
        let items = nav_items(&SessionState::Anonymous);
        assert!(items.contains(&NavItem::Login));
        assert!(items.contains(&NavItem::Register));
        assert!(!items.contains(&NavItem::Logout));
    }

    #[test]
    fn projects_link_follows_role_gate() {
        assert!(!nav_items(&authed("citizen")).contains(&NavItem::Projects));
        assert!(nav_items(&authed("official")).contains(&NavItem::Projects));
        assert!(nav_items(&authed("admin")).contains(&NavItem::Logout));
    }

    #[test]
    fn login_href_encodes_return_path() {
        assert_eq!(login_href("/projects"), "/login?from=/projects");
        assert_eq!(login_href("/a b?c=1"), "/login?from=/a%20b%3Fc%3D1");
    }

    #[test]
    fn every_route_has_a_title() {
        for r in AppRoute::all() {
            assert!(!page_title(*r).trim().is_empty());
        }
    }
}
