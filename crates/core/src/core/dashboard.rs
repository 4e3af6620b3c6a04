use crate::role::{Identity, Role};

/// The three dashboard variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dashboard {
    Citizen,
    Official,
    Admin,
}

impl Dashboard {
    /// Total: unrecognized roles get the citizen view.
    pub fn for_role(role: Option<Role>) -> Dashboard {
        match role {
            Some(Role::Admin) => Dashboard::Admin,
            Some(Role::Official) => Dashboard::Official,
            Some(Role::Citizen) | None => Dashboard::Citizen,
        }
    }

    pub fn for_identity(identity: &Identity) -> Dashboard {
        Self::for_role(identity.role())
    }

    pub fn title(self) -> &'static str {
        match self {
            Dashboard::Citizen => "Citizen Dashboard",
            Dashboard::Official => "Official Dashboard",
            Dashboard::Admin => "Admin Dashboard",
        }
    }

    /// Backend listing the dashboard is populated from.
    pub fn projects_path(self) -> &'static str {
        match self {
            Dashboard::Citizen | Dashboard::Official => "/projects",
            Dashboard::Admin => "/projects/all",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardView {
    Loading,
    Ready(Dashboard),
}

/// Picks the dashboard for the signed-in user.
///
/// The role is copied into local state by [`RoleDispatcher::observe`]; until
/// that happens (identity resolution is asynchronous relative to mount) the
/// view is [`DashboardView::Loading`].
#[derive(Debug, Clone, Default)]
pub struct RoleDispatcher {
    role: Option<String>,
}

impl RoleDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the chosen view changed.
    pub fn observe(&mut self, identity: Option<&Identity>) -> bool {
        let before = self.view();
        if let Some(identity) = identity {
            self.role = Some(identity.role_name.clone());
        }
        self.view() != before
    }

    pub fn view(&self) -> DashboardView {
        match &self.role {
            Some(raw) => DashboardView::Ready(Dashboard::for_role(Role::parse(raw))),
            None => DashboardView::Loading,
        }
    }
}
