use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Citizen,
    Official,
    Admin,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Citizen => "citizen",
            Role::Official => "official",
            Role::Admin => "admin",
        }
    }

    /// Parses a wire role. Exact lowercase match only; anything else
    /// (`"ADMIN"`, `" admin "`) is unknown, never an error.
    pub fn parse(v: &str) -> Option<Role> {
        match v {
            "citizen" => Some(Role::Citizen),
            "official" => Some(Role::Official),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn all() -> &'static [Role] {
        &[Role::Citizen, Role::Official, Role::Admin]
    }
}

/// Resolved user record, as returned by `/auth/profile` and `/auth/login`.
///
/// The role is kept verbatim; use [`Identity::role`] for the typed view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: u64,
    pub username: String,
    pub email: String,
    #[serde(rename = "role")]
    pub role_name: String,
}

impl Identity {
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role_name)
    }
}
