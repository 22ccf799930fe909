//! Operator session state.
//!
//! The session is an explicit value passed to every client call. It only
//! decides which identity the client claims; nothing on the server verifies
//! it, so it is not an authentication boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminRole {
    SuperAdmin,
    Admin,
    ReadOnly,
}

impl AdminRole {
    /// Position in the hierarchy; higher includes lower.
    pub fn level(self) -> u8 {
        match self {
            AdminRole::SuperAdmin => 3,
            AdminRole::Admin => 2,
            AdminRole::ReadOnly => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AdminRole::SuperAdmin => "SUPER_ADMIN",
            AdminRole::Admin => "ADMIN",
            AdminRole::ReadOnly => "READ_ONLY",
        }
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub id: String,
    pub name: String,
    pub role: AdminRole,
}

impl AdminProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: AdminRole) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }
}

/// Identities operators can pick from.
pub fn roster() -> Vec<AdminProfile> {
    vec![
        AdminProfile::new("muse_mulatu", "Muse Mulatu", AdminRole::SuperAdmin),
        AdminProfile::new("greg_pessoni", "Greg Pessoni", AdminRole::Admin),
        AdminProfile::new("paul_fidika", "Paul Fidika", AdminRole::Admin),
        AdminProfile::new("guest_user", "Guest Observer", AdminRole::ReadOnly),
    ]
}

/// Look up a roster entry by id.
pub fn find_profile(id: &str) -> Option<AdminProfile> {
    roster().into_iter().find(|p| p.id == id)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminSession {
    current: Option<AdminProfile>,
}

impl AdminSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session already logged in as `profile`.
    pub fn logged_in(profile: AdminProfile) -> Self {
        Self {
            current: Some(profile),
        }
    }

    pub fn login(&mut self, profile: AdminProfile) {
        self.current = Some(profile);
    }

    pub fn logout(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&AdminProfile> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// False when logged out.
    pub fn has_permission(&self, required: AdminRole) -> bool {
        self.current
            .as_ref()
            .is_some_and(|p| p.role.level() >= required.level())
    }

    /// `(id, role)` claimed on requests; both empty when logged out.
    pub fn identity(&self) -> (&str, &str) {
        match &self.current {
            Some(p) => (p.id.as_str(), p.role.as_str()),
            None => ("", ""),
        }
    }
}
