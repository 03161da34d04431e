use serde::{Deserialize, Serialize};
use tutorlink_transport::UserPayload;

pub use tutorlink_transport::Role;

use super::Identity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Identity,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

impl User {
    /// Name shown in lists; falls back to a role label when the account has no name.
    pub fn display_name(&self) -> &str {
        if !self.full_name.is_empty() {
            return &self.full_name;
        }
        match self.role {
            Role::Tutor => "Tutor",
            Role::Student => "Student",
            Role::Admin => "Admin",
        }
    }
}

impl From<UserPayload> for User {
    fn from(payload: UserPayload) -> Self {
        Self {
            id: Identity(payload.id),
            full_name: payload.full_name.unwrap_or_default(),
            email: payload.email,
            role: payload.role,
        }
    }
}
