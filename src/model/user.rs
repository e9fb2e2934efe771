//! User documents and the guide projection.
//!
//! Users are referenced by `Tour::guides` and `Review::user`. Internal
//! bookkeeping fields (password-change tracking, document version) never
//! serialize to clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validate::FieldError;

/// User roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    User,
    Guide,
    LeadGuide,
    Admin,
}

/// A stored user document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(skip_serializing)]
    pub password_changed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub version: u32,
}

impl User {
    /// Builds a storable user from a creation payload.
    pub fn from_new(new: NewUser) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();
        let name = new.name.trim().to_string();
        if name.is_empty() {
            errors.push(FieldError::new("name", "User must have a name."));
        }
        if !new.email.contains('@') {
            errors.push(FieldError::new(
                "email",
                "Please provide a valid email address.",
            ));
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            email: new.email.trim().to_lowercase(),
            role: new.role,
            photo: new.photo,
            password_changed_at: None,
            version: 0,
        })
    }
}

/// Payload for creating a user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default)]
    pub photo: Option<String>,
}

fn default_role() -> Role {
    Role::User
}

/// Partial update for a user.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub photo: Option<String>,
}

/// The projection of a user joined into tour documents as a guide.
///
/// Deliberately omits password-change tracking and the version counter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl From<&User> for GuideProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            photo: user.photo.clone(),
        }
    }
}
