//! User profile as shown on the profile page and persisted locally.

use serde::{Deserialize, Serialize};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// User profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_avatar")]
    pub avatar_url: String,
    #[serde(default)]
    pub role: Role,
}

fn default_avatar() -> String {
    "/placeholder.svg".to_string()
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            avatar_url: default_avatar(),
            role: Role::User,
        }
    }
}

/// Partial profile update, as sent to `PUT /api/user/profile`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserProfile {
    /// Apply an update, returning whether anything changed
    pub fn merge(&mut self, update: &ProfileUpdate) -> bool {
        let mut changed = false;
        if let Some(name) = &update.name {
            if *name != self.name {
                self.name = name.clone();
                changed = true;
            }
        }
        if let Some(avatar_url) = &update.avatar_url {
            if *avatar_url != self.avatar_url {
                self.avatar_url = avatar_url.clone();
                changed = true;
            }
        }
        changed
    }
}
