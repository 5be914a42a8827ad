//! Domain model types shared between the vault and the API client.
//!
//! This module defines the session artifacts tied to a credential:
//! - [`User`] - The authenticated user's profile
//! - [`UserPatch`] - A partial profile update
//! - [`AppConfig`] - Server-provided application configuration
//! - [`ThemeMode`] - The persisted theme preference

use serde::{Deserialize, Serialize};
use std::fmt;

/// Theme preference carried on the user profile.
///
/// Falls back to [`ThemeMode::Light`] when the server sends nothing,
/// mirroring the system default on a fresh session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

/// The authenticated user's profile.
///
/// Unknown server fields are ignored; optional fields default to `None`
/// so older backend versions deserialize cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub nif: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub theme: Option<ThemeMode>,
    #[serde(default)]
    pub loyalty_synced: bool,
}

/// A partial update to the user profile.
///
/// Absent fields leave the current value untouched. Serializes with
/// absent fields omitted, so the same type doubles as the `PUT /user`
/// request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loyalty_synced: Option<bool>,
}

impl UserPatch {
    /// Apply this patch on top of an existing profile.
    pub fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(phone) = &self.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(birth_date) = &self.birth_date {
            user.birth_date = Some(birth_date.clone());
        }
        if let Some(street) = &self.street {
            user.street = Some(street.clone());
        }
        if let Some(city) = &self.city {
            user.city = Some(city.clone());
        }
        if let Some(postal_code) = &self.postal_code {
            user.postal_code = Some(postal_code.clone());
        }
        if let Some(theme) = self.theme {
            user.theme = Some(theme);
        }
        if let Some(loyalty_synced) = self.loyalty_synced {
            user.loyalty_synced = loyalty_synced;
        }
    }
}

/// Server-provided application configuration delivered with the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL for resolving relative asset paths in content and coupons.
    #[serde(default)]
    pub assets_base_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        serde_json::from_value(serde_json::json!({
            "id": 7,
            "name": "Maria Silva",
            "email": "maria@example.com",
            "loyalty_synced": false
        }))
        .unwrap()
    }

    #[test]
    fn user_tolerates_missing_optional_fields() {
        let user = sample_user();
        assert_eq!(user.name, "Maria Silva");
        assert!(user.phone.is_none());
        assert!(user.theme.is_none());
    }

    #[test]
    fn theme_mode_roundtrip() {
        let dark: ThemeMode = serde_json::from_str("\"dark\"").unwrap();
        assert_eq!(dark, ThemeMode::Dark);
        assert_eq!(serde_json::to_string(&ThemeMode::Light).unwrap(), "\"light\"");
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut user = sample_user();
        let patch = UserPatch {
            theme: Some(ThemeMode::Dark),
            loyalty_synced: Some(true),
            ..Default::default()
        };

        patch.apply(&mut user);

        assert_eq!(user.theme, Some(ThemeMode::Dark));
        assert!(user.loyalty_synced);
        assert_eq!(user.name, "Maria Silva");
    }

    #[test]
    fn patch_serializes_without_absent_fields() {
        let patch = UserPatch {
            theme: Some(ThemeMode::Dark),
            ..Default::default()
        };
        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(body, serde_json::json!({ "theme": "dark" }));
    }
}
