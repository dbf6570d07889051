use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use topup_core::{ExternalId, UserId};

/// A user record mapping a platform identity to an internal surrogate key.
///
/// Created on first contact. `external_id` is immutable; the profile fields
/// are refreshed idempotently on every inbound event. Users are never deleted
/// in normal operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub external_id: ExternalId,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Apply a refreshed profile. The platform identity never changes.
    pub fn refresh_profile(&mut self, profile: &ContactProfile) {
        self.username = profile.username.clone();
        self.display_name = profile.display_name.clone();
    }

    /// Name to address the user by in notifications: platform handle first,
    /// then display name, then the bare external id.
    pub fn handle(&self) -> String {
        match (&self.username, &self.display_name) {
            (Some(username), _) => format!("@{username}"),
            (None, Some(display_name)) => display_name.clone(),
            (None, None) => self.external_id.to_string(),
        }
    }
}

/// Contact details observed on an inbound event, used to upsert a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactProfile {
    pub external_id: ExternalId,
    pub username: Option<String>,
    pub display_name: Option<String>,
}

impl ContactProfile {
    pub fn new(external_id: ExternalId) -> Self {
        Self {
            external_id,
            username: None,
            display_name: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Treat empty or whitespace-only strings as absent.
    pub fn normalized(mut self) -> Self {
        let clean = |field: &mut Option<String>| {
            if field.as_deref().is_some_and(|s| s.trim().is_empty()) {
                *field = None;
            }
        };
        clean(&mut self.username);
        clean(&mut self.display_name);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: UserId::new(1),
            external_id: ExternalId::new(900_100),
            username: None,
            display_name: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn refresh_replaces_profile_but_not_identity() {
        let mut user = test_user();
        let external_id = user.external_id;

        let profile = ContactProfile::new(ExternalId::new(123))
            .with_username("alice")
            .with_display_name("Alice");
        user.refresh_profile(&profile);

        assert_eq!(user.external_id, external_id);
        assert_eq!(user.username.as_deref(), Some("alice"));
        assert_eq!(user.display_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn refresh_can_clear_stale_fields() {
        let mut user = test_user();
        user.username = Some("old".to_string());

        user.refresh_profile(&ContactProfile::new(user.external_id));
        assert_eq!(user.username, None);
    }

    #[test]
    fn handle_prefers_username_then_display_name() {
        let mut user = test_user();
        assert_eq!(user.handle(), "900100");

        user.display_name = Some("Alice".to_string());
        assert_eq!(user.handle(), "Alice");

        user.username = Some("alice".to_string());
        assert_eq!(user.handle(), "@alice");
    }

    #[test]
    fn normalized_drops_blank_strings() {
        let profile = ContactProfile {
            external_id: ExternalId::new(1),
            username: Some("   ".to_string()),
            display_name: Some("Alice".to_string()),
        }
        .normalized();

        assert_eq!(profile.username, None);
        assert_eq!(profile.display_name.as_deref(), Some("Alice"));
    }
}
