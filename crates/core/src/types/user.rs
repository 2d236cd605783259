//! User, session-token and profile records.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::UserId;

/// The signed-in user as returned by the auth endpoints.
///
/// The API is inconsistent about casing, so both `fullName` and `full_name`
/// are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default, alias = "id", alias = "userId")]
    pub user_id: Option<UserId>,
    #[serde(default, alias = "fullName")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserRecord {
    /// Name to greet the user with.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("User")
    }
}

/// An issued session token.
///
/// `Debug` is redacted so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for attaching to requests and persisting.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

/// Success payload of `POST /auth/login` and `POST /auth/signup`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: UserRecord,
    pub token: AuthToken,
}

/// Profile returned by `GET /users/profile`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, alias = "id", alias = "userId")]
    pub user_id: Option<UserId>,
    #[serde(default, alias = "fullName")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl Profile {
    /// A profile is complete once both city and country are filled in.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        has_text(self.city.as_deref()) && has_text(self.country.as_deref())
    }

    /// `"City, Country"`, whichever half is present, or `None`.
    #[must_use]
    pub fn location(&self) -> Option<String> {
        let city = self.city.as_deref().filter(|c| !c.trim().is_empty());
        let country = self.country.as_deref().filter(|c| !c.trim().is_empty());
        match (city, country) {
            (Some(city), Some(country)) => Some(format!("{city}, {country}")),
            (Some(one), None) | (None, Some(one)) => Some(one.to_owned()),
            (None, None) => None,
        }
    }

    /// The user record embedded in a profile, used to restore a session.
    #[must_use]
    pub fn to_user(&self) -> UserRecord {
        UserRecord {
            user_id: self.user_id.clone(),
            full_name: self.full_name.clone(),
            email: self.email.clone(),
        }
    }
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Partial body of `PUT /users/profile`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}
