use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::profile::{UserProfile, UserRole};
use crate::provider::Identity;

/// Registration input
#[derive(Clone, PartialEq)]
pub struct SignUpData {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
}

impl SignUpData {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            full_name: None,
            role: None,
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Metadata attached to the new identity. Missing values become `""` and
    /// the default role.
    pub fn metadata(&self) -> Value {
        json!({
            "full_name": self.full_name.clone().unwrap_or_default(),
            "role": self.role.unwrap_or_default(),
        })
    }
}

impl fmt::Debug for SignUpData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpData")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .field("full_name", &self.full_name)
            .field("role", &self.role)
            .finish()
    }
}

#[derive(Clone, PartialEq)]
pub struct SignInData {
    pub email: String,
    pub password: String,
}

impl SignInData {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for SignInData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInData")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// The provider identity together with its profile row, when one exists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    #[serde(flatten)]
    pub identity: Identity,
    pub profile: Option<UserProfile>,
}

impl AuthUser {
    pub fn new(identity: Identity, profile: Option<UserProfile>) -> Self {
        Self { identity, profile }
    }

    pub fn id(&self) -> &str {
        &self.identity.id
    }

    pub fn email(&self) -> Option<&str> {
        self.identity.email.as_deref()
    }

    /// Role from the profile row; `None` when there is no profile
    pub fn role(&self) -> Option<UserRole> {
        self.profile.as_ref().map(|profile| profile.role)
    }
}
