use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::ProfileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Citizen,
    Official,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Citizen => "citizen",
            Self::Official => "official",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "citizen" => Ok(Self::Citizen),
            "official" => Ok(Self::Official),
            other => Err(ProfileError::InvalidData(format!("Unknown role: {other}"))),
        }
    }
}

/// Application-owned record describing a user, keyed by the identity id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Row as the store creates it, with column defaults applied
    pub fn from_new_row(row: NewProfileRow, now: DateTime<Utc>) -> Self {
        Self {
            id: row.id,
            email: row.email,
            full_name: row.data.full_name,
            avatar_url: None,
            role: row.data.role.unwrap_or_default(),
            is_verified: false,
            bio: row.data.bio,
            location: row.data.location,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.role == role
    }

    /// Overwrite the fields present in `changes`, leaving the rest untouched
    pub fn apply(&mut self, changes: &ProfileChanges) {
        let fields = &changes.fields;
        if let Some(full_name) = &fields.full_name {
            self.full_name = Some(full_name.clone());
        }
        if let Some(avatar_url) = &fields.avatar_url {
            self.avatar_url = Some(avatar_url.clone());
        }
        if let Some(bio) = &fields.bio {
            self.bio = Some(bio.clone());
        }
        if let Some(location) = &fields.location {
            self.location = Some(location.clone());
        }
        self.updated_at = changes.updated_at;
    }
}

/// Optional fields supplied when a profile is created
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CreateProfileData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Fields a user may change on their own profile
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateProfileData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl UpdateProfileData {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.avatar_url.is_none()
            && self.bio.is_none()
            && self.location.is_none()
    }
}

/// Insert payload: the identity key plus the optional creation fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewProfileRow {
    pub id: String,
    pub email: String,
    #[serde(flatten)]
    pub data: CreateProfileData,
}

/// Update payload: the supplied fields plus the refreshed timestamp
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileChanges {
    #[serde(flatten)]
    pub fields: UpdateProfileData,
    pub updated_at: DateTime<Utc>,
}

impl ProfileChanges {
    pub fn new(fields: UpdateProfileData, updated_at: DateTime<Utc>) -> Self {
        Self { fields, updated_at }
    }
}
