//! civic_auth - Identity and profile facades for a hosted auth service
//!
//! This crate wraps a GoTrue-style authentication service and a PostgREST-style
//! `user_profiles` table behind two facades:
//!
//! - [`AuthService`] signs users up, in and out, exposes the session and composes
//!   the authenticated identity with its profile row into an [`AuthUser`].
//! - [`ProfileService`] reads, creates and updates profile rows and answers
//!   role checks for the current user.
//!
//! Both facades are built from an [`AuthContext`], which carries the provider
//! and the row store explicitly so that the composition logic can run against
//! the in-memory fakes in tests.

mod auth;
mod config;
mod context;
mod profile;
mod provider;
mod remote;
mod store;

#[cfg(test)]
mod test_utils;

pub use auth::{AuthService, AuthSubscription, AuthUser, SignInData, SignUpData};

pub use config::{ClientConfig, ConfigError, HTTP_TIMEOUT_SECS, PROFILE_TABLE};

pub use context::AuthContext;

pub use profile::{
    CreateProfileData, NewProfileRow, ProfileChanges, ProfileError, ProfileService,
    UpdateProfileData, UserProfile, UserRole,
};

pub use provider::{
    AuthChangeEvent, AuthError, AuthEvent, AuthProvider, AuthResponse, GoTrueProvider, Identity,
    InMemoryAuthProvider, Session,
};

pub use store::{InMemoryProfileStore, ProfileStore, RestProfileStore, StoreError};
