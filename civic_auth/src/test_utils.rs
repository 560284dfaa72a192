//! Shared helpers for unit tests across the crate

use std::sync::Arc;

use chrono::Utc;

use crate::context::AuthContext;
use crate::profile::{CreateProfileData, NewProfileRow, UserProfile, UserRole};
use crate::provider::{AuthProvider, InMemoryAuthProvider};
use crate::store::InMemoryProfileStore;

pub(crate) const TEST_PASSWORD: &str = "correct-horse";

/// Context over fresh in-memory fakes, with handles to both for inspection
pub(crate) fn in_memory_context() -> (
    AuthContext,
    Arc<InMemoryAuthProvider>,
    Arc<InMemoryProfileStore>,
) {
    let provider = Arc::new(InMemoryAuthProvider::new());
    let store = Arc::new(InMemoryProfileStore::new());
    let context = AuthContext::new(provider.clone(), store.clone());
    (context, provider, store)
}

/// Sign up (and thereby sign in) a user; returns the identity id
pub(crate) async fn signed_in_user(provider: &InMemoryAuthProvider, email: &str) -> String {
    let response = provider
        .sign_up(email, TEST_PASSWORD, serde_json::Value::Null)
        .await
        .expect("sign-up should succeed");
    response.user.expect("sign-up should return a user").id
}

/// Store a profile row for `id`, as the hosted creation trigger would
pub(crate) async fn seed_profile(
    store: &InMemoryProfileStore,
    id: &str,
    email: &str,
    role: UserRole,
) -> UserProfile {
    let row = NewProfileRow {
        id: id.to_string(),
        email: email.to_string(),
        data: CreateProfileData {
            full_name: Some("Test User".to_string()),
            role: Some(role),
            bio: None,
            location: Some("Springfield".to_string()),
        },
    };
    let profile = UserProfile::from_new_row(row, Utc::now() - chrono::Duration::minutes(5));
    store.seed(profile.clone()).await;
    profile
}
