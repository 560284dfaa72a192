/// Identity facade flows over HTTP
///
/// Covers sign-up (with and without email confirmation), password sign-in,
/// sign-out, token refresh and the auth state listener.
use crate::common::{ANON_KEY, MockServer, MockState, PASSWORD, context_for, services_for};
use civic_auth::{
    AuthContext, AuthError, AuthService, ClientConfig, SignInData, SignUpData, UserRole,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_sign_up_composes_identity_with_triggered_profile() {
    let server = MockServer::start().await;
    let (auth, _) = services_for(&server);

    // Step 1: Sign up with a name and role
    let response = auth
        .sign_up(
            SignUpData::new("official@example.com", PASSWORD)
                .with_full_name("Olivia Official")
                .with_role(UserRole::Official),
        )
        .await
        .expect("Sign-up should succeed");
    assert!(response.session.is_some(), "Auto-confirmed sign-up returns a session");

    // Step 2: The metadata reached the provider
    let identity = response.user.expect("Sign-up should return the identity");
    assert_eq!(identity.user_metadata["full_name"], "Olivia Official");
    assert_eq!(identity.user_metadata["role"], "official");

    // Step 3: The composed user carries the profile the trigger created
    let user = auth
        .get_current_user()
        .await
        .expect("User should be signed in");
    let profile = user.profile.as_ref().expect("Profile should exist");
    assert_eq!(user.id(), identity.id);
    assert_eq!(profile.id, identity.id);
    assert_eq!(profile.full_name.as_deref(), Some("Olivia Official"));
    assert_eq!(user.role(), Some(UserRole::Official));
    assert!(auth.is_authenticated().await);
}

#[tokio::test]
async fn test_sign_up_with_email_confirmation() {
    let server = MockServer::start_with(MockState {
        require_confirmation: true,
        ..Default::default()
    })
    .await;
    let (auth, _) = services_for(&server);

    // Sign-up returns the user but no session
    let response = auth
        .sign_up(SignUpData::new("pending@example.com", PASSWORD))
        .await
        .expect("Sign-up should succeed");
    assert!(response.session.is_none());
    assert!(response.user.is_some());
    assert!(!auth.is_authenticated().await);

    // Signing in before confirming is refused with the provider's message
    let err = auth
        .sign_in(SignInData::new("pending@example.com", PASSWORD))
        .await
        .expect_err("Unconfirmed sign-in should fail");
    assert_eq!(err.to_string(), "Email not confirmed");
    assert_eq!(err.code(), Some("email_not_confirmed"));

    // After confirmation the same credentials work
    server.confirm_email("pending@example.com");
    auth.sign_in(SignInData::new("pending@example.com", PASSWORD))
        .await
        .expect("Confirmed sign-in should succeed");
    assert!(auth.is_authenticated().await);
}

#[tokio::test]
async fn test_sign_up_errors_are_preserved() {
    let server = MockServer::start().await;
    let (auth, _) = services_for(&server);

    let weak = auth
        .sign_up(SignUpData::new("weak@example.com", "123"))
        .await
        .expect_err("Weak password should be rejected");
    assert_eq!(weak.to_string(), "Password should be at least 6 characters.");
    assert_eq!(weak.status(), Some(422));

    auth.sign_up(SignUpData::new("dup@example.com", PASSWORD))
        .await
        .expect("First sign-up should succeed");
    let duplicate = auth
        .sign_up(SignUpData::new("dup@example.com", PASSWORD))
        .await
        .expect_err("Duplicate sign-up should be rejected");
    assert_eq!(duplicate.to_string(), "User already registered");
}

#[tokio::test]
async fn test_sign_in_with_wrong_password() {
    let server = MockServer::start().await;
    let (auth, _) = services_for(&server);
    auth.sign_up(SignUpData::new("ada@example.com", PASSWORD))
        .await
        .expect("Sign-up should succeed");
    auth.sign_out().await.expect("Sign-out should succeed");

    let err = auth
        .sign_in(SignInData::new("ada@example.com", "wrong-password"))
        .await
        .expect_err("Sign-in should fail");

    assert_eq!(err.to_string(), "Invalid login credentials");
    assert_eq!(err.status(), Some(400));
    assert_eq!(auth.get_current_user().await, None);
}

#[tokio::test]
async fn test_sign_out_revokes_and_clears() {
    let server = MockServer::start().await;
    let (auth, _) = services_for(&server);
    auth.sign_up(SignUpData::new("out@example.com", PASSWORD))
        .await
        .expect("Sign-up should succeed");
    assert!(auth.get_access_token().await.is_some());

    auth.sign_out().await.expect("Sign-out should succeed");

    assert_eq!(auth.get_session().await, None);
    assert_eq!(auth.get_access_token().await, None);
    assert_eq!(auth.get_current_user().await, None);
    {
        let state = server.state();
        assert_eq!(state.logout_calls, 1);
        assert!(state.access_tokens.is_empty());
    }

    // Nothing to revoke the second time, so no request is made
    auth.sign_out().await.expect("Second sign-out should succeed");
    assert_eq!(server.state().logout_calls, 1);
}

#[tokio::test]
async fn test_sign_out_with_revoked_token_still_clears_locally() {
    let server = MockServer::start().await;
    let (auth, _) = services_for(&server);
    auth.sign_up(SignUpData::new("revoked@example.com", PASSWORD))
        .await
        .expect("Sign-up should succeed");

    server.revoke_all_tokens();

    // The provider no longer recognises the token
    assert_eq!(auth.get_current_user().await, None);

    // Sign-out gets a 401 but the local session is dropped anyway
    auth.sign_out().await.expect("Sign-out should succeed");
    assert_eq!(auth.get_session().await, None);
    assert_eq!(server.state().logout_calls, 1);
}

#[tokio::test]
async fn test_expired_session_is_refreshed() {
    // Tokens that expire inside the client's safety margin
    let server = MockServer::start_with(MockState {
        expires_in: 10,
        ..Default::default()
    })
    .await;
    let (auth, _) = services_for(&server);

    let response = auth
        .sign_up(SignUpData::new("refresh@example.com", PASSWORD))
        .await
        .expect("Sign-up should succeed");
    let first_token = response
        .session
        .expect("Sign-up should return a session")
        .access_token;

    let refreshed = auth
        .get_access_token()
        .await
        .expect("Session should survive via refresh");

    assert_ne!(refreshed, first_token);
    assert_eq!(server.state().refresh_calls, 1);
}

#[tokio::test]
async fn test_rejected_refresh_ends_session() {
    let server = MockServer::start_with(MockState {
        expires_in: 10,
        ..Default::default()
    })
    .await;
    let (auth, _) = services_for(&server);
    auth.sign_up(SignUpData::new("stale@example.com", PASSWORD))
        .await
        .expect("Sign-up should succeed");

    server.state().refresh_tokens.clear();

    assert_eq!(auth.get_session().await, None);
    assert!(!auth.is_authenticated().await);
}

/// Expiring sessions with refresh grants and logout held back by the server
fn slow_server_state() -> MockState {
    MockState {
        expires_in: 10,
        response_delay: Some(Duration::from_millis(300)),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_refresh_does_not_overwrite_newer_sign_in() {
    let server = MockServer::start_with(slow_server_state()).await;
    let (auth, _) = services_for(&server);
    let second_id = auth
        .sign_up(SignUpData::new("second@example.com", PASSWORD))
        .await
        .expect("Sign-up should succeed")
        .user
        .expect("Identity should be returned")
        .id;
    auth.sign_up(SignUpData::new("first@example.com", PASSWORD))
        .await
        .expect("Sign-up should succeed");

    // Step 1: Start refreshing the first user's expired session
    let pending = tokio::spawn({
        let auth = auth.clone();
        async move { auth.get_session().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Step 2: Switch users while the refresh is in flight
    auth.sign_in(SignInData::new("second@example.com", PASSWORD))
        .await
        .expect("Sign-in should succeed");

    // Step 3: The late refresh result is discarded
    let returned = pending
        .await
        .expect("Refresh task should finish")
        .expect("Newer session should be returned");
    assert_eq!(returned.user.id, second_id);
    let current = auth.get_session().await.expect("Session should remain");
    assert_eq!(current.user.id, second_id);
}

#[tokio::test]
async fn test_rejected_refresh_keeps_newer_sign_in() {
    let server = MockServer::start_with(slow_server_state()).await;
    let (auth, _) = services_for(&server);
    auth.sign_up(SignUpData::new("second@example.com", PASSWORD))
        .await
        .expect("Sign-up should succeed");
    auth.sign_up(SignUpData::new("first@example.com", PASSWORD))
        .await
        .expect("Sign-up should succeed");
    server.state().refresh_tokens.clear();

    let pending = tokio::spawn({
        let auth = auth.clone();
        async move { auth.get_session().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    auth.sign_in(SignInData::new("second@example.com", PASSWORD))
        .await
        .expect("Sign-in should succeed");

    let returned = pending
        .await
        .expect("Refresh task should finish")
        .expect("Newer session should be returned");
    assert_eq!(returned.user.email.as_deref(), Some("second@example.com"));
    assert!(auth.is_authenticated().await);
}

#[tokio::test]
async fn test_sign_out_keeps_newer_sign_in() {
    let server = MockServer::start_with(MockState {
        response_delay: Some(Duration::from_millis(300)),
        ..Default::default()
    })
    .await;
    let (auth, _) = services_for(&server);
    auth.sign_up(SignUpData::new("second@example.com", PASSWORD))
        .await
        .expect("Sign-up should succeed");
    auth.sign_up(SignUpData::new("first@example.com", PASSWORD))
        .await
        .expect("Sign-up should succeed");

    let pending = tokio::spawn({
        let auth = auth.clone();
        async move { auth.sign_out().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    auth.sign_in(SignInData::new("second@example.com", PASSWORD))
        .await
        .expect("Sign-in should succeed");

    pending
        .await
        .expect("Sign-out task should finish")
        .expect("Sign-out should succeed");
    let user = auth.get_current_user().await.expect("Second user should stay signed in");
    assert_eq!(user.email(), Some("second@example.com"));
    assert_eq!(server.state().logout_calls, 1);
}

#[tokio::test]
async fn test_listener_tracks_session_changes() {
    let server = MockServer::start().await;
    let (auth, _) = services_for(&server);
    auth.sign_up(
        SignUpData::new("listen@example.com", PASSWORD).with_role(UserRole::Official),
    )
    .await
    .expect("Sign-up should succeed");
    auth.sign_out().await.expect("Sign-out should succeed");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = auth.on_auth_state_change(move |user| {
        let _ = tx.send(user);
    });

    auth.sign_in(SignInData::new("listen@example.com", PASSWORD))
        .await
        .expect("Sign-in should succeed");
    let signed_in = timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("Listener should fire on sign-in")
        .expect("Channel should be open")
        .expect("Sign-in should deliver a user");
    assert_eq!(signed_in.email(), Some("listen@example.com"));
    assert_eq!(signed_in.role(), Some(UserRole::Official));

    auth.sign_out().await.expect("Sign-out should succeed");
    let signed_out = timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("Listener should fire on sign-out")
        .expect("Channel should be open");
    assert_eq!(signed_out, None);

    subscription.unsubscribe();
}

#[tokio::test]
async fn test_wrong_api_key_is_rejected() {
    let server = MockServer::start().await;
    let config = ClientConfig::new(&server.base_url, "not-the-key").expect("Config should build");
    let auth = AuthService::new(AuthContext::from_config(&config).expect("Context should build"));

    let err = auth
        .sign_in(SignInData::new("anyone@example.com", PASSWORD))
        .await
        .expect_err("Sign-in should fail");

    assert!(matches!(err, AuthError::Api { status: 401, .. }));
    assert_eq!(err.to_string(), "Invalid API key");
}

#[tokio::test]
async fn test_unreachable_service_degrades() {
    // Bind and immediately drop a listener so the port refuses connections
    let port = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Bind should succeed");
        listener.local_addr().expect("Address").port()
    };
    let config = ClientConfig::new(format!("http://127.0.0.1:{port}"), ANON_KEY)
        .expect("Config should build")
        .with_timeout(Duration::from_secs(2));
    let auth = AuthService::new(AuthContext::from_config(&config).expect("Context should build"));

    let err = auth
        .sign_in(SignInData::new("anyone@example.com", PASSWORD))
        .await
        .expect_err("Sign-in should fail");
    assert!(matches!(err, AuthError::Http(_)));

    // Nobody is signed in, so the degrading reads need no network
    assert_eq!(auth.get_current_user().await, None);
    assert!(!auth.is_authenticated().await);
}

#[tokio::test]
async fn test_separate_contexts_hold_separate_sessions() {
    let server = MockServer::start().await;
    let first = AuthService::new(context_for(&server));
    let second = AuthService::new(context_for(&server));

    first
        .sign_up(SignUpData::new("one@example.com", PASSWORD))
        .await
        .expect("Sign-up should succeed");

    assert!(first.is_authenticated().await);
    assert!(!second.is_authenticated().await);
}
