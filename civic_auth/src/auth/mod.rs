//! Identity facade

mod service;
mod subscription;
mod types;

pub use service::AuthService;
pub use subscription::AuthSubscription;
pub use types::{AuthUser, SignInData, SignUpData};
