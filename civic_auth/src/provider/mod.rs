//! Authentication provider seam
//!
//! The [`AuthProvider`] trait is the narrow surface of the hosted auth service
//! that the facades depend on. [`GoTrueProvider`] talks to the service over HTTP;
//! [`InMemoryAuthProvider`] keeps accounts and the session in process.

mod errors;
mod gotrue;
mod memory;
mod traits;
mod types;

pub use errors::AuthError;
pub use gotrue::GoTrueProvider;
pub use memory::InMemoryAuthProvider;
pub use traits::AuthProvider;
pub use types::{AuthChangeEvent, AuthEvent, AuthResponse, Identity, Session};
