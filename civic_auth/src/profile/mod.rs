//! User profile rows and the profile facade

mod errors;
mod service;
mod types;

pub use errors::ProfileError;
pub use service::ProfileService;
pub use types::{
    CreateProfileData, NewProfileRow, ProfileChanges, UpdateProfileData, UserProfile, UserRole,
};
