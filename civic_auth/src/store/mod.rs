//! Profile row store seam
//!
//! [`ProfileStore`] is the select-by-key / insert / update-by-key surface of the
//! hosted table. [`RestProfileStore`] speaks the PostgREST dialect over HTTP;
//! [`InMemoryProfileStore`] keeps rows in process.

mod errors;
mod memory;
mod rest;
mod traits;

pub use errors::StoreError;
pub use memory::InMemoryProfileStore;
pub use rest::RestProfileStore;
pub use traits::ProfileStore;
