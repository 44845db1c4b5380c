//! Google OAuth2 for the Drive session: client secrets, the persisted token
//! and the stateless token endpoints.

pub mod endpoints;
pub mod secrets;

pub use endpoints::AuthorizationRequest;
pub use secrets::{ClientSecrets, StoredToken};
