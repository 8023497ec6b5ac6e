//! Admin authentication: password hashes, session tokens and the
//! extractors guarding protected routes.

pub mod accounts;
pub mod db;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod password;
pub mod token;

pub use extract::{AdminUser, AuthUser};
pub use models::{Role, UserRecord, UserView};
pub use token::AuthSettings;
