//! Contact form submissions and the admin inbox.

pub mod db;
pub mod handlers;
pub mod models;

pub use handlers::routes;
