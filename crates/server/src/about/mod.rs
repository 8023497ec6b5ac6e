//! The site owner's profile. Exactly one row exists; it is created with
//! placeholder content the first time it is read.

pub mod db;
pub mod entries;
pub mod handlers;
pub mod models;

pub use handlers::routes;
