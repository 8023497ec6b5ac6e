pub mod db;
pub mod handlers;
pub mod input;
pub mod models;

pub use handlers::routes;
