pub mod db;
pub mod handlers;
pub mod models;

pub use handlers::routes;
