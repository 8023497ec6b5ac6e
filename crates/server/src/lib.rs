//! Folio: content API for a personal portfolio site.

pub mod about;
pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod errors;
pub mod media;
pub mod message;
pub mod project;
pub mod sale_project;
pub mod seed;
pub mod skill;
pub mod state;
pub mod validation;

pub mod test_helpers;
