//! HTTP surface: body and query parsing, the response envelope and the
//! router that ties the resource modules together.

pub mod form;
pub mod query;
pub mod response;
pub mod server;
