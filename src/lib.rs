//! Packet listing viewer: a display filter engine, an incremental packet
//! store over a paginated listing API, and the derived views (search, sort,
//! stream following, marks) built on top of it. A small actix-web server
//! serves capture files through the same listing API.

pub mod api;
pub mod capture;
pub mod filter;
pub mod models;
pub mod store;
pub mod utils;
pub mod view;
