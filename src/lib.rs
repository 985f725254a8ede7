//! reciteserve - local HTTP server for the recitation library front-end.
//!
//! Serves the HTML front-end, the JSON data files and the Opus audio clips
//! from a directory tree over HTTP/1.1. Every response carries permissive
//! CORS headers so the data files can be fetched from any origin during
//! development.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
