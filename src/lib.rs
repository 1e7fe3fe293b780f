//! rawhttp - minimal HTTP/1.1 static file server
//!
//! Requests are framed by hand from a single bounded read per connection;
//! see [`http::framer`].

pub mod config;
pub mod http;
pub mod server;
pub mod site;
