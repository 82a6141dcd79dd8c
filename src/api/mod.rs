//! API Module
//!
//! HTTP handlers and routing for hosting a cache behind a REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a value, optionally with a TTL
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Remove a key
//! - `GET /exists/:key` - Check whether a key is set
//! - `PUT|GET|DELETE /ttl/:key` - Set, read or remove a key's TTL
//! - `GET /keys` - List keys in insertion order
//! - `GET /stats` - Get cache statistics
//! - `POST /flush` - Drop all keys
//! - `GET /health` - Lifecycle state of the cache

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
