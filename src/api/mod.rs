//! API Module
//!
//! HTTP handlers and routing for the cache admin and monitoring API.
//!
//! # Endpoints
//! - `PUT /entries` - Store a payload under a key
//! - `GET /entries/:key` - Retrieve a payload by key
//! - `DELETE /entries/:key` - Delete a key
//! - `DELETE /entries` - Clear the cache
//! - `DELETE /groups/:group` - Invalidate a group
//! - `DELETE /prefixes/:prefix` - Invalidate by key prefix
//! - `DELETE /entities/:group/:id` - Invalidate an entity and its dependents
//! - `GET /stats` - Get cache statistics
//! - `POST /stats/reset` - Reset cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
