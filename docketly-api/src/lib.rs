//! # Docketly API Server Library
//!
//! HTTP layer over the services in `docketly_shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration from the environment
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors that reject with JSON errors
//! - `middleware`: JWT authentication and security headers
//! - `routes`: Route handlers, one module per resource

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
