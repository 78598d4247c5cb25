//! # Docketly Shared Library
//!
//! This crate contains the data and service layer used by the Docketly API
//! server and the notification worker.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their SQL
//! - `services`: Per-domain business rules (builders, contractors, dockets,
//!   invoices, weekly views, history, admin, worker self-service)
//! - `auth`: Password hashing, JWT tokens, request auth context, role checks
//! - `crypto`: Field-level encryption for contractor bank details
//! - `weekly`: ISO week date ranges
//! - `export`: CSV and PDF rendering
//! - `db`: Connection pool and migrations
//! - `error`: Service error taxonomy

pub mod auth;
pub mod crypto;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod pagination;
pub mod services;
pub mod weekly;

/// Current version of the Docketly shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
