//! # Docketly Worker Library
//!
//! Background delivery of the notification outbox.
//!
//! ## Modules
//!
//! - `config`: Worker settings from the environment
//! - `mailer`: Email delivery (HTTP provider, log, in-memory)
//! - `queue`: Outbox claiming and outcome recording
//! - `orchestrator`: Poll loop with bounded concurrency
//!
//! ## Example
//!
//! ```no_run
//! use docketly_worker::mailer::{Email, Mailer, MemoryMailer};
//!
//! # async fn example() {
//! let mailer = MemoryMailer::new();
//! mailer
//!     .send(&Email::new("pay@example.com", "jo@example.com", "Hi", "Hello"))
//!     .await
//!     .unwrap();
//! assert_eq!(mailer.sent().len(), 1);
//! # }
//! ```

pub mod config;
pub mod mailer;
pub mod orchestrator;
pub mod queue;
