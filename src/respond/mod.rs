//! Response client — prompt text → generated reply over HTTP.
//!
//! This module provides:
//! * [`Responder`] — async trait implemented by all generation backends.
//! * [`HttpResponder`] — JSON client for a remote generation endpoint.
//! * [`RespondError`] — error variants for generation operations.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use talkmatic::config::AppConfig;
//! use talkmatic::respond::{HttpResponder, Responder};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let responder = HttpResponder::from_config(&config.response);
//!
//!     let reply = responder.respond("Hello").await.unwrap();
//!     println!("{reply}");
//! }
//! ```

pub mod client;

pub use client::{HttpResponder, RespondError, Responder};
