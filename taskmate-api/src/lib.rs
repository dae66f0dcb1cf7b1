//! # TaskMate API Server Library
//!
//! HTTP surface of the TaskMate backend. Handlers translate requests into
//! `taskmate_shared::services` calls and map their outcomes to status codes.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration from the environment
//! - `error`: Outcome to HTTP response mapping
//! - `middleware`: Bearer-token resolution and security headers
//! - `routes`: Route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
