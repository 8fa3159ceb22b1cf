//! # Forgeboard API Server Library
//!
//! This library provides the core functionality for the Forgeboard API server.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `response`: The JSON response envelope and pagination
//! - `mailer`: Outbound email delivery client
//! - `middleware`: Security headers and rate limiting
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod mailer;
pub mod middleware;
pub mod response;
pub mod routes;
