//! Desktop client for an image processing server.
//!
//! Uploads images, triggers server-side processing and downloads the
//! resulting batch. The library exposes its modules for integration tests.

pub mod api;
pub mod app;
pub mod config;
pub mod notify;
pub mod utils;
