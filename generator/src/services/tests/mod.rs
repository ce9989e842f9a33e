//! Tests for generator services
//!
//! HTTP clients run against a local wiremock server, storage runs in a
//! temporary directory.

pub mod http_client;
