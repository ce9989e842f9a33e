//! Tests for evolution services
//!
//! HTTP adapters run against a local wiremock server.

pub mod publisher;
