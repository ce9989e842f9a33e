//! Common test utilities and infrastructure
//!
//! Shared fixtures and helpers for the evolution engine test suites.

pub mod fixtures;
pub mod helpers;

pub use fixtures::TestFixtures;
pub use helpers::{EngineBuilder, PanickingMerger, PresenterCall, ScriptedClient, TestHarness};
