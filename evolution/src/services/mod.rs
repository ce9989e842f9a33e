//! Evolution services implementations

pub mod console_presenter;
pub mod credentials;
pub mod publisher;
pub mod rewriter;

#[cfg(test)]
pub mod tests;

pub use console_presenter::*;
pub use credentials::*;
pub use publisher::*;
pub use rewriter::*;
