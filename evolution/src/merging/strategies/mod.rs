//! Concrete prompt merge strategies

pub mod append;
pub mod delegated;

pub use append::{AppendMerger, append_feedback};
pub use delegated::{DelegatedMerger, clean_rewrite};
