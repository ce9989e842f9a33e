//! Generator services implementations

pub mod file_store;
pub mod http_client;
pub mod placeholder;

#[cfg(test)]
pub mod tests;

pub use file_store::*;
pub use http_client::*;
pub use placeholder::*;
