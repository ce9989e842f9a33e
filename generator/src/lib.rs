//! Image generation with bounded retries
//!
//! This library wraps a text-to-image backend behind the [`GenerationClient`]
//! trait, persists produced images through an [`ArtifactStore`] and retries
//! transient backend failures in [`RetryingGenerator`]. [`imaging`] produces
//! the JPEG renditions used when publishing.

pub mod error;
pub mod imaging;
pub mod retrying;
pub mod services;
pub mod traits;
pub mod types;

pub use error::{BackendError, BackendErrorKind, GeneratorError, GeneratorResult};
pub use imaging::{Rendition, jpeg_rendition};
pub use retrying::{RetryDecision, RetryingGenerator};
pub use services::*;
pub use traits::*;
pub use types::*;
