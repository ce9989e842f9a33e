//! Offline generation client for dry runs

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use async_trait::async_trait;
use image::{Rgb, RgbImage};

use crate::error::BackendError;
use crate::imaging::encode_png;
use crate::traits::GenerationClient;
use crate::types::GenerationRequest;

/// Quality levels past this render at the same size
const MAX_SCALE: u32 = 4;

/// Renders a gradient PNG whose colors are derived from the prompt
pub struct PlaceholderClient {
    size: u32,
}

impl PlaceholderClient {
    pub fn new(size: u32) -> Self {
        Self { size: size.clamp(1, 1024) }
    }

    /// Side length in pixels for a quality level
    pub fn side_for(&self, quality_index: usize) -> u32 {
        let scale = u32::try_from(quality_index).unwrap_or(u32::MAX).min(MAX_SCALE - 1) + 1;
        self.size * scale
    }

    fn render(&self, prompt: &str, quality_index: usize) -> RgbImage {
        let mut hasher = DefaultHasher::new();
        prompt.hash(&mut hasher);
        let seed = hasher.finish().to_le_bytes();

        let side = self.side_for(quality_index);
        RgbImage::from_fn(side, side, |x, y| {
            let fx = (x * 255 / side) as u8;
            let fy = (y * 255 / side) as u8;
            Rgb([
                seed[0] ^ fx,
                seed[1] ^ fy,
                seed[2].wrapping_add(fx / 2).wrapping_add(fy / 2),
            ])
        })
    }
}

impl Default for PlaceholderClient {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl GenerationClient for PlaceholderClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<u8>, BackendError> {
        if request.prompt.trim().is_empty() {
            return Err(BackendError::fatal("empty prompt"));
        }
        let image = self.render(&request.prompt, request.quality.index);
        encode_png(&image).map_err(|e| BackendError::fatal(e.to_string()))
    }
}
