//! Generator request and image types

use serde::{Deserialize, Serialize};
use shared::{QualityLevel, SessionId};

/// One text-to-image request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub session: SessionId,
    pub prompt: String,
    pub quality: QualityLevel,
}

impl GenerationRequest {
    pub fn new(session: SessionId, prompt: impl Into<String>, quality: QualityLevel) -> Self {
        Self {
            session,
            prompt: prompt.into(),
            quality,
        }
    }
}

/// Render parameters sent to the backend for a quality level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityProfile {
    pub width: u32,
    pub height: u32,
    pub steps: u32,
}

const PROFILES: [QualityProfile; 3] = [
    QualityProfile { width: 512, height: 512, steps: 4 },
    QualityProfile { width: 768, height: 768, steps: 8 },
    QualityProfile { width: 1024, height: 1024, steps: 16 },
];

impl QualityProfile {
    /// Levels above the last profile reuse the last profile
    pub fn for_level(level: &QualityLevel) -> Self {
        PROFILES[level.index.min(PROFILES.len() - 1)]
    }
}

/// Image container of produced artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
    Unknown,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 4] = [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Webp, ImageFormat::Unknown];

    /// Detect the container from its magic bytes
    pub fn sniff(bytes: &[u8]) -> Self {
        match image::guess_format(bytes) {
            Ok(image::ImageFormat::Png) => ImageFormat::Png,
            Ok(image::ImageFormat::Jpeg) => ImageFormat::Jpeg,
            Ok(image::ImageFormat::WebP) => ImageFormat::Webp,
            _ => ImageFormat::Unknown,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
            ImageFormat::Unknown => "bin",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Unknown => "application/octet-stream",
        }
    }
}
