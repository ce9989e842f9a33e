//! Image renditions for publishing
//!
//! Marketplaces want a full-size artifact plus smaller display and thumbnail
//! copies, all as opaque JPEGs.

use std::io::Cursor;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};

use crate::error::GeneratorResult;

pub const JPEG_QUALITY: u8 = 95;

/// One named size an artifact is published at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rendition {
    pub label: &'static str,
    pub max_side: u32,
}

impl Rendition {
    pub const ARTIFACT: Rendition = Rendition { label: "artifact", max_side: 2048 };
    pub const DISPLAY: Rendition = Rendition { label: "display", max_side: 1024 };
    pub const THUMBNAIL: Rendition = Rendition { label: "thumbnail", max_side: 256 };

    pub const ALL: [Rendition; 3] = [Rendition::ARTIFACT, Rendition::DISPLAY, Rendition::THUMBNAIL];

    pub fn file_name(&self) -> String {
        format!("{}.jpg", self.label)
    }
}

/// Composite any alpha channel over white
pub fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let pixel = rgba.get_pixel(x, y);
        let alpha = u16::from(pixel[3]);
        let blend = |channel: u8| (((u16::from(channel) * alpha) + (255 * (255 - alpha))) / 255) as u8;
        Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])])
    })
}

/// Decode `bytes` and re-encode as JPEG no larger than `max_side` on either axis.
///
/// Smaller images keep their size; aspect ratio is preserved.
pub fn jpeg_rendition(bytes: &[u8], max_side: u32) -> GeneratorResult<Vec<u8>> {
    let decoded = image::load_from_memory(bytes)?;
    let mut image = DynamicImage::ImageRgb8(flatten_onto_white(&decoded));
    if image.width() > max_side || image.height() > max_side {
        image = image.resize(max_side, max_side, FilterType::Lanczos3);
    }

    let mut encoded = Vec::new();
    image.write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, JPEG_QUALITY))?;
    Ok(encoded)
}

/// Encode raw RGB pixels as PNG
pub fn encode_png(image: &RgbImage) -> GeneratorResult<Vec<u8>> {
    let mut encoded = Cursor::new(Vec::new());
    image.write_to(&mut encoded, image::ImageFormat::Png)?;
    Ok(encoded.into_inner())
}
