//! Test fixtures and constants

use generator::imaging::encode_png;
use image::{Rgb, RgbImage};
use shared::{EvolutionConfig, PublishSettings};

pub struct TestFixtures;

impl TestFixtures {
    pub const SEED: &'static str = "a lighthouse at dusk";
    pub const RECEIVER: &'static str = "tz1receiver";
    pub const RETRY_DELAY_SECONDS: u64 = 10;

    /// Single seed so the starting prompt is predictable
    pub fn config() -> EvolutionConfig {
        EvolutionConfig {
            starter_prompts: vec![Self::SEED.to_string()],
            retry_delay_seconds: Self::RETRY_DELAY_SECONDS,
            ..EvolutionConfig::default()
        }
    }

    pub fn publishing_config() -> EvolutionConfig {
        EvolutionConfig {
            publish: PublishSettings {
                enabled: true,
                receiver_identity: Self::RECEIVER.to_string(),
                ..PublishSettings::default()
            },
            ..Self::config()
        }
    }

    /// A small solid-color PNG
    pub fn png_bytes() -> Vec<u8> {
        encode_png(&RgbImage::from_pixel(4, 4, Rgb([30, 60, 90]))).unwrap()
    }
}
