use crate::utils::CareerError;
use image::{DynamicImage, GrayImage};
use imageproc::filter::bilateral_filter;
use log::debug;

/// Side of the square neighbourhood the bilateral filter averages over.
pub const BILATERAL_DIAMETER: u32 = 9;
pub const BILATERAL_SIGMA_COLOR: f32 = 75.0;
pub const BILATERAL_SIGMA_SPATIAL: f32 = 75.0;

pub struct ImageProcessor;

impl ImageProcessor {
    /// Decode an uploaded scan and prepare it for text recognition.
    pub fn preprocess_bytes(image_bytes: &[u8]) -> Result<GrayImage, CareerError> {
        let img = image::load_from_memory(image_bytes).map_err(CareerError::ImageDecode)?;
        debug!("Decoded {}x{} image", img.width(), img.height());
        Ok(Self::preprocess_image(&img))
    }

    pub fn preprocess_image(img: &DynamicImage) -> GrayImage {
        let gray = img.to_luma8();
        Self::smooth(&gray)
    }

    // Edge-preserving smoothing: knocks down scan speckle, keeps strokes sharp.
    fn smooth(gray: &GrayImage) -> GrayImage {
        bilateral_filter(
            gray,
            BILATERAL_DIAMETER / 2,
            BILATERAL_SIGMA_COLOR,
            BILATERAL_SIGMA_SPATIAL,
        )
    }
}
