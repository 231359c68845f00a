//! Image to classifier-input transformation.
//!
//! The emotion model was fit on images produced by exactly this sequence, so
//! every step is pinned down explicitly instead of relying on library
//! defaults:
//!
//! 1. decode the bytes with the `image` crate,
//! 2. reduce to 8-bit luminance with the ITU-R 601-2 integer transform,
//! 3. resize to `side × side` with the Catmull-Rom bicubic filter,
//! 4. divide by 255 and lay out as `(1, side, side, 1)`.

use image::{imageops::FilterType, DynamicImage, GrayImage, Luma};
use ndarray::Array4;

use crate::error::{AppError, AppResult};

/// Tensor consumed by the classifier: `(batch, height, width, channels)`
pub type InputTensor = Array4<f32>;

/// Input side length of the reference model
pub const DEFAULT_IMAGE_SIZE: u32 = 48;

const RESIZE_FILTER: FilterType = FilterType::CatmullRom;
const INTENSITY_DIVISOR: f32 = 255.0;

/// Normalizes arbitrary encoded images into the classifier's input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePreprocessor {
    side: u32,
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self {
            side: DEFAULT_IMAGE_SIZE,
        }
    }
}

impl ImagePreprocessor {
    pub fn new(side: u32) -> AppResult<Self> {
        if side == 0 {
            return Err(AppError::InvalidInput(
                "Image size must be greater than zero".to_string(),
            ));
        }
        Ok(Self { side })
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    /// Decodes encoded image bytes and converts them to the input tensor
    pub fn preprocess(&self, bytes: &[u8]) -> AppResult<InputTensor> {
        if bytes.is_empty() {
            return Err(AppError::InvalidImage("Image payload is empty".to_string()));
        }

        let image = image::load_from_memory(bytes)
            .map_err(|e| AppError::InvalidImage(format!("Unable to decode image: {}", e)))?;

        self.to_tensor(&image)
    }

    /// Converts an already decoded image to the input tensor
    pub fn to_tensor(&self, image: &DynamicImage) -> AppResult<InputTensor> {
        if image.width() == 0 || image.height() == 0 {
            return Err(AppError::InvalidImage("Image has zero area".to_string()));
        }

        let gray = luminance(image);
        let resized = image::imageops::resize(&gray, self.side, self.side, RESIZE_FILTER);

        let side = self.side as usize;
        let data: Vec<f32> = resized
            .pixels()
            .map(|p| f32::from(p.0[0]) / INTENSITY_DIVISOR)
            .collect();

        Array4::from_shape_vec((1, side, side, 1), data)
            .map_err(|e| AppError::Internal(format!("Tensor shape error: {}", e)))
    }
}

/// Single-channel 8-bit luminance
///
/// Grayscale inputs keep their luma channel. Everything else goes through 8-bit
/// RGB and `L = (R*19595 + G*38470 + B*7471 + 0x8000) >> 16`, the fixed-point
/// form of `0.299 R + 0.587 G + 0.114 B`. Alpha is ignored.
pub fn luminance(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        DynamicImage::ImageLumaA8(gray_alpha) => {
            GrayImage::from_fn(gray_alpha.width(), gray_alpha.height(), |x, y| {
                Luma([gray_alpha.get_pixel(x, y).0[0]])
            })
        }
        other => {
            let rgb = other.to_rgb8();
            GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                Luma([itu_r_601_luma(r, g, b)])
            })
        }
    }
}

fn itu_r_601_luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000;
    (weighted >> 16) as u8
}
