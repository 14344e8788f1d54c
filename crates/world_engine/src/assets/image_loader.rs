//! Image decoding for texture upload
//!
//! Images arrive as tightly packed pixels with their channel count and bit
//! depth. 8-bit RGB is widened to RGBA because three-channel 8-bit formats are
//! rarely sampleable.

use std::path::Path;

use crate::assets::{AssetError, AssetResult};

/// Decoded pixels ready for staging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Tightly packed pixel bytes, native endian for 16-bit channels
    pub pixels: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Channels per pixel
    pub components: u8,
    /// Bits per channel
    pub bits: u8,
}

impl ImageData {
    /// 8-bit RGBA image of one repeated color
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = width as usize * height as usize;
        Self {
            pixels: color.repeat(pixel_count),
            width,
            height,
            components: 4,
            bits: 8,
        }
    }

    /// Size of the pixel data in bytes
    pub fn size_bytes(&self) -> usize {
        self.pixels.len()
    }

    /// Convert 8-bit RGB to RGBA with opaque alpha; other layouts are unchanged
    pub fn widen_rgb(self) -> Self {
        if self.components != 3 || self.bits != 8 {
            return self;
        }
        let pixels = self
            .pixels
            .chunks_exact(3)
            .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], u8::MAX])
            .collect();
        Self {
            pixels,
            components: 4,
            ..self
        }
    }

    /// Build from a decoded `image` crate image, keeping 8/16-bit layouts
    pub fn from_dynamic(image: image::DynamicImage) -> Self {
        use image::DynamicImage;

        let (width, height) = (image.width(), image.height());
        let (pixels, components, bits) = match image {
            DynamicImage::ImageLuma8(buffer) => (buffer.into_raw(), 1, 8),
            DynamicImage::ImageLumaA8(buffer) => (buffer.into_raw(), 2, 8),
            DynamicImage::ImageRgba8(buffer) => (buffer.into_raw(), 4, 8),
            DynamicImage::ImageLuma16(buffer) => (bytemuck::cast_slice(buffer.as_raw()).to_vec(), 1, 16),
            DynamicImage::ImageLumaA16(buffer) => (bytemuck::cast_slice(buffer.as_raw()).to_vec(), 2, 16),
            DynamicImage::ImageRgb16(buffer) => (bytemuck::cast_slice(buffer.as_raw()).to_vec(), 3, 16),
            DynamicImage::ImageRgba16(buffer) => (bytemuck::cast_slice(buffer.as_raw()).to_vec(), 4, 16),
            other => (other.to_rgba8().into_raw(), 4, 8),
        };
        Self {
            pixels,
            width,
            height,
            components,
            bits,
        }
    }
}

/// Source of decoded images for texture paths
pub trait ImageLoader {
    /// Decode the image at `path`
    fn load(&self, path: &Path) -> AssetResult<ImageData>;
}

/// Loads images from disk with the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct FileImageLoader;

impl ImageLoader for FileImageLoader {
    fn load(&self, path: &Path) -> AssetResult<ImageData> {
        log::debug!("Loading image from: {:?}", path);

        let decoded = image::open(path).map_err(|e| match e {
            image::ImageError::IoError(io) => AssetError::Io(io),
            other => AssetError::Decode {
                path: path.display().to_string(),
                reason: other.to_string(),
            },
        })?;
        let data = ImageData::from_dynamic(decoded).widen_rgb();

        log::info!("Loaded image {}x{} from {:?}", data.width, data.height, path);
        Ok(data)
    }
}
